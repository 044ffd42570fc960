//! Per-session viewer state.
//!
//! [`Stores`] bundles every observable cell the UI reads from: the image
//! list, the selected index, values derived from them, the two tag
//! hierarchies, and one editable mirror cell per metadata field.  One value
//! is created per viewer session and passed around explicitly.
//!
//! The field cells hold *pending* edits.  [`Stores::bind_fields`] keeps them
//! in step with the selected image; [`Stores::commit`] writes them back into
//! the image record.

use thiserror::Error;

use super::hierarchy::{close_hierarchy, open_hierarchy_path, Hier};
use super::metadata::{Field, FieldValue, Metadata};
use super::reactive::{derived, derived2, Cell, Derived, Subscription};
use super::snapshot::{fold_tags, Snapshot};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("no image at index {index} (list has {len})")]
    NoImage { index: usize, len: usize },
}

// ───────────────────────────────────────── field cells ───────

/// Editable mirrors of the current image's fields.
#[derive(Debug, Clone, Default)]
pub struct FieldCells {
    pub artist: Cell<String>,
    pub caption: Cell<String>,
    pub gps: Cell<String>,
    pub groups: Cell<Vec<String>>,
    pub keywords: Cell<Vec<String>>,
    pub location: Cell<String>,
    pub people: Cell<Vec<String>>,
    pub places: Cell<Vec<String>>,
    pub title: Cell<String>,
    pub topics: Cell<Vec<String>>,
}

impl FieldCells {
    fn text(&self, field: Field) -> Option<&Cell<String>> {
        match field {
            Field::Artist => Some(&self.artist),
            Field::Caption => Some(&self.caption),
            Field::Gps => Some(&self.gps),
            Field::Location => Some(&self.location),
            Field::Title => Some(&self.title),
            _ => None,
        }
    }

    fn list(&self, field: Field) -> Option<&Cell<Vec<String>>> {
        match field {
            Field::Groups => Some(&self.groups),
            Field::Keywords => Some(&self.keywords),
            Field::People => Some(&self.people),
            Field::Places => Some(&self.places),
            Field::Topics => Some(&self.topics),
            _ => None,
        }
    }

    pub fn value(&self, field: Field) -> FieldValue {
        match self.text(field) {
            Some(cell) => FieldValue::Text(cell.get()),
            None => FieldValue::List(self.list(field).map(|c| c.get()).unwrap_or_default()),
        }
    }

    pub fn set(&self, field: Field, value: FieldValue) {
        if let Some(cell) = self.text(field) {
            cell.set(value.into_text());
        } else if let Some(cell) = self.list(field) {
            cell.set(value.into_list());
        }
    }

    /// Overwrite every field from `image`, or clear them all for `None`.
    pub fn populate(&self, image: Option<&Metadata>) {
        let blank = Metadata::default();
        let image = image.unwrap_or(&blank);
        for &field in Field::ALL {
            self.set(field, image.value(field));
        }
    }
}

// ───────────────────────────────────────── change set ────────

/// Fields whose edited value differs from the image record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub filename: String,
    pub changes: Vec<(Field, FieldValue)>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn contains(&self, field: Field) -> bool {
        self.changes.iter().any(|(f, _)| *f == field)
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.changes.iter().map(|(f, _)| f.label()).collect()
    }
}

// ───────────────────────────────────────── stores ────────────

pub struct Stores {
    pub index: Cell<usize>,
    pub images: Cell<Vec<Metadata>>,
    /// `images[index]`, or `None` when the index is out of range.
    pub image: Derived<Option<Metadata>>,
    pub filename: Derived<Option<String>>,
    /// `images[index - 1]`; `None` at index 0.
    pub prev_image: Derived<Option<Metadata>>,
    /// Rebuilt from outside as new tag values appear.
    pub place_hierarchy: Cell<Vec<Hier>>,
    pub topic_hierarchy: Cell<Vec<Hier>>,
    pub fields: FieldCells,
}

impl Default for Stores {
    fn default() -> Self {
        Self::new()
    }
}

impl Stores {
    pub fn new() -> Self {
        let index = Cell::new(0usize);
        let images: Cell<Vec<Metadata>> = Cell::default();
        let image = derived2(&index, &images, |&i: &usize, images: &Vec<Metadata>| {
            images.get(i).cloned()
        });
        let filename = derived(&image, |image: &Option<Metadata>| {
            image.as_ref().map(|m| m.filename.clone())
        });
        let prev_image = derived2(&index, &images, |&i: &usize, images: &Vec<Metadata>| {
            i.checked_sub(1).and_then(|p| images.get(p)).cloned()
        });
        Self {
            index,
            images,
            image,
            filename,
            prev_image,
            place_hierarchy: Cell::default(),
            topic_hierarchy: Cell::default(),
            fields: FieldCells::default(),
        }
    }

    /// Replace images and hierarchies wholesale and select the first image.
    pub fn load(&self, snapshot: Snapshot) {
        tracing::debug!(images = snapshot.images.len(), "loading snapshot into stores");
        self.place_hierarchy.set(snapshot.place_hierarchy);
        self.topic_hierarchy.set(snapshot.topic_hierarchy);
        self.images.set(snapshot.images);
        self.index.set(0);
    }

    /// Like [`Stores::load`], but keep the selected index when it is still
    /// inside the new image list.
    pub fn reload(&self, snapshot: Snapshot) {
        let keep = self.index.get();
        let in_range = keep < snapshot.images.len();
        tracing::debug!(
            images = snapshot.images.len(),
            keep_index = in_range,
            "reloading snapshot into stores"
        );
        self.place_hierarchy.set(snapshot.place_hierarchy);
        self.topic_hierarchy.set(snapshot.topic_hierarchy);
        self.images.set(snapshot.images);
        self.index.set(if in_range { keep } else { 0 });
    }

    pub fn len(&self) -> usize {
        self.images.with(Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Select `index` as given; out-of-range values leave `image` empty.
    pub fn select(&self, index: usize) {
        self.index.set(index);
    }

    /// Move the selection by `delta`, clamped to the list.  Returns whether
    /// the index changed.
    pub fn step(&self, delta: isize) -> bool {
        let len = self.len();
        if len == 0 {
            return false;
        }
        let current = self.index.get();
        let target = current.saturating_add_signed(delta).min(len - 1);
        if target == current {
            return false;
        }
        self.index.set(target);
        true
    }

    /// Keep the field cells mirroring the selected image.  The cells are
    /// populated immediately and again every time `image` changes, which
    /// discards pending edits.
    pub fn bind_fields(&self) -> Subscription {
        let fields = self.fields.clone();
        self.image
            .subscribe(move |image: &Option<Metadata>| fields.populate(image.as_ref()))
    }

    /// Discard pending edits.
    pub fn revert(&self) {
        self.image.with(|image| self.fields.populate(image.as_ref()));
    }

    /// Copy the previous image's fields into the edit cells.  Returns
    /// `false` when there is no previous image.
    pub fn copy_from_previous(&self) -> bool {
        match self.prev_image.get() {
            Some(prev) => {
                self.fields.populate(Some(&prev));
                true
            }
            None => false,
        }
    }

    /// Edits not yet written to the current image, or `None` with no image.
    pub fn pending_changes(&self) -> Option<ChangeSet> {
        self.image.with(|image| {
            let image = image.as_ref()?;
            let changes = Field::ALL
                .iter()
                .filter_map(|&field| {
                    let edited = self.fields.value(field);
                    (edited != image.value(field)).then_some((field, edited))
                })
                .collect();
            Some(ChangeSet {
                filename: image.filename.clone(),
                changes,
            })
        })
    }

    /// Pending edits, only when at least one field differs.
    pub fn unsaved_changes(&self) -> Option<ChangeSet> {
        self.pending_changes().filter(|changes| !changes.is_empty())
    }

    /// Write pending edits into the current image record and fold new place
    /// and topic values into the hierarchies.
    pub fn commit(&self) -> Result<ChangeSet, StoreError> {
        let index = self.index.get();
        let changes = self.pending_changes().ok_or(StoreError::NoImage {
            index,
            len: self.len(),
        })?;
        if changes.is_empty() {
            return Ok(changes);
        }

        self.images.update(|images| {
            if let Some(image) = images.get_mut(index) {
                for (field, value) in &changes.changes {
                    image.set_value(*field, value.clone());
                }
            }
        });
        for (field, value) in &changes.changes {
            let forest = match field {
                Field::Places => &self.place_hierarchy,
                Field::Topics => &self.topic_hierarchy,
                _ => continue,
            };
            if let FieldValue::List(tags) = value {
                forest.update(|forest| fold_tags(forest, tags));
            }
        }

        tracing::info!(
            filename = %changes.filename,
            fields = ?changes.labels(),
            "committed edits"
        );
        Ok(changes)
    }

    /// Collapse both hierarchies, then open the path of every place and
    /// topic currently in the edit cells.
    pub fn reveal_tags(&self) {
        let places = self.fields.places.get();
        let topics = self.fields.topics.get();
        self.place_hierarchy.update(|forest| reveal(forest, &places));
        self.topic_hierarchy.update(|forest| reveal(forest, &topics));
    }
}

fn reveal(forest: &mut [Hier], paths: &[String]) {
    close_hierarchy(forest);
    for path in paths {
        open_hierarchy_path(forest, path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hierarchy::visible_rows;

    fn image(name: &str, title: &str) -> Metadata {
        Metadata {
            title: title.to_string(),
            ..Metadata::new(name)
        }
    }

    fn stores_with(images: Vec<Metadata>) -> Stores {
        let stores = Stores::new();
        stores.load(Snapshot::from_images(images).unwrap());
        stores
    }

    #[test]
    fn image_and_prev_image_follow_index() {
        let m = [image("m0", "a"), image("m1", "b"), image("m2", "c")];
        let stores = stores_with(m.to_vec());

        stores.select(1);
        assert_eq!(stores.image.get(), Some(m[1].clone()));
        assert_eq!(stores.prev_image.get(), Some(m[0].clone()));
        assert_eq!(stores.filename.get().as_deref(), Some("m1"));

        stores.select(0);
        assert_eq!(stores.prev_image.get(), None);
        assert_eq!(stores.image.get(), Some(m[0].clone()));
    }

    #[test]
    fn shrinking_list_leaves_image_empty() {
        let stores = stores_with(vec![image("a", ""), image("b", ""), image("c", "")]);
        stores.select(2);
        stores.images.set(vec![image("a", "")]);

        assert_eq!(stores.image.get(), None);
        assert_eq!(stores.filename.get(), None);
        assert_eq!(stores.prev_image.get(), None);
    }

    #[test]
    fn empty_store_has_no_image() {
        let stores = Stores::new();
        assert!(stores.is_empty());
        assert_eq!(stores.image.get(), None);
        assert!(!stores.step(1));
        assert_eq!(
            stores.commit(),
            Err(StoreError::NoImage { index: 0, len: 0 })
        );
    }

    #[test]
    fn step_clamps_to_bounds() {
        let stores = stores_with(vec![image("a", ""), image("b", "")]);
        assert!(!stores.step(-1));
        assert!(stores.step(1));
        assert!(!stores.step(1));
        assert_eq!(stores.index.get(), 1);
        assert!(stores.step(-5));
        assert_eq!(stores.index.get(), 0);
    }

    #[test]
    fn bound_fields_follow_selection() {
        let stores = stores_with(vec![image("a", "First"), image("b", "Second")]);
        let _sync = stores.bind_fields();
        assert_eq!(stores.fields.title.get(), "First");

        stores.fields.title.set("edited".into());
        stores.step(1);
        assert_eq!(stores.fields.title.get(), "Second");

        stores.select(9);
        assert_eq!(stores.fields.title.get(), "");
    }

    #[test]
    fn pending_changes_and_commit() {
        let stores = stores_with(vec![image("a", "First")]);
        let _sync = stores.bind_fields();
        assert!(stores.pending_changes().unwrap().is_empty());

        stores.fields.title.set("Renamed".into());
        stores
            .fields
            .places
            .set(vec!["USA / Oregon / Bend".into()]);
        let pending = stores.pending_changes().unwrap();
        assert_eq!(pending.labels(), ["Title", "Places"]);

        let committed = stores.commit().unwrap();
        assert_eq!(committed, pending);
        assert_eq!(stores.images.with(|i| i[0].title.clone()), "Renamed");
        assert!(stores.pending_changes().unwrap().is_empty());

        let rows = stores.place_hierarchy.with(|f| visible_rows(f));
        assert_eq!(rows[0].name, "USA");
    }

    #[test]
    fn unsaved_changes_ignores_untouched_image() {
        let stores = stores_with(vec![image("a", "First")]);
        let _sync = stores.bind_fields();
        assert!(stores.pending_changes().is_some());
        assert_eq!(stores.unsaved_changes(), None);

        stores.fields.caption.set("draft".into());
        assert_eq!(stores.unsaved_changes().unwrap().labels(), ["Caption"]);
    }

    #[test]
    fn reload_keeps_index_in_range() {
        let stores = stores_with(vec![image("a", ""), image("b", ""), image("c", "")]);
        let _sync = stores.bind_fields();
        stores.select(1);

        let refreshed = vec![image("a", ""), image("b", "Renamed"), image("c", "")];
        stores.reload(Snapshot::from_images(refreshed).unwrap());
        assert_eq!(stores.index.get(), 1);
        assert_eq!(stores.fields.title.get(), "Renamed");
    }

    #[test]
    fn reload_resets_index_past_the_end() {
        let stores = stores_with(vec![image("a", ""), image("b", ""), image("c", "")]);
        stores.select(2);

        stores.reload(Snapshot::from_images(vec![image("a", "Only")]).unwrap());
        assert_eq!(stores.index.get(), 0);
        assert_eq!(stores.filename.get().as_deref(), Some("a"));

        // Plain load always goes back to the start.
        stores.reload(Snapshot::from_images(vec![image("a", ""), image("b", "")]).unwrap());
        stores.select(1);
        stores.load(Snapshot::from_images(vec![image("a", ""), image("b", "")]).unwrap());
        assert_eq!(stores.index.get(), 0);
    }

    #[test]
    fn revert_discards_edits() {
        let stores = stores_with(vec![image("a", "First")]);
        let _sync = stores.bind_fields();
        stores.fields.caption.set("draft".into());
        stores.revert();
        assert!(stores.pending_changes().unwrap().is_empty());
    }

    #[test]
    fn copy_from_previous_image() {
        let mut first = image("a", "Beach");
        first.people = vec!["Ann".into()];
        let stores = stores_with(vec![first, image("b", "")]);
        let _sync = stores.bind_fields();

        assert!(!stores.copy_from_previous());
        stores.step(1);
        assert!(stores.copy_from_previous());
        assert_eq!(stores.fields.title.get(), "Beach");
        assert_eq!(stores.fields.people.get(), vec!["Ann".to_string()]);
        assert!(stores.pending_changes().unwrap().contains(Field::People));
    }

    #[test]
    fn reveal_opens_only_current_tags() {
        let mut a = image("a", "");
        a.places = vec!["USA / Oregon".into()];
        let mut b = image("b", "");
        b.places = vec!["Canada / Yukon".into()];
        let stores = stores_with(vec![a, b]);
        let _sync = stores.bind_fields();

        stores.reveal_tags();
        let open: Vec<_> = stores.place_hierarchy.with(|f| {
            visible_rows(f)
                .into_iter()
                .filter(|r| r.open)
                .map(|r| r.name)
                .collect()
        });
        assert_eq!(open, ["USA", "Oregon"]);

        stores.step(1);
        stores.reveal_tags();
        let open: Vec<_> = stores.place_hierarchy.with(|f| {
            visible_rows(f)
                .into_iter()
                .filter(|r| r.open)
                .map(|r| r.name)
                .collect()
        });
        assert_eq!(open, ["Canada", "Yukon"]);
    }
}
