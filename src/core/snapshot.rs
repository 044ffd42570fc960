//! Loading a metadata snapshot — the image list plus the place and topic
//! hierarchies, as served by the metadata server's `metadata.json`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::hierarchy::{add_to_hierarchy, build_hierarchy, parse_hier_value, Hier, HierValue};
use super::metadata::{null_as_default, Metadata};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed metadata document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("image #{index} has no file name")]
    EmptyFilename { index: usize },
    #[error("multiple images named {0:?}")]
    DuplicateFilename(String),
}

/// Everything the viewer needs to start: images and tag hierarchies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<Metadata>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub place_hierarchy: Vec<Hier>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub topic_hierarchy: Vec<Hier>,
}

impl Snapshot {
    /// Build a snapshot from images alone, deriving both hierarchies.
    pub fn from_images(images: Vec<Metadata>) -> Result<Self, SnapshotError> {
        let mut snapshot = Self {
            images,
            ..Self::default()
        };
        snapshot.check_filenames()?;
        snapshot.fill_missing_hierarchies();
        Ok(snapshot)
    }

    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        let mut snapshot: Snapshot = serde_json::from_str(text)?;
        snapshot.check_filenames()?;
        snapshot.fill_missing_hierarchies();
        Ok(snapshot)
    }

    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let text = std::fs::read_to_string(path).map_err(|source| SnapshotError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot = Self::from_json(&text)?;
        tracing::info!(
            path = %path.display(),
            images = snapshot.images.len(),
            "loaded metadata snapshot"
        );
        Ok(snapshot)
    }

    fn check_filenames(&self) -> Result<(), SnapshotError> {
        let mut seen = HashSet::new();
        for (index, image) in self.images.iter().enumerate() {
            if image.filename.is_empty() {
                return Err(SnapshotError::EmptyFilename { index });
            }
            if !seen.insert(image.filename.as_str()) {
                return Err(SnapshotError::DuplicateFilename(image.filename.clone()));
            }
        }
        Ok(())
    }

    /// Older documents carry no hierarchies; rebuild them from the tags.
    fn fill_missing_hierarchies(&mut self) {
        if self.place_hierarchy.is_empty() {
            self.place_hierarchy = hierarchy_from_tags(self.images.iter().map(|m| &m.places));
        }
        if self.topic_hierarchy.is_empty() {
            self.topic_hierarchy = hierarchy_from_tags(self.images.iter().map(|m| &m.topics));
        }
    }
}

/// Fold every parseable tag value into a new forest.  Unparseable values
/// are skipped with a warning.
pub fn hierarchy_from_tags<'a>(tags: impl IntoIterator<Item = &'a Vec<String>>) -> Vec<Hier> {
    let values: Vec<HierValue> = tags
        .into_iter()
        .flatten()
        .filter_map(|tag| match parse_hier_value(tag) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(tag = %tag, "skipping tag: {e}");
                None
            }
        })
        .collect();
    build_hierarchy(&values)
}

/// Add each value in `tags` to an existing forest.
pub fn fold_tags(forest: &mut Vec<Hier>, tags: &[String]) {
    for tag in tags {
        match parse_hier_value(tag) {
            Ok(value) => add_to_hierarchy(forest, &value),
            Err(e) => tracing::warn!(tag = %tag, "skipping tag: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_full_document() {
        let json = r#"{
            "images": [
                {"Filename": "a.jpg", "Places": ["USA / Oregon"]},
                {"Filename": "b.jpg"}
            ],
            "placeHierarchy": [{"Name": "Canada", "Children": []}],
            "topicHierarchy": null
        }"#;
        let snap = Snapshot::from_json(json).unwrap();
        assert_eq!(snap.images.len(), 2);
        // A hierarchy sent by the server is used as-is.
        assert_eq!(snap.place_hierarchy.len(), 1);
        assert_eq!(snap.place_hierarchy[0].name, "Canada");
        assert!(snap.topic_hierarchy.is_empty());
    }

    #[test]
    fn builds_missing_hierarchies_from_tags() {
        let json = r#"{"images": [
            {"Filename": "a.jpg", "Places": ["USA / Oregon", "bad | tag"], "Topics": ["Nature / Birds"]},
            {"Filename": "b.jpg", "Places": ["USA / California"]}
        ]}"#;
        let snap = Snapshot::from_json(json).unwrap();
        assert_eq!(snap.place_hierarchy.len(), 1);
        let usa: Vec<_> = snap.place_hierarchy[0]
            .children
            .iter()
            .map(|h| h.name.as_str())
            .collect();
        assert_eq!(usa, ["California", "Oregon"]);
        assert_eq!(snap.topic_hierarchy[0].children[0].name, "Birds");
    }

    #[test]
    fn rejects_duplicate_and_empty_names() {
        let dup = r#"{"images": [{"Filename": "a.jpg"}, {"Filename": "a.jpg"}]}"#;
        assert!(matches!(
            Snapshot::from_json(dup),
            Err(SnapshotError::DuplicateFilename(name)) if name == "a.jpg"
        ));

        let empty = r#"{"images": [{"Filename": "a.jpg"}, {"Artist": "x"}]}"#;
        assert!(matches!(
            Snapshot::from_json(empty),
            Err(SnapshotError::EmptyFilename { index: 1 })
        ));

        assert!(matches!(
            Snapshot::from_json("{not json"),
            Err(SnapshotError::Parse(_))
        ));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"images": [{{"Filename": "x.jpg", "Title": "Hi"}}]}}"#).unwrap();

        let snap = Snapshot::load(file.path()).unwrap();
        assert_eq!(snap.images[0].title, "Hi");

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            Snapshot::load(&missing),
            Err(SnapshotError::Read { .. })
        ));
    }
}
