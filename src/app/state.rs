//! Central application state.
//!
//! All mutable state lives here so that the rest of the app can be pure
//! functions over `&AppState` (rendering) or `&mut AppState` (event handling).
//! The metadata itself lives in [`Stores`]; this struct adds what only the
//! terminal front-end cares about (focus, selection, the line editor).

use std::path::PathBuf;

use crate::config::AppConfig;
use crate::core::{
    hierarchy::{parse_hier_value, value_at, visible_rows, Hier, HierRow, HierValue},
    metadata::Field,
    reactive::{Cell, Subscription},
    snapshot::Snapshot,
    store::Stores,
};
use crate::ui::hier_widget::HierWidgetState;

/// Which view / overlay is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveView {
    #[default]
    Browse,
    Editing,
    Help,
}

/// Which pane receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaneFocus {
    #[default]
    Hierarchy,
    Fields,
}

/// Which tag hierarchy the left pane shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HierarchyTab {
    #[default]
    Places,
    Topics,
}

impl HierarchyTab {
    pub fn label(self) -> &'static str {
        match self {
            HierarchyTab::Places => "Places",
            HierarchyTab::Topics => "Topics",
        }
    }

    /// The list field whose values live in this hierarchy.
    pub fn field(self) -> Field {
        match self {
            HierarchyTab::Places => Field::Places,
            HierarchyTab::Topics => Field::Topics,
        }
    }

    pub fn other(self) -> Self {
        match self {
            HierarchyTab::Places => HierarchyTab::Topics,
            HierarchyTab::Topics => HierarchyTab::Places,
        }
    }
}

// ───────────────────────────────────────── line editor ───────

/// Single-line editor for one field.  `cursor` counts characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEditor {
    pub field: Field,
    pub buffer: String,
    pub cursor: usize,
}

impl FieldEditor {
    pub fn new(field: Field, text: String) -> Self {
        let cursor = text.chars().count();
        Self {
            field,
            buffer: text,
            cursor,
        }
    }

    fn byte_index(&self) -> usize {
        self.buffer
            .char_indices()
            .nth(self.cursor)
            .map_or(self.buffer.len(), |(i, _)| i)
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_index();
        self.buffer.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index();
        self.buffer.remove(at);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.buffer.chars().count() {
            let at = self.byte_index();
            self.buffer.remove(at);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.buffer.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.buffer.chars().count();
    }
}

// ───────────────────────────────────────── state ─────────────

/// Top-level application state.
pub struct AppState {
    /// Images, hierarchies and field edit cells.
    pub stores: Stores,
    /// Keeps the field cells mirroring the selected image.
    _field_sync: Subscription,
    /// The snapshot file the session was loaded from.
    pub source: PathBuf,
    /// User-configurable keybindings and preferences.
    pub config: AppConfig,
    pub active_view: ActiveView,
    pub focus: PaneFocus,
    pub tab: HierarchyTab,
    /// Selection / scroll in the hierarchy pane.
    pub hier_state: HierWidgetState,
    /// Index into [`Field::ALL`] of the highlighted field.
    pub field_selected: usize,
    /// Present while [`ActiveView::Editing`].
    pub editor: Option<FieldEditor>,
    /// An optional status message shown in the bottom bar.
    pub status_message: Option<String>,
    /// Controls the main event loop.
    pub should_quit: bool,
}

impl AppState {
    pub fn new(source: PathBuf, snapshot: Snapshot, config: AppConfig) -> Self {
        let stores = Stores::new();
        stores.load(snapshot);
        let field_sync = stores.bind_fields();

        let mut state = Self {
            stores,
            _field_sync: field_sync,
            source,
            config,
            active_view: ActiveView::default(),
            focus: PaneFocus::default(),
            tab: HierarchyTab::default(),
            hier_state: HierWidgetState::default(),
            field_selected: 0,
            editor: None,
            status_message: None,
            should_quit: false,
        };
        if state.config.reveal_on_select {
            state.reveal_current_tags();
        }
        state
    }

    /// The hierarchy shown in the left pane.
    pub fn hierarchy(&self) -> &Cell<Vec<Hier>> {
        match self.tab {
            HierarchyTab::Places => &self.stores.place_hierarchy,
            HierarchyTab::Topics => &self.stores.topic_hierarchy,
        }
    }

    pub fn hier_rows(&self) -> Vec<HierRow> {
        self.hierarchy().with(|forest| visible_rows(forest))
    }

    pub fn selected_row(&self) -> Option<HierRow> {
        self.hier_rows().into_iter().nth(self.hier_state.selected)
    }

    /// Tag value of the highlighted hierarchy row.
    pub fn selected_value(&self) -> Option<HierValue> {
        let row = self.selected_row()?;
        self.hierarchy().with(|forest| value_at(forest, &row.path))
    }

    /// Move the highlight onto the row naming `value`.  Returns `false` when
    /// that row is not visible.
    pub fn select_value(&mut self, value: &HierValue) -> bool {
        let rows = self.hier_rows();
        let found = self.hierarchy().with(|forest| {
            rows.iter()
                .position(|row| value_at(forest, &row.path).as_ref() == Some(value))
        });
        match found {
            Some(idx) => {
                self.hier_state.selected = idx;
                true
            }
            None => false,
        }
    }

    pub fn selected_field(&self) -> Field {
        Field::ALL[self.field_selected.min(Field::ALL.len() - 1)]
    }

    /// Tag values of the active tab's field, as currently edited.
    pub fn active_tags(&self) -> Vec<String> {
        self.stores.fields.value(self.tab.field()).into_list()
    }

    /// Collapse both hierarchies to the current image's tags and put the
    /// selection on the first of them.
    pub fn reveal_current_tags(&mut self) {
        self.stores.reveal_tags();
        self.select_first_tag();
    }

    /// Select the deepest visible row along the first tag of the active tab.
    fn select_first_tag(&mut self) {
        let Some(tag) = self
            .active_tags()
            .into_iter()
            .find_map(|t| parse_hier_value(&t).ok().filter(|v| !v.is_empty()))
        else {
            self.hier_state.selected = 0;
            return;
        };

        let rows = self.hier_rows();
        let best = self.hierarchy().with(|forest| {
            rows.iter()
                .enumerate()
                .filter_map(|(i, row)| {
                    let value = value_at(forest, &row.path)?;
                    tag.components()
                        .starts_with(value.components())
                        .then_some((i, row.depth))
                })
                .max_by_key(|&(_, depth)| depth)
                .map(|(i, _)| i)
        });
        self.hier_state.selected = best.unwrap_or(0);
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metadata::Metadata;

    fn snapshot() -> Snapshot {
        let mut a = Metadata::new("a.jpg");
        a.places = vec!["USA / Oregon / Bend".into()];
        let mut b = Metadata::new("b.jpg");
        b.places = vec!["Canada".into()];
        Snapshot::from_images(vec![a, b]).unwrap()
    }

    #[test]
    fn new_state_reveals_and_selects_first_tag() {
        let state = AppState::new(PathBuf::from("m.json"), snapshot(), AppConfig::default());
        let row = state.selected_row().unwrap();
        assert_eq!(row.name, "Bend");
        assert_eq!(row.depth, 2);
    }

    #[test]
    fn reveal_can_be_disabled() {
        let config = AppConfig {
            reveal_on_select: false,
            ..AppConfig::default()
        };
        let state = AppState::new(PathBuf::from("m.json"), snapshot(), config);
        assert_eq!(state.hier_rows().len(), 2);
        assert_eq!(state.hier_state.selected, 0);
    }

    #[test]
    fn editor_handles_multibyte_text() {
        let mut ed = FieldEditor::new(Field::Title, "Zürich".into());
        assert_eq!(ed.cursor, 6);
        ed.left();
        ed.left();
        ed.backspace();
        assert_eq!(ed.buffer, "Zürch");
        ed.insert('X');
        assert_eq!(ed.buffer, "ZürXch");
        ed.delete();
        assert_eq!(ed.buffer, "ZürXh");
        ed.home();
        ed.backspace();
        ed.delete();
        assert_eq!(ed.buffer, "ürXh");
        ed.end();
        ed.right();
        assert_eq!(ed.cursor, 4);
    }
}
