//! Input handling — maps key events to state mutations.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::Action;
use crate::core::{
    hierarchy::{close_hierarchy, parse_hier_value, set_open, value_at},
    metadata::{Field, FieldValue},
    snapshot::Snapshot,
};

use super::state::{ActiveView, AppState, FieldEditor, PaneFocus};

/// Process a key event, dispatching based on the active view.
pub fn handle_key(state: &mut AppState, key: KeyEvent) {
    // Ctrl+c always quits, regardless of view.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        state.should_quit = true;
        return;
    }

    match state.active_view {
        ActiveView::Browse => handle_browse_key(state, key),
        ActiveView::Editing => handle_editor_key(state, key),
        ActiveView::Help => {
            // Any key closes the help overlay.
            state.active_view = ActiveView::Browse;
        }
    }
}

// ── Browse view (configurable bindings) ─────────────────────────

fn handle_browse_key(state: &mut AppState, key: KeyEvent) {
    let Some(action) = state.config.match_key(key) else {
        return;
    };

    match action {
        Action::Quit => state.should_quit = true,
        Action::Help => state.active_view = ActiveView::Help,
        Action::NextImage => change_image(state, 1),
        Action::PrevImage => change_image(state, -1),
        Action::SwitchPane => {
            state.focus = match state.focus {
                PaneFocus::Hierarchy => PaneFocus::Fields,
                PaneFocus::Fields => PaneFocus::Hierarchy,
            };
        }
        Action::SwitchHierarchy => {
            state.tab = state.tab.other();
            state.hier_state.selected = 0;
            state.hier_state.offset = 0;
            state.set_status(format!("Showing {}", state.tab.label()));
        }
        Action::MoveUp => match state.focus {
            PaneFocus::Hierarchy => state.hier_state.select_prev(),
            PaneFocus::Fields => state.field_selected = state.field_selected.saturating_sub(1),
        },
        Action::MoveDown => match state.focus {
            PaneFocus::Hierarchy => {
                let count = state.hier_rows().len();
                state.hier_state.select_next(count);
            }
            PaneFocus::Fields => {
                if state.field_selected + 1 < Field::ALL.len() {
                    state.field_selected += 1;
                }
            }
        },
        Action::Expand => {
            if state.focus == PaneFocus::Hierarchy {
                expand_selected(state);
            }
        }
        Action::Collapse => {
            if state.focus == PaneFocus::Hierarchy {
                collapse_selected(state);
            }
        }
        Action::Activate => match state.focus {
            PaneFocus::Hierarchy => toggle_selected_tag(state),
            PaneFocus::Fields => open_editor(state),
        },
        Action::RevealTags => {
            state.reveal_current_tags();
            state.set_status("Revealed tags of the current image");
        }
        Action::CollapseAll => {
            state.hierarchy().update(|forest| close_hierarchy(forest));
            state.hier_state.selected = 0;
            state.hier_state.offset = 0;
        }
        Action::CopyPrevious => {
            let prev = state.stores.prev_image.with(|p| p.as_ref().map(|m| m.filename.clone()));
            match prev {
                Some(name) if state.stores.copy_from_previous() => {
                    state.set_status(format!("Copied fields from {name}"));
                }
                _ => state.set_status("No previous image"),
            }
        }
        Action::Commit => commit_edits(state),
        Action::Revert => {
            state.stores.revert();
            state.set_status("Discarded edits");
        }
        Action::Reload => reload_snapshot(state),
    }
}

/// Set a status message and return `true` when edits are pending.
fn refuse_if_unsaved(state: &mut AppState) -> bool {
    if state.stores.unsaved_changes().is_none() {
        return false;
    }
    let apply = state.config.display_bindings(Action::Commit);
    let discard = state.config.display_bindings(Action::Revert);
    state.set_status(format!(
        "Unsaved edits: apply ({apply}) or discard ({discard}) first"
    ));
    true
}

/// Committed tags may add sorted siblings above the highlighted row, so the
/// highlight follows the node rather than the row number.
fn commit_edits(state: &mut AppState) {
    let anchor = state.selected_value();
    match state.stores.commit() {
        Ok(changes) if changes.is_empty() => state.set_status("Nothing to apply"),
        Ok(changes) => {
            let fields = changes.labels().join(", ");
            state.set_status(format!("Applied {fields} to {}", changes.filename));
        }
        Err(e) => state.set_status(e.to_string()),
    }
    if let Some(value) = anchor {
        state.select_value(&value);
    }
}

/// Re-read the snapshot file, keeping the current image when it still exists.
fn reload_snapshot(state: &mut AppState) {
    if refuse_if_unsaved(state) {
        return;
    }
    let snapshot = match Snapshot::load(&state.source) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!(path = %state.source.display(), "reload failed: {e}");
            state.set_status(format!("Reload failed: {e}"));
            return;
        }
    };

    let anchor = state.selected_value();
    state.stores.reload(snapshot);
    if state.config.reveal_on_select {
        state.reveal_current_tags();
    } else if let Some(value) = anchor {
        state.select_value(&value);
    }
    state.set_status(format!("Reloaded {} images", state.stores.len()));
}

/// Move to another image.  Refuses while edits are pending so they are not
/// silently overwritten by the field sync.
fn change_image(state: &mut AppState, delta: isize) {
    if refuse_if_unsaved(state) {
        return;
    }

    if !state.stores.step(delta) {
        let edge = if delta < 0 { "first" } else { "last" };
        state.set_status(format!("Already at the {edge} image"));
        return;
    }

    tracing::debug!(index = state.stores.index.get(), "selected image");
    if state.config.reveal_on_select {
        state.reveal_current_tags();
    }
    let name = state.stores.filename.get().unwrap_or_default();
    let (pos, len) = (state.stores.index.get() + 1, state.stores.len());
    state.set_status(format!("{name} ({pos}/{len})"));
}

// ── Hierarchy pane ──────────────────────────────────────────────

/// Open a closed node; on an open node step into its first child.
fn expand_selected(state: &mut AppState) {
    let Some(row) = state.selected_row() else {
        return;
    };
    if !row.has_children {
        return;
    }
    if row.open {
        let count = state.hier_rows().len();
        state.hier_state.select_next(count);
    } else {
        state.hierarchy().update(|forest| {
            set_open(forest, &row.path, true);
        });
    }
}

/// Close an open node; on a closed node jump to its parent.
fn collapse_selected(state: &mut AppState) {
    let Some(row) = state.selected_row() else {
        return;
    };
    if row.open && row.has_children {
        state.hierarchy().update(|forest| {
            set_open(forest, &row.path, false);
        });
        return;
    }
    if let Some((_, parent)) = row.path.split_last() {
        if let Some(idx) = state.hier_rows().iter().position(|r| r.path == parent) {
            state.hier_state.selected = idx;
        }
    }
}

/// Add the selected hierarchy path to the image's tags, or remove it when
/// already present.
fn toggle_selected_tag(state: &mut AppState) {
    let Some(row) = state.selected_row() else {
        return;
    };
    let Some(value) = state.hierarchy().with(|forest| value_at(forest, &row.path)) else {
        return;
    };

    let field = state.tab.field();
    let mut tags = state.active_tags();
    let before = tags.len();
    tags.retain(|t| parse_hier_value(t).map_or(true, |v| v != value));

    let tag = value.to_string();
    if tags.len() == before {
        tags.push(tag.clone());
        state.set_status(format!("Added {} {tag}", field.label().to_lowercase()));
    } else {
        state.set_status(format!("Removed {} {tag}", field.label().to_lowercase()));
    }
    state.stores.fields.set(field, FieldValue::List(tags));
}

// ── Field pane / editor ─────────────────────────────────────────

fn open_editor(state: &mut AppState) {
    if state.stores.image.with(Option::is_none) {
        state.set_status("No image selected");
        return;
    }
    let field = state.selected_field();
    let text = state.stores.fields.value(field).display();
    state.editor = Some(FieldEditor::new(field, text));
    state.active_view = ActiveView::Editing;
}

fn handle_editor_key(state: &mut AppState, key: KeyEvent) {
    let Some(editor) = state.editor.as_mut() else {
        state.active_view = ActiveView::Browse;
        return;
    };

    match key.code {
        KeyCode::Esc => {
            state.editor = None;
            state.active_view = ActiveView::Browse;
        }
        KeyCode::Enter => {
            let value = FieldValue::parse(editor.field, &editor.buffer);
            let field = editor.field;
            state.stores.fields.set(field, value);
            state.editor = None;
            state.active_view = ActiveView::Browse;
            state.set_status(format!("Edited {}", field.label()));
        }
        KeyCode::Backspace => editor.backspace(),
        KeyCode::Delete => editor.delete(),
        KeyCode::Left => editor.left(),
        KeyCode::Right => editor.right(),
        KeyCode::Home => editor.home(),
        KeyCode::End => editor.end(),
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            editor.insert(c)
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::config::AppConfig;
    use crate::core::metadata::Metadata;

    fn press(state: &mut AppState, code: KeyCode) {
        handle_key(state, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(state: &mut AppState, text: &str) {
        for c in text.chars() {
            press(state, KeyCode::Char(c));
        }
    }

    fn state() -> AppState {
        let mut a = Metadata::new("a.jpg");
        a.title = "Harbor".into();
        a.places = vec!["USA / Oregon".into()];
        let mut b = Metadata::new("b.jpg");
        b.places = vec!["USA / California".into(), "Canada".into()];
        let snapshot = Snapshot::from_images(vec![a, b]).unwrap();
        AppState::new(PathBuf::from("m.json"), snapshot, AppConfig::default())
    }

    #[test]
    fn next_and_prev_move_between_images() {
        let mut s = state();
        press(&mut s, KeyCode::Char('n'));
        assert_eq!(s.stores.filename.get().as_deref(), Some("b.jpg"));
        assert_eq!(s.status_message.as_deref(), Some("b.jpg (2/2)"));

        press(&mut s, KeyCode::Char('n'));
        assert_eq!(s.status_message.as_deref(), Some("Already at the last image"));

        press(&mut s, KeyCode::PageUp);
        assert_eq!(s.stores.index.get(), 0);
    }

    #[test]
    fn edit_field_then_apply() {
        let mut s = state();
        press(&mut s, KeyCode::Tab);
        assert_eq!(s.focus, PaneFocus::Fields);
        assert_eq!(s.selected_field(), Field::Title);

        press(&mut s, KeyCode::Enter);
        assert_eq!(s.active_view, ActiveView::Editing);
        type_text(&mut s, " at dusk");
        press(&mut s, KeyCode::Enter);
        assert_eq!(s.stores.fields.title.get(), "Harbor at dusk");

        // Pending edits block navigation.
        press(&mut s, KeyCode::Char('n'));
        assert_eq!(s.stores.index.get(), 0);
        assert!(s.status_message.as_deref().unwrap().starts_with("Unsaved edits"));

        press(&mut s, KeyCode::Char('s'));
        assert_eq!(s.stores.images.with(|i| i[0].title.clone()), "Harbor at dusk");
        press(&mut s, KeyCode::Char('n'));
        assert_eq!(s.stores.index.get(), 1);
    }

    #[test]
    fn escape_cancels_edit_and_revert_discards() {
        let mut s = state();
        press(&mut s, KeyCode::Tab);
        press(&mut s, KeyCode::Enter);
        type_text(&mut s, "xyz");
        press(&mut s, KeyCode::Esc);
        assert_eq!(s.active_view, ActiveView::Browse);
        assert_eq!(s.stores.fields.title.get(), "Harbor");

        s.stores.fields.caption.set("draft".into());
        press(&mut s, KeyCode::Char('u'));
        assert!(s.stores.pending_changes().unwrap().is_empty());
    }

    #[test]
    fn enter_on_hierarchy_toggles_tag() {
        let mut s = state();
        // Selection starts on the revealed "Oregon" row.
        assert_eq!(s.selected_row().unwrap().name, "Oregon");

        press(&mut s, KeyCode::Enter);
        assert!(s.stores.fields.places.get().is_empty());

        press(&mut s, KeyCode::Enter);
        assert_eq!(s.stores.fields.places.get(), vec!["USA / Oregon".to_string()]);
    }

    #[test]
    fn expand_and_collapse_walk_the_tree() {
        let mut s = state();
        press(&mut s, KeyCode::Char('z'));
        let rows = s.hier_rows();
        assert!(rows.iter().all(|r| !r.open));
        assert_eq!(rows.len(), 2); // Canada, USA

        press(&mut s, KeyCode::Down);
        press(&mut s, KeyCode::Right);
        assert!(s.selected_row().unwrap().open);
        press(&mut s, KeyCode::Right);
        assert_eq!(s.selected_row().unwrap().name, "California");

        press(&mut s, KeyCode::Left);
        assert_eq!(s.selected_row().unwrap().name, "USA");
        press(&mut s, KeyCode::Left);
        assert!(!s.selected_row().unwrap().open);
    }

    #[test]
    fn switch_hierarchy_and_copy_previous() {
        let mut s = state();
        press(&mut s, KeyCode::Char('t'));
        assert_eq!(s.status_message.as_deref(), Some("Showing Topics"));
        assert!(s.hier_rows().is_empty());

        press(&mut s, KeyCode::Char('c'));
        assert_eq!(s.status_message.as_deref(), Some("No previous image"));

        press(&mut s, KeyCode::Char('n'));
        press(&mut s, KeyCode::Char('c'));
        assert_eq!(s.stores.fields.title.get(), "Harbor");
        assert_eq!(s.status_message.as_deref(), Some("Copied fields from a.jpg"));
    }

    #[test]
    fn help_and_quit() {
        let mut s = state();
        handle_key(&mut s, KeyEvent::new(KeyCode::Char('?'), KeyModifiers::SHIFT));
        assert_eq!(s.active_view, ActiveView::Help);
        press(&mut s, KeyCode::Char('q'));
        assert_eq!(s.active_view, ActiveView::Browse);
        assert!(!s.should_quit);
        press(&mut s, KeyCode::Char('q'));
        assert!(s.should_quit);
    }

    #[test]
    fn commit_keeps_highlight_on_same_node() {
        let mut s = state();
        assert_eq!(s.selected_row().unwrap().name, "Oregon");

        s.stores
            .fields
            .places
            .set(vec!["USA / Oregon".into(), "Brazil".into()]);
        press(&mut s, KeyCode::Char('s'));
        assert_eq!(s.hier_rows()[0].name, "Brazil");
        assert_eq!(s.selected_row().unwrap().name, "Oregon");
    }

    #[test]
    fn reload_rereads_source_and_keeps_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.json");
        let json = r#"{"images":[{"Filename":"a.jpg"},{"Filename":"b.jpg","Title":"Old"}]}"#;
        std::fs::write(&path, json).unwrap();
        let snapshot = Snapshot::load(&path).unwrap();
        let mut s = AppState::new(path.clone(), snapshot, AppConfig::default());
        press(&mut s, KeyCode::Char('n'));

        std::fs::write(&path, json.replace("Old", "New")).unwrap();
        press(&mut s, KeyCode::F(5));
        assert_eq!(s.stores.index.get(), 1);
        assert_eq!(s.stores.fields.title.get(), "New");
        assert_eq!(s.status_message.as_deref(), Some("Reloaded 2 images"));
    }

    #[test]
    fn reload_refused_with_edits_and_reports_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = state();
        s.source = dir.path().join("missing.json");

        s.stores.fields.caption.set("draft".into());
        press(&mut s, KeyCode::F(5));
        assert!(s.status_message.as_deref().unwrap().starts_with("Unsaved edits"));
        assert_eq!(s.stores.fields.caption.get(), "draft");

        press(&mut s, KeyCode::Char('u'));
        press(&mut s, KeyCode::F(5));
        assert!(s.status_message.as_deref().unwrap().starts_with("Reload failed"));
        assert_eq!(s.stores.len(), 2);
    }
}
