//! Popup overlay widgets for the field editor and the key help.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget},
};

use crate::app::state::FieldEditor;
use crate::config::{Action, AppConfig};
use crate::core::metadata::LIST_SEPARATOR;

use super::theme::Theme;

fn popup_block(title: String) -> Block<'static> {
    Block::default()
        .title(title)
        .title_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::DarkGray))
}

// ───────────────────────────────────────── editor popup ──────

/// One-line editor for the selected field.
pub struct EditorPopup<'a> {
    pub editor: &'a FieldEditor,
}

impl<'a> EditorPopup<'a> {
    /// Split the buffer around the cursor; the char under it is drawn
    /// reversed (a trailing space when the cursor is at the end).
    fn input_line(&self) -> Line<'static> {
        let chars: Vec<char> = self.editor.buffer.chars().collect();
        let at = self.editor.cursor.min(chars.len());
        let before: String = chars[..at].iter().collect();
        let under = chars.get(at).map_or(" ".to_string(), |c| c.to_string());
        let after: String = chars.get(at + 1..).unwrap_or(&[]).iter().collect();
        Line::from(vec![
            Span::raw(" "),
            Span::styled(before, Theme::input_style()),
            Span::styled(
                under,
                Theme::input_style().add_modifier(Modifier::REVERSED),
            ),
            Span::styled(after, Theme::input_style()),
        ])
    }
}

impl<'a> Widget for EditorPopup<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let popup = centered_fixed(area.width.saturating_sub(8).max(20), 7, area);
        Clear.render(popup, buf);

        let block = popup_block(format!(" Edit {} ", self.editor.field.label()));
        let inner = block.inner(popup);
        block.render(popup, buf);

        let dim = Style::default().fg(Color::DarkGray);
        let hint = if self.editor.field.is_list() {
            format!("  Separate items with '{}'", LIST_SEPARATOR.trim_end())
        } else {
            String::new()
        };
        let lines = vec![
            Line::raw(""),
            self.input_line(),
            Line::from(Span::styled(hint, dim)),
            Line::from(Span::styled("  Enter: keep  Esc: cancel", dim)),
        ];
        Paragraph::new(lines).render(inner, buf);
    }
}

// ───────────────────────────────────────── help popup ────────

/// Keybinding reference, built from the live configuration.
pub struct HelpPopup<'a> {
    pub config: &'a AppConfig,
}

impl<'a> Widget for HelpPopup<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let height = (Action::ALL.len() as u16) + 5;
        let popup = centered_fixed(48, height, area);
        Clear.render(popup, buf);

        let block = popup_block(" Keys ".to_string());
        let inner = block.inner(popup);
        block.render(popup, buf);

        let mut lines = vec![Line::raw("")];
        for &action in Action::ALL {
            // Fixed-width columns: label left-aligned, keys right-aligned.
            let label_col = format!("   {:<22}", action.label());
            let keys_width = (inner.width as usize)
                .saturating_sub(Span::raw(label_col.as_str()).width() + 1)
                .max(1);
            let keys_col = format!("{:>keys_width$}", self.config.display_bindings(action));
            lines.push(Line::from(vec![
                Span::styled(label_col, Style::default().fg(Color::White)),
                Span::styled(keys_col, Style::default().fg(Color::Yellow)),
            ]));
        }
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            "  Any key: close",
            Style::default().fg(Color::DarkGray),
        )));

        Paragraph::new(lines).render(inner, buf);
    }
}

// ───────────────────────────────────────── helpers ───────────

/// Create a centered rectangle with fixed dimensions, clamped to the available area.
fn centered_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(w)) / 2;
    let y = area.y + (area.height.saturating_sub(h)) / 2;
    Rect::new(x, y, w, h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metadata::Field;

    #[test]
    fn centered_rect_is_clamped() {
        let area = Rect::new(0, 0, 30, 10);
        assert_eq!(centered_fixed(20, 4, area), Rect::new(5, 3, 20, 4));
        assert_eq!(centered_fixed(50, 40, area), area);
    }

    #[test]
    fn help_keys_share_one_column() {
        let area = Rect::new(0, 0, 60, 30);
        let mut buf = Buffer::empty(area);
        let config = AppConfig::default();
        HelpPopup { config: &config }.render(area, &mut buf);

        let row = |label: &str| -> u16 {
            (0..area.height)
                .find(|&y| {
                    (0..area.width)
                        .map(|x| buf[(x, y)].symbol().to_string())
                        .collect::<String>()
                        .contains(label)
                })
                .unwrap_or_else(|| panic!("no row for {label}"))
        };
        // Keys are right-aligned one cell inside the popup border.
        let popup = centered_fixed(48, Action::ALL.len() as u16 + 5, area);
        let last = popup.x + popup.width - 3;
        assert_eq!(buf[(last, row("Places ⇄ Topics"))].symbol(), "t");
        assert_eq!(buf[(last, row("Quit"))].symbol(), "q");
    }

    #[test]
    fn editor_line_marks_cursor_position() {
        let mut editor = FieldEditor::new(Field::Title, "Bend".into());
        editor.left();
        let line = EditorPopup { editor: &editor }.input_line();
        let parts: Vec<&str> = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(parts, vec![" ", "Ben", "d", ""]);

        editor.end();
        let line = EditorPopup { editor: &editor }.input_line();
        assert_eq!(line.spans[2].content, " ");
    }
}
