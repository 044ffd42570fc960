//! Right-hand pane: the selected image's identity and its editable fields.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget, Wrap},
};

use crate::core::{
    metadata::{display_date_time, Field, Metadata},
    store::{ChangeSet, Stores},
};

use super::theme::Theme;

const LABEL_WIDTH: usize = 10;

/// Snapshot of everything the pane shows, taken from [`Stores`] each frame.
pub struct FieldsWidget<'a> {
    image: Option<Metadata>,
    prev_filename: Option<String>,
    rows: Vec<(Field, String)>,
    changes: Option<ChangeSet>,
    /// Highlighted row, if the pane has focus.
    selected: Option<usize>,
    block: Option<Block<'a>>,
}

impl<'a> FieldsWidget<'a> {
    pub fn new(stores: &Stores) -> Self {
        let rows = Field::ALL
            .iter()
            .map(|&f| (f, stores.fields.value(f).display()))
            .collect();
        Self {
            image: stores.image.get(),
            prev_filename: stores.prev_image.get().map(|m| m.filename),
            rows,
            changes: stores.pending_changes(),
            selected: None,
            block: None,
        }
    }

    pub fn selected(mut self, selected: Option<usize>) -> Self {
        self.selected = selected;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    fn header_line(label: &str, value: String) -> Line<'static> {
        Line::from(vec![
            Span::styled(format!("{label:<LABEL_WIDTH$}"), Theme::muted_style()),
            Span::styled(value, Theme::value_style()),
        ])
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let Some(image) = &self.image else {
            return vec![Line::from(Span::styled("(no image)", Theme::muted_style()))];
        };

        let mut lines = vec![
            Self::header_line("File", image.filename.clone()),
            Self::header_line("Taken", display_date_time(&image.date_time)),
            Self::header_line(
                "Previous",
                self.prev_filename.clone().unwrap_or_else(|| "-".into()),
            ),
            Line::raw(""),
        ];

        for (i, (field, text)) in self.rows.iter().enumerate() {
            let changed = self.changes.as_ref().is_some_and(|c| c.contains(*field));
            let marker = if changed { "*" } else { " " };
            let mut value_style = if changed {
                Theme::changed_style()
            } else {
                Theme::value_style()
            };
            let mut label_style = Theme::label_style();
            if self.selected == Some(i) {
                value_style = value_style.patch(Theme::selected_style());
                label_style = label_style.patch(Theme::selected_style());
            }
            lines.push(Line::from(vec![
                Span::styled(marker, Theme::changed_style()),
                Span::styled(format!("{:<w$}", field.label(), w = LABEL_WIDTH - 1), label_style),
                Span::styled(text.clone(), value_style),
            ]));
        }
        lines
    }
}

impl<'a> Widget for FieldsWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let lines = self.lines();
        let mut paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
        if let Some(block) = self.block {
            paragraph = paragraph.block(block);
        }
        paragraph.render(area, buf);
    }
}
