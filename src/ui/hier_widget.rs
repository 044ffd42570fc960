//! Custom Ratatui widget that renders a tag hierarchy as an indented,
//! collapsible tree.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, StatefulWidget, Widget},
};

use crate::core::hierarchy::{value_at, visible_rows, Hier, HierRow, HierValue};

use super::theme::Theme;

// ───────────────────────────────────────── state ─────────────

/// Persistent state for the hierarchy widget (selected row, scroll offset).
#[derive(Debug, Default)]
pub struct HierWidgetState {
    /// Index into the *visible* row list that is currently highlighted.
    pub selected: usize,
    /// Vertical scroll offset (first visible row).
    pub offset: usize,
}

impl HierWidgetState {
    pub fn select_next(&mut self, max: usize) {
        if max > 0 && self.selected < max - 1 {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Keep the selection inside the list and visible in a viewport of
    /// `height` rows.
    pub fn clamp(&mut self, rows: usize, height: usize) {
        self.selected = self.selected.min(rows.saturating_sub(1));
        if height == 0 {
            return;
        }
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset + height {
            self.offset = self.selected - height + 1;
        }
    }
}

// ───────────────────────────────────────── widget ────────────

/// The hierarchy widget itself — created fresh each frame.
pub struct HierWidget<'a> {
    forest: &'a [Hier],
    /// Values carried by the current image; matching rows get a check mark.
    tagged: &'a [HierValue],
    block: Option<Block<'a>>,
    empty_hint: &'a str,
}

impl<'a> HierWidget<'a> {
    pub fn new(forest: &'a [Hier]) -> Self {
        Self {
            forest,
            tagged: &[],
            block: None,
            empty_hint: "(no tags)",
        }
    }

    pub fn tagged(mut self, tagged: &'a [HierValue]) -> Self {
        self.tagged = tagged;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    pub fn empty_hint(mut self, hint: &'a str) -> Self {
        self.empty_hint = hint;
        self
    }

    fn is_tagged(&self, row: &HierRow) -> bool {
        value_at(self.forest, &row.path).is_some_and(|v| self.tagged.contains(&v))
    }

    fn render_row(&self, row: &HierRow, is_selected: bool) -> Line<'static> {
        let indent = "  ".repeat(row.depth);
        let icon = match (row.has_children, row.open) {
            (true, true) => "▼ ",
            (true, false) => "▶ ",
            (false, _) => "  ",
        };
        let tagged = self.is_tagged(row);
        let style = if is_selected {
            Theme::selected_style()
        } else if tagged {
            Theme::tagged_style()
        } else if row.has_children {
            Theme::branch_style()
        } else {
            Theme::leaf_style()
        };

        let mut spans = vec![
            Span::raw(indent),
            Span::styled(format!("{icon}{}", row.name), style),
        ];
        if tagged {
            spans.push(Span::styled(" ✓", Theme::tagged_style()));
        }
        Line::from(spans)
    }
}

impl<'a> StatefulWidget for HierWidget<'a> {
    type State = HierWidgetState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        // Resolve the inner area (inside the optional block border).
        let inner = if let Some(ref block) = self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        let rows = visible_rows(self.forest);
        if rows.is_empty() {
            let line = Line::from(Span::styled(self.empty_hint, Theme::muted_style()));
            buf.set_line(inner.x, inner.y, &line, inner.width);
            return;
        }
        state.clamp(rows.len(), inner.height as usize);

        let visible = rows
            .iter()
            .enumerate()
            .skip(state.offset)
            .take(inner.height as usize);

        for (i, (row_idx, row)) in visible.enumerate() {
            let y = inner.y + i as u16;
            let line = self.render_row(row, row_idx == state.selected);
            buf.set_line(inner.x, y, &line, inner.width);
        }
    }
}
