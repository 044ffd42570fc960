//! Colour palette and text styles used across the UI.

use ratatui::style::{Color, Modifier, Style};

/// Central theme — change colours here and they propagate everywhere.
pub struct Theme;

impl Theme {
    // ── hierarchy pane ─────────────────────────────────────────
    pub fn branch_style() -> Style {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    }

    pub fn leaf_style() -> Style {
        Style::default().fg(Color::White)
    }

    /// Nodes that are one of the current image's tags.
    pub fn tagged_style() -> Style {
        Style::default().fg(Color::Green)
    }

    pub fn selected_style() -> Style {
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    }

    // ── field pane ─────────────────────────────────────────────
    pub fn label_style() -> Style {
        Style::default().fg(Color::Yellow)
    }

    pub fn value_style() -> Style {
        Style::default().fg(Color::White)
    }

    /// Fields whose edit differs from the stored record.
    pub fn changed_style() -> Style {
        Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::ITALIC)
    }

    pub fn muted_style() -> Style {
        Style::default().fg(Color::DarkGray)
    }

    // ── chrome ─────────────────────────────────────────────────
    pub fn border_style(focused: bool) -> Style {
        if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::Gray)
        }
    }

    pub fn title_style() -> Style {
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD)
    }

    pub fn status_bar_style() -> Style {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    }

    pub fn input_style() -> Style {
        Style::default().fg(Color::Yellow)
    }
}
