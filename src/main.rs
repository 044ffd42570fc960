//! A terminal editor for photo metadata snapshots.
//!
//! Run the binary on a JSON snapshot to browse the images, tag them from the
//! place and topic hierarchies, and edit their fields.
//! Run with `--write-config` to dump the default keybindings.

mod app;
mod config;
mod core;
mod ui;

use std::fs::File;
use std::io::{self, stderr};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use tracing_subscriber::EnvFilter;

use crate::app::{
    event::{spawn_event_reader, AppEvent},
    handler,
    state::{ActiveView, AppState, PaneFocus},
};
use crate::core::{hierarchy::parse_hier_value, snapshot::Snapshot};
use crate::ui::{
    fields_widget::FieldsWidget, hier_widget::HierWidget, layout::AppLayout, popup,
    theme::Theme,
};

// ───────────────────────────────────────── CLI ───────────────

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), about = "Photo metadata editor")]
struct Cli {
    /// Metadata snapshot to open.
    #[arg(default_value = "metadata.json")]
    snapshot: PathBuf,

    /// Image to select first (0-based).
    #[arg(long)]
    index: Option<usize>,

    /// Write log output to this file instead of stderr.
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,

    /// Write the default keybindings to the config file and exit.
    #[arg(long = "write-config")]
    write_config: bool,
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let builder = tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env());
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        // Never pollute stdout.
        None => builder.with_writer(io::stderr).init(),
    }
    Ok(())
}

// ───────────────────────────────────────── drawing ───────────

fn draw(frame: &mut Frame, state: &mut AppState) {
    let layout = AppLayout::from_area(frame.area());

    // ── header ───────────────────────────────────────────────
    let position = match state.stores.filename.get() {
        Some(name) => format!(
            " {} ({}/{})",
            name,
            state.stores.index.get() + 1,
            state.stores.len()
        ),
        None => " no image".to_string(),
    };
    let header = Line::from(vec![
        Span::styled(format!(" {}", state.source.display()), Theme::muted_style()),
        Span::styled(position, Theme::title_style()),
    ]);
    frame.render_widget(Paragraph::new(header), layout.header_area);

    // ── hierarchy pane ───────────────────────────────────────
    let forest = state.hierarchy().get();
    let tagged: Vec<_> = state
        .active_tags()
        .iter()
        .filter_map(|t| parse_hier_value(t).ok())
        .collect();
    let hier_block = Block::default()
        .title(format!(" {} ", state.tab.label()))
        .title_style(Theme::title_style())
        .borders(Borders::ALL)
        .border_style(Theme::border_style(state.focus == PaneFocus::Hierarchy));
    let empty_hint = format!("(no {})", state.tab.label().to_lowercase());
    let hier_widget = HierWidget::new(&forest)
        .tagged(&tagged)
        .empty_hint(&empty_hint)
        .block(hier_block);
    frame.render_stateful_widget(hier_widget, layout.hier_area, &mut state.hier_state);

    // ── field pane ───────────────────────────────────────────
    let fields_block = Block::default()
        .title(" Fields ")
        .title_style(Theme::title_style())
        .borders(Borders::ALL)
        .border_style(Theme::border_style(state.focus == PaneFocus::Fields));
    let selected = (state.focus == PaneFocus::Fields).then_some(state.field_selected);
    frame.render_widget(
        FieldsWidget::new(&state.stores)
            .selected(selected)
            .block(fields_block),
        layout.fields_area,
    );

    // ── status bar ───────────────────────────────────────────
    let hint = state.config.status_bar_hint();
    let status_text = state.status_message.as_deref().unwrap_or(&hint);
    let status = Paragraph::new(status_text).style(Theme::status_bar_style());
    frame.render_widget(status, layout.status_area);

    // ── overlays ─────────────────────────────────────────────
    match state.active_view {
        ActiveView::Editing => {
            if let Some(editor) = &state.editor {
                frame.render_widget(popup::EditorPopup { editor }, frame.area());
            }
        }
        ActiveView::Help => {
            frame.render_widget(
                popup::HelpPopup {
                    config: &state.config,
                },
                frame.area(),
            );
        }
        ActiveView::Browse => {}
    }
}

// ───────────────────────────────────────── main ─────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref())?;

    if cli.write_config {
        let path = config::AppConfig::default().save()?;
        println!("{}", path.display());
        return Ok(());
    }

    // ── load before touching the terminal so errors print cleanly ─
    let snapshot = Snapshot::load(&cli.snapshot)
        .with_context(|| format!("cannot open snapshot {}", cli.snapshot.display()))?;
    let user_config = config::AppConfig::load();
    let mut state = AppState::new(cli.snapshot.clone(), snapshot, user_config);
    if let Some(index) = cli.index {
        state.stores.select(index);
        if state.config.reveal_on_select {
            state.reveal_current_tags();
        }
    }

    // ── terminal setup ────────────────────────────────────────
    enable_raw_mode()?;
    execute!(stderr(), EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stderr());
    let mut terminal = Terminal::new(backend)?;

    let mut events = spawn_event_reader(Duration::from_millis(250));

    // ── event loop ────────────────────────────────────────────
    let result = loop {
        if let Err(e) = terminal.draw(|frame| draw(frame, &mut state)) {
            break Err(anyhow::Error::from(e));
        }

        match events.recv().await {
            Some(AppEvent::Key(k)) => handler::handle_key(&mut state, k),
            Some(AppEvent::Resize(_, _)) | Some(AppEvent::Tick) => {}
            None => {
                tracing::warn!("event reader stopped");
                break Ok(());
            }
        }

        if state.should_quit {
            break Ok(());
        }
    };

    // ── teardown ──────────────────────────────────────────────
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Some(changes) = state.stores.unsaved_changes() {
        tracing::warn!(
            filename = %changes.filename,
            fields = ?changes.labels(),
            "quit with unapplied edits"
        );
    }

    result
}
