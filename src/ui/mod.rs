//! UI / rendering layer — everything that touches Ratatui widgets.
//!
//! This layer reads the *core* stores and turns them into cells on the
//! terminal.  No state is mutated here apart from widget scroll offsets.

pub mod fields_widget;
pub mod hier_widget;
pub mod layout;
pub mod popup;
pub mod theme;
