//! Core state – observable cells, tag hierarchies, metadata records and the
//! per-session store that ties them together.
//!
//! Nothing in this module depends on any TUI or rendering crate.  The state
//! layer is single-threaded: cells share their values through `Rc`, so none
//! of these types are `Send`.

pub mod hierarchy;
pub mod metadata;
pub mod reactive;
pub mod snapshot;
pub mod store;
