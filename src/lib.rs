//! Core library surface for the service planner: an event-program editor
//! whose rows can be reordered by dragging.
//!
//! The reordering pieces are independent of the terminal front-end. A
//! [`ProgramSequence`] holds the running order, a [`UiStateStore`] keeps
//! per-item view state keyed by id, and a [`DragController`] turns drag
//! input into at most one [`Reorder`] per gesture. The `ui` module wires those
//! into a ratatui list view.
pub mod config;
pub mod drag;
pub mod error;
pub mod logging;
pub mod models;
pub mod program;
pub mod sample;
pub mod ui;
pub mod ui_state;

pub use config::AppConfig;
pub use drag::{transition, DragController, DragEvent, DragSession, DragState, Reorder, VerticalSpan};
pub use error::ProgramError;
pub use models::{ItemId, ItemKind, ItemPayload, ProgramItem};
pub use program::ProgramSequence;
pub use ui::{run_app, App};
pub use ui_state::{DetailTab, FilesView, ItemUiPatch, ItemUiState, UiStateStore};
