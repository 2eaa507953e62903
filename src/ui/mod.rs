//! Ratatui front-end: the program list with pointer and keyboard reordering.

mod app;
mod forms;
mod helpers;
mod rows;
mod terminal;

pub use app::App;
pub use terminal::run_app;
