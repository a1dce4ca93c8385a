//! Ratatui front-end: the `App` state machine, its modal forms, small layout
//! helpers, and the terminal bring-up/event loop.

mod app;
mod forms;
mod helpers;
mod terminal;

pub use app::App;
pub use terminal::run_app;
