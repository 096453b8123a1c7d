//! Terminal UI components using ratatui

mod browser;
mod terminal;
mod ui;

pub use terminal::Tui;
pub use ui::render;
