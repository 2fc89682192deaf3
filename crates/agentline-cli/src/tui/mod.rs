//! TUI (Terminal User Interface) module for the Agentline CLI
//!
//! The thread fills the screen, a typing indicator shows while a reply is
//! outstanding, and the input area stays at the bottom.

mod app;
pub mod events;
mod ui;

pub use app::{App, AppState};
pub use events::{Event, EventHandler, KeyAction, handle_key_help, handle_key_normal};
pub use ui::draw;
