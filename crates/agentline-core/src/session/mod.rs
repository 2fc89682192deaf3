//! Session module - thread state and the session controller
//!
//! The controller is the single owner of the conversation: it appends turns,
//! tracks the one outstanding call, and switches agents. Front ends feed it
//! user intents and completions.
//!
//! # Example Usage
//!
//! ```ignore
//! use agentline_core::session::{SessionConfig, SessionController};
//!
//! let (mut controller, mut completions) = SessionController::new(config, transport);
//!
//! controller.dispatch("Hello!");
//! while let Some(completion) = completions.recv().await {
//!     if let Some(turn) = controller.resolve(completion) {
//!         println!("{}", turn.content());
//!     }
//! }
//! ```

mod controller;
mod types;

pub use controller::{Completion, CompletionReceiver, EventReceiver, PendingTurn, SessionController};
pub use types::{
    Originator, SessionConfig, SessionEvent, StaleReplyPolicy, Thread, Turn, TurnId,
};
