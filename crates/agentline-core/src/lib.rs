//! Agentline Core - chat session management for remote conversational agents
//!
//! This crate provides the core functionality for Agentline:
//! - Agent selection (conversational vs. summarization)
//! - Identity provider for user and per-request session identifiers
//! - HTTP transport to the remote inference endpoint
//! - Normalization of loosely structured, double-encoded replies
//! - The session controller owning the thread and the in-flight call

pub mod agent;
pub mod config;
pub mod error;
pub mod identity;
pub mod normalizer;
pub mod session;
pub mod transport;

pub use agent::{AgentDirectory, AgentKind};
pub use config::{Config, ConfigManager, EndpointConfig};
pub use error::{Error, Result, TransportError};
pub use identity::{session_id_for, UserId};
pub use normalizer::{normalize, DEFAULT_REPLY, TRANSPORT_FAILURE_REPLY};

// Session exports
pub use session::{
    Completion, CompletionReceiver, Originator, PendingTurn, SessionConfig, SessionController,
    SessionEvent, StaleReplyPolicy, Thread, Turn,
};
pub use transport::{HttpTransport, Transport, TurnRequest};
