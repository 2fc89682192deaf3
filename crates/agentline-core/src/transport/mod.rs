//! Transport to the remote agent service
//!
//! One user turn is one POST carrying the user, agent, and session
//! identifiers plus the message text. The response body is handed back
//! decoded but otherwise untouched; making sense of it is the
//! normalizer's job.

mod http;
pub mod logging;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

pub use http::HttpTransport;

/// Wire body of a single turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRequest {
    pub user_id: String,
    pub agent_id: String,
    pub session_id: String,
    pub message: String,
}

impl TurnRequest {
    pub fn new(
        user_id: impl Into<String>,
        agent_id: impl Into<String>,
        session_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            agent_id: agent_id.into(),
            session_id: session_id.into(),
            message: message.into(),
        }
    }
}

/// Something that can deliver a turn to the remote service
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one turn and return the decoded response body.
    ///
    /// Any non-success status, network failure, or undecodable body is an
    /// error; there is no retry and no partial result.
    async fn send_turn(&self, request: &TurnRequest) -> Result<serde_json::Value, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_body_shape() {
        let request = TurnRequest::new("user_1", "agent_a", "agent_a-xyz", "hello");
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "user_id": "user_1",
                "agent_id": "agent_a",
                "session_id": "agent_a-xyz",
                "message": "hello"
            })
        );
    }
}
