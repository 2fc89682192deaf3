//! Remote agent selection
//!
//! The remote service hosts two agents. Which one a turn targets decides the
//! agent identifier sent on the wire, the session identifier namespace, and
//! the rules used to pull a reply out of the response.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::normalizer::ReplyRule;

/// Default identifier of the conversational agent on the remote service
pub const DEFAULT_CONVERSATIONAL_AGENT_ID: &str = "67a9c3f1e2b4d5a6c7f8e901";

/// Default identifier of the summarization agent on the remote service
pub const DEFAULT_SUMMARIZATION_AGENT_ID: &str = "67a9c41be2b4d5a6c7f8e9a2";

/// Which of the two remote agents a turn is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    /// General chat agent
    #[default]
    Conversational,
    /// Agent that condenses the submitted text
    Summarization,
}

const CONVERSATIONAL_RULES: &[ReplyRule] = &[
    ReplyRule::field("response"),
    ReplyRule::field("message"),
];

const SUMMARIZATION_RULES: &[ReplyRule] = &[
    ReplyRule::path(&["result", "summary"]),
    ReplyRule::field("summary"),
];

impl AgentKind {
    /// The other agent
    pub fn toggle(self) -> Self {
        match self {
            AgentKind::Conversational => AgentKind::Summarization,
            AgentKind::Summarization => AgentKind::Conversational,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Conversational => "conversational",
            AgentKind::Summarization => "summarization",
        }
    }

    /// Human-readable label for status bars and prompts
    pub fn label(&self) -> &'static str {
        match self {
            AgentKind::Conversational => "Chat",
            AgentKind::Summarization => "Summarizer",
        }
    }

    /// Ordered rules for reading the reply out of a decoded envelope
    pub fn reply_rules(&self) -> &'static [ReplyRule] {
        match self {
            AgentKind::Conversational => CONVERSATIONAL_RULES,
            AgentKind::Summarization => SUMMARIZATION_RULES,
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AgentKind {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "conversational" | "chat" => Ok(AgentKind::Conversational),
            "summarization" | "summary" | "summarize" => Ok(AgentKind::Summarization),
            _ => Err(Error::UnknownAgent(s.to_string())),
        }
    }
}

/// Maps each agent kind to its identifier on the remote service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentDirectory {
    conversational: String,
    summarization: String,
}

impl AgentDirectory {
    pub fn new(conversational: impl Into<String>, summarization: impl Into<String>) -> Self {
        Self {
            conversational: conversational.into(),
            summarization: summarization.into(),
        }
    }

    /// Remote identifier for the given agent
    pub fn agent_id(&self, kind: AgentKind) -> &str {
        match kind {
            AgentKind::Conversational => &self.conversational,
            AgentKind::Summarization => &self.summarization,
        }
    }
}

impl Default for AgentDirectory {
    fn default() -> Self {
        Self::new(DEFAULT_CONVERSATIONAL_AGENT_ID, DEFAULT_SUMMARIZATION_AGENT_ID)
    }
}
