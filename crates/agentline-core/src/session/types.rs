//! Session types: turns, the thread, and controller events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::{AgentDirectory, AgentKind};
use crate::identity::UserId;

/// Unique identifier for a turn within a thread
pub type TurnId = String;

/// Who authored a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Originator {
    User,
    Agent,
}

/// One message in the thread. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    id: TurnId,
    content: String,
    originator: Originator,
    timestamp: DateTime<Utc>,
    /// Agent selected when the turn was created
    agent: AgentKind,
    /// Only set on synthetic agent turns standing in for a failed call
    failed: bool,
}

impl Turn {
    fn new(originator: Originator, content: impl Into<String>, agent: AgentKind, failed: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            originator,
            timestamp: Utc::now(),
            agent,
            failed,
        }
    }

    /// A user-authored turn
    pub fn user(content: impl Into<String>, agent: AgentKind) -> Self {
        Self::new(Originator::User, content, agent, false)
    }

    /// A successful agent reply
    pub fn agent(content: impl Into<String>, agent: AgentKind) -> Self {
        Self::new(Originator::Agent, content, agent, false)
    }

    /// A synthetic agent turn for a failed call
    pub fn failure(content: impl Into<String>, agent: AgentKind) -> Self {
        Self::new(Originator::Agent, content, agent, true)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn originator(&self) -> Originator {
        self.originator
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn agent_kind(&self) -> AgentKind {
        self.agent
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn is_user(&self) -> bool {
        self.originator == Originator::User
    }
}

/// Ordered, append-only list of turns. Only a full reset removes turns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Thread {
    turns: Vec<Turn>,
}

impl Thread {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, turn: Turn) -> &Turn {
        self.turns.push(turn);
        &self.turns[self.turns.len() - 1]
    }

    pub(crate) fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.turns.iter()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }
}

impl<'a> IntoIterator for &'a Thread {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}

/// What to do with a reply that resolves after the thread was cleared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleReplyPolicy {
    /// Drop the reply; the cleared thread stays clean
    #[default]
    Discard,
    /// Append the reply to whatever thread exists when it resolves
    Append,
}

/// Notifications emitted by the controller as its state changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A turn was appended to the thread
    TurnAppended { turn: Turn },
    /// The busy flag changed
    BusyChanged { busy: bool },
    /// The thread was reset
    Cleared,
    /// A different agent was selected
    AgentSwitched { agent: AgentKind },
    /// A reply arrived for a thread that has since been cleared and was dropped
    StaleReplyDiscarded { agent: AgentKind },
}

/// Configuration for a session controller
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Remote identifiers for both agents
    pub agents: AgentDirectory,
    /// Agent selected at start
    pub initial_agent: AgentKind,
    /// Handling of replies that resolve after a clear
    pub stale_replies: StaleReplyPolicy,
    /// Fixed user identifier (generated when absent)
    pub user_id: Option<UserId>,
}

impl SessionConfig {
    pub fn new(agents: AgentDirectory) -> Self {
        Self {
            agents,
            ..Default::default()
        }
    }

    /// Build from the application configuration
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            agents: config.agent_directory(),
            initial_agent: config.agents.default_agent,
            stale_replies: config.session.stale_replies,
            user_id: None,
        }
    }

    /// Set the initially selected agent
    pub fn with_agent(mut self, agent: AgentKind) -> Self {
        self.initial_agent = agent;
        self
    }

    /// Set the stale reply policy
    pub fn with_stale_replies(mut self, policy: StaleReplyPolicy) -> Self {
        self.stale_replies = policy;
        self
    }

    /// Use a fixed user identifier
    pub fn with_user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }
}
