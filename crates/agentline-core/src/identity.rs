//! Identity provider
//!
//! A user identifier is generated once per controller and kept in memory for
//! its lifetime. Every transport call gets a fresh session identifier
//! namespaced by the target agent, so sessions never bleed across agents.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of the random suffix used in generated identifiers
const SUFFIX_LEN: usize = 12;

/// Per-process user identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Generate a new identifier, `user_<random>`
    pub fn generate() -> Self {
        Self(format!("user_{}", random_suffix()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fresh session identifier for one call to the given agent
pub fn session_id_for(agent_id: &str) -> String {
    format!("{}-{}", agent_id, random_suffix())
}

fn random_suffix() -> String {
    let mut simple = Uuid::new_v4().simple().to_string();
    simple.truncate(SUFFIX_LEN);
    simple
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_format() {
        let id = UserId::generate();
        let suffix = id.as_str().strip_prefix("user_").unwrap();
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_user_ids_differ() {
        assert_ne!(UserId::generate(), UserId::generate());
    }

    #[test]
    fn test_session_id_is_namespaced_and_fresh() {
        let first = session_id_for("agent-a");
        let second = session_id_for("agent-a");
        assert!(first.starts_with("agent-a-"));
        assert!(second.starts_with("agent-a-"));
        assert_ne!(first, second);
        assert!(session_id_for("agent-b").starts_with("agent-b-"));
    }
}
