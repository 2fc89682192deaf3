//! Reply normalization
//!
//! The remote service wraps its reply in an envelope field whose value is
//! usually another JSON document encoded as a string, and the inner shape
//! depends on the agent. Normalization walks a short list of extraction
//! rules, first match wins, and never fails: a body nothing matches yields
//! [`DEFAULT_REPLY`].

use serde_json::Value;

use crate::agent::AgentKind;

/// Shown when a response decodes but no rule finds a reply in it
pub const DEFAULT_REPLY: &str = "Sorry, I couldn't make sense of the agent's reply.";

/// Shown for a turn whose transport call failed
pub const TRANSPORT_FAILURE_REPLY: &str =
    "Sorry, something went wrong while contacting the agent. Please try again.";

/// Top-level fields that may hold the encoded envelope, in lookup order
const ENVELOPE_FIELDS: &[&str] = &["response", "content"];

/// Top-level fields consulted when the envelope is not JSON
const FALLBACK_RULES: &[ReplyRule] = &[ReplyRule::field("response"), ReplyRule::field("message")];

/// A single extraction rule: a key path into a JSON value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyRule {
    /// A top-level object key
    Field(&'static str),
    /// Nested object keys, outermost first
    Path(&'static [&'static str]),
}

impl ReplyRule {
    pub const fn field(name: &'static str) -> Self {
        ReplyRule::Field(name)
    }

    pub const fn path(keys: &'static [&'static str]) -> Self {
        ReplyRule::Path(keys)
    }

    /// Apply the rule. Only non-blank strings count as a match.
    pub fn apply(&self, value: &Value) -> Option<String> {
        let target = match self {
            ReplyRule::Field(name) => value.get(*name)?,
            ReplyRule::Path(keys) => keys.iter().try_fold(value, |v, key| v.get(*key))?,
        };
        target
            .as_str()
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.to_string())
    }

    fn reads_field(&self, name: &str) -> bool {
        matches!(self, ReplyRule::Field(field) if *field == name)
    }
}

/// First rule that yields a reply
pub fn first_match(value: &Value, rules: &[ReplyRule]) -> Option<String> {
    rules.iter().find_map(|rule| rule.apply(value))
}

/// Where the envelope text was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnvelopeSource {
    Field(&'static str),
    WholeBody,
}

/// Pull the envelope text out of the body.
///
/// String values are used verbatim, other values are re-serialized. With no
/// envelope field at all the whole body is serialized.
fn envelope_text(body: &Value) -> (String, EnvelopeSource) {
    for field in ENVELOPE_FIELDS {
        match body.get(*field) {
            None | Some(Value::Null) => continue,
            Some(Value::String(text)) => return (text.clone(), EnvelopeSource::Field(*field)),
            Some(other) => return (other.to_string(), EnvelopeSource::Field(*field)),
        }
    }
    (body.to_string(), EnvelopeSource::WholeBody)
}

/// Convert a decoded response body into display text for the given agent.
///
/// Pure function of its inputs; the result is never empty.
pub fn normalize(body: &Value, agent: AgentKind) -> String {
    let (text, source) = envelope_text(body);

    let reply = match serde_json::from_str::<Value>(&text) {
        Ok(envelope) => first_match(&envelope, agent.reply_rules()),
        Err(_) => FALLBACK_RULES
            .iter()
            // An envelope that failed to parse is not itself a reply
            .filter(|rule| match source {
                EnvelopeSource::Field(name) => !rule.reads_field(name),
                EnvelopeSource::WholeBody => true,
            })
            .find_map(|rule| rule.apply(body)),
    };

    reply.unwrap_or_else(|| DEFAULT_REPLY.to_string())
}
