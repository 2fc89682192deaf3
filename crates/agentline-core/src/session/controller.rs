//! Session controller
//!
//! Owns the thread, the busy flag, and the agent selection, and is the only
//! thing that mutates them. A turn moves IDLE -> SENDING on [`submit`] and
//! back to IDLE on [`resolve`], with either the normalized reply or a
//! synthetic failure turn appended.
//!
//! At most one call is outstanding: submitting while busy is a no-op.
//! Calls are not cancellable. Each one carries the epoch current when it was
//! issued; [`clear`] bumps the epoch, and a completion from an older epoch is
//! handled according to the [`StaleReplyPolicy`].
//!
//! [`submit`]: SessionController::submit
//! [`resolve`]: SessionController::resolve
//! [`clear`]: SessionController::clear

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::types::{SessionConfig, SessionEvent, StaleReplyPolicy, Thread, Turn};
use crate::agent::{AgentDirectory, AgentKind};
use crate::error::TransportError;
use crate::identity::{session_id_for, UserId};
use crate::normalizer::{normalize, TRANSPORT_FAILURE_REPLY};
use crate::transport::{Transport, TurnRequest};

/// Receiver for completions of dispatched turns
pub type CompletionReceiver = mpsc::UnboundedReceiver<Completion>;

/// Receiver for controller events
pub type EventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

/// A submitted turn whose transport call has not run yet
#[derive(Debug, Clone)]
pub struct PendingTurn {
    seq: u64,
    epoch: u64,
    agent: AgentKind,
    request: TurnRequest,
}

impl PendingTurn {
    pub fn request(&self) -> &TurnRequest {
        &self.request
    }

    pub fn agent(&self) -> AgentKind {
        self.agent
    }

    /// Perform the transport call and normalize the reply
    pub async fn run(self, transport: &dyn Transport) -> Completion {
        let outcome = transport
            .send_turn(&self.request)
            .await
            .map(|body| normalize(&body, self.agent));

        Completion {
            seq: self.seq,
            epoch: self.epoch,
            agent: self.agent,
            outcome,
        }
    }
}

/// Result of a transport call, ready to be folded back into the thread
#[derive(Debug)]
pub struct Completion {
    seq: u64,
    epoch: u64,
    agent: AgentKind,
    outcome: Result<String, TransportError>,
}

impl Completion {
    pub fn agent(&self) -> AgentKind {
        self.agent
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Owns the conversation state for one user
pub struct SessionController {
    user_id: UserId,
    agents: AgentDirectory,
    agent: AgentKind,
    stale_replies: StaleReplyPolicy,
    transport: Arc<dyn Transport>,
    thread: Thread,
    /// Sequence number of the outstanding call, if any
    in_flight: Option<u64>,
    next_seq: u64,
    epoch: u64,
    completion_tx: mpsc::UnboundedSender<Completion>,
    event_tx: Option<mpsc::UnboundedSender<SessionEvent>>,
}

impl SessionController {
    /// Create a controller and the receiver its dispatched turns complete on
    pub fn new(config: SessionConfig, transport: Arc<dyn Transport>) -> (Self, CompletionReceiver) {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let user_id = config.user_id.unwrap_or_else(UserId::generate);
        info!("Session started for {}", user_id);

        let controller = Self {
            user_id,
            agents: config.agents,
            agent: config.initial_agent,
            stale_replies: config.stale_replies,
            transport,
            thread: Thread::new(),
            in_flight: None,
            next_seq: 0,
            epoch: 0,
            completion_tx,
            event_tx: None,
        };

        (controller, completion_rx)
    }

    /// Subscribe to controller events. Replaces any earlier subscriber.
    pub fn subscribe(&mut self) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.event_tx = Some(tx);
        rx
    }

    pub fn thread(&self) -> &Thread {
        &self.thread
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn agent(&self) -> AgentKind {
        self.agent
    }

    /// Remote identifier of the selected agent
    pub fn agent_id(&self) -> &str {
        self.agents.agent_id(self.agent)
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn stale_replies(&self) -> StaleReplyPolicy {
        self.stale_replies
    }

    /// Append the user turn and mark the session busy.
    ///
    /// Returns `None` without touching state when the text is blank or a
    /// call is already outstanding.
    pub fn submit(&mut self, text: &str) -> Option<PendingTurn> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if self.is_busy() {
            debug!("Ignoring submission while a turn is in flight");
            return None;
        }

        let seq = self.next_seq;
        self.next_seq += 1;

        let agent_id = self.agent_id().to_string();
        let request = TurnRequest::new(
            self.user_id.as_str(),
            agent_id.clone(),
            session_id_for(&agent_id),
            text,
        );

        self.append(Turn::user(text, self.agent));
        self.set_in_flight(Some(seq));
        debug!(seq, agent = %self.agent, session_id = %request.session_id, "Turn submitted");

        Some(PendingTurn {
            seq,
            epoch: self.epoch,
            agent: self.agent,
            request,
        })
    }

    /// Submit and run the call on a spawned task.
    ///
    /// The completion arrives on the [`CompletionReceiver`] and must be
    /// passed to [`resolve`](Self::resolve). Returns whether a call was issued.
    pub fn dispatch(&mut self, text: &str) -> bool {
        let Some(pending) = self.submit(text) else {
            return false;
        };

        let transport = Arc::clone(&self.transport);
        let tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let completion = pending.run(transport.as_ref()).await;
            // Receiver gone means the front end shut down mid-request
            let _ = tx.send(completion);
        });
        true
    }

    /// Submit, wait for the call, and resolve it in place
    pub async fn send(&mut self, text: &str) -> Option<&Turn> {
        let pending = self.submit(text)?;
        let transport = Arc::clone(&self.transport);
        let completion = pending.run(transport.as_ref()).await;
        self.resolve(completion)
    }

    /// Fold a completion back into the thread.
    ///
    /// Returns the appended agent turn, or `None` when the reply was stale
    /// and discarded.
    pub fn resolve(&mut self, completion: Completion) -> Option<&Turn> {
        if self.in_flight == Some(completion.seq) {
            self.set_in_flight(None);
        }

        if completion.epoch != self.epoch && self.stale_replies == StaleReplyPolicy::Discard {
            warn!(seq = completion.seq, "Discarding reply for a cleared thread");
            self.emit(SessionEvent::StaleReplyDiscarded {
                agent: completion.agent,
            });
            return None;
        }

        let turn = match completion.outcome {
            Ok(reply) => Turn::agent(reply, completion.agent),
            Err(e) => {
                warn!(seq = completion.seq, agent = %completion.agent, "Turn failed: {}", e);
                Turn::failure(TRANSPORT_FAILURE_REPLY, completion.agent)
            }
        };
        Some(self.append(turn))
    }

    /// Reset to an empty, idle thread. An outstanding call keeps running.
    pub fn clear(&mut self) {
        self.thread.clear();
        self.epoch += 1;
        self.set_in_flight(None);
        info!("Chat cleared");
        self.emit(SessionEvent::Cleared);
    }

    /// Select the other agent
    pub fn switch_agent(&mut self) -> AgentKind {
        self.set_agent(self.agent.toggle());
        self.agent
    }

    /// Select the given agent
    pub fn set_agent(&mut self, agent: AgentKind) {
        if self.agent == agent {
            return;
        }
        self.agent = agent;
        info!("Switched to {} agent ({})", agent, self.agent_id());
        self.emit(SessionEvent::AgentSwitched { agent });
    }

    fn append(&mut self, turn: Turn) -> &Turn {
        if self.event_tx.is_some() {
            self.emit(SessionEvent::TurnAppended { turn: turn.clone() });
        }
        self.thread.push(turn)
    }

    fn set_in_flight(&mut self, in_flight: Option<u64>) {
        let was_busy = self.is_busy();
        self.in_flight = in_flight;
        if was_busy != self.is_busy() {
            self.emit(SessionEvent::BusyChanged {
                busy: self.is_busy(),
            });
        }
    }

    fn emit(&mut self, event: SessionEvent) {
        let closed = match &self.event_tx {
            Some(tx) => tx.send(event).is_err(),
            None => false,
        };
        if closed {
            self.event_tx = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct EchoTransport;

    #[async_trait]
    impl Transport for EchoTransport {
        async fn send_turn(&self, request: &TurnRequest) -> Result<serde_json::Value, TransportError> {
            let inner = json!({ "response": format!("echo: {}", request.message) });
            Ok(json!({ "response": inner.to_string() }))
        }
    }

    fn controller() -> SessionController {
        let (controller, _rx) = SessionController::new(
            SessionConfig::new(AgentDirectory::new("conv", "sum")),
            Arc::new(EchoTransport),
        );
        controller
    }

    #[test]
    fn test_submit_appends_user_turn_and_sets_busy() {
        let mut c = controller();
        let pending = c.submit("  hello  ").unwrap();

        assert!(c.is_busy());
        assert_eq!(c.thread().len(), 1);
        assert_eq!(c.thread().last().unwrap().content(), "hello");
        assert_eq!(pending.request().message, "hello");
        assert_eq!(pending.request().agent_id, "conv");
        assert!(pending.request().session_id.starts_with("conv-"));
        assert_eq!(pending.request().user_id, c.user_id().as_str());
    }

    #[test]
    fn test_blank_submit_is_noop() {
        let mut c = controller();
        assert!(c.submit("").is_none());
        assert!(c.submit(" \n\t ").is_none());
        assert!(c.thread().is_empty());
        assert!(!c.is_busy());
    }

    #[test]
    fn test_submit_while_busy_is_noop() {
        let mut c = controller();
        let _first = c.submit("one").unwrap();
        assert!(c.submit("two").is_none());
        assert_eq!(c.thread().len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_appends_reply_and_clears_busy() {
        let mut c = controller();
        let pending = c.submit("hi").unwrap();
        let completion = pending.run(&EchoTransport).await;

        let turn = c.resolve(completion).unwrap();
        assert_eq!(turn.content(), "echo: hi");
        assert!(!turn.is_failed());
        assert!(!c.is_busy());
        assert_eq!(c.thread().len(), 2);
    }

    #[test]
    fn test_session_ids_are_fresh_per_call() {
        let mut c = controller();
        let first = c.submit("a").unwrap();
        c.clear();
        let second = c.submit("b").unwrap();
        assert_ne!(first.request().session_id, second.request().session_id);
        assert_eq!(first.request().user_id, second.request().user_id);
    }

    #[test]
    fn test_switch_agent_changes_request_namespace() {
        let mut c = controller();
        assert_eq!(c.switch_agent(), AgentKind::Summarization);
        let pending = c.submit("long text").unwrap();
        assert_eq!(pending.request().agent_id, "sum");
        assert!(pending.request().session_id.starts_with("sum-"));
        assert_eq!(pending.agent(), AgentKind::Summarization);
    }

    #[test]
    fn test_events_follow_state_changes() {
        let mut c = controller();
        let mut events = c.subscribe();

        let _pending = c.submit("hi").unwrap();
        c.switch_agent();
        c.clear();

        assert!(matches!(events.try_recv(), Ok(SessionEvent::TurnAppended { .. })));
        assert_eq!(events.try_recv().unwrap(), SessionEvent::BusyChanged { busy: true });
        assert_eq!(
            events.try_recv().unwrap(),
            SessionEvent::AgentSwitched { agent: AgentKind::Summarization }
        );
        assert_eq!(events.try_recv().unwrap(), SessionEvent::BusyChanged { busy: false });
        assert_eq!(events.try_recv().unwrap(), SessionEvent::Cleared);
        assert!(events.try_recv().is_err());
    }
}
