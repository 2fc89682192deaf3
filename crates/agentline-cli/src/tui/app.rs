//! Application state and types for the TUI

use agentline_core::session::{SessionController, SessionEvent};
use agentline_core::AgentKind;
use tui_input::Input;

/// Application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Normal mode - user can type and submit messages
    Normal,
    /// A reply is outstanding; typing is allowed, submitting is not
    Processing,
    /// Help overlay is open
    Help,
}

/// Main TUI application
pub struct App {
    /// Conversation owner; the UI only reads it and forwards intents
    pub controller: SessionController,
    /// Text input buffer
    pub input: Input,
    /// Scroll offset for message area (usize::MAX follows the newest turn)
    pub scroll_offset: usize,
    /// Largest useful scroll offset, updated on every render
    pub max_scroll: usize,
    /// Whether the app should quit
    pub should_quit: bool,
    /// Whether the help overlay is open
    pub show_help: bool,
    /// Status message (shown in footer)
    pub status: String,
    /// Endpoint host for display
    pub endpoint_info: String,
    /// Input history
    pub history: Vec<String>,
    /// Current position in history (None = not browsing)
    pub history_index: Option<usize>,
    /// Saved current input when browsing history
    pub history_draft: String,
    /// Tick counter driving the typing indicator animation
    pub ticks: usize,
}

impl App {
    pub fn new(controller: SessionController, endpoint_info: String) -> Self {
        Self {
            controller,
            input: Input::default(),
            scroll_offset: 0,
            max_scroll: 0,
            should_quit: false,
            show_help: false,
            status: String::new(),
            endpoint_info,
            history: Vec::new(),
            history_index: None,
            history_draft: String::new(),
            ticks: 0,
        }
    }

    pub fn state(&self) -> AppState {
        if self.show_help {
            AppState::Help
        } else if self.controller.is_busy() {
            AppState::Processing
        } else {
            AppState::Normal
        }
    }

    /// Submit text to the controller. Ignored while a reply is outstanding.
    pub fn submit(&mut self, text: &str) -> bool {
        let sent = self.controller.dispatch(text);
        if sent {
            self.status.clear();
            self.scroll_to_bottom();
        }
        sent
    }

    pub fn clear_chat(&mut self) {
        self.controller.clear();
        self.scroll_offset = 0;
    }

    pub fn switch_agent(&mut self) -> AgentKind {
        self.controller.switch_agent()
    }

    /// Scroll to the bottom of messages
    pub fn scroll_to_bottom(&mut self) {
        // Scroll offset will be calculated during render based on viewport
        self.scroll_offset = usize::MAX;
    }

    /// Scroll up by one line
    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.min(self.max_scroll).saturating_sub(1);
    }

    /// Scroll down by one line; reaching the bottom resumes following
    pub fn scroll_down(&mut self) {
        let next = self.scroll_offset.saturating_add(1);
        if next >= self.max_scroll {
            self.scroll_to_bottom();
        } else {
            self.scroll_offset = next;
        }
    }

    /// Advance the typing indicator
    pub fn tick(&mut self) {
        if self.controller.is_busy() {
            self.ticks = self.ticks.wrapping_add(1);
        }
    }

    /// Push input to history
    pub fn push_history(&mut self, input: String) {
        if !input.is_empty() {
            self.history.push(input);
        }
        self.history_index = None;
        self.history_draft.clear();
    }

    /// Navigate to previous history entry
    pub fn history_prev(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let new_index = match self.history_index {
            None => {
                // Save current input and start browsing from the end
                self.history_draft = self.input.value().to_string();
                self.history.len() - 1
            }
            Some(0) => return, // Already at oldest
            Some(i) => i - 1,
        };
        self.history_index = Some(new_index);
        self.input = Input::new(self.history[new_index].clone());
    }

    /// Navigate to next history entry
    pub fn history_next(&mut self) {
        let Some(idx) = self.history_index else { return };
        if idx + 1 >= self.history.len() {
            // Restore draft
            self.history_index = None;
            self.input = Input::new(self.history_draft.clone());
        } else {
            self.history_index = Some(idx + 1);
            self.input = Input::new(self.history[idx + 1].clone());
        }
    }

    /// Handle submitted input: slash commands or a message for the agent
    pub fn handle_user_input(&mut self, input: &str) {
        self.push_history(input.to_string());

        let trimmed = input.trim();
        if let Some(command) = trimmed.strip_prefix('/') {
            let mut parts = command.split_whitespace();
            match parts.next() {
                Some("exit") | Some("quit") => self.should_quit = true,
                Some("clear") => self.clear_chat(),
                Some("help") => self.show_help = true,
                Some("agent") => match parts.next() {
                    None => {
                        self.switch_agent();
                    }
                    Some(name) => match name.parse::<AgentKind>() {
                        Ok(agent) => self.controller.set_agent(agent),
                        Err(e) => self.status = e.to_string(),
                    },
                },
                _ => self.status = format!("Unknown command: /{}", command),
            }
            return;
        }

        if !self.submit(input) && self.controller.is_busy() {
            self.status = "Still waiting for the previous reply".to_string();
        }
    }

    /// Process a controller event
    pub fn handle_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::TurnAppended { .. } => self.scroll_to_bottom(),
            SessionEvent::BusyChanged { busy } => {
                if busy {
                    self.ticks = 0;
                    self.scroll_to_bottom();
                }
            }
            SessionEvent::Cleared => {
                self.status = "Chat cleared".to_string();
            }
            SessionEvent::AgentSwitched { agent } => {
                self.status = format!("Switched to {}", agent.label());
            }
            SessionEvent::StaleReplyDiscarded { agent } => {
                self.status = format!("Dropped a late {} reply", agent.label());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentline_core::session::SessionConfig;
    use agentline_core::transport::{Transport, TurnRequest};
    use agentline_core::{AgentDirectory, TransportError};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct NeverTransport;

    #[async_trait]
    impl Transport for NeverTransport {
        async fn send_turn(&self, _request: &TurnRequest) -> Result<serde_json::Value, TransportError> {
            std::future::pending().await
        }
    }

    fn app() -> App {
        let (controller, _rx) = SessionController::new(
            SessionConfig::new(AgentDirectory::default()),
            Arc::new(NeverTransport),
        );
        App::new(controller, "agents.example.com".to_string())
    }

    #[tokio::test]
    async fn test_state_follows_controller() {
        let mut app = app();
        assert_eq!(app.state(), AppState::Normal);

        assert!(app.submit("hello"));
        assert_eq!(app.state(), AppState::Processing);
        assert_eq!(app.scroll_offset, usize::MAX);

        // Second submission is ignored while busy
        assert!(!app.submit("again"));
        assert_eq!(app.controller.thread().len(), 1);

        app.clear_chat();
        assert_eq!(app.state(), AppState::Normal);
        assert!(app.controller.thread().is_empty());
    }

    #[tokio::test]
    async fn test_waiting_status_only_when_busy() {
        let mut app = app();

        app.handle_user_input("   ");
        assert!(app.status.is_empty());
        assert!(app.controller.thread().is_empty());

        app.handle_user_input("hello");
        app.handle_user_input("again");
        assert_eq!(app.status, "Still waiting for the previous reply");
        assert_eq!(app.controller.thread().len(), 1);
    }

    #[tokio::test]
    async fn test_slash_commands() {
        let mut app = app();

        app.handle_user_input("/agent summary");
        assert_eq!(app.controller.agent(), AgentKind::Summarization);
        app.handle_user_input("/agent");
        assert_eq!(app.controller.agent(), AgentKind::Conversational);

        app.handle_user_input("/agent poet");
        assert_eq!(app.status, "Unknown agent: poet");

        app.handle_user_input("hello");
        app.handle_user_input("/clear");
        assert!(app.controller.thread().is_empty());
        assert!(!app.controller.is_busy());

        app.handle_user_input("/help");
        assert_eq!(app.state(), AppState::Help);

        app.handle_user_input("/bogus");
        assert_eq!(app.status, "Unknown command: /bogus");

        app.handle_user_input("/exit");
        assert!(app.should_quit);
        assert_eq!(app.history.len(), 8);
    }

    #[test]
    fn test_scrolling_resumes_follow_at_bottom() {
        let mut app = app();
        app.max_scroll = 10;
        app.scroll_to_bottom();

        app.scroll_up();
        assert_eq!(app.scroll_offset, 9);
        app.scroll_down();
        assert_eq!(app.scroll_offset, usize::MAX);
    }

    #[test]
    fn test_history_navigation() {
        let mut app = app();
        app.push_history("first".to_string());
        app.push_history("second".to_string());
        app.input = Input::new("draft".to_string());

        app.history_prev();
        assert_eq!(app.input.value(), "second");
        app.history_prev();
        assert_eq!(app.input.value(), "first");
        app.history_prev();
        assert_eq!(app.input.value(), "first");

        app.history_next();
        assert_eq!(app.input.value(), "second");
        app.history_next();
        assert_eq!(app.input.value(), "draft");
        assert!(app.history_index.is_none());
    }

    #[test]
    fn test_agent_switch_updates_status() {
        let mut app = app();
        let agent = app.switch_agent();
        app.handle_session_event(SessionEvent::AgentSwitched { agent });
        assert_eq!(agent, AgentKind::Summarization);
        assert_eq!(app.status, "Switched to Summarizer");
    }
}
