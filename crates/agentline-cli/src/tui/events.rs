//! Event handling for the TUI

use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyModifiers};
use std::time::Duration;
use tokio::sync::mpsc;

use agentline_core::session::{Completion, CompletionReceiver, EventReceiver, SessionEvent};

/// Events that can occur in the TUI
#[derive(Debug)]
pub enum Event {
    /// Terminal event (key press, resize, etc.)
    Terminal(CrosstermEvent),
    /// A dispatched turn finished
    Completion(Completion),
    /// State change reported by the session controller
    Session(SessionEvent),
    /// Tick for UI refresh
    Tick,
}

/// Event handler that polls for terminal events, completions, and session events
pub struct EventHandler {
    /// Receiver for events
    rx: mpsc::UnboundedReceiver<Event>,
    /// Sender for events (kept so forwarding tasks never see a closed channel first)
    _tx: mpsc::UnboundedSender<Event>,
}

impl EventHandler {
    /// Create a new event handler
    pub fn new(mut completion_rx: CompletionReceiver, mut session_rx: EventReceiver) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        // Spawn terminal event polling task
        let tx_terminal = tx.clone();
        std::thread::spawn(move || {
            loop {
                // Poll with a short timeout to allow checking for shutdown
                if event::poll(Duration::from_millis(100)).unwrap_or(false)
                    && let Ok(evt) = event::read()
                    && tx_terminal.send(Event::Terminal(evt)).is_err()
                {
                    break;
                }
                // Send tick for UI refresh
                if tx_terminal.send(Event::Tick).is_err() {
                    break;
                }
            }
        });

        // Spawn completion forwarding task
        let tx_completion = tx.clone();
        tokio::spawn(async move {
            while let Some(completion) = completion_rx.recv().await {
                if tx_completion.send(Event::Completion(completion)).is_err() {
                    break;
                }
            }
        });

        // Spawn session event forwarding task
        let tx_session = tx.clone();
        tokio::spawn(async move {
            while let Some(session_event) = session_rx.recv().await {
                if tx_session.send(Event::Session(session_event)).is_err() {
                    break;
                }
            }
        });

        Self { rx, _tx: tx }
    }

    /// Get the next event
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

/// Result of handling a key event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// No action needed
    None,
    /// Submit the current input
    Submit(String),
    /// Quit the application
    Quit,
    /// Select the other agent
    SwitchAgent,
    /// Reset the thread
    ClearChat,
    /// Toggle the help overlay
    ToggleHelp,
    /// Scroll up
    ScrollUp,
    /// Scroll down
    ScrollDown,
    /// Page up
    PageUp,
    /// Page down
    PageDown,
    /// History previous
    HistoryPrev,
    /// History next
    HistoryNext,
}

/// Handle a key event in normal mode.
///
/// With `busy` set, Enter neither submits nor clears the input.
pub fn handle_key_normal(key: KeyEvent, input: &mut tui_input::Input, busy: bool) -> KeyAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) => {
            input.handle(tui_input::InputRequest::InsertChar('\n'));
            KeyAction::None
        }
        KeyCode::Enter if busy => KeyAction::None,
        KeyCode::Enter => {
            let value = input.value().to_string();
            if !value.trim().is_empty() {
                input.reset();
                KeyAction::Submit(value)
            } else {
                KeyAction::None
            }
        }
        KeyCode::Char('c') | KeyCode::Char('d') if ctrl => KeyAction::Quit,
        KeyCode::Char('t') if ctrl => KeyAction::SwitchAgent,
        KeyCode::Char('l') if ctrl => KeyAction::ClearChat,
        KeyCode::F(1) => KeyAction::ToggleHelp,
        KeyCode::Up if key.modifiers.contains(KeyModifiers::SHIFT) => KeyAction::ScrollUp,
        KeyCode::Down if key.modifiers.contains(KeyModifiers::SHIFT) => KeyAction::ScrollDown,
        KeyCode::Up => KeyAction::HistoryPrev,
        KeyCode::Down => KeyAction::HistoryNext,
        KeyCode::PageUp => KeyAction::PageUp,
        KeyCode::PageDown => KeyAction::PageDown,
        KeyCode::Char(_) if ctrl => KeyAction::None,
        KeyCode::Char(c) => {
            input.handle(tui_input::InputRequest::InsertChar(c));
            KeyAction::None
        }
        KeyCode::Backspace => {
            input.handle(tui_input::InputRequest::DeletePrevChar);
            KeyAction::None
        }
        KeyCode::Delete => {
            input.handle(tui_input::InputRequest::DeleteNextChar);
            KeyAction::None
        }
        KeyCode::Left => {
            input.handle(tui_input::InputRequest::GoToPrevChar);
            KeyAction::None
        }
        KeyCode::Right => {
            input.handle(tui_input::InputRequest::GoToNextChar);
            KeyAction::None
        }
        KeyCode::Home => {
            input.handle(tui_input::InputRequest::GoToStart);
            KeyAction::None
        }
        KeyCode::End => {
            input.handle(tui_input::InputRequest::GoToEnd);
            KeyAction::None
        }
        _ => KeyAction::None,
    }
}

/// Handle a key event while the help overlay is open
pub fn handle_key_help(key: KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
        _ => KeyAction::ToggleHelp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tui_input::Input;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(input: &mut Input, text: &str) {
        for c in text.chars() {
            handle_key_normal(key(KeyCode::Char(c)), input, false);
        }
    }

    #[test]
    fn test_enter_submits_and_resets() {
        let mut input = Input::default();
        type_text(&mut input, "hello");
        assert_eq!(
            handle_key_normal(key(KeyCode::Enter), &mut input, false),
            KeyAction::Submit("hello".to_string())
        );
        assert_eq!(input.value(), "");
    }

    #[test]
    fn test_enter_on_blank_input_does_nothing() {
        let mut input = Input::new("   ".to_string());
        assert_eq!(handle_key_normal(key(KeyCode::Enter), &mut input, false), KeyAction::None);
        assert_eq!(input.value(), "   ");
    }

    #[test]
    fn test_enter_while_busy_keeps_input() {
        let mut input = Input::default();
        type_text(&mut input, "queued");
        assert_eq!(handle_key_normal(key(KeyCode::Enter), &mut input, true), KeyAction::None);
        assert_eq!(input.value(), "queued");
    }

    #[test]
    fn test_shift_enter_inserts_newline() {
        let mut input = Input::default();
        type_text(&mut input, "a");
        let shift_enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT);
        assert_eq!(handle_key_normal(shift_enter, &mut input, false), KeyAction::None);
        type_text(&mut input, "b");
        assert_eq!(input.value(), "a\nb");
    }

    #[test]
    fn test_control_shortcuts() {
        let mut input = Input::default();
        let ctrl = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL);
        assert_eq!(handle_key_normal(ctrl('t'), &mut input, true), KeyAction::SwitchAgent);
        assert_eq!(handle_key_normal(ctrl('l'), &mut input, true), KeyAction::ClearChat);
        assert_eq!(handle_key_normal(ctrl('c'), &mut input, false), KeyAction::Quit);
        assert_eq!(handle_key_normal(ctrl('x'), &mut input, false), KeyAction::None);
        assert_eq!(input.value(), "");
    }
}
