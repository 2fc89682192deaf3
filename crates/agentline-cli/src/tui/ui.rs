//! UI rendering for the TUI

use agentline_core::session::Turn;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::{App, AppState};

const INPUT_PROMPT: &str = "You> ";

/// Most input lines shown before the input box stops growing
const MAX_INPUT_LINES: u16 = 5;

/// Draw the entire UI
pub fn draw(frame: &mut Frame, app: &mut App) {
    let input_lines = (app.input.value().split('\n').count() as u16).clamp(1, MAX_INPUT_LINES);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),                  // Messages area
            Constraint::Length(1),               // Status bar
            Constraint::Length(input_lines + 2), // Input area
        ])
        .split(frame.area());

    draw_messages(frame, app, chunks[0]);
    draw_status_bar(frame, app, chunks[1]);
    draw_input(frame, app, chunks[2]);

    if app.state() == AppState::Help {
        draw_help_modal(frame);
    }
}

/// Draw the messages area
fn draw_messages(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", app.controller.agent().label()));

    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let width = (inner_area.width as usize).saturating_sub(2);
    let mut lines: Vec<ListItem> = app
        .controller
        .thread()
        .iter()
        .flat_map(|turn| turn_to_lines(turn, width))
        .collect();

    if lines.is_empty() && !app.controller.is_busy() {
        lines = welcome_lines();
    }

    if app.controller.is_busy() {
        lines.push(typing_indicator(app.ticks));
    }

    // Calculate scroll
    let total_lines = lines.len();
    let visible_lines = inner_area.height as usize;

    // Handle auto-scroll (scroll_offset == usize::MAX means scroll to bottom)
    let scroll = if app.scroll_offset == usize::MAX {
        total_lines.saturating_sub(visible_lines)
    } else {
        app.scroll_offset.min(total_lines.saturating_sub(visible_lines))
    };

    app.max_scroll = total_lines.saturating_sub(visible_lines);
    if app.scroll_offset != usize::MAX {
        app.scroll_offset = scroll;
    }

    let visible_items: Vec<ListItem> = lines
        .into_iter()
        .skip(scroll)
        .take(visible_lines)
        .collect();

    frame.render_widget(List::new(visible_items), inner_area);
}

/// Convert a turn to styled lines
fn turn_to_lines(turn: &Turn, max_width: usize) -> Vec<ListItem<'static>> {
    let timestamp = turn
        .timestamp()
        .with_timezone(&chrono::Local)
        .format("%H:%M ")
        .to_string();

    let (prefix, prefix_style, content_style) = if turn.is_user() {
        (
            "You: ".to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            Style::default(),
        )
    } else if turn.is_failed() {
        (
            format!("{}: ", turn.agent_kind().label()),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            Style::default().fg(Color::Red),
        )
    } else {
        (
            format!("{}: ", turn.agent_kind().label()),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            Style::default(),
        )
    };

    let indent = timestamp.width() + prefix.width();
    let wrapped_lines = wrap_text(turn.content(), max_width.saturating_sub(indent));

    let mut items: Vec<ListItem<'static>> = wrapped_lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            let line_content = if i == 0 {
                Line::from(vec![
                    Span::styled(timestamp.clone(), Style::default().fg(Color::DarkGray)),
                    Span::styled(prefix.clone(), prefix_style),
                    Span::styled(line, content_style),
                ])
            } else {
                Line::from(vec![
                    Span::raw(" ".repeat(indent)),
                    Span::styled(line, content_style),
                ])
            };
            ListItem::new(line_content)
        })
        .collect();

    // Blank separator between turns
    items.push(ListItem::new(Line::from("")));
    items
}

fn welcome_lines() -> Vec<ListItem<'static>> {
    let dim = Style::default().fg(Color::DarkGray);
    [
        "Welcome to Agentline.",
        "Type a message and press Enter. Shift+Enter adds a new line.",
        "Ctrl+T switches agent, Ctrl+L clears the chat, F1 shows help.",
    ]
    .into_iter()
    .map(|text| ListItem::new(Line::from(Span::styled(text, dim))))
    .collect()
}

/// Animated "typing" line shown while a reply is outstanding
fn typing_indicator(ticks: usize) -> ListItem<'static> {
    let dots = ".".repeat(ticks / 3 % 3 + 1);
    ListItem::new(Line::from(Span::styled(
        format!("Agent is typing{}", dots),
        Style::default().fg(Color::Magenta).add_modifier(Modifier::ITALIC),
    )))
}

/// Wrap text to fit within a given display width
pub(crate) fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        if paragraph.trim().is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current_line = String::new();

        for word in paragraph.split_whitespace() {
            if current_line.is_empty() {
                current_line = split_long_word(word, max_width, &mut lines);
            } else if current_line.width() + 1 + word.width() <= max_width {
                current_line.push(' ');
                current_line.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current_line));
                current_line = split_long_word(word, max_width, &mut lines);
            }
        }

        if !current_line.is_empty() {
            lines.push(current_line);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

/// Push full-width pieces of an over-long word, returning the remainder
fn split_long_word(word: &str, max_width: usize, lines: &mut Vec<String>) -> String {
    if word.width() <= max_width {
        return word.to_string();
    }

    let mut chunk = String::new();
    for c in word.chars() {
        if !chunk.is_empty() && chunk.width() + c.width().unwrap_or(0) > max_width {
            lines.push(std::mem::take(&mut chunk));
        }
        chunk.push(c);
    }
    chunk
}

/// Draw the status bar
fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let agent = app.controller.agent();
    let mut status_text = format!(" {} ({}) | {} ", agent.label(), app.controller.agent_id(), app.endpoint_info);
    if app.controller.is_busy() {
        status_text.push_str("| waiting for reply ");
    }
    if !app.status.is_empty() {
        status_text.push_str(&format!("| {} ", app.status));
    }

    let style = match app.state() {
        AppState::Processing => Style::default().bg(Color::Blue).fg(Color::White),
        AppState::Help => Style::default().bg(Color::Cyan).fg(Color::Black),
        AppState::Normal => Style::default().bg(Color::DarkGray).fg(Color::White),
    };

    frame.render_widget(Paragraph::new(status_text).style(style), area);
}

/// Draw the input area
fn draw_input(frame: &mut Frame, app: &App, area: Rect) {
    let state = app.state();
    let input_active = state != AppState::Help;

    let indent = " ".repeat(INPUT_PROMPT.width());
    let value = app.input.value();
    let all_lines: Vec<&str> = value.split('\n').collect();

    // Row and column of the cursor within the (possibly multi-line) value
    let before_cursor: String = value.chars().take(app.input.cursor()).collect();
    let cursor_row = before_cursor.matches('\n').count();
    let cursor_col = before_cursor.rsplit('\n').next().unwrap_or("").width();

    // Keep the cursor row visible when the value outgrows the box
    let visible_rows = MAX_INPUT_LINES as usize;
    let first_row = cursor_row.saturating_sub(visible_rows - 1);

    let lines: Vec<Line> = all_lines
        .iter()
        .enumerate()
        .skip(first_row)
        .take(visible_rows)
        .map(|(i, line)| {
            let lead = if i == 0 { INPUT_PROMPT.to_string() } else { indent.clone() };
            Line::from(vec![
                Span::styled(lead, Style::default().fg(Color::Cyan)),
                Span::raw(line.to_string()),
            ])
        })
        .collect();

    let title = match state {
        AppState::Processing => " Input (waiting for reply, Enter disabled) ",
        _ => " Input ",
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(if input_active {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        });

    frame.render_widget(Paragraph::new(lines).block(block), area);

    if input_active {
        let cursor_x = area.x + 1 + (INPUT_PROMPT.width() + cursor_col) as u16;
        let cursor_y = area.y + 1 + (cursor_row - first_row) as u16;
        frame.set_cursor_position((
            cursor_x.min(area.x + area.width.saturating_sub(2)),
            cursor_y.min(area.y + area.height.saturating_sub(2)),
        ));
    }
}

/// Draw the help overlay
fn draw_help_modal(frame: &mut Frame) {
    let area = centered_rect(60, 60, frame.area());

    // Clear the area behind the modal
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help (any key to close) ")
        .border_style(Style::default().fg(Color::Cyan));

    let key_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let entries = [
        ("Enter", "Send message"),
        ("Shift+Enter", "New line (Alt+Enter on terminals without Shift+Enter)"),
        ("Ctrl+T", "Switch between chat and summarizer agents"),
        ("Ctrl+L", "Clear the chat"),
        ("Up / Down", "Input history"),
        ("Shift+Up / Shift+Down", "Scroll messages"),
        ("PageUp / PageDown", "Scroll messages by page"),
        ("/agent [name]", "Switch or pick agent (chat, summary)"),
        ("/clear", "Clear the chat"),
        ("/exit", "Quit"),
        ("Ctrl+C", "Quit"),
    ];

    let lines: Vec<Line> = entries
        .iter()
        .map(|(keys, description)| {
            Line::from(vec![
                Span::styled(format!("{:<24}", keys), key_style),
                Span::raw(*description),
            ])
        })
        .collect();

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true }).block(block);
    frame.render_widget(paragraph, area);
}

/// Create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_respects_width() {
        let lines = wrap_text("the quick brown fox jumps over the lazy dog", 10);
        assert!(lines.iter().all(|l| l.width() <= 10));
        assert_eq!(lines.join(" "), "the quick brown fox jumps over the lazy dog");
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let lines = wrap_text("abcdefghijkl", 5);
        assert_eq!(lines, vec!["abcde", "fghij", "kl"]);

        let lines = wrap_text("hi abcdefghijkl", 5);
        assert_eq!(lines, vec!["hi", "abcde", "fghij", "kl"]);
    }

    #[test]
    fn test_wrap_keeps_paragraph_breaks() {
        let lines = wrap_text("one\n\ntwo", 20);
        assert_eq!(lines, vec!["one", "", "two"]);
    }

    #[test]
    fn test_wrap_counts_wide_characters() {
        let lines = wrap_text("日本語テキスト", 6);
        assert!(lines.iter().all(|l| l.width() <= 6));
        assert_eq!(lines.concat(), "日本語テキスト");
    }

    #[test]
    fn test_typing_indicator_cycles() {
        let texts: Vec<String> = [0, 3, 6, 9]
            .into_iter()
            .map(|t| format!("{:?}", typing_indicator(t)))
            .collect();
        assert_ne!(texts[0], texts[1]);
        assert_eq!(texts[0], texts[3]);
    }
}
