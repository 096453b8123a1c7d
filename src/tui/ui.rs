//! UI rendering using ratatui
//!
//! Screens:
//! - Browser: hubs found on the LAN
//! - Channel: chat log, members, private board, input line
//! - Error: connection problems

use crate::app::{AppCoordinator, ChatState, Screen};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

use super::browser::render_browser;

/// Render the appropriate screen based on app state
pub fn render(frame: &mut Frame, coordinator: &AppCoordinator) {
    match &coordinator.screen {
        Screen::Browser { hubs, selected, .. } => {
            render_browser(frame, hubs, *selected, &coordinator.config().name);
        }
        Screen::Channel { chat, .. } => render_channel(frame, chat),
        Screen::Error { message } => render_error(frame, message),
    }
}

/// Render a joined channel
fn render_channel(frame: &mut Frame, chat: &ChatState) {
    let area = frame.area();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(5),    // Log and side panels
            Constraint::Length(3), // Input
            Constraint::Length(1), // Footer
        ])
        .split(area);

    render_header(frame, layout[0], chat);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(30), Constraint::Length(30)])
        .split(layout[1]);

    render_log(frame, body[0], chat);
    render_side(frame, body[1], chat);

    let input = Paragraph::new(format!("> {}_", chat.input))
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
    frame.render_widget(input, layout[2]);

    let footer = Paragraph::new("Enter Send  Esc Leave  !help Commands")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(footer, layout[3]);
}

fn render_header(frame: &mut Frame, area: Rect, chat: &ChatState) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(Color::DarkGray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let header_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(10),
            Constraint::Min(10),
            Constraint::Length(20),
        ])
        .split(inner);

    let logo = Paragraph::new("SPYWORD")
        .style(Style::default().fg(Color::Yellow).bold())
        .alignment(Alignment::Left);
    frame.render_widget(logo, header_layout[0]);

    let channel = Paragraph::new(format!("#{}", chat.channel))
        .style(Style::default().fg(Color::Cyan).bold())
        .alignment(Alignment::Center);
    frame.render_widget(channel, header_layout[1]);

    let status = if chat.is_welcomed() {
        chat.name.clone()
    } else {
        "connecting...".to_string()
    };
    let status = Paragraph::new(status)
        .style(Style::default().fg(Color::Green))
        .alignment(Alignment::Right);
    frame.render_widget(status, header_layout[2]);
}

/// Chat log, newest at the bottom
fn render_log(frame: &mut Frame, area: Rect, chat: &ChatState) {
    let mut lines: Vec<Line> = Vec::new();
    for entry in chat.lines() {
        for (i, part) in entry.text.lines().enumerate() {
            let text = Span::styled(part.to_string(), line_style(part));
            match (&entry.author, i) {
                (Some(author), 0) => {
                    let author_style = if *author == chat.name {
                        Style::default().fg(Color::Green).bold()
                    } else {
                        Style::default().fg(Color::Cyan)
                    };
                    lines.push(Line::from(vec![
                        Span::styled(format!("{}: ", author), author_style),
                        text,
                    ]));
                }
                _ => lines.push(Line::from(text)),
            }
        }
    }

    let height = area.height.saturating_sub(2) as usize;
    let skip = lines.len().saturating_sub(height);
    let visible: Vec<Line> = lines.into_iter().skip(skip).collect();

    let log = Paragraph::new(visible).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(log, area);
}

/// Members list, plus the private board once one arrives
fn render_side(frame: &mut Frame, area: Rect, chat: &ChatState) {
    let direct = chat.direct();
    let constraints = match direct {
        Some(_) => [Constraint::Length(chat.members.len() as u16 + 2), Constraint::Min(4)],
        None => [Constraint::Min(0), Constraint::Length(0)],
    };
    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let items: Vec<ListItem> = chat
        .members
        .iter()
        .map(|name| {
            let style = if *name == chat.name {
                Style::default().fg(Color::Green).bold()
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(name.as_str()).style(style)
        })
        .collect();
    let members = List::new(items).block(
        Block::default()
            .title(format!(" Members ({}) ", chat.members.len()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)),
    );
    frame.render_widget(members, side[0]);

    if let Some(text) = direct {
        let lines: Vec<Line> = text
            .lines()
            .map(|l| Line::styled(l.to_string(), line_style(l)))
            .collect();
        let board = Paragraph::new(lines).block(
            Block::default()
                .title(" Spymaster board ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Magenta)),
        );
        frame.render_widget(board, side[1]);
    }
}

/// Render error screen
fn render_error(frame: &mut Frame, message: &str) {
    let area = frame.area();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Percentage(40),
        ])
        .margin(2)
        .split(area);

    let error = Paragraph::new(format!("Error: {}", message))
        .style(Style::default().fg(Color::Red))
        .alignment(Alignment::Center);
    frame.render_widget(error, layout[1]);

    let hint = Paragraph::new("Press Esc to go back")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(hint, layout[2]);
}

fn line_style(line: &str) -> Style {
    match tag_color(line) {
        Some(color) => Style::default().fg(color),
        None => Style::default(),
    }
}

/// Color for a line the game bot wrote, by its leading marker.
/// Board rows (` 3. [B] apple`) are colored by their tag.
pub fn tag_color(line: &str) -> Option<Color> {
    let body = line.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ' ');
    if body.starts_with("[B]") {
        Some(Color::Blue)
    } else if body.starts_with("[R]") {
        Some(Color::Red)
    } else if body.starts_with("[X]") {
        Some(Color::Magenta)
    } else if body.starts_with("[ ]") {
        Some(Color::Gray)
    } else if line.starts_with("! ") {
        Some(Color::Yellow)
    } else if line.starts_with("x ") {
        Some(Color::DarkGray)
    } else if line.ends_with(" team won!") {
        Some(Color::Green)
    } else {
        None
    }
}
