//! Hub browser rendering
//!
//! Layout:
//! ┌─────────────────────────────────────────────────┐
//! │                 Hubs on the LAN                 │
//! ├─────────────────────────────────────────────────┤
//! │ > den        host-a.local.:55333                │
//! │   attic      host-b.local.:55334  (v2)          │
//! ├─────────────────────────────────────────────────┤
//! │  ↑↓ Select  Enter Join  Esc Quit                │
//! └─────────────────────────────────────────────────┘

use crate::network::{HubInfo, PROTOCOL_VERSION};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

/// Render the hub browser
pub fn render_browser(frame: &mut Frame, hubs: &[HubInfo], selected: usize, name: &str) {
    let area = frame.area();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(6),    // Hub list
            Constraint::Length(2), // Footer
        ])
        .margin(1)
        .split(area);

    let header = Paragraph::new(format!("Hubs on the LAN  (playing as {})", name))
        .style(Style::default().fg(Color::Cyan).bold())
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, layout[0]);

    if hubs.is_empty() {
        let searching = Paragraph::new(
            "Searching for hubs on LAN...\n\n(Start one with `spyword serve`, or pass --connect)",
        )
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
        frame.render_widget(searching, layout[1]);
    } else {
        let items: Vec<ListItem> = hubs
            .iter()
            .enumerate()
            .map(|(i, hub)| {
                let style = if i == selected {
                    Style::default().fg(Color::Yellow).bold()
                } else {
                    Style::default().fg(Color::White)
                };
                ListItem::new(hub_label(hub, i == selected)).style(style)
            })
            .collect();

        let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Hubs"));
        frame.render_widget(list, layout[1]);
    }

    let footer = Paragraph::new("↑↓ Select  Enter Join  Esc Quit")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(footer, layout[2]);
}

fn hub_label(hub: &HubInfo, selected: bool) -> String {
    let prefix = if selected { "> " } else { "  " };
    let mut label = format!("{}{:<12} {}:{}", prefix, hub.guild, hub.hostname, hub.port);
    if hub.version != PROTOCOL_VERSION {
        label.push_str(&format!("  (v{})", hub.version));
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::ui::tests::draw;

    fn hub(guild: &str, version: &str) -> HubInfo {
        HubInfo {
            instance_id: format!("spyword-{}", guild),
            guild: guild.into(),
            version: version.into(),
            hostname: "box.local.".into(),
            addresses: vec!["127.0.0.1".parse().unwrap()],
            port: 55333,
        }
    }

    #[test]
    fn test_hub_label_marks_version_mismatch() {
        assert_eq!(
            hub_label(&hub("den", PROTOCOL_VERSION), true),
            "> den          box.local.:55333"
        );
        assert!(hub_label(&hub("den", "9"), false).ends_with("(v9)"));
    }

    #[test]
    fn test_empty_browser_searches() {
        let rows = draw(80, 20, |f| render_browser(f, &[], 0, "ana"));
        assert!(rows.iter().any(|r| r.contains("Searching for hubs")));
        assert!(rows.iter().any(|r| r.contains("playing as ana")));
    }

    #[test]
    fn test_browser_lists_hubs() {
        let hubs = vec![hub("attic", PROTOCOL_VERSION), hub("den", PROTOCOL_VERSION)];
        let rows = draw(80, 20, |f| render_browser(f, &hubs, 1, "ana"));
        assert!(rows.iter().any(|r| r.contains("  attic")));
        assert!(rows.iter().any(|r| r.contains("> den")));
    }
}
