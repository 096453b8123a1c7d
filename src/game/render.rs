//! Text rendering for channel displays
//!
//! Board lines carry a color tag (`[B]`, `[R]`, `[X]`, `[ ]`) that the
//! terminal client picks up for coloring.

use super::session::Unmet;
use super::surface::DeliveryError;
use super::{Color, Member, Roster, Team, Turn, Word};

/// Tag shown in front of a board word.
pub fn color_tag(color: Color) -> &'static str {
    match color {
        Color::Blue => "[B]",
        Color::Red => "[R]",
        Color::Neutral => "[ ]",
        Color::Forbidden => "[X]",
    }
}

/// Numbered board lines, two-digit aligned.
pub fn board_lines(words: &[Word]) -> Vec<String> {
    words
        .iter()
        .enumerate()
        .map(|(i, w)| format!("{:>2}. {} {}", i, color_tag(w.color), w.text))
        .collect()
}

/// The persistent game display: host, both teams, and the visible board.
pub fn game_text(host: &Member, roster: &Roster, display: &[Word]) -> String {
    let mut text = format!("Host: {}\n", host.name);

    for team in Team::ALL {
        text.push_str(&format!("\n{} Team:\n", team.label()));
        let spymaster = roster.spymaster_id(team);
        if let Some(sm) = roster.spymaster(team) {
            text.push_str(&format!("  {} [spymaster]\n", sm.name));
        }
        for member in roster.members(team) {
            if Some(member.id) != spymaster {
                text.push_str(&format!("  {}\n", member.name));
            }
        }
    }

    if !display.is_empty() {
        text.push_str("\nWords:\n");
        text.push_str(&board_lines(display).join("\n"));
        text.push('\n');
    }

    text.trim_end().to_string()
}

/// The solved board sent privately to spymasters.
pub fn solved_text(words: &[Word]) -> String {
    format!("Words:\n{}", board_lines(words).join("\n"))
}

/// `mm:ss` for a number of seconds.
pub fn clock_text(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// The persistent turn display.
pub fn turn_text(turn: Turn, seconds_left: u32) -> String {
    format!(
        "{} {}'s turn\n{} Time remaining: {}",
        color_tag(turn.team().color()),
        turn.label(),
        color_tag(turn.team().color()),
        clock_text(seconds_left)
    )
}

/// One diagnostic line per unmet start condition.
pub fn unmet_text(unmet: &[Unmet]) -> String {
    unmet
        .iter()
        .map(|u| match u {
            Unmet::NoSpymaster(team) => format!("! {} team does not have a spymaster", team.label()),
            Unmet::NotEnoughPlayers(team) => {
                format!("! {} team does not have enough players", team.label())
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Diagnostic for a spymaster who could not be sent the board.
pub fn delivery_failed_text(error: &DeliveryError) -> String {
    match error {
        DeliveryError::DirectMessagesDisabled(name) => format!(
            "! Could not start; {} must allow direct messages to be spymaster.",
            name
        ),
        DeliveryError::NotConnected(name) => {
            format!("! Could not start; spymaster {} is no longer connected.", name)
        }
    }
}

pub const WORDS_UNAVAILABLE_TEXT: &str = "! Could not start; not enough words to fill a board.";

/// Announcement for a finished game.
pub fn winner_text(winner: Team) -> String {
    format!("{} team won!", winner.label())
}

pub const CANCELED_TEXT: &str = "x Game session canceled.";
