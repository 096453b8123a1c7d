//! Game logic: board, rosters, turn sequencing, sessions

pub mod board;
pub mod clock;
pub mod dictionary;
pub mod render;
pub mod roster;
pub mod session;
pub mod surface;
pub mod turn;

#[cfg(test)]
pub(crate) mod testing;

use std::fmt;

pub use roster::Roster;
pub use session::GameSession;
pub use turn::{Turn, TurnSequencer};

/// Number of words on a board.
pub const BOARD_SIZE: usize = 25;

/// Words owned by the team that moves first.
pub const BLUE_WORDS_COUNT: u32 = 7;

/// Words owned by the team that moves second.
pub const RED_WORDS_COUNT: u32 = 6;

/// Seconds granted to every turn phase.
pub const TURN_DURATION: u32 = 120;

/// One of the two competing teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Team {
    Blue,
    Red,
}

impl Team {
    /// Both teams, in turn order.
    pub const ALL: [Team; 2] = [Team::Blue, Team::Red];

    /// The opposing team.
    pub fn other(self) -> Team {
        match self {
            Team::Blue => Team::Red,
            Team::Red => Team::Blue,
        }
    }

    /// Word quota for this team on a fresh board.
    pub fn quota(self) -> u32 {
        match self {
            Team::Blue => BLUE_WORDS_COUNT,
            Team::Red => RED_WORDS_COUNT,
        }
    }

    /// The board color owned by this team.
    pub fn color(self) -> Color {
        match self {
            Team::Blue => Color::Blue,
            Team::Red => Color::Red,
        }
    }

    /// Parse a team name as typed in chat (case-insensitive).
    pub fn parse(name: &str) -> Option<Team> {
        match name.to_lowercase().as_str() {
            "blue" => Some(Team::Blue),
            "red" => Some(Team::Red),
            _ => None,
        }
    }

    /// Capitalized display name.
    pub fn label(self) -> &'static str {
        match self {
            Team::Blue => "Blue",
            Team::Red => "Red",
        }
    }
}

/// The hidden color of a board word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Blue,
    Red,
    Neutral,
    Forbidden,
}

impl Color {
    /// The team owning this color, if any.
    pub fn team(self) -> Option<Team> {
        match self {
            Color::Blue => Some(Team::Blue),
            Color::Red => Some(Team::Red),
            Color::Neutral | Color::Forbidden => None,
        }
    }
}

/// A word on the board together with its color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    pub color: Color,
}

impl Word {
    pub fn new(text: impl Into<String>, color: Color) -> Self {
        Self {
            text: text.into(),
            color,
        }
    }
}

/// Opaque identity of a chat member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId(pub u64);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A chat member: identity plus a human-readable name.
///
/// Equality only considers the identity, names are display-only.
#[derive(Debug, Clone, Eq)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
}

impl Member {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: MemberId(id),
            name: name.into(),
        }
    }
}

impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
