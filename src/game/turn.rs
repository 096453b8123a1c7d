//! Turn sequencing: spymaster clue, then team guessing, for each team in turn

use super::Team;

/// A turn phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Turn {
    BlueSpymaster,
    BlueGuessing,
    RedSpymaster,
    RedGuessing,
}

impl Turn {
    /// All phases in cycle order.
    #[cfg(test)]
    pub const CYCLE: [Turn; 4] = [
        Turn::BlueSpymaster,
        Turn::BlueGuessing,
        Turn::RedSpymaster,
        Turn::RedGuessing,
    ];

    /// The phase following this one, wrapping around.
    pub fn next(self) -> Turn {
        match self {
            Turn::BlueSpymaster => Turn::BlueGuessing,
            Turn::BlueGuessing => Turn::RedSpymaster,
            Turn::RedSpymaster => Turn::RedGuessing,
            Turn::RedGuessing => Turn::BlueSpymaster,
        }
    }

    /// Team acting in this phase.
    pub fn team(self) -> Team {
        match self {
            Turn::BlueSpymaster | Turn::BlueGuessing => Team::Blue,
            Turn::RedSpymaster | Turn::RedGuessing => Team::Red,
        }
    }

    /// Whether team members (not the spymaster) are guessing.
    pub fn is_guessing(self) -> bool {
        matches!(self, Turn::BlueGuessing | Turn::RedGuessing)
    }

    /// Label used in the turn display.
    pub fn label(self) -> &'static str {
        match self {
            Turn::BlueSpymaster => "Blue spymaster",
            Turn::BlueGuessing => "Blue team",
            Turn::RedSpymaster => "Red spymaster",
            Turn::RedGuessing => "Red team",
        }
    }
}

/// Cycles through the four turn phases. `advance` is the only mutator.
#[derive(Debug, Clone)]
pub struct TurnSequencer {
    current: Turn,
}

impl Default for TurnSequencer {
    fn default() -> Self {
        Self {
            current: Turn::BlueSpymaster,
        }
    }
}

impl TurnSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Turn {
        self.current
    }

    /// Move to the next phase and return it.
    pub fn advance(&mut self) -> Turn {
        self.current = self.current.next();
        self.current
    }
}
