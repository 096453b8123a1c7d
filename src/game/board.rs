//! Word board generation and reveal tracking

use super::surface::{WordSupply, WordSupplyError};
use super::{Color, Team, Word, BOARD_SIZE};
use rand::seq::SliceRandom;
use rand::Rng;

/// Result of revealing a word that exists on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reveal {
    /// Position of the word on the board
    pub index: usize,
    /// The word's true color
    pub color: Color,
    /// Whether this call uncovered the word (false on re-reveals)
    pub first: bool,
}

/// A generated board: the solved words plus what players currently see.
#[derive(Debug, Clone)]
pub struct Board {
    words: Vec<Word>,
    display: Vec<Word>,
    // A neutral word looks the same hidden or uncovered
    revealed: Vec<bool>,
}

impl Board {
    /// Draw `BOARD_SIZE` words and color them.
    ///
    /// The first `quota(a) + quota(b)` draw slots alternate between the two
    /// team colors starting with `team_a`, the last slot is forbidden, and
    /// the rest are neutral. The colored words are then shuffled.
    pub fn generate<R: Rng + ?Sized>(
        team_a: Team,
        team_b: Team,
        supply: &mut dyn WordSupply,
        rng: &mut R,
    ) -> Result<Self, WordSupplyError> {
        let drawn = supply.draw(BOARD_SIZE)?;
        if drawn.len() < BOARD_SIZE {
            return Err(WordSupplyError::NotEnoughWords {
                requested: BOARD_SIZE,
                available: drawn.len(),
            });
        }

        let teams_word_count = (team_a.quota() + team_b.quota()) as usize;
        let last = BOARD_SIZE - 1;

        let mut words: Vec<Word> = drawn
            .into_iter()
            .take(BOARD_SIZE)
            .enumerate()
            .map(|(i, text)| {
                let color = if i < teams_word_count {
                    if i % 2 == 0 {
                        team_a.color()
                    } else {
                        team_b.color()
                    }
                } else if i < last {
                    Color::Neutral
                } else {
                    Color::Forbidden
                };
                Word::new(text.to_lowercase(), color)
            })
            .collect();

        words.shuffle(rng);
        Ok(Self::from_words(words))
    }

    /// Build a board from already-colored words, all hidden.
    pub fn from_words(words: Vec<Word>) -> Self {
        let display = words
            .iter()
            .map(|w| Word::new(w.text.clone(), Color::Neutral))
            .collect();
        let revealed = vec![false; words.len()];
        Self {
            words,
            display,
            revealed,
        }
    }

    /// Reveal `text` (case-insensitive). Returns `None` if it is not on the board.
    pub fn reveal(&mut self, text: &str) -> Option<Reveal> {
        let needle = text.to_lowercase();
        let index = self.words.iter().position(|w| w.text == needle)?;
        let first = !self.revealed[index];
        self.revealed[index] = true;
        self.display[index] = self.words[index].clone();
        Some(Reveal {
            index,
            color: self.words[index].color,
            first,
        })
    }

    /// Whether the word at `index` has been uncovered.
    #[cfg(test)]
    pub fn is_revealed(&self, index: usize) -> bool {
        self.revealed.get(index).copied().unwrap_or(false)
    }

    /// Number of uncovered words.
    #[cfg(test)]
    pub fn revealed_count(&self) -> usize {
        self.revealed.iter().filter(|r| **r).count()
    }

    /// The solved board.
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// What players see.
    pub fn display(&self) -> &[Word] {
        &self.display
    }

    /// Number of words of a color.
    #[cfg(test)]
    pub fn count(&self, color: Color) -> usize {
        self.words.iter().filter(|w| w.color == color).count()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
