//! Dictionary module: the word supply for new boards
//!
//! Embeds the board wordlist at build time.
//! Draws distinct words without replacement.

use super::surface::{WordSupply, WordSupplyError};
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

/// Embedded wordlist.
/// Words are lowercase, alphabetic only, one per line
static WORDS_DATA: &str = include_str!("../../data/words.txt");

/// Deduplicated wordlist in file order
static WORD_LIST: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut seen = HashSet::new();
    WORDS_DATA
        .lines()
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .filter(|w| seen.insert(*w))
        .collect()
});

/// Returns the number of distinct words in the embedded list
pub fn word_count() -> usize {
    WORD_LIST.len()
}

/// A word supply backed by a fixed corpus.
pub struct Dictionary {
    words: Vec<String>,
    rng: StdRng,
}

impl Dictionary {
    /// The embedded wordlist with an OS-seeded RNG.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// The embedded wordlist with a caller-provided RNG (for testing/seeding).
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            words: WORD_LIST.iter().map(|w| w.to_string()).collect(),
            rng,
        }
    }

    /// A custom corpus. Words are lowercased and deduplicated.
    #[cfg(test)]
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .filter(|w| seen.insert(w.clone()))
            .collect();
        Self {
            words,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Case-insensitive membership check.
    #[cfg(test)]
    pub fn contains(&self, word: &str) -> bool {
        let lower = word.to_lowercase();
        self.words.iter().any(|w| *w == lower)
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

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl WordSupply for Dictionary {
    fn draw(&mut self, n: usize) -> Result<Vec<String>, WordSupplyError> {
        if n > self.words.len() {
            return Err(WordSupplyError::NotEnoughWords {
                requested: n,
                available: self.words.len(),
            });
        }
        let picked = rand::seq::index::sample(&mut self.rng, self.words.len(), n);
        Ok(picked.into_iter().map(|i| self.words[i].clone()).collect())
    }
}
