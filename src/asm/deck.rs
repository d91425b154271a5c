//! Card decks and card images.
//!
//! A deck file is plain text with one card per line; blank lines are
//! ignored. A card image is the assembler's output: a deck made entirely of
//! address/data pairs, where the address card is `0<2-digit address>` (an
//! `INP` instruction for the bootstrap loader) and the data card is the word
//! to store there.

use crate::cpu::memory::{Memory, MemoryError};
use crate::decimal::{Word, WordError};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Bootstrap pair that installs the trampoline jump in cell 2.
pub const BOOTSTRAP_CARDS: [&str; 2] = ["002", "800"];

/// A parsed card image: address/data pairs in load order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardImage {
    pairs: Vec<(u8, Word)>,
}

impl CardImage {
    /// Create an empty image.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an address/data pair.
    ///
    /// # Panics
    /// Panics if the address does not fit in two digits.
    pub fn push(&mut self, address: u8, data: Word) {
        assert!(address < 100, "card address {} out of range (0-99)", address);
        self.pairs.push((address, data));
    }

    /// The address/data pairs.
    pub fn pairs(&self) -> &[(u8, Word)] {
        &self.pairs
    }

    /// Number of cards (twice the number of pairs).
    pub fn len(&self) -> usize {
        self.pairs.len() * 2
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Parse deck text into an image.
    pub fn parse(text: &str) -> Result<Self, DeckError> {
        let cards: Vec<(usize, &str)> = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty())
            .collect();

        if cards.len() % 2 != 0 {
            return Err(DeckError::OddCardCount(cards.len()));
        }

        let mut image = Self::new();
        for pair in cards.chunks_exact(2) {
            let (addr_line, addr_card) = pair[0];
            let (data_line, data_card) = pair[1];

            let address = Word::parse(addr_card)
                .ok()
                .and_then(|w| u8::try_from(w.value()).ok())
                .filter(|&a| a < 100)
                .ok_or_else(|| DeckError::NotAnAddressCard {
                    line: addr_line,
                    card: addr_card.to_string(),
                })?;

            let data = Word::parse(data_card)
                .map_err(|source| DeckError::InvalidCard { line: data_line, source })?;

            image.pairs.push((address, data));
        }

        Ok(image)
    }

    /// All cards in deck order, for feeding the bootstrap loader.
    pub fn cards(&self) -> Vec<String> {
        self.pairs
            .iter()
            .flat_map(|(address, data)| [format!("{:03}", address), data.to_string()])
            .collect()
    }

    /// The start address: the target of the last jump written to cell 2.
    pub fn entry_point(&self) -> Option<u8> {
        self.pairs
            .iter()
            .rev()
            .find(|(address, _)| *address == 2)
            .and_then(|(_, data)| {
                let value = data.value();
                (800..900).contains(&value).then(|| (value - 800) as u8)
            })
    }

    /// Write every pair straight into memory.
    pub fn load_into(&self, mem: &mut Memory) -> Result<(), MemoryError> {
        for (address, data) in &self.pairs {
            mem.set(i64::from(*address), *data)?;
        }
        Ok(())
    }
}

impl fmt::Display for CardImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for card in self.cards() {
            writeln!(f, "{}", card)?;
        }
        Ok(())
    }
}

/// Load a deck file as a list of cards.
pub fn load_deck<P: AsRef<Path>>(path: P) -> Result<Vec<String>, DeckError> {
    let text = std::fs::read_to_string(path.as_ref())
        .map_err(|e| DeckError::IoError(e.to_string()))?;

    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Write cards to a deck file, one per line.
pub fn save_deck<P: AsRef<Path>, S: AsRef<str>>(path: P, cards: &[S]) -> Result<(), DeckError> {
    let mut text = String::new();
    for card in cards {
        text.push_str(card.as_ref());
        text.push('\n');
    }
    std::fs::write(path.as_ref(), text).map_err(|e| DeckError::IoError(e.to_string()))
}

/// Load a card image file.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<CardImage, DeckError> {
    let text = std::fs::read_to_string(path.as_ref())
        .map_err(|e| DeckError::IoError(e.to_string()))?;
    CardImage::parse(&text)
}

/// Save a card image to disk.
pub fn save_image<P: AsRef<Path>>(path: P, image: &CardImage) -> Result<(), DeckError> {
    std::fs::write(path.as_ref(), image.to_string())
        .map_err(|e| DeckError::IoError(e.to_string()))
}

/// Errors that can occur during deck operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeckError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("card image has {0} cards, expected address/data pairs")]
    OddCardCount(usize),

    #[error("line {line}: {card:?} is not an address card")]
    NotAnAddressCard { line: usize, card: String },

    #[error("line {line}: {source}")]
    InvalidCard { line: usize, source: WordError },
}
