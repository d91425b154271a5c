//! Input/output port.
//!
//! The CARDIAC reads punched cards one at a time (INP) and writes cards to
//! an output tray (OUT). The engine only needs to pop the next input card
//! and append an output card; [`Deck`] is the in-memory implementation.

use serde::{Serialize, Deserialize};
use std::collections::VecDeque;

/// The IO boundary consumed by the CPU.
pub trait IoPort {
    /// Pop the next input card, or `None` if the deck is exhausted.
    fn read_input(&mut self) -> Option<String>;

    /// Append a card to the output.
    fn write_output(&mut self, card: String);

    /// The next input card without consuming it (for tracing).
    fn peek_input(&self) -> Option<&str> {
        None
    }

    /// Everything written so far (for tracing).
    fn output(&self) -> &[String] {
        &[]
    }
}

/// An input deck and an output tray.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    input: VecDeque<String>,
    output: Vec<String>,
}

impl Deck {
    /// Create an empty deck.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a deck from a sequence of cards.
    pub fn from_cards<I, S>(cards: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input: cards.into_iter().map(Into::into).collect(),
            output: Vec::new(),
        }
    }

    /// Parse deck text: one card per line, blank lines skipped.
    pub fn parse(text: &str) -> Self {
        Self::from_cards(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty()),
        )
    }

    /// Append cards to the end of the input.
    pub fn push_input<I, S>(&mut self, cards: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input.extend(cards.into_iter().map(Into::into));
    }

    /// Put cards in front of the remaining input, keeping their order.
    pub fn prepend_input<I, S>(&mut self, cards: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut front: VecDeque<String> = cards.into_iter().map(Into::into).collect();
        front.append(&mut self.input);
        self.input = front;
    }

    /// Number of unread input cards.
    pub fn remaining(&self) -> usize {
        self.input.len()
    }

    /// Take the output collected so far, leaving it empty.
    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }
}

impl IoPort for Deck {
    fn read_input(&mut self) -> Option<String> {
        self.input.pop_front()
    }

    fn write_output(&mut self, card: String) {
        self.output.push(card);
    }

    fn peek_input(&self) -> Option<&str> {
        self.input.front().map(String::as_str)
    }

    fn output(&self) -> &[String] {
        &self.output
    }
}
