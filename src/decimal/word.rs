//! The CARDIAC memory word.
//!
//! A word is a signed decimal integer in the range -999 to +999. Its
//! external form is the 3-digit zero-padded magnitude with a leading `-`
//! for negative values, e.g. `015`, `-178`, `001`.

use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// A signed 3-digit decimal word.
///
/// Used for:
/// - Memory cells (100 of them on a stock CARDIAC)
/// - Instructions (`opcode * 100 + operand`)
/// - Input and output cards
///
/// Value range: -999 to +999
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Word(i16);

// ============================================================================
// Word Implementation
// ============================================================================

impl Word {
    /// Maximum value: +999
    pub const MAX: i64 = 999;

    /// Minimum value: -999
    pub const MIN: i64 = -999;

    /// The bootstrap value held by cell 0 of a fresh memory (`INP 01`).
    pub const BOOTSTRAP: Word = Word(1);

    /// Create a zero word.
    #[inline]
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Create a word from an integer.
    ///
    /// Fails with [`WordError::DataValueOverflow`] if `|value| > 999`.
    pub fn new(value: i64) -> Result<Self, WordError> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(WordError::DataValueOverflow(value));
        }
        // Range checked above, so the narrowing cannot truncate.
        Ok(Self(value as i16))
    }

    /// Build an instruction word from an opcode digit and a 2-digit operand.
    pub fn instruction(opcode: u8, operand: u8) -> Result<Self, WordError> {
        Self::new(i64::from(opcode) * 100 + i64::from(operand))
    }

    /// The integer value.
    #[inline]
    pub const fn value(self) -> i16 {
        self.0
    }

    /// The integer value widened to `i64`.
    #[inline]
    pub fn to_i64(self) -> i64 {
        i64::from(self.0)
    }

    /// Check if this word is negative.
    #[inline]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Parse a card or operand token.
    ///
    /// Surrounding whitespace and a leading `+` are accepted. Any other
    /// non-digit content is [`WordError::InvalidData`].
    pub fn parse(s: &str) -> Result<Self, WordError> {
        let trimmed = s.trim();
        match trimmed.parse::<i64>() {
            Ok(value) => Self::new(value),
            Err(_) if is_integer_literal(trimmed) => {
                // Well-formed but too large for i64: still an overflow, not bad data.
                let saturated = if trimmed.starts_with('-') { i64::MIN } else { i64::MAX };
                Err(WordError::DataValueOverflow(saturated))
            }
            Err(_) => Err(WordError::InvalidData(s.to_string())),
        }
    }
}

fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Word({})", self)
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{:03}", sign, self.0.unsigned_abs())
    }
}

impl FromStr for Word {
    type Err = WordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Word::parse(s)
    }
}

impl TryFrom<i64> for Word {
    type Error = WordError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Word::new(value)
    }
}

impl From<Word> for i64 {
    fn from(word: Word) -> Self {
        word.to_i64()
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur when building a word.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WordError {
    /// The value is not an integer.
    #[error("invalid data: {0:?}")]
    InvalidData(String),

    /// The magnitude exceeds 999.
    #[error("value overflow: {0}")]
    DataValueOverflow(i64),
}

// ============================================================================
// Tests
// ============================================================================
