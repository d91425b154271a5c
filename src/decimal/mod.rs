//! Decimal number primitives.
//!
//! - [`Word`] - A signed 3-digit decimal word (memory cells and instructions)
//! - [`arith`] - Accumulator arithmetic, including the decimal shift

mod word;
pub mod arith;

pub use word::{Word, WordError};
