//! Assembler, disassembler and card decks for CARDIAC programs.
//!
//! This module provides:
//! - A two-pass assembler (text → card image)
//! - A disassembler (memory → readable text)
//! - Card image and deck file handling

pub mod assembler;
pub mod disasm;
pub mod deck;

pub use assembler::{assemble, Assembly, AssemblerError};
pub use disasm::{disassemble, disassemble_word};
pub use deck::{CardImage, DeckError, load_deck, load_image, save_deck, save_image};
