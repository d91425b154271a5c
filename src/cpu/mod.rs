//! CPU emulation for the CARDIAC.
//!
//! This module implements the complete CARDIAC (1968) architecture:
//! - 100 three-digit signed decimal memory cells
//! - Accumulator, program counter, instruction register
//! - 10-instruction set with single-address architecture
//! - A card reader and output tray behind the [`IoPort`] trait

pub mod memory;
pub mod registers;
pub mod decode;
pub mod execute;
pub mod io;

pub use memory::{Memory, MemoryError};
pub use registers::Registers;
pub use decode::{Instruction, Opcode, DecodeError};
pub use execute::{Cpu, CpuError, RunSummary, Snapshot, StopReason};
pub use io::{Deck, IoPort};
