//! # CARDIAC Emulator
//!
//! An emulator and assembler for CARDIAC, the CARDboard Illustrative Aid to
//! Computation published by Bell Labs in 1968.
//!
//! The CARDIAC is a decimal machine with 100 three-digit memory cells, a
//! single accumulator and ten instructions. Programs are loaded from punched
//! cards through a two-instruction bootstrap loader wired into cells 0-2.

pub mod decimal;
pub mod cpu;
pub mod asm;
pub mod config;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export commonly used types
pub use decimal::{Word, WordError};
pub use cpu::{Cpu, CpuError, Deck, IoPort, Memory, MemoryError, Registers, Instruction, Opcode};
pub use cpu::{RunSummary, Snapshot, StopReason};
pub use asm::{assemble, disassemble, Assembly, AssemblerError, CardImage, DeckError};
pub use config::{ExhaustionPolicy, MachineConfig};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
