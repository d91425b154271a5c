//! CARDIAC CPU registers.
//!
//! The CARDIAC has a single accumulator, a program counter (the "bug" that
//! is moved along the cardboard memory), an instruction register and a
//! running flag.

use serde::{Serialize, Deserialize};

/// The CARDIAC register file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// Accumulator. Wider than a memory word; checked only when stored.
    pub acc: i64,

    /// Program counter: address of the next instruction.
    pub pc: u32,

    /// Instruction register: raw value of the last fetched cell.
    pub ir: i64,

    /// Set by `run`, cleared by HRS.
    pub running: bool,
}

impl Registers {
    /// Create a new register file with all values zeroed and the CPU halted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all registers to zero and halt.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Increment the program counter by 1.
    /// Returns the old value.
    pub fn advance_pc(&mut self) -> u32 {
        let old = self.pc;
        self.pc = self.pc.saturating_add(1);
        old
    }

    /// Set the program counter to an absolute address.
    pub fn jump(&mut self, addr: u8) {
        self.pc = u32::from(addr);
    }
}
