//! Instruction decoder for the CARDIAC.
//!
//! An instruction is a word `v` split into `opcode = v // 100` and
//! `operand = v % 100`. The ten opcodes form a closed set; anything else
//! (including the negative opcodes produced by negative words) is invalid.

use crate::decimal::Word;
use serde::{Serialize, Deserialize};
use std::fmt;
use thiserror::Error;

/// The ten CARDIAC operations, in opcode order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    /// Input: [arg] := next input card
    Inp,
    /// Clear and add: ACC := [arg]
    Cla,
    /// Add: ACC := ACC + [arg]
    Add,
    /// Test accumulator: if ACC < 0 then PC := arg
    Tac,
    /// Shift: ACC := ACC * 10^l / 10^r mod 10000
    Sft,
    /// Output: emit [arg]
    Out,
    /// Store: [arg] := ACC
    Sto,
    /// Subtract: ACC := ACC - [arg]
    Sub,
    /// Jump: [99] := 800 + PC, PC := arg
    Jmp,
    /// Halt and reset: registers := 0, PC := arg
    Hrs,
}

/// Opcode table indexed by opcode digit.
pub const OPCODES: [Opcode; 10] = [
    Opcode::Inp,
    Opcode::Cla,
    Opcode::Add,
    Opcode::Tac,
    Opcode::Sft,
    Opcode::Out,
    Opcode::Sto,
    Opcode::Sub,
    Opcode::Jmp,
    Opcode::Hrs,
];

/// Mnemonic table indexed by opcode digit.
pub const MNEMONICS: [&str; 10] = [
    "INP", "CLA", "ADD", "TAC", "SFT", "OUT", "STO", "SUB", "JMP", "HRS",
];

impl Opcode {
    /// Look up an opcode by its digit.
    pub fn from_digit(digit: i64) -> Option<Self> {
        usize::try_from(digit).ok().and_then(|i| OPCODES.get(i).copied())
    }

    /// Look up an opcode by its mnemonic (exact, upper case).
    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        MNEMONICS
            .iter()
            .position(|&m| m == mnemonic)
            .map(|i| OPCODES[i])
    }

    /// The opcode digit.
    #[inline]
    pub const fn digit(self) -> u8 {
        self as u8
    }

    /// The 3-letter mnemonic.
    #[inline]
    pub const fn mnemonic(self) -> &'static str {
        MNEMONICS[self as usize]
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A decoded CARDIAC instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    /// Two-digit operand, 0-99.
    pub operand: u8,
}

impl Instruction {
    /// Create an instruction.
    ///
    /// Returns `None` if the operand does not fit in two digits.
    pub fn new(opcode: Opcode, operand: u8) -> Option<Self> {
        (operand < 100).then_some(Self { opcode, operand })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:02}", self.opcode, self.operand)
    }
}

/// Decode a raw instruction register value.
pub fn decode(raw: i64) -> Result<Instruction, DecodeError> {
    let digit = raw.div_euclid(100);
    // rem_euclid(100) is always in 0..100.
    let operand = raw.rem_euclid(100) as u8;

    let opcode = Opcode::from_digit(digit).ok_or(DecodeError::InvalidOpcode(digit))?;
    Ok(Instruction { opcode, operand })
}

/// Encode an instruction back to a word.
pub fn encode(instr: &Instruction) -> Word {
    // opcode <= 9 and operand <= 99 always give a value <= 999.
    Word::instruction(instr.opcode.digit(), instr.operand % 100).unwrap_or_default()
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("opcode {0} not available")]
    InvalidOpcode(i64),
}
