//! Disassembler for CARDIAC memory.
//!
//! Converts words back to readable assembly. Words that do not decode
//! (negative values) are shown as `DATA`.

use crate::cpu::decode::decode;
use crate::cpu::Memory;
use crate::decimal::Word;
use std::ops::Range;

/// Disassemble a single word to text.
pub fn disassemble_word(word: Word) -> String {
    match decode(word.to_i64()) {
        Ok(instr) => instr.to_string(),
        Err(_) => format!("DATA {}", word),
    }
}

/// Disassemble a range of memory cells. Empty cells are skipped.
pub fn disassemble(mem: &Memory, range: Range<usize>) -> String {
    let mut output = String::new();
    output.push_str("; CARDIAC Disassembly\n");
    output.push_str("; -------------------\n\n");

    for (addr, cell) in mem.dump(range.start, range.len()) {
        if let Some(word) = cell {
            output.push_str(&format!("{:02}: {:<8}  ; {}\n", addr, disassemble_word(word), word));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disassemble_instruction() {
        assert_eq!(disassemble_word(Word::new(803).unwrap()), "JMP 03");
        assert_eq!(disassemble_word(Word::new(1).unwrap()), "INP 01");
        assert_eq!(disassemble_word(Word::new(452).unwrap()), "SFT 52");
    }

    #[test]
    fn test_disassemble_negative_as_data() {
        assert_eq!(disassemble_word(Word::new(-12).unwrap()), "DATA -012");
    }

    #[test]
    fn test_disassemble_memory() {
        let mut mem = Memory::new();
        mem.set_int(3, 150).unwrap();
        mem.set_int(4, 900).unwrap();

        let listing = disassemble(&mem, 0..10);

        assert!(listing.contains("00: INP 01"));
        assert!(listing.contains("03: CLA 50"));
        assert!(listing.contains("04: HRS 00"));
        assert!(!listing.contains("05:"));
    }
}
