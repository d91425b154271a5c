//! Two-pass assembler for CARDIAC programs.
//!
//! Syntax:
//! ```text
//! ; Comment
//!         INP N          ; unlabelled instruction
//! LOOP    CLA N          ; labelled instruction
//!         JMP LOOP       ; operand may be a label or a literal 0-99
//! N       DATA 005       ; data word, -999 to 999
//! ```
//!
//! A line whose first token is a mnemonic has no label. Code is laid out
//! from address 3; cells 0-2 belong to the bootstrap loader. The output is a
//! card image: the trampoline pair, one address/data pair per line of
//! source, and a final pair that points the trampoline at the first
//! instruction.

use crate::asm::deck::CardImage;
use crate::cpu::decode::{encode, Instruction, Opcode};
use crate::decimal::{Word, WordError};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// First address available to user code.
pub const FIRST_ADDRESS: u8 = 3;

/// Last address available to user code.
pub const LAST_ADDRESS: u8 = 99;

/// Result of a successful assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    /// Label -> address.
    pub symbols: BTreeMap<String, u8>,
    /// Address of the first non-DATA instruction.
    pub start_address: u8,
    /// The card image to load.
    pub image: CardImage,
}

/// Assemble source code to a card image.
pub fn assemble(source: &str) -> Result<Assembly, AssemblerError> {
    let mut asm = Assembler::new();
    asm.assemble(source)
}

/// What a source line assembles to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Instruction(Opcode),
    Data,
}

/// One recorded source line, operand still unresolved.
#[derive(Debug, Clone)]
struct Record {
    address: u8,
    operation: Operation,
    operand: String,
    line: usize,
}

/// The assembler state.
struct Assembler {
    /// Next address to assign.
    current_addr: u8,
    /// Symbol table (label -> address).
    symbols: HashMap<String, u8>,
    /// Recorded lines in address order.
    records: Vec<Record>,
    /// First instruction address.
    start_address: Option<u8>,
}

impl Assembler {
    fn new() -> Self {
        Self {
            current_addr: FIRST_ADDRESS,
            symbols: HashMap::new(),
            records: Vec::new(),
            start_address: None,
        }
    }

    fn assemble(&mut self, source: &str) -> Result<Assembly, AssemblerError> {
        // Pass 1: Tokenize, assign addresses, collect labels
        for (line_num, line) in source.lines().enumerate() {
            self.process_line(line, line_num + 1)?;
        }

        let start_address = self.start_address.ok_or(AssemblerError::NoEntryPoint)?;

        // Pass 2: Resolve operands and encode
        let mut image = CardImage::new();
        image.push(2, Word::instruction(Opcode::Jmp.digit(), 0)?);
        for record in &self.records {
            image.push(record.address, self.encode(record)?);
        }
        image.push(2, Word::instruction(Opcode::Jmp.digit(), start_address)?);

        Ok(Assembly {
            symbols: self.symbols.iter().map(|(k, v)| (k.clone(), *v)).collect(),
            start_address,
            image,
        })
    }

    fn process_line(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        // Remove comments
        let code = line.split(';').next().unwrap_or_default();

        let mut tokens: Vec<&str> = code.split_whitespace().collect();
        if tokens.is_empty() {
            return Ok(());
        }

        if Opcode::from_mnemonic(tokens[0]).is_some() {
            tokens.insert(0, "");
        }
        tokens.truncate(3);

        let &[label, op, operand] = tokens.as_slice() else {
            return Err(AssemblerError::InvalidInstruction {
                line: line_num,
                message: format!("too few elements in {:?}", line.trim()),
            });
        };

        let operation = match op {
            "DATA" => Operation::Data,
            mnemonic => Opcode::from_mnemonic(mnemonic)
                .map(Operation::Instruction)
                .ok_or_else(|| AssemblerError::InvalidInstruction {
                    line: line_num,
                    message: format!("opcode {:?} not valid", mnemonic),
                })?,
        };

        self.record(label, operation, operand, line_num)
    }

    fn record(&mut self, label: &str, operation: Operation, operand: &str, line_num: usize)
        -> Result<(), AssemblerError>
    {
        if self.current_addr > LAST_ADDRESS {
            return Err(AssemblerError::ProgramTooLarge { line: line_num });
        }
        let address = self.current_addr;

        if self.start_address.is_none() && operation != Operation::Data {
            self.start_address = Some(address);
        }

        if !label.is_empty() {
            if self.symbols.contains_key(label) {
                return Err(AssemblerError::DuplicateVariable {
                    line: line_num,
                    label: label.to_string(),
                });
            }
            self.symbols.insert(label.to_string(), address);
        }

        self.records.push(Record {
            address,
            operation,
            operand: operand.to_string(),
            line: line_num,
        });
        self.current_addr += 1;

        Ok(())
    }

    fn encode(&self, record: &Record) -> Result<Word, AssemblerError> {
        match record.operation {
            Operation::Data => Word::parse(&record.operand).map_err(|source| {
                AssemblerError::InvalidLiteral {
                    line: record.line,
                    literal: record.operand.clone(),
                    source,
                }
            }),

            Operation::Instruction(opcode) => {
                let value = match self.symbols.get(&record.operand) {
                    Some(&address) => i64::from(address),
                    None => record.operand.parse::<i64>().map_err(|_| {
                        AssemblerError::UndefinedVariable {
                            line: record.line,
                            name: record.operand.clone(),
                        }
                    })?,
                };

                let operand = u8::try_from(value)
                    .ok()
                    .and_then(|operand| Instruction::new(opcode, operand))
                    .ok_or(AssemblerError::OperandOutOfRange { line: record.line, value })?;

                Ok(encode(&operand))
            }
        }
    }
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("invalid instruction on line {line}: {message}")]
    InvalidInstruction { line: usize, message: String },

    #[error("variable {label} on line {line} is already defined")]
    DuplicateVariable { line: usize, label: String },

    #[error("variable {name} on line {line} is undefined")]
    UndefinedVariable { line: usize, name: String },

    #[error("operand {value} on line {line} out of range (0-99)")]
    OperandOutOfRange { line: usize, value: i64 },

    #[error("invalid DATA literal {literal:?} on line {line}: {source}")]
    InvalidLiteral { line: usize, literal: String, source: WordError },

    #[error("program does not fit in memory (line {line} is past address 99)")]
    ProgramTooLarge { line: usize },

    #[error("program has no instructions")]
    NoEntryPoint,

    #[error(transparent)]
    Word(#[from] WordError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_label_reference() {
        let source = "LOOP CLA LOOP\nHRS 0\n";

        let result = assemble(source).unwrap();

        assert_eq!(result.symbols.len(), 1);
        assert_eq!(result.symbols["LOOP"], 3);
        assert_eq!(result.start_address, 3);
        assert_eq!(
            result.image.cards(),
            ["002", "800", "003", "103", "004", "900", "002", "803"]
        );
    }

    #[test]
    fn test_assemble_forward_reference() {
        let source = r#"
            CLA N       ; load
            OUT N
            HRS 0
        N   DATA -12
        "#;

        let result = assemble(source).unwrap();

        assert_eq!(result.symbols["N"], 6);
        let pairs = result.image.pairs();
        assert_eq!(pairs[1], (3, Word::new(106).unwrap()));
        assert_eq!(pairs[4], (6, Word::new(-12).unwrap()));
    }

    #[test]
    fn test_start_skips_leading_data() {
        let source = "A DATA 1\nB DATA 2\nCLA A\nHRS 0\n";

        let result = assemble(source).unwrap();

        assert_eq!(result.start_address, 5);
        assert_eq!(result.image.entry_point(), Some(5));
    }

    #[test]
    fn test_blank_and_comment_lines() {
        let source = "\n   \n; only a comment\nHRS 0 ; trailing\n";
        let result = assemble(source).unwrap();
        assert_eq!(result.image.len(), 6);
    }

    #[test]
    fn test_extra_tokens_ignored() {
        let result = assemble("CLA 5 extra words\nHRS 0\n").unwrap();
        assert_eq!(result.image.pairs()[1], (3, Word::new(105).unwrap()));
    }

    #[test]
    fn test_undefined_variable() {
        let err = assemble("CLA NOPE\nHRS 0\n").unwrap_err();
        assert_eq!(err, AssemblerError::UndefinedVariable { line: 1, name: "NOPE".to_string() });
    }

    #[test]
    fn test_duplicate_variable() {
        let err = assemble("X CLA 5\nX HRS 0\n").unwrap_err();
        assert_eq!(err, AssemblerError::DuplicateVariable { line: 2, label: "X".to_string() });
    }

    #[test]
    fn test_too_few_elements() {
        assert!(matches!(
            assemble("HRS\n"),
            Err(AssemblerError::InvalidInstruction { line: 1, .. })
        ));
        assert!(matches!(
            assemble("LABEL\n"),
            Err(AssemblerError::InvalidInstruction { line: 1, .. })
        ));
    }

    #[test]
    fn test_invalid_opcode() {
        assert!(matches!(
            assemble("X MUL 5\n"),
            Err(AssemblerError::InvalidInstruction { line: 1, .. })
        ));
        // DATA is not a mnemonic, so an unlabelled DATA line reads "DATA" as a label.
        assert!(matches!(
            assemble("DATA 5\n"),
            Err(AssemblerError::InvalidInstruction { line: 1, .. })
        ));
    }

    #[test]
    fn test_operand_out_of_range() {
        assert_eq!(
            assemble("CLA 100\n").unwrap_err(),
            AssemblerError::OperandOutOfRange { line: 1, value: 100 }
        );
        assert_eq!(
            assemble("CLA -1\n").unwrap_err(),
            AssemblerError::OperandOutOfRange { line: 1, value: -1 }
        );
    }

    #[test]
    fn test_invalid_literal() {
        assert!(matches!(
            assemble("HRS 0\nX DATA 1000\n"),
            Err(AssemblerError::InvalidLiteral { line: 2, source: WordError::DataValueOverflow(1000), .. })
        ));
        assert!(matches!(
            assemble("HRS 0\nX DATA abc\n"),
            Err(AssemblerError::InvalidLiteral { line: 2, .. })
        ));
    }

    #[test]
    fn test_no_entry_point() {
        assert_eq!(assemble("X DATA 1\n").unwrap_err(), AssemblerError::NoEntryPoint);
        assert_eq!(assemble("").unwrap_err(), AssemblerError::NoEntryPoint);
    }

    #[test]
    fn test_program_too_large() {
        let source = "HRS 0\n".repeat(98);
        assert_eq!(
            assemble(&source).unwrap_err(),
            AssemblerError::ProgramTooLarge { line: 98 }
        );
        assert!(assemble(&"HRS 0\n".repeat(97)).is_ok());
    }
}
