//! CPU execution engine for the CARDIAC.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.

use crate::asm::deck::CardImage;
use crate::config::{ExhaustionPolicy, MachineConfig};
use crate::cpu::decode::{self, DecodeError, Instruction, Opcode};
use crate::cpu::io::{Deck, IoPort};
use crate::cpu::memory::MemoryError;
use crate::cpu::{Memory, Registers};
use crate::decimal::{arith, Word};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Cell that JMP overwrites with its return jump.
pub const RETURN_CELL: i64 = 99;

/// Cell holding the bootstrap trampoline jump.
pub const TRAMPOLINE_CELL: u32 = 2;

/// Why a run stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// HRS cleared the running flag.
    Halted,
    /// The input deck ran out and the reset policy was applied.
    InputExhausted,
    /// The cycle limit was reached.
    CycleLimit,
}

/// Result of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Instructions executed during this run.
    pub cycles: u64,
    pub reason: StopReason,
}

/// Machine state after one executed instruction, handed to trace hooks.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Cycle number (1 for the first instruction ever executed).
    pub cycle: u64,
    /// Address the instruction was fetched from.
    pub address: u32,
    pub instruction: Instruction,
    pub registers: Registers,
    pub memory: Vec<Option<Word>>,
    pub next_input: Option<String>,
    pub output: Vec<String>,
}

/// The CARDIAC: registers, memory and an IO port.
#[derive(Clone, Serialize, Deserialize)]
pub struct Cpu<P: IoPort = Deck> {
    /// CPU registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Card reader and output tray.
    pub io: P,
    /// Input exhaustion handling for `run`.
    pub policy: ExhaustionPolicy,
    /// Instruction count since construction.
    pub cycles: u64,
    /// Last executed instruction (for debugging).
    last_instr: Option<Instruction>,
}

impl Cpu<Deck> {
    /// Create a 100-cell machine with an empty deck.
    pub fn new() -> Self {
        Self::with_io(Deck::new(), &MachineConfig::default())
    }

    /// Create a machine from a configuration with an empty deck.
    pub fn with_config(config: &MachineConfig) -> Self {
        Self::with_io(Deck::new(), config)
    }

    /// Queue a card image ahead of the current input.
    ///
    /// The machine is left at PC 0, so the bootstrap loader in cell 0 reads
    /// the image through the trampoline and then jumps to the program.
    pub fn boot(&mut self, image: &CardImage) {
        self.io.prepend_input(image.cards());
        self.regs.pc = 0;
    }
}

impl<P: IoPort> Cpu<P> {
    /// Create a machine around an IO port.
    pub fn with_io(io: P, config: &MachineConfig) -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::with_size(config.memory_size),
            io,
            policy: config.on_input_exhausted,
            cycles: 0,
            last_instr: None,
        }
    }

    /// Reset registers only. Memory is left untouched.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.last_instr = None;
    }

    /// Write a card image straight into memory and point PC at the trampoline.
    pub fn load_image(&mut self, image: &CardImage) -> Result<(), MemoryError> {
        image.load_into(&mut self.mem)?;
        self.regs.pc = TRAMPOLINE_CELL;
        Ok(())
    }

    /// Fetch the next instruction into IR and advance PC.
    fn fetch(&mut self) -> Result<(), CpuError> {
        self.regs.ir = self.mem.get_int(i64::from(self.regs.pc))?;
        self.regs.advance_pc();
        Ok(())
    }

    /// Execute a single instruction.
    ///
    /// Returns the instruction that was executed, or an error.
    pub fn step(&mut self) -> Result<Instruction, CpuError> {
        self.fetch()?;
        let instr = decode::decode(self.regs.ir)?;
        self.execute(instr)?;

        self.cycles += 1;
        self.last_instr = Some(instr);

        Ok(instr)
    }

    /// Run until HRS, an error, or input exhaustion under the reset policy.
    pub fn run(&mut self) -> Result<RunSummary, CpuError> {
        self.drive(None, None)
    }

    /// Run for at most `max_cycles` instructions.
    pub fn run_limited(&mut self, max_cycles: u64) -> Result<RunSummary, CpuError> {
        self.drive(Some(max_cycles), None)
    }

    /// Run like [`run_limited`](Self::run_limited), calling `hook` after every
    /// executed instruction.
    pub fn run_traced<F>(&mut self, max_cycles: Option<u64>, mut hook: F) -> Result<RunSummary, CpuError>
    where
        F: FnMut(&Snapshot),
    {
        self.drive(max_cycles, Some(&mut hook as &mut dyn FnMut(&Snapshot)))
    }

    fn drive(
        &mut self,
        max_cycles: Option<u64>,
        mut hook: Option<&mut dyn FnMut(&Snapshot)>,
    ) -> Result<RunSummary, CpuError> {
        let start_cycles = self.cycles;
        let summary = |cpu: &Self, reason| RunSummary { cycles: cpu.cycles - start_cycles, reason };

        self.regs.running = true;
        while self.regs.running {
            if max_cycles.is_some_and(|limit| self.cycles - start_cycles >= limit) {
                return Ok(summary(self, StopReason::CycleLimit));
            }

            let address = self.regs.pc;
            match self.step() {
                Ok(instr) => {
                    if let Some(hook) = hook.as_mut() {
                        hook(&self.snapshot(address, instr));
                    }
                }
                Err(CpuError::InputExhausted) if self.policy == ExhaustionPolicy::Reset => {
                    self.reset();
                    return Ok(summary(self, StopReason::InputExhausted));
                }
                Err(e) => return Err(e),
            }
        }

        Ok(summary(self, StopReason::Halted))
    }

    /// Execute a decoded instruction.
    fn execute(&mut self, instr: Instruction) -> Result<(), CpuError> {
        let arg = i64::from(instr.operand);

        match instr.opcode {
            Opcode::Inp => {
                let card = self.io.read_input().ok_or(CpuError::InputExhausted)?;
                self.mem.set_text(arg, &card)?;
            }

            Opcode::Cla => {
                self.regs.acc = self.mem.get_int(arg)?;
            }

            Opcode::Add => {
                let operand = self.mem.get_int(arg)?;
                self.regs.acc = arith::add(self.regs.acc, operand);
            }

            Opcode::Tac => {
                if self.regs.acc < 0 {
                    self.regs.jump(instr.operand);
                }
            }

            Opcode::Sft => {
                self.regs.acc = arith::shift(self.regs.acc, instr.operand);
            }

            Opcode::Out => {
                let card = self.mem.get_text(arg)?;
                self.io.write_output(card);
            }

            Opcode::Sto => {
                self.mem.set_int(arg, self.regs.acc)?;
            }

            Opcode::Sub => {
                let operand = self.mem.get_int(arg)?;
                self.regs.acc = arith::subtract(self.regs.acc, operand);
            }

            Opcode::Jmp => {
                let return_jump = 800 + i64::from(self.regs.pc);
                self.mem.set_int(RETURN_CELL, return_jump)?;
                self.regs.jump(instr.operand);
            }

            Opcode::Hrs => {
                self.regs.reset();
                self.regs.jump(instr.operand);
            }
        }

        Ok(())
    }

    /// Capture the current state after executing `instr` from `address`.
    pub fn snapshot(&self, address: u32, instr: Instruction) -> Snapshot {
        Snapshot {
            cycle: self.cycles,
            address,
            instruction: instr,
            registers: self.regs.clone(),
            memory: self.mem.cells().to_vec(),
            next_input: self.io.peek_input().map(str::to_string),
            output: self.io.output().to_vec(),
        }
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.regs.running
    }
}

impl Default for Cpu<Deck> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: IoPort> std::fmt::Debug for Cpu<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .field("mem", &self.mem)
            .finish()
    }
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("invalid operation: {0}")]
    InvalidOperation(#[from] DecodeError),

    #[error("end of input")]
    InputExhausted,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::decode::encode;
    use crate::decimal::WordError;

    fn op(opcode: Opcode, operand: u8) -> Word {
        encode(&Instruction { opcode, operand })
    }

    /// Machine with `program` written from address 10 and PC pointing at it.
    fn machine(program: &[Word], input: &[&str]) -> Cpu {
        let mut cpu = Cpu::new();
        for (i, word) in program.iter().enumerate() {
            cpu.mem.set(10 + i as i64, *word).unwrap();
        }
        cpu.io.push_input(input.iter().copied());
        cpu.regs.pc = 10;
        cpu
    }

    #[test]
    fn test_cla_advances_pc_by_one() {
        let mut cpu = machine(&[op(Opcode::Cla, 5)], &[]);
        cpu.mem.set_text(5, "-042").unwrap();

        let instr = cpu.step().unwrap();

        assert_eq!(instr, Instruction { opcode: Opcode::Cla, operand: 5 });
        assert_eq!(cpu.regs.acc, -42);
        assert_eq!(cpu.regs.pc, 11);
        assert_eq!(cpu.regs.ir, 105);
    }

    #[test]
    fn test_inp_stores_card() {
        let mut cpu = machine(&[op(Opcode::Inp, 40)], &["-017"]);
        cpu.step().unwrap();
        assert_eq!(cpu.mem.get_int(40).unwrap(), -17);
    }

    #[test]
    fn test_inp_bad_card() {
        let mut cpu = machine(&[op(Opcode::Inp, 40)], &["hello"]);
        assert!(matches!(
            cpu.step(),
            Err(CpuError::Memory(MemoryError::Data(WordError::InvalidData(_))))
        ));
    }

    #[test]
    fn test_add_sub() {
        let mut cpu = machine(&[op(Opcode::Cla, 50), op(Opcode::Add, 51), op(Opcode::Sub, 52)], &[]);
        cpu.mem.set_int(50, 100).unwrap();
        cpu.mem.set_int(51, 25).unwrap();
        cpu.mem.set_int(52, 200).unwrap();

        cpu.step().unwrap();
        cpu.step().unwrap();
        assert_eq!(cpu.regs.acc, 125);
        cpu.step().unwrap();
        assert_eq!(cpu.regs.acc, -75);
    }

    #[test]
    fn test_tac_jumps_only_when_negative() {
        let mut cpu = machine(&[op(Opcode::Tac, 40)], &[]);
        cpu.regs.acc = 0;
        cpu.step().unwrap();
        assert_eq!(cpu.regs.pc, 11);

        let mut cpu = machine(&[op(Opcode::Tac, 40)], &[]);
        cpu.regs.acc = -1;
        cpu.step().unwrap();
        assert_eq!(cpu.regs.pc, 40);
    }

    #[test]
    fn test_sft() {
        let mut cpu = machine(&[op(Opcode::Sft, 21)], &[]);
        cpu.regs.acc = 1234;
        cpu.step().unwrap();
        assert_eq!(cpu.regs.acc, 2340);
    }

    #[test]
    fn test_out_emits_raw_text() {
        let mut cpu = machine(&[op(Opcode::Out, 50), op(Opcode::Out, 51)], &[]);
        cpu.mem.set_int(50, 7).unwrap();

        cpu.step().unwrap();
        cpu.step().unwrap();
        assert_eq!(cpu.io.output(), ["007", ""]);
    }

    #[test]
    fn test_sto_overflow() {
        let mut cpu = machine(&[op(Opcode::Sto, 50)], &[]);
        cpu.regs.acc = 1000;
        assert_eq!(
            cpu.step(),
            Err(CpuError::Memory(MemoryError::Data(WordError::DataValueOverflow(1000))))
        );
        assert_eq!(cpu.mem.get(50).unwrap(), None);
    }

    #[test]
    fn test_jmp_saves_return() {
        let mut cpu = machine(&[op(Opcode::Jmp, 50)], &[]);
        cpu.step().unwrap();

        // PC was 11 after fetching from 10.
        assert_eq!(cpu.mem.get_text(99).unwrap(), "811");
        assert_eq!(cpu.regs.pc, 50);
    }

    #[test]
    fn test_jmp_from_ten() {
        let mut cpu = Cpu::new();
        cpu.mem.set(9, op(Opcode::Jmp, 50)).unwrap();
        cpu.regs.pc = 9;
        cpu.step().unwrap();

        assert_eq!(cpu.mem.get_text(99).unwrap(), "810");
        assert_eq!(cpu.regs.pc, 50);
    }

    #[test]
    fn test_hrs_halts_and_reloads() {
        let mut cpu = machine(&[op(Opcode::Cla, 0), op(Opcode::Hrs, 42)], &[]);

        let summary = cpu.run().unwrap();

        assert_eq!(summary, RunSummary { cycles: 2, reason: StopReason::Halted });
        assert!(!cpu.is_running());
        assert_eq!(cpu.regs.acc, 0);
        assert_eq!(cpu.regs.ir, 0);
        assert_eq!(cpu.regs.pc, 42);
    }

    #[test]
    fn test_invalid_operation_is_fatal() {
        let mut cpu = machine(&[Word::new(-500).unwrap()], &[]);
        assert_eq!(cpu.run(), Err(CpuError::InvalidOperation(DecodeError::InvalidOpcode(-5))));
    }

    #[test]
    fn test_fetch_empty_cell() {
        let mut cpu = machine(&[], &[]);
        assert_eq!(cpu.step(), Err(CpuError::Memory(MemoryError::EmptyCell(10))));
    }

    #[test]
    fn test_fetch_past_end() {
        let mut cpu = Cpu::new();
        cpu.regs.pc = 101;
        assert!(matches!(cpu.step(), Err(CpuError::Memory(MemoryError::OutOfRange { .. }))));
    }

    #[test]
    fn test_input_exhausted_abort() {
        let mut cpu = machine(&[op(Opcode::Inp, 40), op(Opcode::Inp, 41)], &["001"]);
        assert_eq!(cpu.run(), Err(CpuError::InputExhausted));
        assert_eq!(cpu.mem.get_int(40).unwrap(), 1);
    }

    #[test]
    fn test_input_exhausted_reset() {
        let mut cpu = machine(&[op(Opcode::Inp, 40), op(Opcode::Inp, 41)], &["001"]);
        cpu.policy = ExhaustionPolicy::Reset;
        cpu.regs.acc = 55;

        let summary = cpu.run().unwrap();

        assert_eq!(summary, RunSummary { cycles: 1, reason: StopReason::InputExhausted });
        assert_eq!(cpu.regs, Registers::new());
        assert_eq!(cpu.mem.get_int(40).unwrap(), 1);
    }

    #[test]
    fn test_run_limited() {
        // JMP 10 at address 10 loops forever.
        let mut cpu = machine(&[op(Opcode::Jmp, 10)], &[]);
        let summary = cpu.run_limited(25).unwrap();
        assert_eq!(summary, RunSummary { cycles: 25, reason: StopReason::CycleLimit });
        assert!(cpu.is_running());
    }

    #[test]
    fn test_run_traced_snapshots() {
        let mut cpu = machine(&[op(Opcode::Inp, 50), op(Opcode::Out, 50), op(Opcode::Hrs, 0)], &["123"]);
        let mut trace = Vec::new();

        cpu.run_traced(None, |snap| trace.push(snap.clone())).unwrap();

        assert_eq!(trace.len(), 3);
        assert_eq!(trace[0].cycle, 1);
        assert_eq!(trace[0].address, 10);
        assert_eq!(trace[0].memory[50], Some(Word::new(123).unwrap()));
        assert_eq!(trace[0].next_input, None);
        assert!(trace[0].output.is_empty());
        assert_eq!(trace[1].output, ["123"]);
        assert_eq!(trace[2].instruction.opcode, Opcode::Hrs);
        assert!(!trace[2].registers.running);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut cpu = machine(&[op(Opcode::Hrs, 0)], &[]);
        let mut json = String::new();
        cpu.run_traced(None, |snap| json = serde_json::to_string(snap).unwrap()).unwrap();
        assert!(json.contains("\"Hrs\""));
        assert!(json.contains("\"cycle\":1"));
    }
}
