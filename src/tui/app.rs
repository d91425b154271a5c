//! Debugger application state and logic.

use crate::asm::disasm::disassemble_word;
use crate::{CardImage, Cpu, CpuError, ExhaustionPolicy, MachineConfig, Opcode};
use crossterm::event::KeyCode;
use std::collections::HashSet;

/// Debugger application state.
pub struct DebuggerApp {
    /// The machine being debugged.
    pub cpu: Cpu,
    /// Card image that was booted, for reset.
    pub image: CardImage,
    /// Input cards queued after the image, for reset.
    pub input: Vec<String>,
    /// Configuration the machine was built from.
    pub config: MachineConfig,
    /// Breakpoints (by address).
    pub breakpoints: HashSet<u32>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Memory view scroll offset.
    pub mem_scroll: usize,
}

impl DebuggerApp {
    /// Create a new debugger with a booted card image.
    pub fn new(image: CardImage, input: Vec<String>, config: MachineConfig) -> Self {
        let cpu = Self::boot(&image, &input, &config);

        Self {
            cpu,
            image,
            input,
            config,
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status: "Ready. Press 's' to step, 'r' to run, 'q' to quit.".into(),
            mem_scroll: 0,
        }
    }

    fn boot(image: &CardImage, input: &[String], config: &MachineConfig) -> Cpu {
        let mut cpu = Cpu::with_config(config);
        cpu.io.push_input(input.iter().cloned());
        cpu.boot(image);
        cpu
    }

    /// Step one instruction.
    pub fn step(&mut self) {
        let pc = self.cpu.regs.pc;
        match self.cpu.step() {
            Ok(instr) => {
                self.status = format!("PC={:02}: {}", pc, instr);
                if instr.opcode == Opcode::Hrs {
                    self.running = false;
                    self.status = format!("Halted after {} cycles, next PC={:02}", self.cpu.cycles, self.cpu.regs.pc);
                }
            }
            Err(CpuError::InputExhausted) => {
                self.running = false;
                self.status = match self.cpu.policy {
                    ExhaustionPolicy::Abort => "End of input deck".into(),
                    ExhaustionPolicy::Reset => {
                        self.cpu.reset();
                        "End of input deck, registers reset".into()
                    }
                };
            }
            Err(e) => {
                self.status = format!("Error: {}", e);
                self.running = false;
            }
        }
    }

    /// Run until halt, breakpoint, or error.
    pub fn run(&mut self) {
        self.running = true;
        self.status = "Running...".into();
    }

    /// Run one iteration of continuous execution.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }

        if let Some(limit) = self.config.max_cycles {
            if self.cpu.cycles >= limit {
                self.running = false;
                self.status = format!("Cycle limit {} reached", limit);
                return;
            }
        }

        self.step();

        // Check for breakpoint
        let pc = self.cpu.regs.pc;
        if self.running && self.breakpoints.contains(&pc) {
            self.running = false;
            self.status = format!("Breakpoint at PC={:02}", pc);
        }
    }

    /// Toggle breakpoint at current PC.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.cpu.regs.pc;
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at PC={:02}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at PC={:02}", pc);
        }
    }

    /// Rebuild the machine and boot the image again.
    pub fn reset(&mut self) {
        self.cpu = Self::boot(&self.image, &self.input, &self.config);
        self.running = false;
        self.status = "Reset. Ready.".into();
    }

    /// Get disassembly around current PC.
    pub fn get_disassembly(&self, lines: usize) -> Vec<(u32, String, bool)> {
        let pc = self.cpu.regs.pc;
        let last = self.cpu.mem.size() as u32;
        let start = pc.saturating_sub(lines as u32 / 2);

        (start..=last)
            .take(lines)
            .map(|addr| {
                let text = match self.cpu.mem.get(i64::from(addr)) {
                    Ok(Some(word)) => disassemble_word(word),
                    _ => "---".to_string(),
                };
                (addr, text, addr == pc)
            })
            .collect()
    }

    /// Apply one key press.
    pub fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('s') => {
                self.running = false;
                self.step();
            }
            KeyCode::Char('r') => self.run(),
            KeyCode::Char('p') => {
                self.running = false;
                self.status = "Paused.".into();
            }
            KeyCode::Char('b') => self.toggle_breakpoint(),
            KeyCode::Char('x') => self.reset(),
            KeyCode::Up => self.mem_scroll = self.mem_scroll.saturating_sub(1),
            KeyCode::Down => {
                // Memory board rows hold ten cells.
                if self.mem_scroll < self.cpu.mem.size() / 10 {
                    self.mem_scroll += 1;
                }
            }
            _ => {}
        }
    }
}

/// Run the debugger with a card image.
pub fn run_debugger(image: CardImage, input: Vec<String>, config: MachineConfig) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(image, input, config);

    while !app.should_quit {
        terminal.draw(|frame| super::ui::draw(frame, &app))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key.code);
                }
            }
        }

        app.tick();
    }

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}
