//! TUI debugger for the CARDIAC emulator.
//!
//! Provides an interactive terminal-based debugger with:
//! - Register and memory views
//! - Input deck and output tray
//! - Step/run/breakpoint controls
//! - Disassembly view

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
