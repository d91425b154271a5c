//! Machine configuration.

use crate::cpu::memory::DEFAULT_MEMORY_SIZE;
use serde::{Serialize, Deserialize};

/// What `run` does when INP finds the input deck empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExhaustionPolicy {
    /// Stop the run with [`CpuError::InputExhausted`](crate::CpuError::InputExhausted).
    #[default]
    Abort,
    /// Reset all registers (as `HRS 00`) and end the run normally.
    Reset,
}

/// Settings for building a machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Number of memory cells.
    pub memory_size: usize,
    /// Input exhaustion handling.
    pub on_input_exhausted: ExhaustionPolicy,
    /// Upper bound on cycles per run, if any.
    pub max_cycles: Option<u64>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            on_input_exhausted: ExhaustionPolicy::Abort,
            max_cycles: None,
        }
    }
}
