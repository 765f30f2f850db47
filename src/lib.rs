//! # VComputer
//!
//! A cycle-accurate simulator of a small stored-program computer built from
//! discrete components on a shared bus.
//!
//! Each clock tick the control logic asserts one control word; registers,
//! RAM, the ALU and the program counter then drive or capture the bus in a
//! fixed phase order. Instructions are just microcode tables, so the
//! instruction set is data.

pub mod bits;
pub mod clock;
pub mod computer;
pub mod config;
pub mod cpu;
pub mod program;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use clock::{Clock, ManualTimer, ThreadTimer, Timer};
pub use computer::{Computer, ComputerDefinition};
pub use config::{ConfigFileError, MachineConfig};
pub use cpu::{ConfigError, ControlLine, ControlWord, Instruction, InstructionSet, Machine, MachineSnapshot};
pub use program::{ImageError, ProgramImage};

#[cfg(feature = "tui")]
pub use tui::run_monitor;
