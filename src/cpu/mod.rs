//! The simulated machine.
//!
//! Every component hangs off one shared bus:
//! - Registers A and B, the instruction register and the program counter
//! - 2^N words of RAM behind an address controller
//! - A combinational ALU reading A and B directly
//! - An optional output register
//!
//! The control logic drives all of them through control lines, one control
//! word per tick.

pub mod alu;
pub mod bus;
pub mod component;
pub mod control;
pub mod error;
pub mod flags;
pub mod instruction;
pub mod machine;
pub mod memory;
pub mod output;
pub mod registers;
pub mod wiring;

/// Widest supported bus. RAM holds 2^N words, so this bounds memory use.
pub const MAX_BITS: usize = 16;

pub use alu::{Alu, AluMode};
pub use bus::Bus;
pub use component::{Component, ComponentId};
pub use control::{ControlLogic, Stage};
pub use error::ConfigError;
pub use flags::{ControlLine, ControlWord};
pub use instruction::{Instruction, InstructionSet};
pub use machine::{Board, Machine, MachineSnapshot};
pub use memory::{AddressController, Ram};
pub use output::{Debugger, OutputRegister, OutputSink, TracingDebugger};
pub use registers::{InstructionRegister, ProgramCounter, Register};
pub use wiring::Wiring;
