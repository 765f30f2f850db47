//! Wiring-time configuration errors.

use thiserror::Error;

use crate::cpu::flags::ControlLine;

/// Errors raised while building a machine. None of them can occur once the
/// clock has started ticking.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid bit width {0}: must be even and between 2 and {max}", max = crate::cpu::MAX_BITS)]
    InvalidWidth(usize),

    #[error("{component} is {actual} bits wide but the bus has {expected} lines")]
    WidthMismatch {
        component: String,
        expected: usize,
        actual: usize,
    },

    #[error("opcode 0x{0:X} is defined more than once")]
    DuplicateOpcode(u64),

    #[error("opcode 0x{opcode:X} does not fit in {bits} opcode bits")]
    OpcodeOutOfRange { opcode: u64, bits: usize },

    #[error("opcode 0x{opcode:X} asserts {line} but no {component} is connected")]
    MissingComponent {
        opcode: u64,
        line: ControlLine,
        component: &'static str,
    },

    #[error("program image writes address 0x{address:X} but RAM holds {capacity} words")]
    ImageOverflow { address: usize, capacity: usize },

    #[error("clock timer failed to start: {0}")]
    Timer(String),
}
