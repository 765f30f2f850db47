//! The arithmetic-logic unit.
//!
//! Combinational: nothing is latched. When its output flag is set it reads
//! registers A and B as they stand and drives the result onto the bus.

use serde::{Deserialize, Serialize};

use crate::bits::{self, arith};
use crate::clock::Phase;
use crate::cpu::bus::Bus;
use crate::cpu::component::Component;

/// Operation selected by the three mode lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AluMode {
    And,
    Or,
    Xor,
    Add,
    Subtract,
}

impl AluMode {
    /// Decode the 3-bit mode code, LM1 being the most significant bit.
    ///
    /// | code | mode |
    /// |------|------|
    /// | 000  | SUB  |
    /// | 001  | ADD  |
    /// | 010  | AND  |
    /// | 011  | OR   |
    /// | 100  | XOR  |
    ///
    /// Unassigned codes fall back to subtraction.
    pub fn from_code(code: u8) -> Self {
        match code & 0b111 {
            0b001 => AluMode::Add,
            0b010 => AluMode::And,
            0b011 => AluMode::Or,
            0b100 => AluMode::Xor,
            _ => AluMode::Subtract,
        }
    }

    pub fn from_lines(mode: [bool; 3]) -> Self {
        let code = (u8::from(mode[0]) << 2) | (u8::from(mode[1]) << 1) | u8::from(mode[2]);
        Self::from_code(code)
    }
}

/// The ALU. Mode bits are sampled live every time it drives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alu {
    width: usize,
    /// Drive the result this tick.
    pub output: bool,
    /// LM1, LM2, LM3.
    pub mode: [bool; 3],
}

impl Alu {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            output: false,
            mode: [false; 3],
        }
    }

    pub fn current_mode(&self) -> AluMode {
        AluMode::from_lines(self.mode)
    }

    /// Write phase: compute `a <op> b` straight into the bus lines.
    pub fn drive(&self, a: &[bool], b: &[bool], bus: &mut Bus) {
        if !self.output {
            return;
        }

        let result = bus.lines_mut();
        match self.current_mode() {
            AluMode::And => arith::and(a, b, result),
            AluMode::Or => arith::or(a, b, result),
            AluMode::Xor => arith::xor(a, b, result),
            AluMode::Add => {
                arith::add(a, b, result);
            }
            AluMode::Subtract => {
                arith::subtract(a, b, result);
            }
        }
    }

    /// What the ALU would drive for the given operands (display use).
    pub fn preview(&self, a: &[bool], b: &[bool]) -> u64 {
        let mut bus = Bus::new(self.width);
        let live = Alu { output: true, ..self.clone() };
        live.drive(a, b, &mut bus);
        bits::to_int(bus.lines())
    }
}

impl Component for Alu {
    fn name(&self) -> &str {
        "ALU"
    }

    fn width(&self) -> Option<usize> {
        Some(self.width)
    }

    fn phases(&self) -> &'static [Phase] {
        &[Phase::Write]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::to_bits;

    fn run(mode: [bool; 3], a: u64, b: u64) -> u64 {
        let mut alu = Alu::new(8);
        alu.mode = mode;
        alu.output = true;
        let mut bus = Bus::new(8);
        bus.store(0xFF);
        alu.drive(&to_bits(a, 8), &to_bits(b, 8), &mut bus);
        bus.value()
    }

    #[test]
    fn test_mode_table() {
        assert_eq!(AluMode::from_code(0b000), AluMode::Subtract);
        assert_eq!(AluMode::from_code(0b001), AluMode::Add);
        assert_eq!(AluMode::from_code(0b010), AluMode::And);
        assert_eq!(AluMode::from_code(0b011), AluMode::Or);
        assert_eq!(AluMode::from_code(0b100), AluMode::Xor);
        for code in 0b101..=0b111 {
            assert_eq!(AluMode::from_code(code), AluMode::Subtract);
        }
    }

    #[test]
    fn test_lm3_alone_is_add() {
        assert_eq!(AluMode::from_lines([false, false, true]), AluMode::Add);
        assert_eq!(run([false, false, true], 200, 100), 44);
    }

    #[test]
    fn test_each_mode_overwrites_bus() {
        assert_eq!(run([false, true, false], 0b1100, 0b1010), 0b1000);
        assert_eq!(run([false, true, true], 0b1100, 0b1010), 0b1110);
        assert_eq!(run([true, false, false], 0b1100, 0b1010), 0b0110);
        assert_eq!(run([false, false, false], 0, 1), 255);
        assert_eq!(run([true, true, true], 9, 4), 5);
    }

    #[test]
    fn test_idle_alu_leaves_bus() {
        let alu = Alu::new(8);
        let mut bus = Bus::new(8);
        bus.store(0x42);
        alu.drive(&to_bits(1, 8), &to_bits(1, 8), &mut bus);
        assert_eq!(bus.value(), 0x42);
    }

    #[test]
    fn test_preview_ignores_output_flag() {
        let mut alu = Alu::new(8);
        alu.mode = [false, false, true];
        assert_eq!(alu.preview(&to_bits(3, 8), &to_bits(4, 8)), 7);
        assert!(!alu.output);
    }
}
