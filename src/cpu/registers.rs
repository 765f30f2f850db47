//! Latching registers and the program counter.
//!
//! The machine has three bus registers:
//! - A: first ALU operand / accumulator
//! - B: second ALU operand
//! - Instruction: the fetched word, opcode in the high half
//!
//! plus the program counter, which counts on its own between the bus write
//! and read phases.

use serde::{Deserialize, Serialize};

use crate::bits;
use crate::clock::Phase;
use crate::cpu::bus::Bus;
use crate::cpu::component::Component;

/// A generic N-bit latch.
///
/// The stored value only changes in [`capture`](Register::capture), never
/// as a side effect of driving.
#[derive(Clone, Serialize, Deserialize)]
pub struct Register {
    name: String,
    value: Vec<bool>,
    /// Capture the bus during the read phase.
    pub input: bool,
    /// Drive the bus during the write phase.
    pub output: bool,
}

impl Register {
    pub fn new(name: impl Into<String>, width: usize) -> Self {
        Self {
            name: name.into(),
            value: vec![false; width],
            input: false,
            output: false,
        }
    }

    /// Latched bits, MSB first.
    #[inline]
    pub fn bits(&self) -> &[bool] {
        &self.value
    }

    pub fn value(&self) -> u64 {
        bits::to_int(&self.value)
    }

    /// Overwrite the latched value directly (test and front-end use).
    pub fn load(&mut self, value: u64) {
        bits::from_int(value, &mut self.value);
    }

    /// Read phase: copy the bus in if the input flag is set.
    pub fn capture(&mut self, bus: &Bus) {
        if self.input {
            self.value.copy_from_slice(bus.lines());
        }
    }

    /// Write phase: copy the value out if the output flag is set.
    pub fn drive(&self, bus: &mut Bus) {
        if self.output {
            bus.drive(&self.value);
        }
    }
}

impl Component for Register {
    fn name(&self) -> &str {
        &self.name
    }

    fn width(&self) -> Option<usize> {
        Some(self.value.len())
    }

    fn phases(&self) -> &'static [Phase] {
        &[Phase::Write, Phase::Read]
    }
}

impl std::fmt::Debug for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={} (0x{:02X})", self.name, bits::format_bits(&self.value), self.value())
    }
}

/// The instruction register.
///
/// Captures like any other register, but when driving it forwards only the
/// operand half and holds the opcode half low, so an opcode never reaches
/// the address path.
#[derive(Clone, Serialize, Deserialize)]
pub struct InstructionRegister {
    latch: Register,
}

impl InstructionRegister {
    pub fn new(width: usize) -> Self {
        Self {
            latch: Register::new("instruction register", width),
        }
    }

    pub fn set_input(&mut self, on: bool) {
        self.latch.input = on;
    }

    pub fn set_output(&mut self, on: bool) {
        self.latch.output = on;
    }

    #[inline]
    pub fn bits(&self) -> &[bool] {
        self.latch.bits()
    }

    /// Full latched word.
    pub fn value(&self) -> u64 {
        self.latch.value()
    }

    /// High half of the latched word.
    pub fn opcode(&self) -> u64 {
        let half = self.latch.bits().len() / 2;
        bits::to_int(&self.latch.bits()[..half])
    }

    /// Low half of the latched word.
    pub fn operand(&self) -> u64 {
        let half = self.latch.bits().len() / 2;
        bits::to_int(&self.latch.bits()[half..])
    }

    pub fn load(&mut self, value: u64) {
        self.latch.load(value);
    }

    pub fn capture(&mut self, bus: &Bus) {
        self.latch.capture(bus);
    }

    pub fn drive(&self, bus: &mut Bus) {
        if !self.latch.output {
            return;
        }
        let half = self.latch.bits().len() / 2;
        let lines = bus.lines_mut();
        lines[..half].fill(false);
        lines[half..].copy_from_slice(&self.latch.bits()[half..]);
    }
}

impl Component for InstructionRegister {
    fn name(&self) -> &str {
        self.latch.name()
    }

    fn width(&self) -> Option<usize> {
        self.latch.width()
    }

    fn phases(&self) -> &'static [Phase] {
        &[Phase::Write, Phase::Read]
    }
}

impl std::fmt::Debug for InstructionRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.latch, f)
    }
}

/// N-bit program counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramCounter {
    width: usize,
    value: u64,
    /// Count up by one in the latch phase.
    pub enable: bool,
    /// Load from the bus (jump).
    pub input: bool,
    /// Drive the current count onto the bus.
    pub output: bool,
}

impl ProgramCounter {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            value: 0,
            enable: false,
            input: false,
            output: false,
        }
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn load(&mut self, value: u64) {
        self.value = value & bits::mask(self.width);
    }

    pub fn capture(&mut self, bus: &Bus) {
        if self.input {
            self.value = bus.value();
        }
    }

    pub fn drive(&self, bus: &mut Bus) {
        if self.output {
            bus.store(self.value);
        }
    }

    /// Latch phase: advance by one, wrapping at the counter width.
    pub fn increment(&mut self) {
        if self.enable {
            self.value = (self.value + 1) & bits::mask(self.width);
        }
    }
}

impl Component for ProgramCounter {
    fn name(&self) -> &str {
        "program counter"
    }

    fn width(&self) -> Option<usize> {
        Some(self.width)
    }

    fn phases(&self) -> &'static [Phase] {
        &[Phase::Write, Phase::Latch, Phase::Read]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_latches_only_when_enabled() {
        let mut bus = Bus::new(8);
        let mut reg = Register::new("A", 8);
        bus.store(42);

        reg.capture(&bus);
        assert_eq!(reg.value(), 0);

        reg.input = true;
        reg.capture(&bus);
        assert_eq!(reg.value(), 42);

        // driving never changes the stored value
        bus.store(7);
        reg.output = true;
        reg.drive(&mut bus);
        assert_eq!(bus.value(), 42);
        assert_eq!(reg.value(), 42);
    }

    #[test]
    fn test_register_drive_requires_output() {
        let mut bus = Bus::new(8);
        let mut reg = Register::new("B", 8);
        reg.load(0x33);
        bus.store(0x11);

        reg.drive(&mut bus);
        assert_eq!(bus.value(), 0x11);
    }

    #[test]
    fn test_instruction_register_blanks_opcode() {
        let mut bus = Bus::new(8);
        let mut ir = InstructionRegister::new(8);
        ir.load(0x6E);
        assert_eq!(ir.opcode(), 0x6);
        assert_eq!(ir.operand(), 0xE);

        bus.store(0xFF);
        ir.set_output(true);
        ir.drive(&mut bus);
        assert_eq!(bus.value(), 0x0E);
        assert_eq!(ir.value(), 0x6E);
    }

    #[test]
    fn test_counter_wraps() {
        let mut pc = ProgramCounter::new(4);
        pc.load(15);
        pc.enable = true;
        pc.increment();
        assert_eq!(pc.value(), 0);
    }

    #[test]
    fn test_counter_increment_needs_enable() {
        let mut pc = ProgramCounter::new(8);
        pc.increment();
        assert_eq!(pc.value(), 0);
        pc.enable = true;
        pc.increment();
        pc.increment();
        assert_eq!(pc.value(), 2);
    }

    #[test]
    fn test_counter_jump_and_drive() {
        let mut bus = Bus::new(8);
        let mut pc = ProgramCounter::new(8);

        bus.store(0x0C);
        pc.input = true;
        pc.capture(&bus);
        assert_eq!(pc.value(), 0x0C);

        bus.store(0);
        pc.output = true;
        pc.drive(&mut bus);
        assert_eq!(bus.value(), 0x0C);
    }

    #[test]
    fn test_component_widths() {
        assert_eq!(Register::new("A", 8).width(), Some(8));
        assert_eq!(InstructionRegister::new(6).width(), Some(6));
        assert_eq!(ProgramCounter::new(4).width(), Some(4));
        assert!(Register::new("A", 4).attach(&Bus::new(8)).is_err());
        assert!(Register::new("A", 8).attach(&Bus::new(8)).is_ok());
    }
}
