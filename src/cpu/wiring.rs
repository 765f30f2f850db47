//! Control-line distribution.
//!
//! A table built once at wiring time maps each control line to a setter on
//! the component it drives. Lines whose component is absent have no entry.

use crate::clock::Scheduler;
use crate::cpu::error::ConfigError;
use crate::cpu::flags::{ControlLine, ControlWord};
use crate::cpu::instruction::InstructionSet;
use crate::cpu::machine::Board;

type Setter = fn(&mut Board, &mut Scheduler, bool);

#[derive(Clone)]
pub struct Wiring {
    entries: Vec<(ControlLine, Setter)>,
}

impl Wiring {
    /// Wire every line to the components present on `board`.
    pub fn new(board: &Board) -> Self {
        let table: [(ControlLine, Setter); 17] = [
            (ControlLine::RegAIn, |b, _, on| b.reg_a.input = on),
            (ControlLine::RegAOut, |b, _, on| b.reg_a.output = on),
            (ControlLine::RegBIn, |b, _, on| b.reg_b.input = on),
            (ControlLine::RegBOut, |b, _, on| b.reg_b.output = on),
            (ControlLine::InstructionIn, |b, _, on| b.instruction.set_input(on)),
            (ControlLine::InstructionOut, |b, _, on| b.instruction.set_output(on)),
            (ControlLine::RamIn, |b, _, on| b.ram.input = on),
            (ControlLine::RamOut, |b, _, on| b.ram.output = on),
            (ControlLine::AddressIn, |b, _, on| b.address.input = on),
            (ControlLine::AluOut, |b, _, on| b.alu.output = on),
            (ControlLine::AluMode1, |b, _, on| b.alu.mode[0] = on),
            (ControlLine::AluMode2, |b, _, on| b.alu.mode[1] = on),
            (ControlLine::AluMode3, |b, _, on| b.alu.mode[2] = on),
            (ControlLine::CounterEnable, |b, _, on| b.counter.enable = on),
            (ControlLine::CounterIn, |b, _, on| b.counter.input = on),
            (ControlLine::CounterOut, |b, _, on| b.counter.output = on),
            (ControlLine::Halt, |_, s, on| {
                if on {
                    s.halt();
                }
            }),
        ];
        let mut entries = table.to_vec();

        if board.output.is_some() {
            let output_in: Setter = |b, _, on| {
                if let Some(out) = b.output.as_mut() {
                    out.input = on;
                }
            };
            entries.push((ControlLine::OutputIn, output_in));
        }

        Self { entries }
    }

    pub fn is_wired(&self, line: ControlLine) -> bool {
        self.entries.iter().any(|(l, _)| *l == line)
    }

    /// Reject microcode that asserts a required line with nothing behind it.
    pub fn check(&self, set: &InstructionSet) -> Result<(), ConfigError> {
        for instruction in set.iter() {
            for word in &instruction.microcode {
                if let Some(line) = word
                    .lines()
                    .find(|&line| !line.is_optional() && !self.is_wired(line))
                {
                    return Err(ConfigError::MissingComponent {
                        opcode: instruction.opcode,
                        line,
                        component: line.component(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Set every wired line to its state in `word`. Unasserted lines are
    /// cleared, so flags never outlive the tick that set them.
    pub fn apply(&self, word: ControlWord, board: &mut Board, scheduler: &mut Scheduler) {
        for &(line, set) in &self.entries {
            set(board, scheduler, word.contains(line));
        }
    }
}

impl std::fmt::Debug for Wiring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(line, _)| line))
            .finish()
    }
}
