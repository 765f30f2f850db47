//! The microinstruction sequencer.
//!
//! Each tick the control logic produces one control word:
//!
//! | pointer | word                               |
//! |---------|------------------------------------|
//! | 0       | `CO\|MI` (lookup)                  |
//! | 1       | `RO\|II\|CE` (fetch)               |
//! | n >= 2  | step `n - 2` of the current opcode |
//!
//! An undefined opcode, or one with no microcode, does not burn a tick: the
//! lookup for the next instruction is issued straight away and the pointer
//! jumps to the fetch step.

use serde::{Deserialize, Serialize};

use crate::clock::Phase;
use crate::cpu::component::Component;
use crate::cpu::flags::ControlWord;
use crate::cpu::instruction::InstructionSet;
use crate::cpu::registers::InstructionRegister;

#[derive(Debug, Clone)]
pub struct ControlLogic {
    set: InstructionSet,
    pointer: usize,
}

/// Which stage of the cycle a control word came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Lookup,
    Fetch,
    Execute { opcode: u64, step: usize },
    /// Lookup issued in place of an undefined or empty opcode.
    Skip { opcode: u64 },
}

impl ControlLogic {
    pub fn new(set: InstructionSet) -> Self {
        Self { set, pointer: 0 }
    }

    pub fn instructions(&self) -> &InstructionSet {
        &self.set
    }

    /// Current micro-step pointer.
    pub fn pointer(&self) -> usize {
        self.pointer
    }

    /// Produce this tick's control word and advance the pointer.
    pub fn next_word(&mut self, ir: &InstructionRegister) -> (ControlWord, Stage) {
        match self.pointer {
            0 => {
                self.pointer = 1;
                (ControlWord::LOOKUP, Stage::Lookup)
            }
            1 => {
                self.pointer = 2;
                (ControlWord::FETCH, Stage::Fetch)
            }
            pointer => {
                let opcode = ir.opcode();
                let step = pointer - 2;
                let microcode = self
                    .set
                    .get(opcode)
                    .map(|i| i.microcode.as_slice())
                    .unwrap_or_default();

                match microcode.get(step) {
                    Some(&word) => {
                        self.pointer = if step + 1 >= microcode.len() { 0 } else { pointer + 1 };
                        (word, Stage::Execute { opcode, step })
                    }
                    None => {
                        self.pointer = 1;
                        (ControlWord::LOOKUP, Stage::Skip { opcode })
                    }
                }
            }
        }
    }
}

impl Component for ControlLogic {
    fn name(&self) -> &str {
        "control logic"
    }

    fn width(&self) -> Option<usize> {
        None
    }

    fn phases(&self) -> &'static [Phase] {
        &[Phase::Decode]
    }
}
