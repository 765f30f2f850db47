//! Instruction definitions: an opcode and its microcode.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cpu::error::ConfigError;
use crate::cpu::flags::{ControlLine, ControlWord};

/// One opcode and the control words it asserts, one per tick.
///
/// Empty microcode is legal: the instruction costs only its fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mnemonic: Option<String>,
    #[serde(default)]
    pub microcode: Vec<ControlWord>,
}

impl Instruction {
    pub fn new(opcode: u64, microcode: Vec<ControlWord>) -> Self {
        Self {
            opcode,
            mnemonic: None,
            microcode,
        }
    }

    pub fn named(opcode: u64, mnemonic: &str, microcode: Vec<ControlWord>) -> Self {
        Self {
            opcode,
            mnemonic: Some(mnemonic.to_string()),
            microcode,
        }
    }
}

/// A validated opcode table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstructionSet {
    table: BTreeMap<u64, Instruction>,
}

impl InstructionSet {
    /// Build a table, rejecting duplicate opcodes.
    pub fn new(instructions: impl IntoIterator<Item = Instruction>) -> Result<Self, ConfigError> {
        let mut table = BTreeMap::new();
        for instruction in instructions {
            let opcode = instruction.opcode;
            if table.insert(opcode, instruction).is_some() {
                return Err(ConfigError::DuplicateOpcode(opcode));
            }
        }
        Ok(Self { table })
    }

    /// Check every opcode fits in the opcode half of a `bits`-wide word.
    pub fn validate(&self, bits: usize) -> Result<(), ConfigError> {
        let opcode_bits = bits / 2;
        match self.table.keys().find(|&&op| op >> opcode_bits != 0) {
            Some(&opcode) => Err(ConfigError::OpcodeOutOfRange {
                opcode,
                bits: opcode_bits,
            }),
            None => Ok(()),
        }
    }

    pub fn get(&self, opcode: u64) -> Option<&Instruction> {
        self.table.get(&opcode)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Instructions in opcode order.
    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.table.values()
    }

    /// Look an instruction up by mnemonic (case-insensitive).
    pub fn by_mnemonic(&self, name: &str) -> Option<&Instruction> {
        self.iter().find(|i| {
            i.mnemonic
                .as_deref()
                .is_some_and(|m| m.eq_ignore_ascii_case(name))
        })
    }

    /// The stock 8-bit instruction set.
    pub fn standard() -> Self {
        use ControlLine::*;

        let instructions = [
            Instruction::named(0x0, "NOP", vec![]),
            Instruction::named(0x1, "LDA", vec![InstructionOut | AddressIn, RamOut | RegAIn]),
            Instruction::named(0x2, "STA", vec![InstructionOut | AddressIn, RegAOut | RamIn]),
            Instruction::named(
                0x6,
                "ADD",
                vec![InstructionOut | AddressIn, RamOut | RegBIn, AluMode3 | AluOut | RegAIn],
            ),
            Instruction::named(
                0x7,
                "SUB",
                vec![InstructionOut | AddressIn, RamOut | RegBIn, AluOut | RegAIn],
            ),
            Instruction::named(0x9, "JMP", vec![InstructionOut | CounterIn]),
            Instruction::named(0xE, "OUT", vec![RegAOut | OutputIn]),
            Instruction::named(0xF, "HLT", vec![Halt.into()]),
        ];

        let table = instructions
            .into_iter()
            .map(|i| (i.opcode, i))
            .collect();
        Self { table }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_opcode_rejected() {
        let result = InstructionSet::new([
            Instruction::new(1, vec![]),
            Instruction::new(1, vec![ControlLine::Halt.into()]),
        ]);
        assert_eq!(result, Err(ConfigError::DuplicateOpcode(1)));
    }

    #[test]
    fn test_opcode_range() {
        let set = InstructionSet::new([Instruction::new(0x10, vec![])]).unwrap();
        assert_eq!(
            set.validate(8),
            Err(ConfigError::OpcodeOutOfRange { opcode: 0x10, bits: 4 })
        );
        assert!(set.validate(10).is_ok());
    }

    #[test]
    fn test_standard_set() {
        let set = InstructionSet::standard();
        assert_eq!(set.len(), 8);
        assert!(set.validate(8).is_ok());

        let add = set.by_mnemonic("add").unwrap();
        assert_eq!(add.opcode, 0x6);
        assert_eq!(add.microcode[2].to_string(), "AI|LO|LM3");

        assert!(set.get(0x0).unwrap().microcode.is_empty());
        assert!(set.get(0x3).is_none());
    }

    #[test]
    fn test_instruction_json() {
        let json = r#"{"opcode": 9, "mnemonic": "JMP", "microcode": [["IO", "CI"]]}"#;
        let instruction: Instruction = serde_json::from_str(json).unwrap();
        assert_eq!(
            instruction,
            Instruction::named(9, "JMP", vec![ControlLine::InstructionOut | ControlLine::CounterIn])
        );

        let bare: Instruction = serde_json::from_str(r#"{"opcode": 0}"#).unwrap();
        assert!(bare.microcode.is_empty());
        assert!(bare.mnemonic.is_none());
    }
}
