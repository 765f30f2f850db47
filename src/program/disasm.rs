//! Disassembler: machine words back to mnemonics.

use crate::bits;
use crate::cpu::{ControlLine, InstructionSet};

/// Render one word against an instruction set.
///
/// Instructions whose microcode reads the operand (`IO`) show it; others show
/// the mnemonic alone. Unknown opcodes render as `??? 0xNN`.
pub fn disassemble_word(word: u64, bits: usize, set: &InstructionSet) -> String {
    let half = bits / 2;
    let opcode = (word & bits::mask(bits)) >> half;
    let operand = word & bits::mask(half);
    let digits = half.div_ceil(4).max(1);

    match set.get(opcode) {
        Some(instruction) => {
            let name = instruction
                .mnemonic
                .clone()
                .unwrap_or_else(|| format!("OP{:X}", opcode));
            let uses_operand = instruction
                .microcode
                .iter()
                .any(|word| word.contains(ControlLine::InstructionOut));
            if uses_operand {
                format!("{} 0x{:0width$X}", name, operand, width = digits)
            } else {
                name
            }
        }
        None => format!("??? 0x{:0width$X}", word, width = (bits.div_ceil(4)).max(1)),
    }
}

/// Disassemble a run of words loaded at `origin`, one line per word.
pub fn disassemble(words: &[u64], origin: usize, bits: usize, set: &InstructionSet) -> String {
    let digits = bits.div_ceil(4).max(1);
    let mut output = String::new();
    output.push_str("; VComputer Disassembly\n");
    output.push_str("; ---------------------\n\n");

    for (i, &word) in words.iter().enumerate() {
        let line = disassemble_word(word, bits, set);
        output.push_str(&format!(
            "{:0width$X}: {:<12} ; {:0width$X}\n",
            origin.saturating_add(i),
            line,
            word,
            width = digits
        ));
    }

    output
}
