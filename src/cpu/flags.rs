//! Control lines and control words.
//!
//! A control word is the set of lines the control logic asserts for one
//! tick. Each line toggles exactly one property on exactly one component.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use serde::{Deserialize, Serialize};

/// A single named control line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ControlLine {
    /// Register A captures the bus.
    #[serde(rename = "AI")]
    RegAIn,
    /// Register A drives the bus.
    #[serde(rename = "AO")]
    RegAOut,
    #[serde(rename = "BI")]
    RegBIn,
    #[serde(rename = "BO")]
    RegBOut,
    /// Instruction register captures the bus.
    #[serde(rename = "II")]
    InstructionIn,
    /// Instruction register drives its operand half.
    #[serde(rename = "IO")]
    InstructionOut,
    /// RAM stores the bus at the current address.
    #[serde(rename = "RI")]
    RamIn,
    /// RAM drives the word at the current address.
    #[serde(rename = "RO")]
    RamOut,
    /// Address controller latches the bus into the RAM address.
    #[serde(rename = "MI")]
    AddressIn,
    #[serde(rename = "LO")]
    AluOut,
    #[serde(rename = "LM1")]
    AluMode1,
    #[serde(rename = "LM2")]
    AluMode2,
    #[serde(rename = "LM3")]
    AluMode3,
    /// Program counter increments this tick.
    #[serde(rename = "CE")]
    CounterEnable,
    /// Program counter loads from the bus (jump).
    #[serde(rename = "CI")]
    CounterIn,
    #[serde(rename = "CO")]
    CounterOut,
    /// Output register captures the bus.
    #[serde(rename = "OI")]
    OutputIn,
    /// Stop the clock for good.
    #[serde(rename = "HLT")]
    Halt,
}

impl ControlLine {
    /// Every line, in bit order.
    pub const ALL: [ControlLine; 18] = [
        ControlLine::RegAIn,
        ControlLine::RegAOut,
        ControlLine::RegBIn,
        ControlLine::RegBOut,
        ControlLine::InstructionIn,
        ControlLine::InstructionOut,
        ControlLine::RamIn,
        ControlLine::RamOut,
        ControlLine::AddressIn,
        ControlLine::AluOut,
        ControlLine::AluMode1,
        ControlLine::AluMode2,
        ControlLine::AluMode3,
        ControlLine::CounterEnable,
        ControlLine::CounterIn,
        ControlLine::CounterOut,
        ControlLine::OutputIn,
        ControlLine::Halt,
    ];

    /// The bit this line occupies in a [`ControlWord`].
    pub const fn bit(self) -> u32 {
        match self {
            ControlLine::RegAIn => 0x01,
            ControlLine::RegAOut => 0x02,
            ControlLine::RegBIn => 0x04,
            ControlLine::RegBOut => 0x08,
            ControlLine::InstructionIn => 0x10,
            ControlLine::InstructionOut => 0x20,
            ControlLine::RamIn => 0x00_40,
            ControlLine::RamOut => 0x00_80,
            ControlLine::AddressIn => 0x01_00,
            ControlLine::AluOut => 0x02_00,
            ControlLine::AluMode1 => 0x04_00,
            ControlLine::AluMode2 => 0x08_00,
            ControlLine::AluMode3 => 0x10_00,
            ControlLine::CounterEnable => 0x20_00,
            ControlLine::CounterIn => 0x40_00,
            ControlLine::CounterOut => 0x80_00,
            ControlLine::OutputIn => 0x10_00_00,
            ControlLine::Halt => 0x20_00_00,
        }
    }

    /// Short name used in dumps and configuration files.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            ControlLine::RegAIn => "AI",
            ControlLine::RegAOut => "AO",
            ControlLine::RegBIn => "BI",
            ControlLine::RegBOut => "BO",
            ControlLine::InstructionIn => "II",
            ControlLine::InstructionOut => "IO",
            ControlLine::RamIn => "RI",
            ControlLine::RamOut => "RO",
            ControlLine::AddressIn => "MI",
            ControlLine::AluOut => "LO",
            ControlLine::AluMode1 => "LM1",
            ControlLine::AluMode2 => "LM2",
            ControlLine::AluMode3 => "LM3",
            ControlLine::CounterEnable => "CE",
            ControlLine::CounterIn => "CI",
            ControlLine::CounterOut => "CO",
            ControlLine::OutputIn => "OI",
            ControlLine::Halt => "HLT",
        }
    }

    /// Name of the component this line drives.
    pub const fn component(self) -> &'static str {
        match self {
            ControlLine::RegAIn | ControlLine::RegAOut => "register A",
            ControlLine::RegBIn | ControlLine::RegBOut => "register B",
            ControlLine::InstructionIn | ControlLine::InstructionOut => "instruction register",
            ControlLine::RamIn | ControlLine::RamOut => "RAM",
            ControlLine::AddressIn => "RAM address controller",
            ControlLine::AluOut
            | ControlLine::AluMode1
            | ControlLine::AluMode2
            | ControlLine::AluMode3 => "ALU",
            ControlLine::CounterEnable | ControlLine::CounterIn | ControlLine::CounterOut => {
                "program counter"
            }
            ControlLine::OutputIn => "output register",
            ControlLine::Halt => "clock",
        }
    }

    /// Lines whose component may legitimately be left unconnected.
    pub const fn is_optional(self) -> bool {
        matches!(self, ControlLine::OutputIn)
    }

    /// Look a line up by its mnemonic (case-insensitive).
    pub fn from_mnemonic(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|line| line.mnemonic().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for ControlLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A set of control lines asserted together for one tick.
///
/// Serialized as the list of line mnemonics, e.g. `["IO", "MI"]`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<ControlLine>", into = "Vec<ControlLine>")]
pub struct ControlWord(u32);

impl ControlWord {
    /// No lines asserted.
    pub const EMPTY: ControlWord = ControlWord(0);

    /// Counter onto the bus, bus into the RAM address.
    pub const LOOKUP: ControlWord =
        ControlWord(ControlLine::CounterOut.bit() | ControlLine::AddressIn.bit());

    /// RAM into the instruction register, counter advances.
    pub const FETCH: ControlWord = ControlWord(
        ControlLine::RamOut.bit() | ControlLine::InstructionIn.bit() | ControlLine::CounterEnable.bit(),
    );

    /// Every bit that belongs to some control line.
    pub const VALID_BITS: u32 = {
        let mut bits = 0;
        let mut i = 0;
        while i < ControlLine::ALL.len() {
            bits |= ControlLine::ALL[i].bit();
            i += 1;
        }
        bits
    };

    /// Build a word from raw bits. Bits that match no line are dropped.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & Self::VALID_BITS)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, line: ControlLine) -> bool {
        self.0 & line.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn with(self, line: ControlLine) -> Self {
        Self(self.0 | line.bit())
    }

    /// Asserted lines in bit order.
    pub fn lines(self) -> impl Iterator<Item = ControlLine> {
        ControlLine::ALL
            .into_iter()
            .filter(move |line| self.contains(*line))
    }
}

impl From<ControlLine> for ControlWord {
    fn from(line: ControlLine) -> Self {
        Self(line.bit())
    }
}

impl From<Vec<ControlLine>> for ControlWord {
    fn from(lines: Vec<ControlLine>) -> Self {
        lines.into_iter().collect()
    }
}

impl From<ControlWord> for Vec<ControlLine> {
    fn from(word: ControlWord) -> Self {
        word.lines().collect()
    }
}

impl FromIterator<ControlLine> for ControlWord {
    fn from_iter<I: IntoIterator<Item = ControlLine>>(iter: I) -> Self {
        iter.into_iter()
            .fold(ControlWord::EMPTY, |word, line| word.with(line))
    }
}

impl BitOr for ControlLine {
    type Output = ControlWord;

    fn bitor(self, rhs: ControlLine) -> ControlWord {
        ControlWord(self.bit() | rhs.bit())
    }
}

impl BitOr<ControlLine> for ControlWord {
    type Output = ControlWord;

    fn bitor(self, rhs: ControlLine) -> ControlWord {
        self.with(rhs)
    }
}

impl BitOr for ControlWord {
    type Output = ControlWord;

    fn bitor(self, rhs: ControlWord) -> ControlWord {
        ControlWord(self.0 | rhs.0)
    }
}

impl BitOrAssign<ControlLine> for ControlWord {
    fn bitor_assign(&mut self, rhs: ControlLine) {
        *self = self.with(rhs);
    }
}

impl fmt::Display for ControlWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("-");
        }
        for (i, line) in self.lines().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            f.write_str(line.mnemonic())?;
        }
        Ok(())
    }
}

impl fmt::Debug for ControlWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ControlWord({})", self)
    }
}
