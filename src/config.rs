//! JSON machine configuration.
//!
//! ```json
//! {
//!   "bits": 8,
//!   "interval_ms": 250,
//!   "instructions": [
//!     { "opcode": 1, "mnemonic": "LDA", "microcode": [["IO", "MI"], ["RO", "AI"]] }
//!   ]
//! }
//! ```
//!
//! Every field is optional; omitted fields fall back to the standard 8-bit
//! machine.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::DEFAULT_INTERVAL;
use crate::cpu::{ConfigError, Instruction, InstructionSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    pub bits: usize,
    pub interval_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<Vec<Instruction>>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            bits: 8,
            interval_ms: DEFAULT_INTERVAL.as_millis() as u64,
            instructions: None,
        }
    }
}

impl MachineConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigFileError> {
        serde_json::from_str(text).map_err(|e| ConfigFileError::Json(e.to_string()))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigFileError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigFileError::Io(e.to_string()))?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> String {
        // Plain data with string keys; serialization cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// The configured instruction table, or the standard one.
    pub fn instruction_set(&self) -> Result<InstructionSet, ConfigError> {
        match &self.instructions {
            Some(list) => InstructionSet::new(list.iter().cloned()),
            None => Ok(InstructionSet::standard()),
        }
    }
}

/// Errors from reading a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigFileError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("invalid configuration: {0}")]
    Json(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::ControlLine;

    #[test]
    fn test_defaults() {
        let config = MachineConfig::from_json("{}").unwrap();
        assert_eq!(config, MachineConfig::default());
        assert_eq!(config.interval(), DEFAULT_INTERVAL);
        assert_eq!(config.instruction_set().unwrap(), InstructionSet::standard());
    }

    #[test]
    fn test_custom_table() {
        let config = MachineConfig::from_json(
            r#"{
                "bits": 10,
                "interval_ms": 5,
                "instructions": [
                    { "opcode": 1, "mnemonic": "LDA", "microcode": [["IO", "MI"], ["RO", "AI"]] },
                    { "opcode": 31, "microcode": [["HLT"]] }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.bits, 10);
        let set = config.instruction_set().unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.get(31).unwrap().microcode[0].contains(ControlLine::Halt));
        assert!(set.validate(config.bits).is_ok());
    }

    #[test]
    fn test_duplicate_opcode_in_file() {
        let config = MachineConfig::from_json(
            r#"{ "instructions": [ { "opcode": 2 }, { "opcode": 2 } ] }"#,
        )
        .unwrap();
        assert_eq!(config.instruction_set(), Err(ConfigError::DuplicateOpcode(2)));
    }

    #[test]
    fn test_bad_json() {
        let err = MachineConfig::from_json(r#"{ "instructions": [ { "opcode": 1, "microcode": [["ZZ"]] } ] }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigFileError::Json(_)));
    }

    #[test]
    fn test_round_trip_text() {
        let config = MachineConfig {
            instructions: Some(InstructionSet::standard().iter().cloned().collect()),
            ..MachineConfig::default()
        };
        let parsed = MachineConfig::from_json(&config.to_json()).unwrap();
        assert_eq!(parsed, config);
    }
}
