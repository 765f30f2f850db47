//! The contract shared by every simulated chip.

use serde::{Deserialize, Serialize};

use crate::clock::Phase;
use crate::cpu::bus::Bus;
use crate::cpu::error::ConfigError;

/// Identifies a slot on the board. The scheduler stores these rather than
/// references so the board keeps sole ownership of its components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentId {
    Control,
    RegA,
    RegB,
    Instruction,
    Counter,
    Ram,
    Address,
    Alu,
    Output,
}

/// Lifecycle every component goes through at wiring time: attach to the bus,
/// then register for the clock phases it takes part in.
pub trait Component {
    /// Human-readable name, used in errors and dumps.
    fn name(&self) -> &str;

    /// Declared width, or `None` for components not connected to the bus.
    fn width(&self) -> Option<usize>;

    /// Phases this component wants to be called in.
    fn phases(&self) -> &'static [Phase];

    /// Check the component against the bus it is being attached to.
    fn attach(&self, bus: &Bus) -> Result<(), ConfigError> {
        match self.width() {
            Some(width) if width != bus.width() => Err(ConfigError::WidthMismatch {
                component: self.name().to_string(),
                expected: bus.width(),
                actual: width,
            }),
            _ => Ok(()),
        }
    }
}
