//! The shared signal bus.

use serde::{Deserialize, Serialize};

use crate::bits;

/// A fixed-width vector of signal lines shared by every data-path component.
///
/// The bus does no arbitration of its own. Ordering between drivers and
/// readers comes entirely from the clock phases, and a tick is expected to
/// have at most one driver.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bus {
    lines: Vec<bool>,
}

impl Bus {
    /// Create a bus with `width` lines, all low.
    pub fn new(width: usize) -> Self {
        Self {
            lines: vec![false; width],
        }
    }

    /// Number of lines.
    #[inline]
    pub fn width(&self) -> usize {
        self.lines.len()
    }

    #[inline]
    pub fn lines(&self) -> &[bool] {
        &self.lines
    }

    #[inline]
    pub fn lines_mut(&mut self) -> &mut [bool] {
        &mut self.lines
    }

    /// Current lines as an integer (MSB first).
    pub fn value(&self) -> u64 {
        bits::to_int(&self.lines)
    }

    /// Drive an integer onto the lines, truncated to the bus width.
    pub fn store(&mut self, value: u64) {
        bits::from_int(value, &mut self.lines);
    }

    /// Copy a vector of the same width onto the lines.
    pub fn drive(&mut self, source: &[bool]) {
        self.lines.copy_from_slice(source);
    }
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bus({} = 0x{:02X})", bits::format_bits(&self.lines), self.value())
    }
}
