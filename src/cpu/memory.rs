//! RAM and its address controller.
//!
//! RAM holds 2^N words of N bits. It reads and writes whatever the address
//! controller last latched; the controller runs in the latch phase so a new
//! address is in place before RAM captures in the same tick.

use serde::{Deserialize, Serialize};

use crate::bits;
use crate::clock::Phase;
use crate::cpu::bus::Bus;
use crate::cpu::component::Component;
use crate::cpu::error::ConfigError;
use crate::program::ProgramImage;

/// Word-addressed random access memory.
#[derive(Clone, Serialize, Deserialize)]
pub struct Ram {
    width: usize,
    cells: Vec<u64>,
    address: usize,
    /// Store the bus at the current address.
    pub input: bool,
    /// Drive the word at the current address.
    pub output: bool,
}

impl Ram {
    /// Create a zeroed RAM of `2^width` words.
    pub fn new(width: usize) -> Self {
        Self {
            width,
            cells: vec![0; 1usize << width],
            address: 0,
            input: false,
            output: false,
        }
    }

    /// Number of words.
    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    pub fn address(&self) -> usize {
        self.address
    }

    /// Latch a new address, wrapping into range.
    pub fn set_address(&mut self, address: u64) {
        self.address = (address as usize) % self.cells.len();
    }

    /// Read a word directly (front-end use).
    ///
    /// # Panics
    /// Panics if address is out of range.
    #[inline]
    pub fn read(&self, address: usize) -> u64 {
        assert!(address < self.cells.len(), "RAM address {} out of range (0-{})", address, self.cells.len() - 1);
        self.cells[address]
    }

    /// Write a word directly, masked to the word width.
    ///
    /// # Panics
    /// Panics if address is out of range.
    #[inline]
    pub fn write(&mut self, address: usize, value: u64) {
        assert!(address < self.cells.len(), "RAM address {} out of range (0-{})", address, self.cells.len() - 1);
        self.cells[address] = value & bits::mask(self.width);
    }

    /// Word at the latched address.
    pub fn current(&self) -> u64 {
        self.cells[self.address]
    }

    /// Copy a program image into memory. Values are masked to the word width.
    pub fn load_image(&mut self, image: &ProgramImage) -> Result<(), ConfigError> {
        for (address, _) in image.cells() {
            if address >= self.cells.len() {
                return Err(ConfigError::ImageOverflow {
                    address,
                    capacity: self.cells.len(),
                });
            }
        }

        let mask = bits::mask(self.width);
        for (address, value) in image.cells() {
            self.cells[address] = value & mask;
        }
        Ok(())
    }

    /// Clear every word and reset the address.
    pub fn clear(&mut self) {
        self.cells.fill(0);
        self.address = 0;
    }

    /// `count` words starting at `start`, clipped to the end of memory.
    pub fn dump(&self, start: usize, count: usize) -> Vec<(usize, u64)> {
        let end = start.saturating_add(count).min(self.cells.len());
        (start.min(end)..end)
            .map(|i| (i, self.cells[i]))
            .collect()
    }

    pub fn capture(&mut self, bus: &Bus) {
        if self.input {
            self.cells[self.address] = bus.value();
        }
    }

    pub fn drive(&self, bus: &mut Bus) {
        if self.output {
            bus.store(self.cells[self.address]);
        }
    }
}

impl Component for Ram {
    fn name(&self) -> &str {
        "RAM"
    }

    fn width(&self) -> Option<usize> {
        Some(self.width)
    }

    fn phases(&self) -> &'static [Phase] {
        &[Phase::Write, Phase::Read]
    }
}

impl std::fmt::Debug for Ram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only count non-zero cells
        let non_zero = self.cells.iter().filter(|&&cell| cell != 0).count();

        f.debug_struct("Ram")
            .field("address", &self.address)
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &self.cells.len())
            .finish()
    }
}

/// Memory address register: latches the bus into RAM's address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressController {
    width: usize,
    /// Latch the bus into the RAM address this tick.
    pub input: bool,
}

impl AddressController {
    pub fn new(width: usize) -> Self {
        Self { width, input: false }
    }

    /// Latch phase.
    pub fn capture(&self, bus: &Bus, ram: &mut Ram) {
        if self.input {
            ram.set_address(bus.value());
        }
    }
}

impl Component for AddressController {
    fn name(&self) -> &str {
        "RAM address controller"
    }

    fn width(&self) -> Option<usize> {
        Some(self.width)
    }

    fn phases(&self) -> &'static [Phase] {
        &[Phase::Latch]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ram_size() {
        assert_eq!(Ram::new(8).capacity(), 256);
        assert_eq!(Ram::new(4).capacity(), 16);
    }

    #[test]
    fn test_ram_read_write() {
        let mut ram = Ram::new(8);
        ram.write(10, 42);
        assert_eq!(ram.read(10), 42);

        ram.write(11, 0x1FF);
        assert_eq!(ram.read(11), 0xFF);
    }

    #[test]
    #[should_panic]
    fn test_ram_bounds() {
        let ram = Ram::new(4);
        ram.read(16);
    }

    #[test]
    fn test_bus_transfer_uses_latched_address() {
        let mut bus = Bus::new(8);
        let mut ram = Ram::new(8);
        let mut mar = AddressController::new(8);

        bus.store(0x20);
        mar.input = true;
        mar.capture(&bus, &mut ram);
        assert_eq!(ram.address(), 0x20);

        bus.store(99);
        ram.input = true;
        ram.capture(&bus);
        assert_eq!(ram.read(0x20), 99);

        bus.store(0);
        ram.output = true;
        ram.drive(&mut bus);
        assert_eq!(bus.value(), 99);
    }

    #[test]
    fn test_address_controller_idle() {
        let mut bus = Bus::new(8);
        let mut ram = Ram::new(8);
        let mar = AddressController::new(8);
        bus.store(5);
        mar.capture(&bus, &mut ram);
        assert_eq!(ram.address(), 0);
    }

    #[test]
    fn test_load_image() {
        let mut ram = Ram::new(8);
        let mut image = ProgramImage::from_words(vec![1, 2, 3]);
        image.push_segment(0x80, vec![0x1FF]);

        ram.load_image(&image).unwrap();
        assert_eq!(ram.dump(0, 4), vec![(0, 1), (1, 2), (2, 3), (3, 0)]);
        assert_eq!(ram.read(0x80), 0xFF);
    }

    #[test]
    fn test_load_image_overflow() {
        let mut ram = Ram::new(4);
        let image = ProgramImage::from_words(vec![0; 17]);
        assert_eq!(
            ram.load_image(&image),
            Err(ConfigError::ImageOverflow { address: 16, capacity: 16 })
        );
        // nothing written on failure
        assert!(ram.dump(0, 16).iter().all(|&(_, v)| v == 0));
    }
}
