//! Loading and inspecting programs.

pub mod disasm;
pub mod image;

pub use disasm::{disassemble, disassemble_word};
pub use image::{ImageError, ProgramImage, Segment};
