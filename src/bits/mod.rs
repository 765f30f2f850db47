//! Boolean signal vectors.
//!
//! Every register, RAM word and the bus itself is a slice of `bool` lines.
//! Index 0 is the most significant bit and index `len - 1` the least
//! significant one.
//!
//! - [`convert`] - integer conversion and formatting
//! - [`arith`] - bitwise logic and ripple-carry arithmetic

pub mod convert;
pub mod arith;

pub use convert::{format_bits, from_int, mask, to_bits, to_int};
pub use arith::{add, and, or, subtract, xor};
