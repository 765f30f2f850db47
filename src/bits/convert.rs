//! Conversion between boolean vectors and integers.
//!
//! The bit order is big-endian: `bits[0]` carries `2^(len-1)`, the last
//! element carries `2^0`. Both directions keep that convention, so
//! `from_int(to_int(v))` reproduces `v` and `to_int(from_int(k))` is
//! `k mod 2^len`.

/// All-ones mask for a value of `width` bits.
#[inline]
pub const fn mask(width: usize) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Interpret a boolean vector as an unsigned integer.
pub fn to_int(bits: &[bool]) -> u64 {
    bits.iter()
        .fold(0u64, |acc, &bit| (acc << 1) | u64::from(bit))
}

/// Write `value` into `bits`, truncating to the slice width.
pub fn from_int(value: u64, bits: &mut [bool]) {
    let width = bits.len();
    for (i, bit) in bits.iter_mut().enumerate() {
        let shift = width - 1 - i;
        *bit = shift < 64 && (value >> shift) & 1 == 1;
    }
}

/// Build a new boolean vector of `width` bits holding `value`.
pub fn to_bits(value: u64, width: usize) -> Vec<bool> {
    let mut bits = vec![false; width];
    from_int(value, &mut bits);
    bits
}

/// Render a vector as `0`/`1` characters, grouped in nibbles from the
/// least significant end.
pub fn format_bits(bits: &[bool]) -> String {
    let mut out = String::with_capacity(bits.len() + bits.len() / 4);
    for (i, &bit) in bits.iter().enumerate() {
        if i > 0 && (bits.len() - i) % 4 == 0 {
            out.push('_');
        }
        out.push(if bit { '1' } else { '0' });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_msb_first() {
        assert_eq!(to_int(&[true, false, false, false]), 8);
        assert_eq!(to_int(&[false, false, false, true]), 1);
        assert_eq!(to_bits(6, 4), vec![false, true, true, false]);
    }

    #[test]
    fn test_truncates_to_width() {
        assert_eq!(to_int(&to_bits(0x1ff, 8)), 0xff);
        assert_eq!(to_int(&to_bits(256, 8)), 0);
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask(0), 0);
        assert_eq!(mask(4), 0xf);
        assert_eq!(mask(8), 0xff);
        assert_eq!(mask(64), u64::MAX);
    }

    #[test]
    fn test_format_bits() {
        assert_eq!(format_bits(&to_bits(0xa5, 8)), "1010_0101");
        assert_eq!(format_bits(&to_bits(5, 6)), "00_0101");
        assert_eq!(format_bits(&[]), "");
    }

    proptest! {
        #[test]
        fn prop_vector_roundtrip(bits in proptest::collection::vec(any::<bool>(), 1..=16)) {
            let width = bits.len();
            prop_assert_eq!(to_bits(to_int(&bits), width), bits);
        }

        #[test]
        fn prop_integer_roundtrip(value in any::<u64>(), width in 1usize..=16) {
            prop_assert_eq!(to_int(&to_bits(value, width)), value & mask(width));
        }
    }
}
