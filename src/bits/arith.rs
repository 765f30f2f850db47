//! Bitwise logic and ripple-carry arithmetic over boolean vectors.
//!
//! All functions write into `result`, which must be as long as both
//! operands. Arithmetic returns the carry out of the most significant bit.

/// `result = a & b`
pub fn and(a: &[bool], b: &[bool], result: &mut [bool]) {
    for ((r, &x), &y) in result.iter_mut().zip(a).zip(b) {
        *r = x & y;
    }
}

/// `result = a | b`
pub fn or(a: &[bool], b: &[bool], result: &mut [bool]) {
    for ((r, &x), &y) in result.iter_mut().zip(a).zip(b) {
        *r = x | y;
    }
}

/// `result = a ^ b`
pub fn xor(a: &[bool], b: &[bool], result: &mut [bool]) {
    for ((r, &x), &y) in result.iter_mut().zip(a).zip(b) {
        *r = x ^ y;
    }
}

/// Ripple-carry addition with an explicit carry in.
///
/// The result is cleared first, then each position from the least
/// significant end computes `x = a ^ b`, its sum bit `x ^ carry` and the
/// carry passed upwards `(a & b) | (x & carry)`.
pub fn add_with_carry(a: &[bool], b: &[bool], carry_in: bool, result: &mut [bool]) -> bool {
    result.fill(false);

    let mut carry = carry_in;
    for i in (0..result.len()).rev() {
        let x = a[i] ^ b[i];
        result[i] = x ^ carry;
        carry = (a[i] & b[i]) | (x & carry);
    }
    carry
}

/// `result = a + b` modulo `2^len`, returning the carry out.
#[inline]
pub fn add(a: &[bool], b: &[bool], result: &mut [bool]) -> bool {
    add_with_carry(a, b, false, result)
}

/// `result = a - b` modulo `2^len`.
///
/// Two's complement: adds the inverted subtrahend with a carry in of one.
/// The returned carry is set when no borrow occurred (`a >= b`).
pub fn subtract(a: &[bool], b: &[bool], result: &mut [bool]) -> bool {
    let inverted: Vec<bool> = b.iter().map(|&bit| !bit).collect();
    add_with_carry(a, &inverted, true, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::{mask, to_bits, to_int};
    use proptest::prelude::*;

    fn binary(op: fn(&[bool], &[bool], &mut [bool]) -> bool, a: u64, b: u64, width: usize) -> (u64, bool) {
        let mut result = vec![true; width];
        let carry = op(&to_bits(a, width), &to_bits(b, width), &mut result);
        (to_int(&result), carry)
    }

    fn logic(op: fn(&[bool], &[bool], &mut [bool]), a: u64, b: u64, width: usize) -> u64 {
        let mut result = vec![false; width];
        op(&to_bits(a, width), &to_bits(b, width), &mut result);
        to_int(&result)
    }

    #[test]
    fn test_add_basic() {
        assert_eq!(binary(add, 100, 50, 8), (150, false));
        assert_eq!(binary(add, 0, 0, 8), (0, false));
    }

    #[test]
    fn test_add_wraps() {
        assert_eq!(binary(add, 255, 1, 8), (0, true));
        assert_eq!(binary(add, 200, 100, 8), (44, true));
        assert_eq!(binary(add, 15, 1, 4), (0, true));
    }

    #[test]
    fn test_subtract() {
        assert_eq!(binary(subtract, 100, 30, 8), (70, true));
        assert_eq!(binary(subtract, 7, 7, 8), (0, true));
    }

    #[test]
    fn test_subtract_wraps() {
        assert_eq!(binary(subtract, 0, 1, 8), (255, false));
        assert_eq!(binary(subtract, 3, 5, 4), (14, false));
    }

    #[test]
    fn test_add_clears_stale_result() {
        // the result buffer starts all ones in `binary`
        assert_eq!(binary(add, 1, 2, 8).0, 3);
    }

    #[test]
    fn test_logic_ops() {
        assert_eq!(logic(and, 0b1100, 0b1010, 4), 0b1000);
        assert_eq!(logic(or, 0b1100, 0b1010, 4), 0b1110);
        assert_eq!(logic(xor, 0b1100, 0b1010, 4), 0b0110);
    }

    proptest! {
        #[test]
        fn prop_add_matches_wrapping(a in 0u64..256, b in 0u64..256) {
            let (sum, carry) = binary(add, a, b, 8);
            prop_assert_eq!(sum, (a + b) & mask(8));
            prop_assert_eq!(carry, a + b > 255);
        }

        #[test]
        fn prop_subtract_matches_wrapping(a in 0u64..256, b in 0u64..256) {
            let (diff, _) = binary(subtract, a, b, 8);
            prop_assert_eq!(diff, a.wrapping_sub(b) & mask(8));
        }

        #[test]
        fn prop_arith_any_even_width(width in (1usize..=8).prop_map(|w| w * 2), a in any::<u64>(), b in any::<u64>()) {
            let (a, b) = (a & mask(width), b & mask(width));
            prop_assert_eq!(binary(add, a, b, width).0, a.wrapping_add(b) & mask(width));
            prop_assert_eq!(binary(subtract, a, b, width).0, a.wrapping_sub(b) & mask(width));
        }

        #[test]
        fn prop_logic_is_bitwise(a in 0u64..256, b in 0u64..256) {
            prop_assert_eq!(logic(and, a, b, 8), a & b);
            prop_assert_eq!(logic(or, a, b, 8), a | b);
            prop_assert_eq!(logic(xor, a, b, 8), a ^ b);
        }

        #[test]
        fn prop_logic_commutative_idempotent(a in 0u64..256, b in 0u64..256) {
            prop_assert_eq!(logic(and, a, b, 8), logic(and, b, a, 8));
            prop_assert_eq!(logic(or, a, b, 8), logic(or, b, a, 8));
            prop_assert_eq!(logic(xor, a, b, 8), logic(xor, b, a, 8));
            prop_assert_eq!(logic(and, a, a, 8), a);
            prop_assert_eq!(logic(or, a, a, 8), a);
            prop_assert_eq!(logic(xor, a, a, 8), 0);
        }
    }
}
