//! Accumulator arithmetic.
//!
//! The accumulator is wider than a memory word: sums may exceed 999 and are
//! only range-checked when stored back. The only operation that bounds it is
//! the decimal shift, which keeps four digits.

/// Modulus applied by the shift instruction (four decimal digits).
pub const SHIFT_MODULUS: i128 = 10_000;

/// Decimal shift: `(acc * 10^left) // 10^right mod 10000`.
///
/// `arg` is the 2-digit operand; its tens digit is the left shift and its
/// units digit the right shift. Division floors and the modulus is always
/// non-negative, so a negative accumulator comes back in `0..10000`.
pub fn shift(acc: i64, arg: u8) -> i64 {
    let left = u32::from(arg / 10);
    let right = u32::from(arg % 10);

    let widened = i128::from(acc) * 10i128.pow(left);
    let shifted = widened.div_euclid(10i128.pow(right));

    // rem_euclid with a positive modulus lands in 0..10000.
    shifted.rem_euclid(SHIFT_MODULUS) as i64
}

/// Add a memory operand to the accumulator.
#[inline]
pub fn add(acc: i64, operand: i64) -> i64 {
    acc.wrapping_add(operand)
}

/// Subtract a memory operand from the accumulator.
#[inline]
pub fn subtract(acc: i64, operand: i64) -> i64 {
    acc.wrapping_sub(operand)
}
