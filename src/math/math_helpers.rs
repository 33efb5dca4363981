use crate::error::MathError;
use alloy_primitives::U256;

/// Computes `floor(a * b / denominator)` with a full 512-bit intermediate
/// product, returning a `MathError` on overflow or division by zero.
///
/// Every price/amount conversion in the crate depends on this being exact;
/// the 512-bit product is never narrowed before the division.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }

    // 512-bit product of a and b as prod1 * 2^256 + prod0.
    let prod0 = a.wrapping_mul(b);
    let mm = a.mul_mod(b, U256::MAX);
    let mut prod1 = mm.wrapping_sub(prod0);
    if mm < prod0 {
        prod1 = prod1.wrapping_sub(U256::ONE);
    }

    if prod1.is_zero() {
        return Ok(prod0 / denominator);
    }

    if prod1 >= denominator {
        return Err(MathError::Overflow);
    }

    // Make the 512-bit value exactly divisible by subtracting the remainder.
    let remainder = a.mul_mod(b, denominator);
    if remainder > prod0 {
        prod1 = prod1.wrapping_sub(U256::ONE);
    }
    let mut prod0 = prod0.wrapping_sub(remainder);

    // Strip the largest power of two from the denominator and fold the
    // matching high bits of the product into the low word.
    let twos = denominator & denominator.wrapping_neg();
    let denominator = denominator / twos;
    prod0 /= twos;
    let carry_shift = twos.wrapping_neg() / twos + U256::ONE;
    prod0 |= prod1.wrapping_mul(carry_shift);

    // Invert the now-odd denominator modulo 2^256. Six Newton iterations
    // double the correct bits from 4 past 256.
    let mut inverse = U256::from(3u8).wrapping_mul(denominator) ^ U256::from(2u8);
    for _ in 0..6 {
        inverse = inverse.wrapping_mul(U256::from(2u8).wrapping_sub(denominator.wrapping_mul(inverse)));
    }

    Ok(prod0.wrapping_mul(inverse))
}

/// Like [`mul_div`], but rounds up when the division leaves a remainder.
/// Fails with `MathError::Overflow` if the rounded result would not fit.
pub fn mul_div_rounding_up(a: U256, b: U256, denominator: U256) -> Result<U256, MathError> {
    let result = mul_div(a, b, denominator)?;

    if a.mul_mod(b, denominator).is_zero() {
        return Ok(result);
    }
    if result == U256::MAX {
        return Err(MathError::Overflow);
    }
    Ok(result + U256::ONE)
}

/// Divides `a` by `b`, rounding up on a non-zero remainder.
///
/// Panics on `b == 0`, mirroring primitive integer division; callers must
/// rule that out.
pub fn div_rounding_up(a: U256, b: U256) -> U256 {
    let (quotient, remainder) = a.div_rem(b);
    if remainder.is_zero() {
        quotient
    } else {
        quotient + U256::ONE
    }
}
