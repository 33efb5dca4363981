use crate::error::MathError;
use alloy_primitives::U256;

/// Index (0-255) of the highest set bit of `x`, or `MathError::ZeroValue`
/// when `x` is zero.
pub fn most_significant_bit(x: U256) -> Result<u8, MathError> {
    if x.is_zero() {
        return Err(MathError::ZeroValue);
    }
    Ok((255 - x.leading_zeros()) as u8)
}

/// Index (0-255) of the lowest set bit of `x`, or `MathError::ZeroValue`
/// when `x` is zero.
///
/// Used when scanning bitmap words upward for the first initialized tick.
pub fn least_significant_bit(x: U256) -> Result<u8, MathError> {
    if x.is_zero() {
        return Err(MathError::ZeroValue);
    }
    Ok(x.trailing_zeros() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn msb_rejects_zero() {
        assert!(matches!(most_significant_bit(U256::ZERO), Err(MathError::ZeroValue)));
    }

    #[test]
    fn msb_of_powers_of_two() {
        for bit in [0usize, 1, 7, 63, 64, 128, 255] {
            assert_eq!(most_significant_bit(U256::ONE << bit).unwrap(), bit as u8);
        }
    }

    #[test]
    fn msb_ignores_lower_bits() {
        // 1001_0100: highest bit is 7
        assert_eq!(most_significant_bit(U256::from(0b1001_0100u64)).unwrap(), 7);
    }

    #[test]
    fn msb_of_max() {
        assert_eq!(most_significant_bit(U256::MAX).unwrap(), 255);
    }

    #[test]
    fn lsb_rejects_zero() {
        assert!(matches!(least_significant_bit(U256::ZERO), Err(MathError::ZeroValue)));
    }

    #[test]
    fn lsb_of_powers_of_two() {
        for bit in [0usize, 1, 12, 63, 64, 128, 255] {
            assert_eq!(least_significant_bit(U256::ONE << bit).unwrap(), bit as u8);
        }
    }

    #[test]
    fn lsb_ignores_higher_bits() {
        // 1011001000: lowest bit is 3
        assert_eq!(least_significant_bit(U256::from(0b1011001000u64)).unwrap(), 3);
    }

    #[test]
    fn lsb_of_max() {
        assert_eq!(least_significant_bit(U256::MAX).unwrap(), 0);
    }
}
