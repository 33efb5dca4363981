use crate::error::{MathError, PoolError};
use crate::math::bit_math::{least_significant_bit, most_significant_bit};
use crate::FastMap;
use alloy_primitives::U256;

/// Compresses a tick by the spacing, flooring toward negative infinity so
/// negative non-multiples land in the word below.
pub fn compress(tick: i32, tick_spacing: i32) -> i32 {
    tick.div_euclid(tick_spacing)
}

/// Splits a compressed tick into its bitmap coordinates: word index and
/// bit position within the 256-bit word.
pub fn position(compressed: i32) -> (i16, u8) {
    ((compressed >> 8) as i16, compressed.rem_euclid(256) as u8)
}

/// Reads a bitmap word, treating absent words as zero.
pub fn get_word(bitmap: &FastMap<i16, U256>, word: i16) -> U256 {
    bitmap.get(&word).copied().unwrap_or(U256::ZERO)
}

/// Toggles the initialized bit for `tick`, which must be aligned to the
/// spacing. Words that become empty are dropped from the map.
pub fn flip_tick(
    bitmap: &mut FastMap<i16, U256>,
    tick: i32,
    tick_spacing: i32,
) -> Result<(), PoolError> {
    if tick % tick_spacing != 0 {
        return Err(PoolError::TickNotSpaced);
    }
    flip_tick_unchecked(bitmap, tick, tick_spacing);
    Ok(())
}

pub(crate) fn flip_tick_unchecked(bitmap: &mut FastMap<i16, U256>, tick: i32, tick_spacing: i32) {
    let (word_pos, bit_pos) = position(tick / tick_spacing);
    let word = get_word(bitmap, word_pos) ^ (U256::ONE << bit_pos);
    if word.is_zero() {
        bitmap.remove(&word_pos);
    } else {
        bitmap.insert(word_pos, word);
    }
}

/// Finds the next initialized tick in the word holding `tick` (searching
/// down when `lte`, otherwise up from the next compressed tick).
///
/// When the word holds no initialized tick in the scan direction, the
/// returned tick is the word boundary and `initialized` is false, which
/// lets a swap skip the whole word in one step. The returned tick is
/// always a multiple of the spacing.
pub fn next_initialized_tick_within_one_word(
    bitmap: &FastMap<i16, U256>,
    tick: i32,
    tick_spacing: i32,
    lte: bool,
) -> Result<(i32, bool), MathError> {
    let compressed = compress(tick, tick_spacing);

    if lte {
        let (word_pos, bit_pos) = position(compressed);
        // bits at or below the current position
        let mask = (U256::ONE << bit_pos) - U256::ONE | (U256::ONE << bit_pos);
        let masked = get_word(bitmap, word_pos) & mask;

        if masked.is_zero() {
            return Ok(((compressed - bit_pos as i32) * tick_spacing, false));
        }
        let msb = most_significant_bit(masked)?;
        Ok(((compressed - (bit_pos - msb) as i32) * tick_spacing, true))
    } else {
        let (word_pos, bit_pos) = position(compressed + 1);
        // bits at or above the next position
        let mask = !((U256::ONE << bit_pos) - U256::ONE);
        let masked = get_word(bitmap, word_pos) & mask;

        if masked.is_zero() {
            return Ok((
                (compressed + 1 + (255 - bit_pos) as i32) * tick_spacing,
                false,
            ));
        }
        let lsb = least_significant_bit(masked)?;
        Ok((
            (compressed + 1 + (lsb - bit_pos) as i32) * tick_spacing,
            true,
        ))
    }
}
