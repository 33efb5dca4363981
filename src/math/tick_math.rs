use crate::error::StateError;
use crate::Q128;
use alloy_primitives::{I256, U256};

/// Lowest tick representable: log base sqrt(1.0001) of 2^-128.
pub const MIN_TICK: i32 = -887272;
/// Highest tick representable.
pub const MAX_TICK: i32 = -MIN_TICK;

/// `get_sqrt_ratio_at_tick(MIN_TICK)`.
pub const MIN_SQRT_RATIO: U256 = U256::from_limbs([4295128739, 0, 0, 0]);
/// `get_sqrt_ratio_at_tick(MAX_TICK)`.
pub const MAX_SQRT_RATIO: U256 =
    U256::from_limbs([6743328256752651558, 17280870778742802505, 4294805859, 0]);

// 2^64 / log2(sqrt(1.0001)), Q64 fixed point.
const SQRT_10001: I256 = I256::from_raw(U256::from_limbs([11745905768312294533, 13863, 0, 0]));
// Error bounds of the log approximation, Q128.
const TICK_LOW: I256 = I256::from_raw(U256::from_limbs([
    6552757943157144234,
    184476617836266586,
    0,
    0,
]));
const TICK_HIGH: I256 = I256::from_raw(U256::from_limbs([
    4998474450511881007,
    15793544031827761793,
    0,
    0,
]));

// Q128.128 value of sqrt(1.0001)^-1, applied when bit 0 of |tick| is set.
const TICK_FACTOR_BIT_0: U256 =
    U256::from_limbs([12262481743371124737, 18445821805675392311, 0, 0]);

// Q128.128 values of sqrt(1.0001)^-(2^k) for k = 1..=19, as (low, high)
// limb pairs.
const TICK_FACTORS: [[u64; 2]; 19] = [
    [6459403834229662010, 18444899583751176498],
    [17226890335427755468, 18443055278223354162],
    [2032852871939366096, 18439367220385604838],
    [14545316742740207172, 18431993317065449817],
    [5129152022828963008, 18417254355718160513],
    [4894419605888772193, 18387811781193591352],
    [1280255884321894483, 18329067761203520168],
    [15924666964335305636, 18212142134806087854],
    [8010504389359918676, 17980523815641551639],
    [10668036004952895731, 17526086738831147013],
    [4878133418470705625, 16651378430235024244],
    [9537173718739605541, 15030750278693429944],
    [9972618978014552549, 12247334978882834399],
    [10428997489610666743, 8131365268884726200],
    [9305304367709015974, 3584323654723342297],
    [14301143598189091785, 696457651847595233],
    [7393154844743099908, 26294789957452057],
    [2209338891292245656, 37481735321082],
    [10518117631919034274, 76158723],
];

/// Returns the Q64.96 square-root price at a tick, i.e.
/// `ceil(sqrt(1.0001^tick) * 2^96)`, or `StateError::TickOutOfRange` for a
/// tick outside `[MIN_TICK, MAX_TICK]`.
pub fn get_sqrt_ratio_at_tick(tick: i32) -> Result<U256, StateError> {
    let abs_tick = tick.unsigned_abs();
    if abs_tick > MAX_TICK as u32 {
        return Err(StateError::TickOutOfRange);
    }

    // Product over the factors selected by the bits of |tick|, in Q128.128.
    let mut ratio = if abs_tick & 1 != 0 {
        TICK_FACTOR_BIT_0
    } else {
        Q128
    };
    for (i, limbs) in TICK_FACTORS.iter().enumerate() {
        if abs_tick & (1 << (i + 1)) != 0 {
            ratio = ratio.wrapping_mul(U256::from_limbs([limbs[0], limbs[1], 0, 0])) >> 128;
        }
    }

    // The table encodes negative exponents; invert for positive ticks.
    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Narrow Q128.128 to Q64.96 rounding up, so the round trip through
    // get_tick_at_sqrt_ratio lands on the same tick.
    let round_up = ratio.as_limbs()[0] & 0xffff_ffff != 0;
    Ok((ratio >> 32) + U256::from(round_up as u64))
}

/// Returns the unique tick `t` with
/// `get_sqrt_ratio_at_tick(t) <= sqrt_price_x96 < get_sqrt_ratio_at_tick(t + 1)`.
/// The domain is `[MIN_SQRT_RATIO, MAX_SQRT_RATIO)`;
/// `StateError::SqrtPriceOutOfRange` outside it.
pub fn get_tick_at_sqrt_ratio(sqrt_price_x96: U256) -> Result<i32, StateError> {
    if sqrt_price_x96 < MIN_SQRT_RATIO || sqrt_price_x96 >= MAX_SQRT_RATIO {
        return Err(StateError::SqrtPriceOutOfRange);
    }

    // Work in Q64.128 and normalize the mantissa into [2^127, 2^128).
    let ratio: U256 = sqrt_price_x96 << 32;
    let msb = 255 - ratio.leading_zeros();
    let mut r = if msb >= 128 {
        ratio >> (msb - 127)
    } else {
        ratio << (127 - msb)
    };

    // Integer part of log2, signed Q64.
    let mut log_2: I256 = (I256::from_raw(U256::from(msb as u64))
        - I256::from_raw(U256::from(128u64)))
        << 64;

    // Fourteen bits of fractional refinement by repeated squaring.
    for shift in (50..=63usize).rev() {
        r = (r.overflowing_mul(r).0) >> 127;
        let f: U256 = r >> 128;
        log_2 |= I256::from_raw(f << shift);
        r >>= f.to::<usize>();
    }

    // Change of base to log sqrt(1.0001), then bracket the answer.
    let log_sqrt10001 = log_2.wrapping_mul(SQRT_10001);
    let tick_low_shifted: I256 = (log_sqrt10001 - TICK_LOW) >> 128;
    let tick_low = tick_low_shifted.low_i32();
    let tick_high_shifted: I256 = (log_sqrt10001 + TICK_HIGH) >> 128;
    let tick_high = tick_high_shifted.low_i32();

    if tick_low == tick_high {
        return Ok(tick_low);
    }
    if get_sqrt_ratio_at_tick(tick_high)? <= sqrt_price_x96 {
        Ok(tick_high)
    } else {
        Ok(tick_low)
    }
}
