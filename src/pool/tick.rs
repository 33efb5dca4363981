use crate::error::{Error, LiquidityError};
use crate::math::liquidity_math::add_delta;
use alloy_primitives::U256;

/// State kept for every initialized tick. Entries exist exactly while
/// `liquidity_gross > 0`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickInfo {
    /// Total position liquidity referencing this tick as a boundary.
    pub liquidity_gross: u128,
    /// Net liquidity added when the tick is crossed left to right.
    pub liquidity_net: i128,
    /// Fee growth on the side of this tick away from the current price,
    /// token0, Q128.128.
    pub fee_growth_outside_0_x128: U256,
    /// Same for token1.
    pub fee_growth_outside_1_x128: U256,
    pub initialized: bool,
}

/// Applies a liquidity change to one boundary tick, enforcing the per-tick
/// cap. Returns the updated record and whether the tick flipped between
/// initialized and uninitialized.
///
/// On first initialization at or below the current tick, the outside
/// growth is seeded with the running globals so that growth accumulated
/// before the tick existed counts as "below".
#[allow(clippy::too_many_arguments)]
pub fn update(
    info: &TickInfo,
    tick: i32,
    tick_current: i32,
    liquidity_delta: i128,
    fee_growth_global_0_x128: U256,
    fee_growth_global_1_x128: U256,
    upper: bool,
    max_liquidity: u128,
) -> Result<(TickInfo, bool), Error> {
    let liquidity_gross_before = info.liquidity_gross;
    let liquidity_gross_after = add_delta(liquidity_gross_before, liquidity_delta)?;

    if liquidity_gross_after > max_liquidity {
        return Err(LiquidityError::Overflow.into());
    }

    let flipped = (liquidity_gross_after == 0) != (liquidity_gross_before == 0);

    let mut next = info.clone();
    if liquidity_gross_before == 0 {
        if tick <= tick_current {
            next.fee_growth_outside_0_x128 = fee_growth_global_0_x128;
            next.fee_growth_outside_1_x128 = fee_growth_global_1_x128;
        }
        next.initialized = true;
    }

    next.liquidity_gross = liquidity_gross_after;
    next.liquidity_net = if upper {
        info.liquidity_net
            .checked_sub(liquidity_delta)
            .ok_or(LiquidityError::Overflow)?
    } else {
        info.liquidity_net
            .checked_add(liquidity_delta)
            .ok_or(LiquidityError::Overflow)?
    };

    Ok((next, flipped))
}

/// Transition for a swap walking over a tick: the outside growth flips to
/// the other side of the tick. Returns the updated record and the net
/// liquidity the swap must apply.
pub fn cross(
    info: &TickInfo,
    fee_growth_global_0_x128: U256,
    fee_growth_global_1_x128: U256,
) -> (TickInfo, i128) {
    let mut next = info.clone();
    next.fee_growth_outside_0_x128 =
        fee_growth_global_0_x128.wrapping_sub(info.fee_growth_outside_0_x128);
    next.fee_growth_outside_1_x128 =
        fee_growth_global_1_x128.wrapping_sub(info.fee_growth_outside_1_x128);
    (next, info.liquidity_net)
}

/// Fee growth accumulated strictly inside `[tick_lower, tick_upper)`:
/// global minus the growth below the lower tick and above the upper one.
/// All subtractions wrap; snapshots taken from the same accumulators cancel
/// the wrap when differenced.
pub fn fee_growth_inside(
    lower: &TickInfo,
    upper: &TickInfo,
    tick_lower: i32,
    tick_upper: i32,
    tick_current: i32,
    fee_growth_global_0_x128: U256,
    fee_growth_global_1_x128: U256,
) -> (U256, U256) {
    let (below_0, below_1) = if tick_current >= tick_lower {
        (
            lower.fee_growth_outside_0_x128,
            lower.fee_growth_outside_1_x128,
        )
    } else {
        (
            fee_growth_global_0_x128.wrapping_sub(lower.fee_growth_outside_0_x128),
            fee_growth_global_1_x128.wrapping_sub(lower.fee_growth_outside_1_x128),
        )
    };

    let (above_0, above_1) = if tick_current < tick_upper {
        (
            upper.fee_growth_outside_0_x128,
            upper.fee_growth_outside_1_x128,
        )
    } else {
        (
            fee_growth_global_0_x128.wrapping_sub(upper.fee_growth_outside_0_x128),
            fee_growth_global_1_x128.wrapping_sub(upper.fee_growth_outside_1_x128),
        )
    };

    (
        fee_growth_global_0_x128
            .wrapping_sub(below_0)
            .wrapping_sub(above_0),
        fee_growth_global_1_x128
            .wrapping_sub(below_1)
            .wrapping_sub(above_1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick_with(gross: u128, net: i128, outside_0: u64, outside_1: u64) -> TickInfo {
        TickInfo {
            liquidity_gross: gross,
            liquidity_net: net,
            fee_growth_outside_0_x128: U256::from(outside_0),
            fee_growth_outside_1_x128: U256::from(outside_1),
            initialized: true,
        }
    }

    #[test]
    fn first_liquidity_initializes_and_flips() {
        let (info, flipped) = update(
            &TickInfo::default(),
            -100,
            0,
            1000,
            U256::from(7u8),
            U256::from(9u8),
            false,
            u128::MAX,
        )
        .unwrap();

        assert!(flipped);
        assert!(info.initialized);
        assert_eq!(info.liquidity_gross, 1000);
        assert_eq!(info.liquidity_net, 1000);
        // tick below current: pre-existing growth counts as outside
        assert_eq!(info.fee_growth_outside_0_x128, U256::from(7u8));
        assert_eq!(info.fee_growth_outside_1_x128, U256::from(9u8));
    }

    #[test]
    fn first_liquidity_above_current_keeps_zero_outside() {
        let (info, _) = update(
            &TickInfo::default(),
            100,
            0,
            1000,
            U256::from(7u8),
            U256::from(9u8),
            false,
            u128::MAX,
        )
        .unwrap();

        assert_eq!(info.fee_growth_outside_0_x128, U256::ZERO);
        assert_eq!(info.fee_growth_outside_1_x128, U256::ZERO);
    }

    #[test]
    fn upper_boundary_subtracts_from_net() {
        let (info, flipped) = update(
            &TickInfo::default(),
            100,
            0,
            1000,
            U256::ZERO,
            U256::ZERO,
            true,
            u128::MAX,
        )
        .unwrap();

        assert!(flipped);
        assert_eq!(info.liquidity_gross, 1000);
        assert_eq!(info.liquidity_net, -1000);
    }

    #[test]
    fn adding_to_a_live_tick_does_not_flip() {
        let base = tick_with(1000, 1000, 0, 0);
        let (info, flipped) =
            update(&base, 0, 0, 500, U256::ZERO, U256::ZERO, false, u128::MAX).unwrap();

        assert!(!flipped);
        assert_eq!(info.liquidity_gross, 1500);
        assert_eq!(info.liquidity_net, 1500);
    }

    #[test]
    fn removing_all_liquidity_flips_back() {
        let base = tick_with(1000, 1000, 0, 0);
        let (info, flipped) =
            update(&base, 0, 0, -1000, U256::ZERO, U256::ZERO, false, u128::MAX).unwrap();

        assert!(flipped);
        assert_eq!(info.liquidity_gross, 0);
    }

    #[test]
    fn per_tick_cap_is_enforced() {
        let result = update(
            &TickInfo::default(),
            0,
            0,
            2000,
            U256::ZERO,
            U256::ZERO,
            false,
            1000,
        );
        assert!(matches!(
            result,
            Err(Error::LiquidityError(LiquidityError::Overflow))
        ));
    }

    #[test]
    fn removing_more_than_gross_is_rejected() {
        let base = tick_with(100, 100, 0, 0);
        let result = update(&base, 0, 0, -200, U256::ZERO, U256::ZERO, false, u128::MAX);
        assert!(matches!(
            result,
            Err(Error::LiquidityError(LiquidityError::Underflow))
        ));
    }

    #[test]
    fn cross_flips_outside_growth_and_returns_net() {
        let base = tick_with(1000, 500, 100, 200);
        let (info, net) = cross(&base, U256::from(1000u64), U256::from(2000u64));

        assert_eq!(net, 500);
        assert_eq!(info.fee_growth_outside_0_x128, U256::from(900u64));
        assert_eq!(info.fee_growth_outside_1_x128, U256::from(1800u64));
    }

    #[test]
    fn cross_twice_is_identity() {
        let base = tick_with(1000, -750, 123, 456);
        let global_0 = U256::from(10_000u64);
        let global_1 = U256::from(20_000u64);

        let (once, _) = cross(&base, global_0, global_1);
        let (twice, net) = cross(&once, global_0, global_1);

        assert_eq!(net, -750);
        assert_eq!(twice, base);
    }

    #[test]
    fn cross_wraps_cleanly() {
        let base = tick_with(1, 1, 5, 0);
        let (info, _) = cross(&base, U256::from(2u8), U256::ZERO);
        // 2 - 5 wraps; crossing back must still restore the original
        let (back, _) = cross(&info, U256::from(2u8), U256::ZERO);
        assert_eq!(back.fee_growth_outside_0_x128, U256::from(5u8));
    }

    #[test]
    fn inside_growth_with_price_in_range() {
        let lower = tick_with(1000, 1000, 100, 200);
        let upper = tick_with(1000, -1000, 50, 100);

        let (inside_0, inside_1) = fee_growth_inside(
            &lower,
            &upper,
            -100,
            100,
            0,
            U256::from(1000u64),
            U256::from(2000u64),
        );

        assert_eq!(inside_0, U256::from(850u64));
        assert_eq!(inside_1, U256::from(1700u64));
    }

    #[test]
    fn inside_growth_with_price_below_range() {
        let lower = tick_with(1000, 1000, 800, 1600);
        let upper = tick_with(1000, -1000, 300, 600);

        let (inside_0, inside_1) = fee_growth_inside(
            &lower,
            &upper,
            100,
            200,
            0,
            U256::from(1000u64),
            U256::from(2000u64),
        );

        // below = global - lower.outside, above = upper.outside
        assert_eq!(inside_0, U256::from(1000u64 - 200 - 300));
        assert_eq!(inside_1, U256::from(2000u64 - 400 - 600));
    }

    #[test]
    fn inside_growth_with_price_above_range() {
        let lower = tick_with(1000, 1000, 100, 200);
        let upper = tick_with(1000, -1000, 600, 1200);

        let (inside_0, inside_1) = fee_growth_inside(
            &lower,
            &upper,
            -200,
            -100,
            0,
            U256::from(1000u64),
            U256::from(2000u64),
        );

        // below = lower.outside, above = global - upper.outside
        assert_eq!(inside_0, U256::from(1000u64 - 100 - 400));
        assert_eq!(inside_1, U256::from(2000u64 - 200 - 800));
    }
}
