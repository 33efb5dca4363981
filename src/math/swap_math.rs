use crate::error::Error;
use crate::math::math_helpers::{mul_div, mul_div_rounding_up};
use crate::math::sqrt_price_math::{
    get_amount_0_delta_base, get_amount_1_delta_base, get_next_sqrt_price_from_input,
    get_next_sqrt_price_from_output,
};
use alloy_primitives::{I256, U256};

const PIPS_DENOMINATOR: U256 = U256::from_limbs([1_000_000, 0, 0, 0]);

/// Runs one tick-range step of a swap: moves the price from
/// `sqrt_ratio_current_x96` toward `sqrt_ratio_target_x96`, consuming at
/// most `amount_remaining` (positive for exact input, negative for exact
/// output).
///
/// Returns `(sqrt_ratio_next_x96, amount_in, amount_out, fee_amount)`.
/// Input and fee are rounded up, output down, so the pool's balance stays a
/// lower bound on what it owes.
pub fn compute_swap_step(
    sqrt_ratio_current_x96: U256,
    sqrt_ratio_target_x96: U256,
    liquidity: u128,
    amount_remaining: I256,
    fee_pips: u32,
) -> Result<(U256, U256, U256, U256), Error> {
    let zero_for_one = sqrt_ratio_current_x96 >= sqrt_ratio_target_x96;
    let exact_in = !amount_remaining.is_negative();
    let fee_complement = PIPS_DENOMINATOR - U256::from(fee_pips);

    let sqrt_ratio_next_x96: U256;
    let mut amount_in = U256::ZERO;
    let mut amount_out = U256::ZERO;

    if exact_in {
        let amount_remaining_less_fee =
            mul_div(amount_remaining.into_raw(), fee_complement, PIPS_DENOMINATOR)?;

        // Input needed to travel the whole way to the target.
        amount_in = if zero_for_one {
            get_amount_0_delta_base(
                sqrt_ratio_target_x96,
                sqrt_ratio_current_x96,
                liquidity,
                true,
            )?
        } else {
            get_amount_1_delta_base(
                sqrt_ratio_current_x96,
                sqrt_ratio_target_x96,
                liquidity,
                true,
            )?
        };

        sqrt_ratio_next_x96 = if amount_remaining_less_fee >= amount_in {
            sqrt_ratio_target_x96
        } else {
            get_next_sqrt_price_from_input(
                sqrt_ratio_current_x96,
                liquidity,
                amount_remaining_less_fee,
                zero_for_one,
            )?
        };
    } else {
        // Output produced by travelling the whole way to the target.
        amount_out = if zero_for_one {
            get_amount_1_delta_base(
                sqrt_ratio_target_x96,
                sqrt_ratio_current_x96,
                liquidity,
                false,
            )?
        } else {
            get_amount_0_delta_base(
                sqrt_ratio_current_x96,
                sqrt_ratio_target_x96,
                liquidity,
                false,
            )?
        };

        let amount_out_requested = amount_remaining.unsigned_abs();
        sqrt_ratio_next_x96 = if amount_out_requested >= amount_out {
            sqrt_ratio_target_x96
        } else {
            get_next_sqrt_price_from_output(
                sqrt_ratio_current_x96,
                liquidity,
                amount_out_requested,
                zero_for_one,
            )?
        };
    }

    let reached_target = sqrt_ratio_target_x96 == sqrt_ratio_next_x96;

    // Settle both sides against the price actually reached; the side that
    // was pre-computed for a completed step is reused as-is.
    if zero_for_one {
        if !(reached_target && exact_in) {
            amount_in = get_amount_0_delta_base(
                sqrt_ratio_next_x96,
                sqrt_ratio_current_x96,
                liquidity,
                true,
            )?;
        }
        if !(reached_target && !exact_in) {
            amount_out = get_amount_1_delta_base(
                sqrt_ratio_next_x96,
                sqrt_ratio_current_x96,
                liquidity,
                false,
            )?;
        }
    } else {
        if !(reached_target && exact_in) {
            amount_in = get_amount_1_delta_base(
                sqrt_ratio_current_x96,
                sqrt_ratio_next_x96,
                liquidity,
                true,
            )?;
        }
        if !(reached_target && !exact_in) {
            amount_out = get_amount_0_delta_base(
                sqrt_ratio_current_x96,
                sqrt_ratio_next_x96,
                liquidity,
                false,
            )?;
        }
    }

    // Rounded output must never exceed what was asked for.
    if !exact_in && amount_out > amount_remaining.unsigned_abs() {
        amount_out = amount_remaining.unsigned_abs();
    }

    let fee_amount = if exact_in && !reached_target {
        // The step ends inside the range: whatever input the price math did
        // not consume becomes the fee, so the caller spends exactly the
        // specified amount.
        amount_remaining.into_raw() - amount_in
    } else {
        mul_div_rounding_up(amount_in, U256::from(fee_pips), fee_complement)?
    };

    Ok((sqrt_ratio_next_x96, amount_in, amount_out, fee_amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Q96;

    const LIQUIDITY: u128 = 1_000_000_000_000_000_000;

    fn scale(price: U256, num: u64, den: u64) -> U256 {
        price * U256::from(num) / U256::from(den)
    }

    #[test]
    fn exact_in_moving_up_stays_within_target() {
        let current = Q96;
        let target = scale(Q96, 101, 100);

        let (next, amount_in, amount_out, fee) = compute_swap_step(
            current,
            target,
            LIQUIDITY,
            I256::try_from(1_000_000_000i64).unwrap(),
            3000,
        )
        .unwrap();

        assert!(amount_in > U256::ZERO);
        assert!(amount_out > U256::ZERO);
        assert!(fee > U256::ZERO);
        assert!(next > current, "price must rise for one-for-zero");
        assert!(next <= target, "price must not pass the target");
    }

    #[test]
    fn exact_in_moving_down_stays_within_target() {
        let current = Q96;
        let target = scale(Q96, 99, 100);

        let (next, amount_in, amount_out, fee) = compute_swap_step(
            current,
            target,
            LIQUIDITY,
            I256::try_from(1_000_000_000i64).unwrap(),
            3000,
        )
        .unwrap();

        assert!(amount_in > U256::ZERO);
        assert!(amount_out > U256::ZERO);
        assert!(fee > U256::ZERO);
        assert!(next < current);
        assert!(next >= target);
    }

    #[test]
    fn exact_in_large_amount_completes_the_step() {
        let current = Q96;
        let target = scale(Q96, 9999, 10000);

        let (next, ..) = compute_swap_step(
            current,
            target,
            LIQUIDITY,
            I256::try_from(1_000_000_000_000i64).unwrap(),
            3000,
        )
        .unwrap();

        assert_eq!(next, target);
    }

    #[test]
    fn exact_in_small_amount_stops_short() {
        let current = Q96;
        let target = scale(Q96, 8, 10);

        let (next, ..) = compute_swap_step(
            current,
            target,
            LIQUIDITY,
            I256::try_from(1_000_000i64).unwrap(),
            3000,
        )
        .unwrap();

        assert!(next > target);
    }

    #[test]
    fn exact_in_consumes_the_full_input_when_stopping_short() {
        let current = Q96;
        let target = scale(Q96, 99, 100);
        let specified = 1_000_000_000i64;

        let (next, amount_in, _, fee) = compute_swap_step(
            current,
            target,
            LIQUIDITY,
            I256::try_from(specified).unwrap(),
            3000,
        )
        .unwrap();

        if next != target {
            assert_eq!(amount_in + fee, U256::from(specified as u64));
        }
    }

    #[test]
    fn exact_out_both_directions() {
        let current = Q96;

        let (next, amount_in, amount_out, _) = compute_swap_step(
            current,
            scale(Q96, 99, 100),
            LIQUIDITY,
            I256::try_from(-1_000_000_000i64).unwrap(),
            3000,
        )
        .unwrap();
        assert!(amount_in > U256::ZERO);
        assert!(amount_out > U256::ZERO);
        assert!(next < current);

        let (next, amount_in, amount_out, _) = compute_swap_step(
            current,
            scale(Q96, 101, 100),
            LIQUIDITY,
            I256::try_from(-1_000_000_000i64).unwrap(),
            3000,
        )
        .unwrap();
        assert!(amount_in > U256::ZERO);
        assert!(amount_out > U256::ZERO);
        assert!(next > current);
    }

    #[test]
    fn exact_out_never_over_delivers() {
        let requested = 1_000_000_000i64;
        let (_, _, amount_out, _) = compute_swap_step(
            Q96,
            scale(Q96, 99, 100),
            LIQUIDITY,
            I256::try_from(-requested).unwrap(),
            3000,
        )
        .unwrap();

        assert!(amount_out <= U256::from(requested as u64));
    }

    #[test]
    fn higher_fee_tiers_charge_more_and_deliver_less() {
        let current = Q96;
        let target = scale(Q96, 5, 10);
        let amount = I256::try_from(1_000_000_000i64).unwrap();

        let (next_500, _, out_500, fee_500) =
            compute_swap_step(current, target, LIQUIDITY, amount, 500).unwrap();
        let (next_3000, _, out_3000, fee_3000) =
            compute_swap_step(current, target, LIQUIDITY, amount, 3000).unwrap();

        // neither reaches the far target
        assert!(next_500 > target);
        assert!(next_3000 > target);

        assert!(fee_3000 > fee_500);
        assert!(out_500 >= out_3000);
    }

    #[test]
    fn zero_fee_charges_nothing() {
        let (_, amount_in, amount_out, fee) = compute_swap_step(
            Q96,
            scale(Q96, 99, 100),
            LIQUIDITY,
            I256::try_from(1_000_000_000i64).unwrap(),
            0,
        )
        .unwrap();

        assert_eq!(fee, U256::ZERO);
        assert!(amount_in > U256::ZERO);
        assert!(amount_out > U256::ZERO);
    }

    #[test]
    fn zero_liquidity_travels_to_the_target_for_free() {
        let current = Q96;
        let target = scale(Q96, 101, 100);

        let (next, amount_in, amount_out, fee) = compute_swap_step(
            current,
            target,
            0,
            I256::try_from(1_000_000i64).unwrap(),
            3000,
        )
        .unwrap();

        assert_eq!(next, target);
        assert_eq!(amount_in, U256::ZERO);
        assert_eq!(amount_out, U256::ZERO);
        assert_eq!(fee, U256::ZERO);
    }

    #[test]
    fn at_the_target_nothing_moves() {
        let (next, amount_in, amount_out, _) =
            compute_swap_step(Q96, Q96, LIQUIDITY, I256::try_from(1000i64).unwrap(), 3000)
                .unwrap();

        assert_eq!(next, Q96);
        assert_eq!(amount_in, U256::ZERO);
        assert_eq!(amount_out, U256::ZERO);
    }

    #[test]
    fn more_liquidity_means_less_price_impact() {
        let current = Q96;
        let target = scale(Q96, 99, 100);
        let amount = I256::try_from(1_000_000_000i64).unwrap();

        let (next_thin, _, out_thin, _) =
            compute_swap_step(current, target, 1_000_000_000_000u128, amount, 3000).unwrap();
        let (next_deep, _, out_deep, _) =
            compute_swap_step(current, target, LIQUIDITY, amount, 3000).unwrap();

        assert!(out_deep >= out_thin);
        assert!(current - next_deep <= current - next_thin);
    }
}
