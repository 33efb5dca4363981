use crate::error::{Error, LiquidityError, PoolError};
use crate::ledger::AssetLedger;
use crate::math::liquidity_math::add_delta;
use crate::math::math_helpers::mul_div;
use crate::math::swap_math::compute_swap_step;
use crate::math::tick_bitmap::next_initialized_tick_within_one_word;
use crate::math::tick_math::{
    get_sqrt_ratio_at_tick, get_tick_at_sqrt_ratio, MAX_SQRT_RATIO, MAX_TICK, MIN_SQRT_RATIO,
    MIN_TICK,
};
use crate::pool::clmm_pool::ClmmPool;
use crate::pool::tick::{self, TickInfo};
use crate::Q128;
use alloy_primitives::{Address, I256, U256};

#[derive(Copy, Clone, Debug)]
pub struct SwapParams {
    /// True when the caller pays token0 and receives token1; the price
    /// moves down.
    pub zero_for_one: bool,
    /// Positive for exact input, negative for exact output.
    pub amount_specified: I256,
    /// Price the swap must not cross. Zero selects the widest admissible
    /// limit for the direction.
    pub sqrt_price_limit_x96: U256,
}

#[derive(Copy, Clone, Debug)]
pub struct SwapResult {
    /// Token0 owed to the pool (positive) or to the caller (negative).
    pub amount0_delta: I256,
    /// Same for token1.
    pub amount1_delta: I256,
    /// Total fee charged, in units of the input token.
    pub fees_paid: U256,
}

// The top level state of the swap, committed to the pool in one piece
// after the ledger settles.
struct SwapState {
    // the amount remaining to be swapped in/out of the input/output asset
    amount_specified_remaining: I256,
    // the amount already swapped out/in of the output/input asset
    amount_calculated: I256,
    // current sqrt(price)
    sqrt_price_x96: U256,
    // the tick associated with the current price
    tick: i32,
    // the current liquidity in range
    liquidity: u128,
    // fee growth accumulator of the input token
    fee_growth_global_x128: U256,
    // accumulated swap fees
    swap_fee: U256,
    // ticks walked over, with their post-crossing state
    crossed: Vec<(i32, TickInfo)>,
}

#[derive(Default)]
struct StepComputations {
    // the price at the beginning of the step
    sqrt_price_start_x96: U256,
    // the next tick to swap to from the current tick in the swap direction
    tick_next: i32,
    // whether tick_next is initialized or not
    initialized: bool,
    // sqrt(price) for the next tick (1/0)
    sqrt_price_next_x96: U256,
    // how much is being swapped in in this step
    amount_in: U256,
    // how much is being swapped out
    amount_out: U256,
    // how much fee is being paid in
    fee_amount: U256,
}

impl<L: AssetLedger> ClmmPool<L> {
    /// Swaps one token for the other, walking the price across as many
    /// initialized ticks as the specified amount and price limit allow.
    /// Pays the output side to `recipient` and pulls the input side from
    /// `sender`.
    pub fn swap(
        &mut self,
        sender: Address,
        recipient: Address,
        params: SwapParams,
    ) -> Result<SwapResult, Error> {
        self.lock()?;
        let result = self.swap_inner(sender, recipient, params);
        self.slot0.unlocked = true;
        result
    }

    fn swap_inner(
        &mut self,
        sender: Address,
        recipient: Address,
        params: SwapParams,
    ) -> Result<SwapResult, Error> {
        let amount_specified = params.amount_specified;
        if amount_specified.is_zero() {
            return Err(PoolError::ZeroAmount.into());
        }

        let zero_for_one = params.zero_for_one;
        let sqrt_price_limit_x96 = if params.sqrt_price_limit_x96.is_zero() {
            if zero_for_one {
                MIN_SQRT_RATIO + U256::ONE
            } else {
                MAX_SQRT_RATIO - U256::ONE
            }
        } else {
            params.sqrt_price_limit_x96
        };

        if zero_for_one {
            if sqrt_price_limit_x96 >= self.slot0.sqrt_price_x96
                || sqrt_price_limit_x96 <= MIN_SQRT_RATIO
            {
                return Err(PoolError::InvalidSqrtPriceLimit.into());
            }
        } else if sqrt_price_limit_x96 <= self.slot0.sqrt_price_x96
            || sqrt_price_limit_x96 >= MAX_SQRT_RATIO
        {
            return Err(PoolError::InvalidSqrtPriceLimit.into());
        }

        let exact_input = amount_specified.is_positive();

        let mut state = SwapState {
            amount_specified_remaining: amount_specified,
            amount_calculated: I256::ZERO,
            sqrt_price_x96: self.slot0.sqrt_price_x96,
            tick: self.slot0.tick,
            liquidity: self.liquidity,
            fee_growth_global_x128: if zero_for_one {
                self.fee_growth_global_0_x128
            } else {
                self.fee_growth_global_1_x128
            },
            swap_fee: U256::ZERO,
            crossed: Vec::new(),
        };

        while !state.amount_specified_remaining.is_zero()
            && state.sqrt_price_x96 != sqrt_price_limit_x96
        {
            let mut step = StepComputations {
                sqrt_price_start_x96: state.sqrt_price_x96,
                ..StepComputations::default()
            };

            (step.tick_next, step.initialized) = next_initialized_tick_within_one_word(
                &self.bitmap,
                state.tick,
                self.tick_spacing,
                zero_for_one,
            )?;

            step.tick_next = step.tick_next.clamp(MIN_TICK, MAX_TICK);
            step.sqrt_price_next_x96 = get_sqrt_ratio_at_tick(step.tick_next)?;

            // step toward the closer of the next tick and the user's limit
            let sqrt_price_target_x96 = if zero_for_one {
                step.sqrt_price_next_x96.max(sqrt_price_limit_x96)
            } else {
                step.sqrt_price_next_x96.min(sqrt_price_limit_x96)
            };

            (
                state.sqrt_price_x96,
                step.amount_in,
                step.amount_out,
                step.fee_amount,
            ) = compute_swap_step(
                state.sqrt_price_x96,
                sqrt_price_target_x96,
                state.liquidity,
                state.amount_specified_remaining,
                self.fee_pips,
            )?;

            state.swap_fee += step.fee_amount;

            if exact_input {
                state.amount_specified_remaining -=
                    I256::from_raw(step.amount_in + step.fee_amount);
                state.amount_calculated -= I256::from_raw(step.amount_out);
            } else {
                state.amount_specified_remaining += I256::from_raw(step.amount_out);
                state.amount_calculated += I256::from_raw(step.amount_in + step.fee_amount);
            }

            if state.liquidity > 0 {
                state.fee_growth_global_x128 = state
                    .fee_growth_global_x128
                    .wrapping_add(mul_div(step.fee_amount, Q128, U256::from(state.liquidity))?);
            }

            if state.sqrt_price_x96 == step.sqrt_price_next_x96 {
                if step.initialized {
                    let info = self
                        .ticks
                        .get(&step.tick_next)
                        .ok_or(LiquidityError::Underflow)?;

                    // the input-side accumulator is the running one, the
                    // output side never moved during this swap
                    let (global_0, global_1) = if zero_for_one {
                        (state.fee_growth_global_x128, self.fee_growth_global_1_x128)
                    } else {
                        (self.fee_growth_global_0_x128, state.fee_growth_global_x128)
                    };
                    let (crossed_info, mut liquidity_net) =
                        tick::cross(info, global_0, global_1);
                    state.crossed.push((step.tick_next, crossed_info));

                    if zero_for_one {
                        liquidity_net = -liquidity_net;
                    }
                    state.liquidity = add_delta(state.liquidity, liquidity_net)?;
                }

                state.tick = if zero_for_one {
                    step.tick_next - 1
                } else {
                    step.tick_next
                };
            } else if state.sqrt_price_x96 != step.sqrt_price_start_x96 {
                state.tick = get_tick_at_sqrt_ratio(state.sqrt_price_x96)?;
            }
        }

        let (amount0, amount1) = if zero_for_one == exact_input {
            (
                amount_specified - state.amount_specified_remaining,
                state.amount_calculated,
            )
        } else {
            (
                state.amount_calculated,
                amount_specified - state.amount_specified_remaining,
            )
        };

        // Settle before committing: pay the output side out, then pull the
        // input side in. Both run unconditionally so a side rounded to zero
        // still goes through the ledger as a no-op.
        if zero_for_one {
            self.ledger
                .transfer(self.token1, recipient, amount1.unsigned_abs())?;
            self.ledger.transfer_from(
                self.token0,
                sender,
                self.pool_address,
                amount0.unsigned_abs(),
            )?;
        } else {
            self.ledger
                .transfer(self.token0, recipient, amount0.unsigned_abs())?;
            self.ledger.transfer_from(
                self.token1,
                sender,
                self.pool_address,
                amount1.unsigned_abs(),
            )?;
        }

        self.slot0.sqrt_price_x96 = state.sqrt_price_x96;
        self.slot0.tick = state.tick;
        self.liquidity = state.liquidity;
        if zero_for_one {
            self.fee_growth_global_0_x128 = state.fee_growth_global_x128;
        } else {
            self.fee_growth_global_1_x128 = state.fee_growth_global_x128;
        }
        for (tick_index, info) in state.crossed {
            self.ticks.insert(tick_index, info);
        }

        Ok(SwapResult {
            amount0_delta: amount0,
            amount1_delta: amount1,
            fees_paid: state.swap_fee,
        })
    }
}
