use crate::error::{Error, LiquidityError, PoolError, StateError};
use crate::ledger::AssetLedger;
use crate::math::liquidity_math::add_delta;
use crate::math::sqrt_price_math::{get_amount_0_delta, get_amount_1_delta};
use crate::math::tick_bitmap;
use crate::math::tick_math::{get_sqrt_ratio_at_tick, get_tick_at_sqrt_ratio, MAX_TICK, MIN_TICK};
use crate::pool::position::{self, PositionInfo, PositionKey};
use crate::pool::tick::{self, TickInfo};
use crate::{FastMap, FEE_PIPS_DENOMINATOR};
use alloy_primitives::{Address, I256, U160, U256};

/// The hot slot: current price, current tick, and the reentrancy gate.
#[derive(Copy, Clone, Debug, Default)]
pub struct Slot0 {
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub unlocked: bool,
}

/// Upper bound on `liquidity_gross` for any single tick, chosen so the sum
/// over every usable tick still fits in 128 bits.
pub fn max_liquidity_per_tick(tick_spacing: i32) -> u128 {
    let num_ticks = (MAX_TICK / tick_spacing - MIN_TICK / tick_spacing + 1) as u128;
    u128::MAX / num_ticks
}

#[inline(always)]
fn address_to_u160(address: Address) -> U160 {
    address.into()
}

/// Canonical `(token0, token1)` ordering by numeric identifier value.
pub fn sort_tokens(token_a: Address, token_b: Address) -> (Address, Address) {
    if address_to_u160(token_a) < address_to_u160(token_b) {
        (token_a, token_b)
    } else {
        (token_b, token_a)
    }
}

// Staged outcome of a position change; nothing is written to the pool
// until every fallible step, including the ledger, has succeeded.
pub(crate) struct TickWrite {
    pub(crate) tick: i32,
    pub(crate) info: Option<TickInfo>,
    pub(crate) flipped: bool,
}

pub(crate) struct ModifyStaged {
    pub(crate) key: PositionKey,
    pub(crate) position: PositionInfo,
    pub(crate) lower: TickWrite,
    pub(crate) upper: TickWrite,
    pub(crate) pool_liquidity: u128,
    pub(crate) amount0: I256,
    pub(crate) amount1: I256,
}

/// One concentrated-liquidity pool for a pair of assets.
///
/// The pool owns no balances; it settles every operation through the
/// injected [`AssetLedger`], with `pool_address` as its custody account.
#[derive(Debug)]
pub struct ClmmPool<L> {
    pub(crate) pool_address: Address,
    pub(crate) token0: Address,
    pub(crate) token1: Address,
    pub(crate) fee_pips: u32,
    pub(crate) tick_spacing: i32,
    pub(crate) max_liquidity_per_tick: u128,
    pub(crate) slot0: Slot0,
    pub(crate) fee_growth_global_0_x128: U256,
    pub(crate) fee_growth_global_1_x128: U256,
    pub(crate) liquidity: u128,
    pub(crate) ticks: FastMap<i32, TickInfo>,
    pub(crate) bitmap: FastMap<i16, U256>,
    pub(crate) positions: FastMap<PositionKey, PositionInfo>,
    pub(crate) ledger: L,
}

impl<L: AssetLedger> ClmmPool<L> {
    /// Builds an uninitialized pool. Tokens are sorted so `token0 < token1`
    /// regardless of argument order. Call [`ClmmPool::initialize`] before
    /// any other operation.
    pub fn new(
        pool_address: Address,
        token_a: Address,
        token_b: Address,
        fee_pips: u32,
        tick_spacing: i32,
        ledger: L,
    ) -> Self {
        debug_assert!(fee_pips < FEE_PIPS_DENOMINATOR);
        debug_assert!(tick_spacing > 0);

        let (token0, token1) = sort_tokens(token_a, token_b);
        Self {
            pool_address,
            token0,
            token1,
            fee_pips,
            tick_spacing,
            max_liquidity_per_tick: max_liquidity_per_tick(tick_spacing),
            slot0: Slot0::default(),
            fee_growth_global_0_x128: U256::ZERO,
            fee_growth_global_1_x128: U256::ZERO,
            liquidity: 0,
            ticks: FastMap::default(),
            bitmap: FastMap::default(),
            positions: FastMap::default(),
            ledger,
        }
    }

    /// Sets the starting price and opens the pool for use.
    pub fn initialize(&mut self, sqrt_price_x96: U256) -> Result<(), Error> {
        if !self.slot0.sqrt_price_x96.is_zero() {
            return Err(PoolError::AlreadyInitialized.into());
        }
        let tick = get_tick_at_sqrt_ratio(sqrt_price_x96)?;
        self.slot0 = Slot0 {
            sqrt_price_x96,
            tick,
            unlocked: true,
        };
        Ok(())
    }

    /// Adds `amount` of liquidity to `recipient`'s position over
    /// `[tick_lower, tick_upper)` and pulls the required token amounts from
    /// `sender`. Returns the amounts pulled.
    pub fn mint(
        &mut self,
        sender: Address,
        recipient: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount: u128,
    ) -> Result<(U256, U256), Error> {
        self.lock()?;
        let result = self.mint_inner(sender, recipient, tick_lower, tick_upper, amount);
        self.slot0.unlocked = true;
        result
    }

    /// Removes `amount` of liquidity from `sender`'s position. The freed
    /// token amounts are credited to `tokens_owed` rather than transferred;
    /// call [`ClmmPool::collect`] to withdraw them. A zero amount pokes the
    /// position, realizing accrued fees.
    pub fn burn(
        &mut self,
        sender: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount: u128,
    ) -> Result<(U256, U256), Error> {
        self.lock()?;
        let result = self.burn_inner(sender, tick_lower, tick_upper, amount);
        self.slot0.unlocked = true;
        result
    }

    /// Pays out up to the requested share of `sender`'s collectable tokens
    /// to `recipient`, returning what was actually sent.
    pub fn collect(
        &mut self,
        sender: Address,
        recipient: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount0_requested: u128,
        amount1_requested: u128,
    ) -> Result<(u128, u128), Error> {
        self.lock()?;
        let result = self.collect_inner(
            sender,
            recipient,
            tick_lower,
            tick_upper,
            amount0_requested,
            amount1_requested,
        );
        self.slot0.unlocked = true;
        result
    }

    fn mint_inner(
        &mut self,
        sender: Address,
        recipient: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount: u128,
    ) -> Result<(U256, U256), Error> {
        if amount == 0 {
            return Err(PoolError::ZeroAmount.into());
        }
        let liquidity_delta = i128::try_from(amount).map_err(|_| LiquidityError::Overflow)?;

        let staged = self.stage_modify_position(recipient, tick_lower, tick_upper, liquidity_delta)?;
        let amount0 = staged.amount0.into_raw();
        let amount1 = staged.amount1.into_raw();

        self.ledger
            .transfer_from(self.token0, sender, self.pool_address, amount0)?;
        self.ledger
            .transfer_from(self.token1, sender, self.pool_address, amount1)?;

        self.apply_modify(staged);
        Ok((amount0, amount1))
    }

    fn burn_inner(
        &mut self,
        sender: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount: u128,
    ) -> Result<(U256, U256), Error> {
        let liquidity_delta = i128::try_from(amount).map_err(|_| LiquidityError::Underflow)?;

        let mut staged =
            self.stage_modify_position(sender, tick_lower, tick_upper, -liquidity_delta)?;
        let amount0 = staged.amount0.unsigned_abs();
        let amount1 = staged.amount1.unsigned_abs();

        staged.position.tokens_owed_0 = staged
            .position
            .tokens_owed_0
            .saturating_add(amount0.saturating_to::<u128>());
        staged.position.tokens_owed_1 = staged
            .position
            .tokens_owed_1
            .saturating_add(amount1.saturating_to::<u128>());

        self.apply_modify(staged);
        Ok((amount0, amount1))
    }

    fn collect_inner(
        &mut self,
        sender: Address,
        recipient: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount0_requested: u128,
        amount1_requested: u128,
    ) -> Result<(u128, u128), Error> {
        let key = PositionKey {
            owner: sender,
            tick_lower,
            tick_upper,
        };
        let mut position = match self.positions.get(&key) {
            Some(position) => position.clone(),
            None => return Ok((0, 0)),
        };

        let amount0 = amount0_requested.min(position.tokens_owed_0);
        let amount1 = amount1_requested.min(position.tokens_owed_1);

        self.ledger
            .transfer(self.token0, recipient, U256::from(amount0))?;
        self.ledger
            .transfer(self.token1, recipient, U256::from(amount1))?;

        position.tokens_owed_0 -= amount0;
        position.tokens_owed_1 -= amount1;
        self.positions.insert(key, position);

        Ok((amount0, amount1))
    }

    /// Computes the full effect of a liquidity change without touching pool
    /// state: boundary tick updates (and flips), the position's fee
    /// settlement, the pool-liquidity change when the range is active, and
    /// the token amounts owed either way.
    pub(crate) fn stage_modify_position(
        &self,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
        liquidity_delta: i128,
    ) -> Result<ModifyStaged, Error> {
        check_ticks(tick_lower, tick_upper, self.tick_spacing)?;

        let slot0 = self.slot0;

        let lower_before = self.ticks.get(&tick_lower).cloned().unwrap_or_default();
        let upper_before = self.ticks.get(&tick_upper).cloned().unwrap_or_default();

        let (lower_after, flipped_lower) = tick::update(
            &lower_before,
            tick_lower,
            slot0.tick,
            liquidity_delta,
            self.fee_growth_global_0_x128,
            self.fee_growth_global_1_x128,
            false,
            self.max_liquidity_per_tick,
        )?;
        let (upper_after, flipped_upper) = tick::update(
            &upper_before,
            tick_upper,
            slot0.tick,
            liquidity_delta,
            self.fee_growth_global_0_x128,
            self.fee_growth_global_1_x128,
            true,
            self.max_liquidity_per_tick,
        )?;

        let (inside_0, inside_1) = tick::fee_growth_inside(
            &lower_after,
            &upper_after,
            tick_lower,
            tick_upper,
            slot0.tick,
            self.fee_growth_global_0_x128,
            self.fee_growth_global_1_x128,
        );

        let key = PositionKey {
            owner,
            tick_lower,
            tick_upper,
        };
        let current = self.positions.get(&key).cloned().unwrap_or_default();
        let position = position::update(&current, liquidity_delta, inside_0, inside_1)?;

        let mut amount0 = I256::ZERO;
        let mut amount1 = I256::ZERO;
        let mut pool_liquidity = self.liquidity;

        if liquidity_delta != 0 {
            if slot0.tick < tick_lower {
                // range entirely above the price: token0 only
                amount0 = get_amount_0_delta(
                    get_sqrt_ratio_at_tick(tick_lower)?,
                    get_sqrt_ratio_at_tick(tick_upper)?,
                    liquidity_delta,
                )?;
            } else if slot0.tick < tick_upper {
                // active range: both tokens, and the in-range liquidity moves
                amount0 = get_amount_0_delta(
                    slot0.sqrt_price_x96,
                    get_sqrt_ratio_at_tick(tick_upper)?,
                    liquidity_delta,
                )?;
                amount1 = get_amount_1_delta(
                    get_sqrt_ratio_at_tick(tick_lower)?,
                    slot0.sqrt_price_x96,
                    liquidity_delta,
                )?;
                pool_liquidity = add_delta(self.liquidity, liquidity_delta)?;
            } else {
                // range entirely below the price: token1 only
                amount1 = get_amount_1_delta(
                    get_sqrt_ratio_at_tick(tick_lower)?,
                    get_sqrt_ratio_at_tick(tick_upper)?,
                    liquidity_delta,
                )?;
            }
        }

        Ok(ModifyStaged {
            key,
            position,
            lower: TickWrite {
                tick: tick_lower,
                info: (lower_after.liquidity_gross > 0).then_some(lower_after),
                flipped: flipped_lower,
            },
            upper: TickWrite {
                tick: tick_upper,
                info: (upper_after.liquidity_gross > 0).then_some(upper_after),
                flipped: flipped_upper,
            },
            pool_liquidity,
            amount0,
            amount1,
        })
    }

    pub(crate) fn apply_modify(&mut self, staged: ModifyStaged) {
        for write in [staged.lower, staged.upper] {
            if write.flipped {
                tick_bitmap::flip_tick_unchecked(&mut self.bitmap, write.tick, self.tick_spacing);
            }
            match write.info {
                Some(info) => {
                    self.ticks.insert(write.tick, info);
                }
                None => {
                    self.ticks.remove(&write.tick);
                }
            }
        }
        self.positions.insert(staged.key, staged.position);
        self.liquidity = staged.pool_liquidity;
    }

    pub(crate) fn lock(&mut self) -> Result<(), Error> {
        if self.slot0.sqrt_price_x96.is_zero() {
            return Err(PoolError::NotInitialized.into());
        }
        if !self.slot0.unlocked {
            return Err(PoolError::Reentrancy.into());
        }
        self.slot0.unlocked = false;
        Ok(())
    }

    // --- observers ---

    pub fn slot0(&self) -> Slot0 {
        self.slot0
    }

    pub fn liquidity(&self) -> u128 {
        self.liquidity
    }

    pub fn fee_growth_global_0_x128(&self) -> U256 {
        self.fee_growth_global_0_x128
    }

    pub fn fee_growth_global_1_x128(&self) -> U256 {
        self.fee_growth_global_1_x128
    }

    pub fn tick(&self, tick: i32) -> Option<&TickInfo> {
        self.ticks.get(&tick)
    }

    pub fn bitmap_word(&self, word: i16) -> U256 {
        tick_bitmap::get_word(&self.bitmap, word)
    }

    pub fn position(
        &self,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
    ) -> Option<&PositionInfo> {
        self.positions.get(&PositionKey {
            owner,
            tick_lower,
            tick_upper,
        })
    }

    pub fn pool_address(&self) -> Address {
        self.pool_address
    }

    pub fn token0(&self) -> Address {
        self.token0
    }

    pub fn token1(&self) -> Address {
        self.token1
    }

    pub fn fee(&self) -> u32 {
        self.fee_pips
    }

    pub fn tick_spacing(&self) -> i32 {
        self.tick_spacing
    }

    pub fn max_liquidity_per_tick(&self) -> u128 {
        self.max_liquidity_per_tick
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }
}

fn check_ticks(tick_lower: i32, tick_upper: i32, tick_spacing: i32) -> Result<(), Error> {
    if tick_lower >= tick_upper {
        return Err(PoolError::InvalidTickRange.into());
    }
    if tick_lower < MIN_TICK || tick_upper > MAX_TICK {
        return Err(StateError::TickOutOfRange.into());
    }
    if tick_lower % tick_spacing != 0 || tick_upper % tick_spacing != 0 {
        return Err(PoolError::TickNotSpaced.into());
    }
    Ok(())
}
