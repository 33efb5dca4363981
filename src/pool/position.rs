use crate::error::{Error, PoolError};
use crate::math::liquidity_math::add_delta;
use crate::math::math_helpers::mul_div;
use crate::Q128;
use alloy_primitives::{Address, U256};

/// Positions are identified by owner and range; the same owner minting the
/// same range twice grows one position.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PositionKey {
    pub owner: Address,
    pub tick_lower: i32,
    pub tick_upper: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PositionInfo {
    /// Liquidity currently provided by this position.
    pub liquidity: u128,
    /// Inside fee growth at the last update, token0, Q128.128.
    pub fee_growth_inside_0_last_x128: U256,
    /// Same for token1.
    pub fee_growth_inside_1_last_x128: U256,
    /// Fees and burned principal collectable through `collect`.
    pub tokens_owed_0: u128,
    pub tokens_owed_1: u128,
}

/// Settles fees accrued since the last snapshot into `tokens_owed` and
/// applies the liquidity change, returning the updated record.
///
/// A zero delta is a fee poke and requires existing liquidity. The
/// snapshot difference wraps by design; the owed amounts saturate, holders
/// are expected to collect long before the cap.
pub fn update(
    info: &PositionInfo,
    liquidity_delta: i128,
    fee_growth_inside_0_x128: U256,
    fee_growth_inside_1_x128: U256,
) -> Result<PositionInfo, Error> {
    if liquidity_delta == 0 && info.liquidity == 0 {
        return Err(PoolError::PokeWithoutLiquidity.into());
    }

    let owed_0 = mul_div(
        fee_growth_inside_0_x128.wrapping_sub(info.fee_growth_inside_0_last_x128),
        U256::from(info.liquidity),
        Q128,
    )?;
    let owed_1 = mul_div(
        fee_growth_inside_1_x128.wrapping_sub(info.fee_growth_inside_1_last_x128),
        U256::from(info.liquidity),
        Q128,
    )?;

    Ok(PositionInfo {
        liquidity: add_delta(info.liquidity, liquidity_delta)?,
        fee_growth_inside_0_last_x128: fee_growth_inside_0_x128,
        fee_growth_inside_1_last_x128: fee_growth_inside_1_x128,
        tokens_owed_0: info
            .tokens_owed_0
            .saturating_add(owed_0.saturating_to::<u128>()),
        tokens_owed_1: info
            .tokens_owed_1
            .saturating_add(owed_1.saturating_to::<u128>()),
    })
}
