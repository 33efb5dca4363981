use alloy_primitives::U256;

pub mod error;
mod hash;
pub mod ledger;
pub mod math;
pub mod pool;

pub use hash::FastMap;
pub use ledger::{AssetLedger, LedgerError};

pub use pool::clmm_pool::{ClmmPool, Slot0};
pub use pool::swap::{SwapParams, SwapResult};

/// Number of fractional bits in a Q64.96 square-root price.
pub const RESOLUTION: u8 = 96;

/// 2^96, one in Q64.96.
pub const Q96: U256 = U256::from_limbs([0, 4294967296, 0, 0]);

/// 2^128, one in Q128.128. Fee-growth accumulators are expressed in this
/// format and wrap modulo 2^256.
pub const Q128: U256 = U256::from_limbs([0, 0, 1, 0]);

/// Swap fees are expressed in hundredths of a bip, i.e. parts per million.
pub const FEE_PIPS_DENOMINATOR: u32 = 1_000_000;

pub(crate) const U160_MAX: U256 = U256::from_limbs([u64::MAX, u64::MAX, 4294967295, 0]);
