use thiserror::Error;

pub use crate::ledger::LedgerError;

/// Failures of the 256-bit fixed-point primitives.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MathError {
    #[error("math error - overflow")]
    Overflow,
    #[error("math error - division by zero")]
    DivisionByZero,
    #[error("bit math error - zero input value")]
    ZeroValue,
}

/// Domain failures of the price/tick conversions and reserve math.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("state error - tick out of range")]
    TickOutOfRange,
    #[error("state error - sqrt price out of range")]
    SqrtPriceOutOfRange,
    #[error("state error - sqrt price is zero")]
    SqrtPriceIsZero,
    #[error("state error - liquidity is zero")]
    LiquidityIsZero,
    #[error("state error - requested amount exceeds virtual reserves")]
    InsufficientReserves,
}

/// Failures of signed liquidity application and per-tick liquidity caps.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LiquidityError {
    #[error("liquidity error - overflow")]
    Overflow,
    #[error("liquidity error - underflow")]
    Underflow,
}

/// Input rejections surfaced by the pool operations. State is unchanged
/// whenever one of these is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("pool error - reentrant call")]
    Reentrancy,
    #[error("pool error - pool is not initialized")]
    NotInitialized,
    #[error("pool error - pool is already initialized")]
    AlreadyInitialized,
    #[error("pool error - tick range is inverted or empty")]
    InvalidTickRange,
    #[error("pool error - tick is not a multiple of the tick spacing")]
    TickNotSpaced,
    #[error("pool error - amount specified is zero")]
    ZeroAmount,
    #[error("pool error - sqrt price limit is on the wrong side of the price")]
    InvalidSqrtPriceLimit,
    #[error("pool error - poke on a position with no liquidity")]
    PokeWithoutLiquidity,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    MathError(#[from] MathError),

    #[error(transparent)]
    StateError(#[from] StateError),

    #[error(transparent)]
    LiquidityError(#[from] LiquidityError),

    #[error(transparent)]
    PoolError(#[from] PoolError),

    #[error(transparent)]
    LedgerError(#[from] LedgerError),
}
