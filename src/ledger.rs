use alloy_primitives::{Address, U256};
use thiserror::Error;

/// Failures reported by the external asset ledger. These abort the calling
/// pool operation with engine state unchanged; unwinding any transfer that
/// already landed is the ledger host's concern.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("ledger error - insufficient balance")]
    InsufficientBalance,
    #[error("ledger error - transfer rejected")]
    TransferRejected,
}

/// Custody capability injected at pool construction. The pool never holds
/// asset balances itself; it requests and releases them through this
/// interface, in the token's native units.
///
/// A zero-amount transfer must succeed and change nothing.
pub trait AssetLedger {
    /// Moves `amount` of `token` from `from` into `to`.
    fn transfer_from(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), LedgerError>;

    /// Moves `amount` of `token` out of the pool's custody account into `to`.
    fn transfer(&mut self, token: Address, to: Address, amount: U256) -> Result<(), LedgerError>;
}
