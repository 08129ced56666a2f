//! Ledger error types.

use thiserror::Error;

use auction_types::{Amount, Identity};

/// Errors raised while executing a ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Insufficient funds in {account}: need {required}, have {available}")]
    InsufficientFunds {
        account: Identity,
        required: Amount,
        available: Amount,
    },

    #[error("Account already exists: {0}")]
    AccountExists(Identity),

    #[error("No contract state stored under {0}")]
    MissingState(Identity),

    #[error("Balance overflow for {0}")]
    BalanceOverflow(Identity),

    #[error("Contract state codec error: {0}")]
    StateCodec(String),
}
