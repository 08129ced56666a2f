//! Auction module error types.

use thiserror::Error;

use auction_ledger::LedgerError;
use auction_types::{Amount, Identity};

/// Errors that can occur in the auction module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuctionError {
    #[error("Bidder not whitelisted: {0}")]
    NotWhitelisted(Identity),

    #[error("Insufficient funds: need {required}, have {available}")]
    InsufficientFunds { required: Amount, available: Amount },

    #[error("Not authorized to reveal: {0}")]
    Unauthorized(Identity),

    #[error("Auction already settled")]
    AuctionSettled,

    #[error("Auction not found: {0}")]
    AuctionNotFound(Identity),

    #[error("Ledger error: {0}")]
    Ledger(LedgerError),
}

impl From<LedgerError> for AuctionError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientFunds {
                required,
                available,
                ..
            } => AuctionError::InsufficientFunds {
                required,
                available,
            },
            other => AuctionError::Ledger(other),
        }
    }
}
