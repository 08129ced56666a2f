//! Lifecycle error types.

use thiserror::Error;

use auction_module::{AuctionError, ParamsError};
use auction_types::Identity;

/// Errors surfaced by the lifecycle controller.
///
/// Each variant wraps the underlying cause; nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("Deployment failed: {0}")]
    DeploymentFailed(#[source] DeployFailure),

    #[error("Bid rejected: {0}")]
    BidRejected(#[source] AuctionError),

    #[error("Reveal rejected: {0}")]
    RevealRejected(#[source] AuctionError),

    #[error("Auction not deployed by this controller: {0}")]
    UnknownAuction(Identity),

    #[error("Query failed: {0}")]
    Query(#[source] AuctionError),
}

/// Why a deployment did not happen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeployFailure {
    #[error(transparent)]
    InvalidParams(#[from] ParamsError),

    #[error(transparent)]
    Transaction(#[from] AuctionError),
}
