//! RPC-compatible types for the mock chain.
//!
//! Identities travel as hex strings; secret keys are hex-encoded 32-byte
//! secrets. This is a local simulator, so signers hand their secret to the
//! server instead of signing client-side.

use auction_lifecycle::DeployedAuction;
use auction_types::{Amount, Identity};
use serde::{Deserialize, Serialize};

/// Freshly created account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccountRpc {
    pub identity: Identity,
    /// Hex-encoded secret (32 bytes)
    pub secret: String,
    pub balance: Amount,
}

/// Parameters for deploying an auction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployParamsRpc {
    /// Hex-encoded secret of the account funding the auction
    pub payer_secret: String,
    pub whitelist: Vec<Identity>,
    pub participation_cost: Option<Amount>,
    pub bid_threshold: Option<Amount>,
}

/// Deployed auction for RPC responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployedAuctionRpc {
    pub address: Identity,
    pub whitelist: Vec<Identity>,
    pub participation_cost: Amount,
    pub bid_threshold: Amount,
    pub initial_balance: Amount,
}

impl From<DeployedAuction> for DeployedAuctionRpc {
    fn from(d: DeployedAuction) -> Self {
        Self {
            address: d.address,
            whitelist: d.params.whitelist,
            participation_cost: d.params.participation_cost,
            bid_threshold: d.params.bid_threshold,
            initial_balance: d.initial_balance,
        }
    }
}

/// Parameters for submitting a bid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidParamsRpc {
    pub auction: Identity,
    /// Hex-encoded secret of the bidder
    pub bidder_secret: String,
    pub amount: Amount,
}

/// Parameters for revealing the winner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealParamsRpc {
    pub auction: Identity,
    /// Hex-encoded secret of the caller; the auction authority signs when absent
    pub caller_secret: Option<String>,
}
