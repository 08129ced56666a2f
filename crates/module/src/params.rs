//! Deployment parameters for a sealed-bid auction.

use serde::{Deserialize, Serialize};

use auction_types::{Amount, Identity};

/// Fee charged per accepted bid when none is configured.
pub const DEFAULT_PARTICIPATION_COST: Amount = 10;

/// Bid ceiling when none is configured.
pub const DEFAULT_BID_THRESHOLD: Amount = 1_000_000;

/// Configuration fixed at deployment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionParams {
    /// Identities allowed to bid. Duplicates are ignored.
    pub whitelist: Vec<Identity>,

    /// Charged to the bidder on every accepted bid
    #[serde(default = "default_participation_cost")]
    pub participation_cost: Amount,

    /// Initial lowest bid; bids at or above it never win
    #[serde(default = "default_bid_threshold")]
    pub bid_threshold: Amount,
}

fn default_participation_cost() -> Amount {
    DEFAULT_PARTICIPATION_COST
}

fn default_bid_threshold() -> Amount {
    DEFAULT_BID_THRESHOLD
}

impl AuctionParams {
    pub fn new(whitelist: Vec<Identity>, participation_cost: Amount, bid_threshold: Amount) -> Self {
        Self {
            whitelist,
            participation_cost,
            bid_threshold,
        }
    }

    /// Parameters with the default cost and threshold.
    pub fn with_defaults(whitelist: Vec<Identity>) -> Self {
        Self::new(
            whitelist,
            DEFAULT_PARTICIPATION_COST,
            DEFAULT_BID_THRESHOLD,
        )
    }

    /// Validate the parameters.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.whitelist.is_empty() {
            return Err(ParamsError::EmptyWhitelist);
        }

        // Nothing is strictly below zero, so no bid could ever qualify
        if self.bid_threshold == 0 {
            return Err(ParamsError::ZeroThreshold);
        }

        Ok(())
    }
}

/// Errors that can occur during parameter validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamsError {
    #[error("Whitelist cannot be empty")]
    EmptyWhitelist,

    #[error("Bid threshold must be greater than zero")]
    ZeroThreshold,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = AuctionParams::with_defaults(vec![Identity([1u8; 32])]);
        assert_eq!(params.participation_cost, 10);
        assert_eq!(params.bid_threshold, 1_000_000);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_empty_whitelist() {
        let params = AuctionParams::with_defaults(vec![]);
        assert_eq!(params.validate(), Err(ParamsError::EmptyWhitelist));
    }

    #[test]
    fn test_zero_threshold() {
        let params = AuctionParams::new(vec![Identity([1u8; 32])], 10, 0);
        assert_eq!(params.validate(), Err(ParamsError::ZeroThreshold));
    }

    #[test]
    fn test_zero_participation_cost_is_allowed() {
        let params = AuctionParams::new(vec![Identity([1u8; 32])], 0, 100);
        assert!(params.validate().is_ok());
    }
}
