//! Query handlers for the auction module.
//!
//! These functions provide read-only access to auction state.

use auction_ledger::{Ledger, LedgerError};
use auction_types::{Amount, AuctionPhase, AuctionSummary, Identity};
use serde::{Deserialize, Serialize};

use crate::error::AuctionError;
use crate::state::SealedBidAuction;

/// Query request types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum AuctionQuery {
    /// Get auction details by address.
    GetAuction { address: Identity },

    /// Get the phase of an auction.
    GetPhase { address: Identity },

    /// Check whether an identity may bid.
    IsWhitelisted { address: Identity, identity: Identity },

    /// Get the ledger balance of any identity.
    GetBalance { identity: Identity },
}

/// Query response types.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionQueryResponse {
    /// Auction details.
    Auction(Option<AuctionSummary>),

    /// Auction phase.
    Phase(Option<AuctionPhase>),

    /// Whitelist membership.
    Whitelisted(bool),

    /// Ledger balance.
    Balance(Amount),
}

/// Load an auction's state, `None` if no auction lives at `address`.
pub fn find_auction<L: Ledger>(
    ledger: &L,
    address: &Identity,
) -> Result<Option<SealedBidAuction>, AuctionError> {
    match ledger.load_state(address) {
        Ok(auction) => Ok(Some(auction)),
        Err(LedgerError::MissingState(_)) => Ok(None),
        Err(e) => Err(AuctionError::Ledger(e)),
    }
}

/// Caller-facing summary of the auction at `address`.
pub fn auction_summary<L: Ledger>(
    ledger: &L,
    address: &Identity,
) -> Result<Option<AuctionSummary>, AuctionError> {
    Ok(find_auction(ledger, address)?.map(|auction| auction.summary(ledger.balance(address))))
}

/// Handle a query.
pub fn handle_query<L: Ledger>(
    ledger: &L,
    query: AuctionQuery,
) -> Result<AuctionQueryResponse, AuctionError> {
    let response = match query {
        AuctionQuery::GetAuction { address } => {
            AuctionQueryResponse::Auction(auction_summary(ledger, &address)?)
        }

        AuctionQuery::GetPhase { address } => {
            AuctionQueryResponse::Phase(find_auction(ledger, &address)?.map(|a| a.phase))
        }

        AuctionQuery::IsWhitelisted { address, identity } => {
            let whitelisted = find_auction(ledger, &address)?
                .map(|a| a.is_whitelisted(&identity))
                .unwrap_or(false);
            AuctionQueryResponse::Whitelisted(whitelisted)
        }

        AuctionQuery::GetBalance { identity } => {
            AuctionQueryResponse::Balance(ledger.balance(&identity))
        }
    };

    Ok(response)
}
