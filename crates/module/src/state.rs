//! Contract-local state of a sealed-bid auction.
//!
//! This struct is stored borsh-encoded in the auction's own ledger account
//! and is only ever rewritten inside a ledger transaction.

use std::collections::BTreeSet;

use auction_types::{Amount, AuctionPhase, AuctionSummary, Identity, RevealOutcome};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::params::AuctionParams;

/// Auction state.
///
/// `lowest_bid` and `winner` are plain fields: the bid amounts are only
/// hidden from other participants by not being exposed through queries
/// before settlement, not cryptographically.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct SealedBidAuction {
    /// The auction's own identity; also the reveal authority
    pub address: Identity,

    /// Identities allowed to bid. Fixed at deployment.
    pub whitelist: BTreeSet<Identity>,

    /// Fee moved from bidder to auction on every accepted bid
    pub participation_cost: Amount,

    /// Ceiling configured at deployment
    pub bid_threshold: Amount,

    /// Current minimum accepted bid, seeded with `bid_threshold`
    pub lowest_bid: Amount,

    /// Holder of `lowest_bid`; equals `address` while nobody qualified
    pub winner: Identity,

    pub phase: AuctionPhase,

    /// Number of accepted bids
    pub bid_count: u64,
}

impl SealedBidAuction {
    /// Create a freshly deployed auction.
    pub fn new(address: Identity, params: &AuctionParams) -> Self {
        Self {
            address,
            whitelist: params.whitelist.iter().copied().collect(),
            participation_cost: params.participation_cost,
            bid_threshold: params.bid_threshold,
            lowest_bid: params.bid_threshold,
            winner: address,
            phase: AuctionPhase::Created,
            bid_count: 0,
        }
    }

    pub fn is_whitelisted(&self, identity: &Identity) -> bool {
        self.whitelist.contains(identity)
    }

    /// Whether some bidder has gone below the threshold.
    pub fn has_winner(&self) -> bool {
        self.winner != self.address
    }

    pub fn is_settled(&self) -> bool {
        self.phase == AuctionPhase::Settled
    }

    /// Whether `caller` may reveal: the current winner or the auction itself.
    pub fn can_reveal(&self, caller: &Identity) -> bool {
        *caller == self.winner || *caller == self.address
    }

    /// Count an accepted bid and take the lead if it is strictly lower.
    ///
    /// Returns `true` when `bidder` became the new winner. Ties keep the
    /// earlier bidder.
    pub fn record_bid(&mut self, bidder: Identity, amount: Amount) -> bool {
        self.bid_count += 1;
        if amount < self.lowest_bid {
            self.lowest_bid = amount;
            self.winner = bidder;
            true
        } else {
            false
        }
    }

    /// Move to `Settled` and return what gets disclosed.
    pub fn settle(&mut self) -> RevealOutcome {
        self.phase = AuctionPhase::Settled;
        RevealOutcome {
            lowest_bid: self.lowest_bid,
            winner: self.winner,
        }
    }

    /// Caller-facing view, given the auction account's balance.
    pub fn summary(&self, balance: Amount) -> AuctionSummary {
        let settled = self.is_settled();
        AuctionSummary {
            address: self.address,
            whitelist: self.whitelist.iter().copied().collect(),
            participation_cost: self.participation_cost,
            bid_threshold: self.bid_threshold,
            phase: self.phase,
            balance,
            bid_count: self.bid_count,
            lowest_bid: settled.then_some(self.lowest_bid),
            winner: settled.then_some(self.winner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUCTION: Identity = Identity([0u8; 32]);
    const A: Identity = Identity([1u8; 32]);
    const B: Identity = Identity([2u8; 32]);
    const C: Identity = Identity([3u8; 32]);

    fn auction() -> SealedBidAuction {
        SealedBidAuction::new(AUCTION, &AuctionParams::new(vec![A, B, C, A], 10, 1_000_000))
    }

    #[test]
    fn test_new_auction() {
        let auction = auction();
        assert_eq!(auction.whitelist.len(), 3);
        assert_eq!(auction.lowest_bid, 1_000_000);
        assert_eq!(auction.winner, AUCTION);
        assert_eq!(auction.phase, AuctionPhase::Created);
        assert!(!auction.has_winner());
    }

    #[test]
    fn test_record_bid_strictly_lower() {
        let mut auction = auction();

        assert!(auction.record_bid(A, 500));
        assert!(auction.record_bid(B, 300));
        // equal bid keeps the earlier winner
        assert!(!auction.record_bid(C, 300));
        assert!(!auction.record_bid(C, 400));

        assert_eq!(auction.lowest_bid, 300);
        assert_eq!(auction.winner, B);
        assert_eq!(auction.bid_count, 4);
    }

    #[test]
    fn test_bid_at_threshold_does_not_qualify() {
        let mut auction = auction();
        assert!(!auction.record_bid(A, 1_000_000));
        assert!(!auction.has_winner());
        assert_eq!(auction.bid_count, 1);
    }

    #[test]
    fn test_can_reveal() {
        let mut auction = auction();
        auction.record_bid(B, 300);

        assert!(auction.can_reveal(&B));
        assert!(auction.can_reveal(&AUCTION));
        assert!(!auction.can_reveal(&A));
    }

    #[test]
    fn test_summary_hides_result_until_settled() {
        let mut auction = auction();
        auction.record_bid(A, 500);

        let summary = auction.summary(42);
        assert_eq!(summary.balance, 42);
        assert_eq!(summary.lowest_bid, None);
        assert_eq!(summary.winner, None);

        let outcome = auction.settle();
        assert_eq!(outcome.lowest_bid, 500);
        assert_eq!(outcome.winner, A);

        let summary = auction.summary(0);
        assert_eq!(summary.phase, AuctionPhase::Settled);
        assert_eq!(summary.lowest_bid, Some(500));
        assert_eq!(summary.winner, Some(A));
    }

    #[test]
    fn test_borsh_encoding() {
        let auction = auction();
        let encoded = borsh::to_vec(&auction).unwrap();
        let decoded: SealedBidAuction = borsh::from_slice(&encoded).unwrap();
        assert_eq!(auction, decoded);
    }
}
