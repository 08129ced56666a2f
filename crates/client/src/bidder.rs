//! Client-side bidder state.

use thiserror::Error;

use auction_ledger::Ledger;
use auction_types::{Amount, Identity, Keypair};

/// Errors from the bidder view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BidderError {
    #[error("Bid already submitted by {0}")]
    AlreadySubmitted(String),

    #[error("No bid amount set for {0}")]
    NoBid(String),
}

/// Anything that can report a ledger balance.
pub trait BalanceSource {
    fn balance_of(&self, identity: &Identity) -> Amount;
}

impl<L: Ledger> BalanceSource for L {
    fn balance_of(&self, identity: &Identity) -> Amount {
        self.balance(identity)
    }
}

/// One participant as seen from a UI.
///
/// This is a snapshot, not ledger state. The `submitted` flag only stops
/// this client from bidding twice; the auction itself accepts re-bids.
#[derive(Debug, Clone)]
pub struct Bidder {
    keypair: Keypair,
    name: String,
    initial_balance: Amount,
    balance: Amount,
    bid: Option<Amount>,
    submitted: bool,
}

impl Bidder {
    pub fn new(name: impl Into<String>, keypair: Keypair, initial_balance: Amount) -> Self {
        Self {
            keypair,
            name: name.into(),
            initial_balance,
            balance: initial_balance,
            bid: None,
            submitted: false,
        }
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    pub fn identity(&self) -> Identity {
        self.keypair.public()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn initial_balance(&self) -> Amount {
        self.initial_balance
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn bid(&self) -> Option<Amount> {
        self.bid
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Net change since the snapshot was created.
    pub fn balance_delta(&self) -> i128 {
        i128::from(self.balance) - i128::from(self.initial_balance)
    }

    /// Choose the amount to bid.
    pub fn set_bid(&mut self, amount: Amount) -> Result<(), BidderError> {
        if self.submitted {
            return Err(BidderError::AlreadySubmitted(self.name.clone()));
        }
        self.bid = Some(amount);
        Ok(())
    }

    /// Amount to send, if this bidder may still bid.
    pub fn pending_bid(&self) -> Result<Amount, BidderError> {
        if self.submitted {
            return Err(BidderError::AlreadySubmitted(self.name.clone()));
        }
        self.bid.ok_or_else(|| BidderError::NoBid(self.name.clone()))
    }

    /// Record that the ledger accepted the pending bid.
    pub fn mark_submitted(&mut self) -> Result<Amount, BidderError> {
        let amount = self.pending_bid()?;
        self.submitted = true;
        Ok(amount)
    }

    /// Overwrite the balance snapshot.
    pub fn set_balance(&mut self, balance: Amount) {
        self.balance = balance;
    }

    /// Pull the current balance from `source`.
    pub fn refresh_balance<S: BalanceSource>(&mut self, source: &S) -> Amount {
        self.balance = source.balance_of(&self.identity());
        self.balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auction_ledger::LocalLedger;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn bidder(balance: Amount) -> Bidder {
        let keypair = Keypair::generate(&mut StdRng::seed_from_u64(7));
        Bidder::new("alice", keypair, balance)
    }

    #[test]
    fn test_submit_once() {
        let mut alice = bidder(100);
        assert_eq!(alice.pending_bid(), Err(BidderError::NoBid("alice".into())));

        alice.set_bid(40).unwrap();
        assert_eq!(alice.mark_submitted(), Ok(40));
        assert!(alice.is_submitted());

        assert_eq!(
            alice.set_bid(30),
            Err(BidderError::AlreadySubmitted("alice".into()))
        );
        assert_eq!(alice.bid(), Some(40));
    }

    #[test]
    fn test_refresh_from_ledger() {
        let mut alice = bidder(100);
        let ledger = LocalLedger::with_genesis([(alice.identity(), 90)]);

        assert_eq!(alice.refresh_balance(&ledger), 90);
        assert_eq!(alice.initial_balance(), 100);
        assert_eq!(alice.balance_delta(), -10);
    }

    #[test]
    fn test_custom_source() {
        struct Fixed(Amount);
        impl BalanceSource for Fixed {
            fn balance_of(&self, _: &Identity) -> Amount {
                self.0
            }
        }

        let mut alice = bidder(0);
        alice.refresh_balance(&Fixed(55));
        assert_eq!(alice.balance(), 55);
    }
}
