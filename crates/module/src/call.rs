//! Call message types for the auction module.

use auction_ledger::Transaction;
use auction_types::{Amount, RevealOutcome};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::handlers::{self, CallContext, HandlerResult};

/// State-changing calls against a deployed auction.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum AuctionCall {
    /// Submit a bid (whitelisted bidders only).
    Bid { amount: Amount },

    /// Disclose the winner and pay them (winner or auction authority).
    RevealWinner,
}

/// What a successfully dispatched call produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallOutcome {
    Bid { became_lowest: bool },
    Revealed(RevealOutcome),
}

impl AuctionCall {
    /// Route the call to its handler.
    pub fn dispatch(
        &self,
        tx: &mut Transaction<'_>,
        ctx: &CallContext,
    ) -> HandlerResult<CallOutcome> {
        match self {
            AuctionCall::Bid { amount } => {
                let became_lowest = handlers::handle_bid(tx, ctx, *amount)?;
                Ok(CallOutcome::Bid { became_lowest })
            }
            AuctionCall::RevealWinner => {
                handlers::handle_reveal_winner(tx, ctx).map(CallOutcome::Revealed)
            }
        }
    }

    /// Short name for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            AuctionCall::Bid { .. } => "bid",
            AuctionCall::RevealWinner => "reveal_winner",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::AuctionParams;
    use auction_ledger::{Ledger, LocalLedger};
    use auction_types::Keypair;

    #[test]
    fn test_dispatch_bid_then_reveal() {
        let payer = Keypair::from_secret([9u8; 32]);
        let auction = Keypair::from_secret([0u8; 32]);
        let bidder = Keypair::from_secret([1u8; 32]);
        let ledger =
            LocalLedger::with_genesis([(payer.public(), 1_000_000), (bidder.public(), 100)]);

        let params = AuctionParams::new(vec![bidder.public()], 10, 1_000);
        ledger
            .execute(&payer, |tx| {
                let ctx = CallContext::from_transaction(tx, auction.public());
                handlers::handle_initialize(tx, &ctx, &params, 5_000)
            })
            .unwrap();

        let run = |signer: &Keypair, call: AuctionCall| {
            ledger.execute(signer, |tx| {
                let ctx = CallContext::from_transaction(tx, auction.public());
                call.dispatch(tx, &ctx)
            })
        };

        assert_eq!(
            run(&bidder, AuctionCall::Bid { amount: 400 }),
            Ok(CallOutcome::Bid {
                became_lowest: true
            })
        );
        assert_eq!(
            run(&bidder, AuctionCall::RevealWinner),
            Ok(CallOutcome::Revealed(RevealOutcome {
                lowest_bid: 400,
                winner: bidder.public(),
            }))
        );
    }

    #[test]
    fn test_call_borsh_encoding() {
        let call = AuctionCall::Bid { amount: 77 };
        let encoded = borsh::to_vec(&call).unwrap();
        assert_eq!(borsh::from_slice::<AuctionCall>(&encoded).unwrap(), call);
        assert_eq!(call.name(), "bid");
        assert_eq!(AuctionCall::RevealWinner.name(), "reveal_winner");
    }
}
