//! Call handlers for the auction module.
//!
//! These functions implement the business logic for each call type. Every
//! handler runs inside a single ledger transaction: if it returns an error
//! the ledger discards all of its writes, balances and auction state alike.

use auction_ledger::{LedgerError, Transaction};
use auction_types::{Amount, Identity, RevealOutcome};
use tracing::debug;

use crate::error::AuctionError;
use crate::params::AuctionParams;
use crate::state::SealedBidAuction;

/// Context for each call.
///
/// The caller is passed explicitly instead of being looked up from the
/// transaction inside the handlers.
#[derive(Clone, Copy, Debug)]
pub struct CallContext {
    /// Identity on whose behalf the call runs
    pub sender: Identity,
    /// Auction the call targets
    pub auction: Identity,
}

impl CallContext {
    /// Context for a call signed by the transaction's sender.
    pub fn from_transaction(tx: &Transaction<'_>, auction: Identity) -> Self {
        Self {
            sender: tx.sender(),
            auction,
        }
    }
}

/// Result type for handlers.
pub type HandlerResult<T> = Result<T, AuctionError>;

/// Load the auction stored at `address`.
pub fn load_auction(tx: &Transaction<'_>, address: &Identity) -> HandlerResult<SealedBidAuction> {
    tx.load_state(address).map_err(|e| match e {
        LedgerError::MissingState(_) => AuctionError::AuctionNotFound(*address),
        other => AuctionError::Ledger(other),
    })
}

/// Handle deployment of a new auction at `ctx.auction`, funded by `ctx.sender`.
pub fn handle_initialize(
    tx: &mut Transaction<'_>,
    ctx: &CallContext,
    params: &AuctionParams,
    initial_balance: Amount,
) -> HandlerResult<SealedBidAuction> {
    tx.create_account(&ctx.auction)?;
    tx.transfer(&ctx.sender, &ctx.auction, initial_balance)?;

    let auction = SealedBidAuction::new(ctx.auction, params);
    tx.store_state(&ctx.auction, &auction)?;

    debug!(
        "Initialized auction {} with {} whitelisted bidder(s)",
        ctx.auction.short(),
        auction.whitelist.len()
    );
    Ok(auction)
}

/// Handle Bid call.
///
/// Returns whether the bid became the new lowest.
pub fn handle_bid(
    tx: &mut Transaction<'_>,
    ctx: &CallContext,
    amount: Amount,
) -> HandlerResult<bool> {
    let mut auction = load_auction(tx, &ctx.auction)?;

    if auction.is_settled() {
        return Err(AuctionError::AuctionSettled);
    }

    if !auction.is_whitelisted(&ctx.sender) {
        return Err(AuctionError::NotWhitelisted(ctx.sender));
    }

    // Charged whether or not the bid takes the lead
    tx.transfer(&ctx.sender, &auction.address, auction.participation_cost)?;

    let became_lowest = auction.record_bid(ctx.sender, amount);
    tx.store_state(&auction.address, &auction)?;

    debug!(
        "Accepted bid #{} on {} from {}",
        auction.bid_count,
        auction.address.short(),
        ctx.sender.short()
    );
    Ok(became_lowest)
}

/// Handle RevealWinner call.
pub fn handle_reveal_winner(
    tx: &mut Transaction<'_>,
    ctx: &CallContext,
) -> HandlerResult<RevealOutcome> {
    let mut auction = load_auction(tx, &ctx.auction)?;

    if !auction.can_reveal(&ctx.sender) {
        return Err(AuctionError::Unauthorized(ctx.sender));
    }

    if auction.is_settled() {
        return Err(AuctionError::AuctionSettled);
    }

    // Without a qualifying bid the winner is the auction itself: nothing moves
    if auction.has_winner() {
        tx.transfer(&auction.address, &auction.winner, auction.lowest_bid)?;
    }

    let outcome = auction.settle();
    tx.store_state(&auction.address, &auction)?;

    debug!(
        "Settled auction {}: winner {} at {}",
        auction.address.short(),
        outcome.winner.short(),
        outcome.lowest_bid
    );
    Ok(outcome)
}
