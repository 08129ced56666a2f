//! Sealed-bid auction module.
//!
//! This module implements the protocol core of a sealed-bid auction:
//!
//! - Whitelist-gated bidding with a fixed participation cost per bid
//! - Continuous tracking of the lowest bid and its bidder
//! - A one-shot reveal that pays the winner and settles the auction
//!
//! # Architecture
//!
//! - `call`: Message types for state-changing operations
//! - `handlers`: Business logic for processing calls
//! - `queries`: Read-only state access
//! - `state`: Contract-local state stored in the auction's ledger account
//! - `params`: Deployment parameters
//! - `error`: Error types
//!
//! Every handler runs inside one [`auction_ledger::Transaction`], so the
//! whitelist check, the lowest-bid comparison and the balance moves of a
//! call either all apply or none do.
//!
//! # Example
//!
//! ```ignore
//! use auction_module::{handlers, CallContext};
//!
//! ledger.execute(&bidder, |tx| {
//!     let ctx = CallContext::from_transaction(tx, auction_address);
//!     handlers::handle_bid(tx, &ctx, 500)
//! })?;
//! ```

pub mod call;
pub mod error;
pub mod handlers;
pub mod params;
pub mod queries;
pub mod state;

pub use call::{AuctionCall, CallOutcome};
pub use error::AuctionError;
pub use handlers::{CallContext, HandlerResult};
pub use params::{AuctionParams, ParamsError};
pub use queries::{AuctionQuery, AuctionQueryResponse};
pub use state::SealedBidAuction;
