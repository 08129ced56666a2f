//! Client SDK for bidding in sealed-bid auctions.
//!
//! This crate provides:
//! - A client-side [`Bidder`] view that tracks one participant's balance
//!   snapshot and bid
//! - A typed JSON-RPC client for the mock chain

pub mod bidder;
pub mod rpc;

pub use bidder::{BalanceSource, Bidder, BidderError};
pub use rpc::{AuctionRpcClient, DeployRequest, NewAccount, SubmitError};
