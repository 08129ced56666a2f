//! Lifecycle controller for sealed-bid auctions.
//!
//! The controller is the façade callers use:
//!
//! - `deploy`: create a fresh auction identity, fund it and store the
//!   initial contract state, guarded so concurrent deploys do not race
//! - `submit_bid`: one ledger transaction invoking the bid handler
//! - `reveal`: one ledger transaction invoking the reveal handler
//!
//! Ledger-level failures are surfaced as [`LifecycleError`] variants that
//! wrap the underlying cause. Nothing is retried automatically.

pub mod config;
pub mod controller;
pub mod error;

pub use config::{ConfigError, ControllerConfig, DEFAULT_INITIAL_AUCTION_BALANCE};
pub use controller::{AuctionController, DeployedAuction};
pub use error::{DeployFailure, LifecycleError};
