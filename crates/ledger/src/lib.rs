//! Ledger adapter for sealed-bid auctions.
//!
//! The auction protocol never touches balances directly. It runs inside a
//! [`Transaction`] handed out by a [`Ledger`], which provides:
//!
//! - Balance queries for any identity
//! - Fresh identities (key pairs)
//! - Atomic execution of a closure under a signer's authority
//! - Contract-local state stored alongside an account's balance
//!
//! [`LocalLedger`] is the in-memory implementation used by the mock chain
//! and the tests. It serializes transactions behind a single lock and only
//! commits a transaction's staged writes when its closure succeeds.

pub mod error;
pub mod local;
pub mod transaction;

use auction_types::{Amount, Identity, Keypair};
use borsh::BorshDeserialize;

pub use error::LedgerError;
pub use local::LocalLedger;
pub use transaction::{Account, Transaction};

/// Capability consumed by the auction protocol.
pub trait Ledger: Send + Sync {
    /// Current balance of `identity`. Unknown accounts hold nothing.
    fn balance(&self, identity: &Identity) -> Amount;

    /// Generate a fresh identity. No account exists for it until funded.
    fn new_identity(&self) -> Keypair;

    /// Run `f` as one atomic transaction signed by `signer`.
    ///
    /// Writes made through the transaction become visible only if `f`
    /// returns `Ok`. No other transaction observes or interleaves with it.
    fn execute<T, E, F>(&self, signer: &Keypair, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<T, E>;

    /// Read the contract-local state stored under `account`.
    fn load_state<S: BorshDeserialize>(&self, account: &Identity) -> Result<S, LedgerError>;
}
