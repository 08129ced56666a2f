//! Core type definitions for sealed-bid auctions.
//!
//! This crate provides the shared data structures used across the auction
//! system: ledger identities and key pairs, amounts, the auction phase and
//! the views handed back to callers.

use borsh::{BorshDeserialize, BorshSerialize};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =========================
// AMOUNTS
// =========================

/// Unsigned ledger amount.
pub type Amount = u64;

// =========================
// IDENTITIES
// =========================

/// Domain separator for deriving public identities from secrets.
const IDENTITY_DOMAIN: &[u8] = b"IDENTITY_V1:";

/// Public ledger identity (32 bytes).
///
/// Text form is lowercase hex, optionally `0x`-prefixed on input.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, BorshSerialize, BorshDeserialize)]
pub struct Identity(pub [u8; 32]);

impl Identity {
    /// Hex encoding of the identity.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a hex-encoded identity.
    pub fn from_hex(s: &str) -> Result<Self, IdentityParseError> {
        let bytes = hex::decode(s.trim_start_matches("0x"))
            .map_err(|e| IdentityParseError::InvalidHex(e.to_string()))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| IdentityParseError::InvalidLength(b.len()))?;
        Ok(Self(bytes))
    }

    /// Abbreviated form for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({}..)", self.short())
    }
}

impl FromStr for Identity {
    type Err = IdentityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as Deserialize>::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Errors parsing identities and secret keys from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityParseError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

/// Private identity: a 32-byte secret together with its public identity.
///
/// Holding a `Keypair` is what authorizes signing a ledger transaction.
#[derive(Clone, PartialEq, Eq)]
pub struct Keypair {
    secret: [u8; 32],
    public: Identity,
}

impl Keypair {
    /// Generate a fresh key pair.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut secret = [0u8; 32];
        rng.fill_bytes(&mut secret);
        Self::from_secret(secret)
    }

    /// Rebuild a key pair from its secret.
    pub fn from_secret(secret: [u8; 32]) -> Self {
        Self {
            secret,
            public: derive_identity(&secret),
        }
    }

    /// Parse a hex-encoded secret.
    pub fn from_secret_hex(s: &str) -> Result<Self, IdentityParseError> {
        let Identity(secret) = Identity::from_hex(s)?;
        Ok(Self::from_secret(secret))
    }

    /// Public identity of this key pair.
    pub fn public(&self) -> Identity {
        self.public
    }

    /// Hex encoding of the secret. Handle with care.
    pub fn secret_hex(&self) -> String {
        hex::encode(self.secret)
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

/// Derive the public identity for a secret.
pub fn derive_identity(secret: &[u8; 32]) -> Identity {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(IDENTITY_DOMAIN);
    hasher.update(secret);
    Identity(hasher.finalize().into())
}

// =========================
// AUCTION TYPES
// =========================

/// Auction lifecycle phase.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AuctionPhase {
    /// Deployed and accepting bids
    Created,
    /// Winner revealed and paid; terminal
    Settled,
}

impl fmt::Display for AuctionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuctionPhase::Created => f.write_str("created"),
            AuctionPhase::Settled => f.write_str("settled"),
        }
    }
}

/// Result disclosed by a successful reveal.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct RevealOutcome {
    pub lowest_bid: Amount,
    pub winner: Identity,
}

/// Caller-facing view of an auction.
///
/// `lowest_bid` and `winner` stay `None` until the auction is settled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionSummary {
    pub address: Identity,
    pub whitelist: Vec<Identity>,
    pub participation_cost: Amount,
    pub bid_threshold: Amount,
    pub phase: AuctionPhase,
    pub balance: Amount,
    pub bid_count: u64,
    pub lowest_bid: Option<Amount>,
    pub winner: Option<Identity>,
}
