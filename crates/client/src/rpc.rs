//! Typed JSON-RPC client for the mock chain.

use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::ClientError;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use auction_types::{
    Amount, AuctionPhase, AuctionSummary, Identity, IdentityParseError, Keypair, RevealOutcome,
};

use crate::bidder::{Bidder, BidderError};

/// Errors submitting a bidder's pending bid.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Bidder(#[from] BidderError),

    #[error("RPC request failed: {0}")]
    Rpc(#[from] ClientError),
}

/// Account returned by `admin_newAccount`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    pub identity: Identity,
    pub secret: String,
    pub balance: Amount,
}

impl NewAccount {
    pub fn keypair(&self) -> Result<Keypair, IdentityParseError> {
        Keypair::from_secret_hex(&self.secret)
    }
}

/// Parameters for `auction_deploy`. Unset costs take the chain defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployRequest {
    pub payer_secret: String,
    pub whitelist: Vec<Identity>,
    pub participation_cost: Option<Amount>,
    pub bid_threshold: Option<Amount>,
}

/// Response of `auction_deploy`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployedAuction {
    pub address: Identity,
    pub whitelist: Vec<Identity>,
    pub participation_cost: Amount,
    pub bid_threshold: Amount,
    pub initial_balance: Amount,
}

#[derive(Debug, Serialize)]
struct BidRequest<'a> {
    auction: Identity,
    bidder_secret: &'a str,
    amount: Amount,
}

#[derive(Debug, Serialize)]
struct RevealRequest<'a> {
    auction: Identity,
    caller_secret: Option<&'a str>,
}

/// Mock chain client.
pub struct AuctionRpcClient {
    inner: HttpClient,
}

impl AuctionRpcClient {
    pub fn connect(url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            inner: HttpClientBuilder::default().build(url)?,
        })
    }

    pub async fn new_account(&self, fund: Amount) -> Result<NewAccount, ClientError> {
        self.inner.request("admin_newAccount", (fund,)).await
    }

    pub async fn fund(&self, identity: Identity, amount: Amount) -> Result<Amount, ClientError> {
        self.inner.request("admin_fund", (identity, amount)).await
    }

    pub async fn balance(&self, identity: Identity) -> Result<Amount, ClientError> {
        self.inner.request("chain_getBalance", (identity,)).await
    }

    /// `None` when the chain is already busy deploying another auction.
    pub async fn deploy(
        &self,
        request: &DeployRequest,
    ) -> Result<Option<DeployedAuction>, ClientError> {
        self.inner.request("auction_deploy", (request,)).await
    }

    pub async fn bid(
        &self,
        auction: Identity,
        bidder: &Keypair,
        amount: Amount,
    ) -> Result<bool, ClientError> {
        let secret = bidder.secret_hex();
        let request = BidRequest {
            auction,
            bidder_secret: &secret,
            amount,
        };
        debug!("Submitting bid on {} from {}", auction.short(), bidder.public().short());
        self.inner.request("auction_bid", (request,)).await
    }

    /// Reveal signed by `caller`, or by the auction authority when `None`.
    pub async fn reveal(
        &self,
        auction: Identity,
        caller: Option<&Keypair>,
    ) -> Result<RevealOutcome, ClientError> {
        let secret = caller.map(Keypair::secret_hex);
        let request = RevealRequest {
            auction,
            caller_secret: secret.as_deref(),
        };
        self.inner.request("auction_reveal", (request,)).await
    }

    pub async fn auction(&self, address: Identity) -> Result<Option<AuctionSummary>, ClientError> {
        self.inner.request("query_getAuction", (address,)).await
    }

    pub async fn auctions(&self) -> Result<Vec<AuctionSummary>, ClientError> {
        self.inner
            .request("query_listAuctions", Vec::<()>::new())
            .await
    }

    pub async fn phase(&self, address: Identity) -> Result<Option<AuctionPhase>, ClientError> {
        self.inner.request("query_getPhase", (address,)).await
    }

    pub async fn is_whitelisted(
        &self,
        address: Identity,
        identity: Identity,
    ) -> Result<bool, ClientError> {
        self.inner
            .request("query_isWhitelisted", (address, identity))
            .await
    }

    /// Submit the bidder's pending bid and refresh its balance snapshot.
    pub async fn submit(&self, auction: Identity, bidder: &mut Bidder) -> Result<(), SubmitError> {
        let amount = bidder.pending_bid()?;
        self.bid(auction, bidder.keypair(), amount).await?;
        bidder.mark_submitted()?;
        self.refresh(bidder).await?;
        Ok(())
    }

    /// Pull the bidder's current balance from the chain.
    pub async fn refresh(&self, bidder: &mut Bidder) -> Result<Amount, ClientError> {
        let balance = self.balance(bidder.identity()).await?;
        bidder.set_balance(balance);
        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let auction = Identity([1u8; 32]);
        let keypair = Keypair::from_secret([2u8; 32]);
        let secret = keypair.secret_hex();

        let value = serde_json::to_value(RevealRequest {
            auction,
            caller_secret: None,
        })
        .unwrap();
        assert_eq!(value["auction"], serde_json::json!(auction.to_hex()));
        assert!(value["caller_secret"].is_null());

        let value = serde_json::to_value(BidRequest {
            auction,
            bidder_secret: &secret,
            amount: 9,
        })
        .unwrap();
        assert_eq!(value["bidder_secret"], serde_json::json!(secret));
        assert_eq!(value["amount"], serde_json::json!(9));
    }

    #[test]
    fn test_connect_rejects_bad_url() {
        assert!(AuctionRpcClient::connect("not a url").is_err());
    }
}
