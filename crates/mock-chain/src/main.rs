//! Mock chain server for local testing of sealed-bid auctions.
//!
//! This provides a JSON-RPC server that simulates the ledger (accounts,
//! balances, atomic transactions) and hosts the auction protocol on top of
//! it, without requiring a real blockchain.

use anyhow::Result;
use clap::Parser;
use jsonrpsee::core::async_trait;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObjectOwned;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use auction_ledger::{Ledger, LocalLedger};
use auction_lifecycle::{AuctionController, ControllerConfig};
use auction_module::params::{DEFAULT_BID_THRESHOLD, DEFAULT_PARTICIPATION_COST};
use auction_module::queries::handle_query;
use auction_module::{AuctionParams, AuctionQuery, AuctionQueryResponse};
use auction_types::{Amount, AuctionPhase, AuctionSummary, Identity, Keypair, RevealOutcome};

mod types;
use types::*;

#[derive(Parser)]
#[command(name = "mock-chain")]
#[command(about = "Local ledger simulator hosting sealed-bid auctions")]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:9944")]
    addr: SocketAddr,

    /// Controller config file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,
}

/// RPC API definition for the mock chain.
#[rpc(server)]
pub trait MockChainApi {
    // ============ Admin Methods ============

    /// Create a fresh account, optionally funded from the faucet.
    #[method(name = "admin_newAccount")]
    async fn admin_new_account(&self, fund: Amount) -> Result<NewAccountRpc, ErrorObjectOwned>;

    /// Mint funds into an account.
    #[method(name = "admin_fund")]
    async fn admin_fund(&self, identity: Identity, amount: Amount)
        -> Result<Amount, ErrorObjectOwned>;

    // ============ Auction Methods ============

    /// Deploy a new auction. Returns null if a deployment is already running.
    #[method(name = "auction_deploy")]
    async fn auction_deploy(
        &self,
        params: DeployParamsRpc,
    ) -> Result<Option<DeployedAuctionRpc>, ErrorObjectOwned>;

    /// Submit a bid.
    #[method(name = "auction_bid")]
    async fn auction_bid(&self, params: BidParamsRpc) -> Result<bool, ErrorObjectOwned>;

    /// Reveal the winner and settle.
    #[method(name = "auction_reveal")]
    async fn auction_reveal(
        &self,
        params: RevealParamsRpc,
    ) -> Result<RevealOutcome, ErrorObjectOwned>;

    // ============ Query Methods ============

    /// Get the balance of an account.
    #[method(name = "chain_getBalance")]
    async fn chain_get_balance(&self, identity: Identity) -> Result<Amount, ErrorObjectOwned>;

    /// Get auction by address.
    #[method(name = "query_getAuction")]
    async fn query_get_auction(
        &self,
        address: Identity,
    ) -> Result<Option<AuctionSummary>, ErrorObjectOwned>;

    /// List all auctions.
    #[method(name = "query_listAuctions")]
    async fn query_list_auctions(&self) -> Result<Vec<AuctionSummary>, ErrorObjectOwned>;

    /// Get the phase of an auction.
    #[method(name = "query_getPhase")]
    async fn query_get_phase(
        &self,
        address: Identity,
    ) -> Result<Option<AuctionPhase>, ErrorObjectOwned>;

    /// Check whether an identity may bid on an auction.
    #[method(name = "query_isWhitelisted")]
    async fn query_is_whitelisted(
        &self,
        address: Identity,
        identity: Identity,
    ) -> Result<bool, ErrorObjectOwned>;
}

/// Implementation of the mock chain RPC server.
struct MockChainServer {
    ledger: Arc<LocalLedger>,
    controller: AuctionController<LocalLedger>,
}

impl MockChainServer {
    fn new(config: ControllerConfig) -> Self {
        let ledger = Arc::new(LocalLedger::new());
        let controller = AuctionController::new(ledger.clone(), config);
        info!(
            "Auctions are funded with {} at deployment",
            controller.config().initial_auction_balance
        );
        Self { ledger, controller }
    }

    fn query(&self, query: AuctionQuery) -> Result<AuctionQueryResponse, ErrorObjectOwned> {
        handle_query(self.ledger.as_ref(), query).map_err(|e| Self::rpc_error(&e.to_string()))
    }

    fn rpc_error(msg: &str) -> ErrorObjectOwned {
        ErrorObjectOwned::owned(-32000, msg.to_string(), None::<()>)
    }

    fn parse_secret(secret: &str) -> Result<Keypair, ErrorObjectOwned> {
        Keypair::from_secret_hex(secret)
            .map_err(|e| Self::rpc_error(&format!("Invalid secret: {}", e)))
    }
}

#[async_trait]
impl MockChainApiServer for MockChainServer {
    async fn admin_new_account(&self, fund: Amount) -> Result<NewAccountRpc, ErrorObjectOwned> {
        let keypair = self.ledger.new_identity();
        let balance = self
            .ledger
            .fund(&keypair.public(), fund)
            .map_err(|e| Self::rpc_error(&format!("Failed to fund account: {}", e)))?;

        info!("Created account {}", keypair.public());
        Ok(NewAccountRpc {
            identity: keypair.public(),
            secret: keypair.secret_hex(),
            balance,
        })
    }

    async fn admin_fund(
        &self,
        identity: Identity,
        amount: Amount,
    ) -> Result<Amount, ErrorObjectOwned> {
        self.ledger
            .fund(&identity, amount)
            .map_err(|e| Self::rpc_error(&format!("Failed to fund account: {}", e)))
    }

    async fn auction_deploy(
        &self,
        params: DeployParamsRpc,
    ) -> Result<Option<DeployedAuctionRpc>, ErrorObjectOwned> {
        let payer = Self::parse_secret(&params.payer_secret)?;
        let auction_params = AuctionParams::new(
            params.whitelist,
            params.participation_cost.unwrap_or(DEFAULT_PARTICIPATION_COST),
            params.bid_threshold.unwrap_or(DEFAULT_BID_THRESHOLD),
        );

        let deployed = self
            .controller
            .deploy(auction_params, &payer)
            .map_err(|e| Self::rpc_error(&e.to_string()))?;

        Ok(deployed.map(DeployedAuctionRpc::from))
    }

    async fn auction_bid(&self, params: BidParamsRpc) -> Result<bool, ErrorObjectOwned> {
        let bidder = Self::parse_secret(&params.bidder_secret)?;
        self.controller
            .submit_bid(&params.auction, &bidder, params.amount)
            .map_err(|e| Self::rpc_error(&e.to_string()))?;
        Ok(true)
    }

    async fn auction_reveal(
        &self,
        params: RevealParamsRpc,
    ) -> Result<RevealOutcome, ErrorObjectOwned> {
        let result = match params.caller_secret {
            Some(secret) => {
                let caller = Self::parse_secret(&secret)?;
                self.controller.reveal(&params.auction, &caller)
            }
            None => self.controller.reveal_as_authority(&params.auction),
        };
        result.map_err(|e| Self::rpc_error(&e.to_string()))
    }

    async fn chain_get_balance(&self, identity: Identity) -> Result<Amount, ErrorObjectOwned> {
        Ok(self.ledger.balance(&identity))
    }

    async fn query_get_auction(
        &self,
        address: Identity,
    ) -> Result<Option<AuctionSummary>, ErrorObjectOwned> {
        self.controller
            .auction(&address)
            .map_err(|e| Self::rpc_error(&e.to_string()))
    }

    async fn query_list_auctions(&self) -> Result<Vec<AuctionSummary>, ErrorObjectOwned> {
        self.controller
            .auctions()
            .map_err(|e| Self::rpc_error(&e.to_string()))
    }

    async fn query_get_phase(
        &self,
        address: Identity,
    ) -> Result<Option<AuctionPhase>, ErrorObjectOwned> {
        match self.query(AuctionQuery::GetPhase { address })? {
            AuctionQueryResponse::Phase(phase) => Ok(phase),
            other => Err(Self::rpc_error(&format!("Unexpected response: {:?}", other))),
        }
    }

    async fn query_is_whitelisted(
        &self,
        address: Identity,
        identity: Identity,
    ) -> Result<bool, ErrorObjectOwned> {
        match self.query(AuctionQuery::IsWhitelisted { address, identity })? {
            AuctionQueryResponse::Whitelisted(whitelisted) => Ok(whitelisted),
            other => Err(Self::rpc_error(&format!("Unexpected response: {:?}", other))),
        }
    }
}

/// Bind the RPC server on `addr` and start serving.
async fn serve(addr: SocketAddr, config: ControllerConfig) -> Result<(SocketAddr, ServerHandle)> {
    let server = Server::builder().build(addr).await?;
    let local_addr = server.local_addr()?;
    let handle = server.start(MockChainServer::new(config).into_rpc());
    Ok((local_addr, handle))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mock_chain=info".parse()?)
                .add_directive("auction_lifecycle=info".parse()?)
                .add_directive("jsonrpsee=warn".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ControllerConfig::load(path)?,
        None => ControllerConfig::default(),
    };

    info!("Starting mock chain server on {}", cli.addr);

    let (_, handle) = serve(cli.addr, config).await?;

    info!("Mock chain server running. Press Ctrl+C to stop.");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutting down...");
    handle.stop()?;
    handle.stopped().await;

    Ok(())
}
