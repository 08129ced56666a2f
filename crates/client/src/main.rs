//! CLI for interacting with sealed-bid auctions on the mock chain.
//!
//! This binary provides commands for:
//! - Creating and funding accounts
//! - Deploying auctions
//! - Submitting bids and revealing the winner
//! - Querying auction status

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use auction_client::{AuctionRpcClient, Bidder, DeployRequest};
use auction_types::{Amount, AuctionSummary, Identity, Keypair};

#[derive(Parser)]
#[command(name = "auction-cli")]
#[command(about = "CLI for sealed-bid auctions")]
struct Cli {
    /// Mock chain RPC endpoint
    #[arg(long, default_value = "http://127.0.0.1:9944")]
    rpc: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a fresh account
    NewAccount {
        /// Faucet funding for the new account
        #[arg(long, default_value = "0")]
        fund: Amount,
    },

    /// Mint funds into an account
    Fund {
        /// Account identity (hex)
        #[arg(long)]
        identity: Identity,

        /// Amount to mint
        #[arg(long)]
        amount: Amount,
    },

    /// Get an account balance
    Balance {
        /// Account identity (hex)
        #[arg(long)]
        identity: Identity,
    },

    /// Deploy a new auction
    Deploy {
        /// Secret key of the funding payer (hex)
        #[arg(long)]
        payer: String,

        /// Whitelisted bidder identities (hex, comma-separated)
        #[arg(long, value_delimiter = ',', required = true)]
        whitelist: Vec<Identity>,

        /// Amount charged per bid
        #[arg(long)]
        participation_cost: Option<Amount>,

        /// Starting value of the lowest bid
        #[arg(long)]
        bid_threshold: Option<Amount>,
    },

    /// Submit a bid
    Bid {
        /// Auction address (hex)
        #[arg(long)]
        auction: Identity,

        /// Secret key of the bidder (hex)
        #[arg(long)]
        secret: String,

        /// Bid amount
        #[arg(long)]
        amount: Amount,
    },

    /// Reveal the winner and settle the auction
    Reveal {
        /// Auction address (hex)
        #[arg(long)]
        auction: Identity,

        /// Secret key of the caller (hex); the auction authority signs if omitted
        #[arg(long)]
        secret: Option<String>,
    },

    /// Get auction details
    GetAuction {
        /// Auction address (hex)
        #[arg(long)]
        auction: Identity,
    },

    /// List all auctions
    ListAuctions,
}

fn print_summary(a: &AuctionSummary) {
    println!("Auction {}:", a.address);
    println!("  Phase: {}", a.phase);
    println!("  Balance: {}", a.balance);
    println!("  Participation Cost: {}", a.participation_cost);
    println!("  Bid Threshold: {}", a.bid_threshold);
    println!("  Bids: {}", a.bid_count);
    println!("  Whitelist:");
    for bidder in &a.whitelist {
        println!("    {}", bidder);
    }
    if let (Some(lowest_bid), Some(winner)) = (a.lowest_bid, a.winner) {
        println!("  Winner: {}", winner);
        println!("  Lowest Bid: {}", lowest_bid);
    }
}

async fn deploy_cmd(client: &AuctionRpcClient, request: DeployRequest) -> Result<()> {
    match client.deploy(&request).await? {
        Some(deployed) => {
            info!("Deployed auction {}", deployed.address);
            println!("Auction deployed:");
            println!("  Address: {}", deployed.address);
            println!("  Participation Cost: {}", deployed.participation_cost);
            println!("  Bid Threshold: {}", deployed.bid_threshold);
            println!("  Initial Balance: {}", deployed.initial_balance);
        }
        None => {
            println!("Another deployment is in progress, nothing deployed");
        }
    }
    Ok(())
}

async fn bid_cmd(
    client: &AuctionRpcClient,
    auction: Identity,
    secret: &str,
    amount: Amount,
) -> Result<()> {
    let keypair = Keypair::from_secret_hex(secret)?;
    if !client.is_whitelisted(auction, keypair.public()).await? {
        return Err(anyhow!("{} may not bid on auction {}", keypair.public(), auction));
    }

    let balance = client.balance(keypair.public()).await?;
    let mut bidder = Bidder::new(keypair.public().short(), keypair, balance);
    bidder.set_bid(amount)?;
    client.submit(auction, &mut bidder).await?;

    info!("Bid submitted on {}", auction);
    println!("Bid submitted successfully");
    println!("  Auction: {}", auction);
    println!("  Bidder: {}", bidder.identity());
    println!("  Balance: {} ({:+})", bidder.balance(), bidder.balance_delta());
    Ok(())
}

async fn reveal_cmd(client: &AuctionRpcClient, auction: Identity, secret: Option<&str>) -> Result<()> {
    let caller = secret.map(Keypair::from_secret_hex).transpose()?;
    let outcome = client.reveal(auction, caller.as_ref()).await?;

    println!("Auction settled:");
    println!("  Winner: {}", outcome.winner);
    println!("  Lowest Bid: {}", outcome.lowest_bid);
    if outcome.winner == auction {
        println!("  (no bid beat the threshold)");
    }
    Ok(())
}

async fn get_auction_cmd(client: &AuctionRpcClient, auction: Identity) -> Result<()> {
    let summary = client
        .auction(auction)
        .await?
        .ok_or_else(|| anyhow!("Auction {} not found", auction))?;
    print_summary(&summary);
    Ok(())
}

async fn list_auctions_cmd(client: &AuctionRpcClient) -> Result<()> {
    let auctions = client.auctions().await?;

    if auctions.is_empty() {
        println!("No auctions found");
    } else {
        println!("Auctions:");
        for a in auctions {
            println!(
                "  [{}] {} - {} bids, balance {}",
                a.address, a.phase, a.bid_count, a.balance
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("auction_cli=info".parse()?)
                .add_directive("auction_client=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let client = AuctionRpcClient::connect(&cli.rpc)?;

    match cli.command {
        Commands::NewAccount { fund } => {
            let account = client.new_account(fund).await?;
            if account.keypair()?.public() != account.identity {
                return Err(anyhow!(
                    "Chain returned a secret that does not match {}",
                    account.identity
                ));
            }
            println!("Account created:");
            println!("  Identity: {}", account.identity);
            println!("  Secret: {}", account.secret);
            println!("  Balance: {}", account.balance);
        }

        Commands::Fund { identity, amount } => {
            let balance = client.fund(identity, amount).await?;
            println!("Funded {}: balance {}", identity, balance);
        }

        Commands::Balance { identity } => {
            let balance = client.balance(identity).await?;
            println!("Balance of {}: {}", identity, balance);
        }

        Commands::Deploy {
            payer,
            whitelist,
            participation_cost,
            bid_threshold,
        } => {
            let request = DeployRequest {
                payer_secret: payer,
                whitelist,
                participation_cost,
                bid_threshold,
            };
            deploy_cmd(&client, request).await?;
        }

        Commands::Bid {
            auction,
            secret,
            amount,
        } => {
            bid_cmd(&client, auction, &secret, amount).await?;
        }

        Commands::Reveal { auction, secret } => {
            reveal_cmd(&client, auction, secret.as_deref()).await?;
        }

        Commands::GetAuction { auction } => {
            get_auction_cmd(&client, auction).await?;
        }

        Commands::ListAuctions => {
            list_auctions_cmd(&client).await?;
        }
    }

    Ok(())
}
