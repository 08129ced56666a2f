//! Lifecycle controller: deploy, bid and reveal against a ledger.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use auction_ledger::Ledger;
use auction_module::{
    handlers, queries, AuctionCall, AuctionError, AuctionParams, CallContext, CallOutcome,
};
use auction_types::{Amount, AuctionSummary, Identity, Keypair, RevealOutcome};
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::config::ControllerConfig;
use crate::error::{DeployFailure, LifecycleError};

/// A successfully deployed auction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedAuction {
    /// Public identity of the auction account
    pub address: Identity,
    pub params: AuctionParams,
    pub initial_balance: Amount,
}

/// Single-flight guard for deployments. Released on drop.
struct DeployLatch<'a>(&'a AtomicBool);

impl<'a> DeployLatch<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for DeployLatch<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Orchestrates auction deployment and the calls made against them.
///
/// The controller never caches auction state: every read goes back to the
/// ledger. It only remembers the authority key of each auction it deployed.
pub struct AuctionController<L> {
    ledger: Arc<L>,
    config: ControllerConfig,
    deploying: AtomicBool,
    authorities: RwLock<HashMap<Identity, Keypair>>,
}

impl<L: Ledger> AuctionController<L> {
    pub fn new(ledger: Arc<L>, config: ControllerConfig) -> Self {
        Self {
            ledger,
            config,
            deploying: AtomicBool::new(false),
            authorities: RwLock::new(HashMap::new()),
        }
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Deploy a new auction funded by `funding_payer`.
    ///
    /// Returns `Ok(None)` without doing anything if another deployment is
    /// already in flight on this controller.
    pub fn deploy(
        &self,
        params: AuctionParams,
        funding_payer: &Keypair,
    ) -> Result<Option<DeployedAuction>, LifecycleError> {
        let Some(_latch) = DeployLatch::acquire(&self.deploying) else {
            warn!("Deployment already in progress, ignoring request");
            return Ok(None);
        };

        params
            .validate()
            .map_err(|e| LifecycleError::DeploymentFailed(DeployFailure::from(e)))?;

        let authority = self.ledger.new_identity();
        let address = authority.public();
        let initial_balance = self.config.initial_auction_balance;

        self.ledger
            .execute(funding_payer, |tx| {
                let ctx = CallContext::from_transaction(tx, address);
                handlers::handle_initialize(tx, &ctx, &params, initial_balance)
            })
            .map_err(|e| {
                warn!("Deployment of {} failed: {}", address.short(), e);
                LifecycleError::DeploymentFailed(DeployFailure::from(e))
            })?;

        self.authorities.write().insert(address, authority);

        info!(
            "Deployed auction {} ({} bidders, cost {}, threshold {})",
            address,
            params.whitelist.len(),
            params.participation_cost,
            params.bid_threshold
        );

        Ok(Some(DeployedAuction {
            address,
            params,
            initial_balance,
        }))
    }

    /// Submit a bid signed by `bidder`.
    ///
    /// Does not report whether the bid took the lead.
    pub fn submit_bid(
        &self,
        auction: &Identity,
        bidder: &Keypair,
        amount: Amount,
    ) -> Result<(), LifecycleError> {
        self.ledger
            .execute(bidder, |tx| {
                let ctx = CallContext::from_transaction(tx, *auction);
                handlers::handle_bid(tx, &ctx, amount)
            })
            .map_err(|e| {
                warn!(
                    "Bid on {} from {} rejected: {}",
                    auction.short(),
                    bidder.public().short(),
                    e
                );
                LifecycleError::BidRejected(e)
            })?;

        info!(
            "Bid on {} accepted from {}",
            auction.short(),
            bidder.public().short()
        );
        Ok(())
    }

    /// Reveal the winner of `auction`, signed by `caller`.
    pub fn reveal(
        &self,
        auction: &Identity,
        caller: &Keypair,
    ) -> Result<RevealOutcome, LifecycleError> {
        let outcome = self
            .ledger
            .execute(caller, |tx| {
                let ctx = CallContext::from_transaction(tx, *auction);
                handlers::handle_reveal_winner(tx, &ctx)
            })
            .map_err(|e| {
                warn!("Reveal of {} rejected: {}", auction.short(), e);
                LifecycleError::RevealRejected(e)
            })?;

        info!(
            "Auction {} settled: winner {} pays out {}",
            auction, outcome.winner, outcome.lowest_bid
        );
        Ok(outcome)
    }

    /// Reveal signed by the auction's own authority key.
    pub fn reveal_as_authority(&self, auction: &Identity) -> Result<RevealOutcome, LifecycleError> {
        let authority = self
            .authorities
            .read()
            .get(auction)
            .cloned()
            .ok_or(LifecycleError::UnknownAuction(*auction))?;
        self.reveal(auction, &authority)
    }

    /// Execute an encoded call message against `auction`.
    pub fn execute_call(
        &self,
        auction: &Identity,
        signer: &Keypair,
        call: &AuctionCall,
    ) -> Result<CallOutcome, LifecycleError> {
        self.ledger
            .execute(signer, |tx| {
                let ctx = CallContext::from_transaction(tx, *auction);
                call.dispatch(tx, &ctx)
            })
            .map_err(|e| {
                warn!("Call {} on {} rejected: {}", call.name(), auction.short(), e);
                match call {
                    AuctionCall::Bid { .. } => LifecycleError::BidRejected(e),
                    AuctionCall::RevealWinner => LifecycleError::RevealRejected(e),
                }
            })
    }

    /// Current on-ledger view of an auction.
    pub fn auction(&self, address: &Identity) -> Result<Option<AuctionSummary>, LifecycleError> {
        queries::auction_summary(self.ledger.as_ref(), address).map_err(LifecycleError::Query)
    }

    /// Views of every auction deployed through this controller, ordered by address.
    pub fn auctions(&self) -> Result<Vec<AuctionSummary>, LifecycleError> {
        let mut addresses: Vec<Identity> = self.authorities.read().keys().copied().collect();
        addresses.sort_unstable();
        let mut summaries = Vec::with_capacity(addresses.len());
        for address in addresses {
            let summary = self
                .auction(&address)?
                .ok_or(LifecycleError::Query(AuctionError::AuctionNotFound(address)))?;
            summaries.push(summary);
        }
        Ok(summaries)
    }

    /// Whether a deployment is currently in flight.
    pub fn is_deploying(&self) -> bool {
        self.deploying.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auction_ledger::{LedgerError, LocalLedger, Transaction};
    use auction_module::ParamsError;
    use auction_types::AuctionPhase;
    use borsh::BorshDeserialize;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Barrier;

    fn keypair(seed: u64) -> Keypair {
        Keypair::generate(&mut StdRng::seed_from_u64(seed))
    }

    fn controller(balances: &[(Identity, Amount)]) -> AuctionController<LocalLedger> {
        let ledger = Arc::new(LocalLedger::with_genesis(balances.iter().copied()));
        AuctionController::new(ledger, ControllerConfig::default())
    }

    #[test]
    fn test_latch_is_single_flight() {
        let flag = AtomicBool::new(false);
        let first = DeployLatch::acquire(&flag);
        assert!(first.is_some());
        assert!(DeployLatch::acquire(&flag).is_none());

        drop(first);
        assert!(DeployLatch::acquire(&flag).is_some());
    }

    #[test]
    fn test_deploy_creates_funded_auction() {
        let payer = keypair(1);
        let bidder = keypair(2);
        let controller = controller(&[(payer.public(), 2_000_000_000)]);

        let deployed = controller
            .deploy(AuctionParams::with_defaults(vec![bidder.public()]), &payer)
            .unwrap()
            .unwrap();

        let ledger = controller.ledger();
        assert_eq!(ledger.balance(&deployed.address), 1_000_000_000);
        assert_eq!(ledger.balance(&payer.public()), 1_000_000_000);
        assert!(!controller.is_deploying());

        let summary = controller.auction(&deployed.address).unwrap().unwrap();
        assert_eq!(summary.phase, AuctionPhase::Created);
        assert_eq!(summary.bid_threshold, 1_000_000);
        assert_eq!(controller.auctions().unwrap(), vec![summary]);
    }

    #[test]
    fn test_deploy_underfunded_payer() {
        let payer = keypair(1);
        let controller = controller(&[(payer.public(), 10)]);

        let result = controller.deploy(AuctionParams::with_defaults(vec![keypair(2).public()]), &payer);

        assert!(matches!(
            result,
            Err(LifecycleError::DeploymentFailed(DeployFailure::Transaction(
                AuctionError::InsufficientFunds { .. }
            )))
        ));
        // no partial auction, latch released
        assert!(controller.auctions().unwrap().is_empty());
        assert_eq!(controller.ledger().balance(&payer.public()), 10);
        assert_eq!(controller.ledger().accounts().len(), 1);
        assert!(!controller.is_deploying());
    }

    #[test]
    fn test_deploy_invalid_params() {
        let payer = keypair(1);
        let controller = controller(&[(payer.public(), 2_000_000_000)]);

        let result = controller.deploy(AuctionParams::with_defaults(vec![]), &payer);
        assert_eq!(
            result,
            Err(LifecycleError::DeploymentFailed(DeployFailure::InvalidParams(
                ParamsError::EmptyWhitelist
            )))
        );
        assert!(!controller.is_deploying());
    }

    #[test]
    fn test_deploy_while_latched_is_noop() {
        let payer = keypair(1);
        let controller = controller(&[(payer.public(), 2_000_000_000)]);

        let latch = DeployLatch::acquire(&controller.deploying);
        let result = controller.deploy(AuctionParams::with_defaults(vec![keypair(2).public()]), &payer);
        assert_eq!(result, Ok(None));
        assert_eq!(controller.ledger().balance(&payer.public()), 2_000_000_000);

        drop(latch);
        assert!(controller
            .deploy(AuctionParams::with_defaults(vec![keypair(2).public()]), &payer)
            .unwrap()
            .is_some());
    }

    /// Ledger that parks inside `execute` until the test lets it continue.
    struct GatedLedger {
        inner: LocalLedger,
        entered: Barrier,
        release: Barrier,
    }

    impl Ledger for GatedLedger {
        fn balance(&self, identity: &Identity) -> Amount {
            self.inner.balance(identity)
        }

        fn new_identity(&self) -> Keypair {
            self.inner.new_identity()
        }

        fn execute<T, E, F>(&self, signer: &Keypair, f: F) -> Result<T, E>
        where
            F: FnOnce(&mut Transaction<'_>) -> Result<T, E>,
        {
            self.entered.wait();
            self.release.wait();
            self.inner.execute(signer, f)
        }

        fn load_state<S: BorshDeserialize>(&self, account: &Identity) -> Result<S, LedgerError> {
            self.inner.load_state(account)
        }
    }

    #[test]
    fn test_concurrent_deploy_is_noop() {
        let payer = keypair(1);
        let whitelist = vec![keypair(2).public()];
        let ledger = Arc::new(GatedLedger {
            inner: LocalLedger::with_genesis([(payer.public(), 3_000_000_000)]),
            entered: Barrier::new(2),
            release: Barrier::new(2),
        });
        let controller = AuctionController::new(ledger.clone(), ControllerConfig::default());

        std::thread::scope(|s| {
            let first = s.spawn(|| controller.deploy(AuctionParams::with_defaults(whitelist.clone()), &payer));

            // first deploy is now parked inside the ledger
            ledger.entered.wait();
            assert!(controller.is_deploying());
            let second = controller.deploy(AuctionParams::with_defaults(whitelist.clone()), &payer);
            assert_eq!(second, Ok(None));
            ledger.release.wait();

            let first = first.join().unwrap().unwrap();
            assert!(first.is_some());
        });

        assert!(!controller.is_deploying());
        assert_eq!(controller.auctions().unwrap().len(), 1);
    }

    #[test]
    fn test_bid_and_reveal_roundtrip() {
        let payer = keypair(1);
        let a = keypair(2);
        let b = keypair(3);
        let controller = controller(&[
            (payer.public(), 2_000_000_000),
            (a.public(), 1_000),
            (b.public(), 1_000),
        ]);
        let auction = controller
            .deploy(AuctionParams::new(vec![a.public(), b.public()], 10, 1_000_000), &payer)
            .unwrap()
            .unwrap()
            .address;

        controller.submit_bid(&auction, &a, 500).unwrap();
        controller.submit_bid(&auction, &b, 300).unwrap();

        // not revealed before settlement
        let summary = controller.auction(&auction).unwrap().unwrap();
        assert_eq!(summary.bid_count, 2);
        assert_eq!(summary.winner, None);

        assert!(matches!(
            controller.reveal(&auction, &a),
            Err(LifecycleError::RevealRejected(AuctionError::Unauthorized(_)))
        ));

        let outcome = controller.reveal(&auction, &b).unwrap();
        assert_eq!(
            outcome,
            RevealOutcome {
                lowest_bid: 300,
                winner: b.public()
            }
        );
        assert_eq!(controller.ledger().balance(&b.public()), 1_290);
    }

    #[test]
    fn test_bid_rejections_wrap_cause() {
        let payer = keypair(1);
        let a = keypair(2);
        let outsider = keypair(3);
        let controller = controller(&[
            (payer.public(), 2_000_000_000),
            (a.public(), 5),
            (outsider.public(), 1_000),
        ]);
        let auction = controller
            .deploy(AuctionParams::with_defaults(vec![a.public()]), &payer)
            .unwrap()
            .unwrap()
            .address;

        assert_eq!(
            controller.submit_bid(&auction, &outsider, 1),
            Err(LifecycleError::BidRejected(AuctionError::NotWhitelisted(
                outsider.public()
            )))
        );
        assert_eq!(
            controller.submit_bid(&auction, &a, 1),
            Err(LifecycleError::BidRejected(AuctionError::InsufficientFunds {
                required: 10,
                available: 5
            }))
        );
    }

    #[test]
    fn test_reveal_as_authority() {
        let payer = keypair(1);
        let a = keypair(2);
        let controller = controller(&[(payer.public(), 2_000_000_000), (a.public(), 100)]);
        let auction = controller
            .deploy(AuctionParams::with_defaults(vec![a.public()]), &payer)
            .unwrap()
            .unwrap()
            .address;

        controller.submit_bid(&auction, &a, 42).unwrap();
        let outcome = controller.reveal_as_authority(&auction).unwrap();
        assert_eq!(outcome.winner, a.public());

        assert_eq!(
            controller.reveal_as_authority(&auction),
            Err(LifecycleError::RevealRejected(AuctionError::AuctionSettled))
        );

        let stranger = keypair(9).public();
        assert_eq!(
            controller.reveal_as_authority(&stranger),
            Err(LifecycleError::UnknownAuction(stranger))
        );
    }

    #[test]
    fn test_execute_call_maps_errors_by_kind() {
        let payer = keypair(1);
        let a = keypair(2);
        let controller = controller(&[(payer.public(), 2_000_000_000), (a.public(), 100)]);
        let auction = controller
            .deploy(AuctionParams::with_defaults(vec![a.public()]), &payer)
            .unwrap()
            .unwrap()
            .address;

        assert_eq!(
            controller.execute_call(&auction, &a, &AuctionCall::Bid { amount: 7 }),
            Ok(CallOutcome::Bid {
                became_lowest: true
            })
        );
        assert_eq!(
            controller.execute_call(&auction, &payer, &AuctionCall::RevealWinner),
            Err(LifecycleError::RevealRejected(AuctionError::Unauthorized(
                payer.public()
            )))
        );
        assert!(matches!(
            controller.execute_call(&auction, &a, &AuctionCall::RevealWinner),
            Ok(CallOutcome::Revealed(_))
        ));
        assert_eq!(
            controller.execute_call(&auction, &a, &AuctionCall::Bid { amount: 1 }),
            Err(LifecycleError::BidRejected(AuctionError::AuctionSettled))
        );
    }
}
