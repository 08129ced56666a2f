//! End-to-end integration tests for the sealed-bid auction system.
//!
//! These tests exercise the full auction lifecycle against a local ledger:
//! 1. Deployment through the lifecycle controller
//! 2. Whitelisted bidding with participation costs
//! 3. Reveal and settlement
//!
//! Randomised checks use seeded `StdRng` sequences so failures reproduce.

use std::sync::Arc;

use auction_client::Bidder;
use auction_ledger::{Ledger, LocalLedger};
use auction_lifecycle::{AuctionController, ControllerConfig, LifecycleError};
use auction_module::{AuctionCall, AuctionError, AuctionParams, CallOutcome, SealedBidAuction};
use auction_types::{Amount, AuctionPhase, Identity, Keypair, RevealOutcome};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const PAYER_FUNDS: Amount = 1_000_000_000_000;
const AUCTION_FUNDS: Amount = 5_000_000;

struct World {
    controller: AuctionController<LocalLedger>,
    payer: Keypair,
    bidders: Vec<Keypair>,
    outsider: Keypair,
}

impl World {
    fn new(seed: u64, bidders: usize, bidder_funds: Amount) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let payer = Keypair::generate(&mut rng);
        let outsider = Keypair::generate(&mut rng);
        let bidders: Vec<Keypair> = (0..bidders).map(|_| Keypair::generate(&mut rng)).collect();

        let mut genesis = vec![(payer.public(), PAYER_FUNDS), (outsider.public(), bidder_funds)];
        genesis.extend(bidders.iter().map(|b| (b.public(), bidder_funds)));

        let controller = AuctionController::new(
            Arc::new(LocalLedger::with_genesis(genesis)),
            ControllerConfig {
                initial_auction_balance: AUCTION_FUNDS,
            },
        );

        Self {
            controller,
            payer,
            bidders,
            outsider,
        }
    }

    fn ledger(&self) -> &LocalLedger {
        self.controller.ledger().as_ref()
    }

    fn deploy(&self, participation_cost: Amount, bid_threshold: Amount) -> Identity {
        let whitelist = self.bidders.iter().map(Keypair::public).collect();
        self.controller
            .deploy(
                AuctionParams::new(whitelist, participation_cost, bid_threshold),
                &self.payer,
            )
            .expect("deploy failed")
            .expect("deploy latched")
            .address
    }

    fn state(&self, auction: &Identity) -> SealedBidAuction {
        self.ledger().load_state(auction).expect("auction state")
    }

    fn balance(&self, identity: &Identity) -> Amount {
        self.ledger().balance(identity)
    }

    fn total_supply(&self) -> u128 {
        self.ledger()
            .accounts()
            .iter()
            .map(|(_, balance)| u128::from(*balance))
            .sum()
    }
}

/// The worked example: A 500, B 300, C 300, B reveals, A is refused.
#[test]
fn test_example_scenario() {
    let world = World::new(1, 3, 10_000);
    let (a, b, c) = (&world.bidders[0], &world.bidders[1], &world.bidders[2]);
    let auction = world.deploy(10, 1_000_000);
    let start = world.balance(&auction);

    world.controller.submit_bid(&auction, a, 500).unwrap();
    let state = world.state(&auction);
    assert_eq!((state.lowest_bid, state.winner), (500, a.public()));
    assert_eq!(world.balance(&a.public()), 9_990);
    assert_eq!(world.balance(&auction), start + 10);

    world.controller.submit_bid(&auction, b, 300).unwrap();
    let state = world.state(&auction);
    assert_eq!((state.lowest_bid, state.winner), (300, b.public()));
    assert_eq!(world.balance(&b.public()), 9_990);

    // equal bid does not displace B, but still pays
    world.controller.submit_bid(&auction, c, 300).unwrap();
    let state = world.state(&auction);
    assert_eq!((state.lowest_bid, state.winner), (300, b.public()));
    assert_eq!(world.balance(&c.public()), 9_990);
    assert_eq!(world.balance(&auction), start + 30);

    let outcome = world.controller.reveal(&auction, b).unwrap();
    assert_eq!(
        outcome,
        RevealOutcome {
            lowest_bid: 300,
            winner: b.public()
        }
    );
    assert_eq!(world.balance(&auction), start + 30 - 300);
    assert_eq!(world.balance(&b.public()), 9_990 + 300);

    assert_eq!(
        world.controller.reveal(&auction, a),
        Err(LifecycleError::RevealRejected(AuctionError::Unauthorized(
            a.public()
        )))
    );

    let summary = world.controller.auction(&auction).unwrap().unwrap();
    assert_eq!(summary.phase, AuctionPhase::Settled);
    assert_eq!(summary.bid_count, 3);
    assert_eq!(summary.lowest_bid, Some(300));
    assert_eq!(summary.winner, Some(b.public()));
}

/// Lowest bid tracks the strict running minimum below the threshold, and
/// every accepted bid moves exactly the participation cost.
#[test]
fn test_random_bid_sequences_track_minimum() {
    const THRESHOLD: Amount = 1_000;
    const COST: Amount = 7;

    for seed in 0..32 {
        let world = World::new(seed, 4, 100_000);
        let auction = world.deploy(COST, THRESHOLD);
        let mut rng = StdRng::seed_from_u64(seed + 1_000);

        let mut lowest = THRESHOLD;
        let mut winner = auction;

        for _ in 0..rng.gen_range(1..40) {
            let bidder = &world.bidders[rng.gen_range(0..world.bidders.len())];
            // coarse grid so ties happen
            let amount = rng.gen_range(0..60u64) * 20;

            let bidder_before = world.balance(&bidder.public());
            let auction_before = world.balance(&auction);

            let outcome = world
                .controller
                .execute_call(&auction, bidder, &AuctionCall::Bid { amount })
                .unwrap();

            let took_lead = amount < lowest;
            if took_lead {
                lowest = amount;
                winner = bidder.public();
            }

            assert_eq!(
                outcome,
                CallOutcome::Bid {
                    became_lowest: took_lead
                },
                "seed {}",
                seed
            );
            let state = world.state(&auction);
            assert_eq!(state.lowest_bid, lowest, "seed {}", seed);
            assert_eq!(state.winner, winner, "seed {}", seed);
            assert_eq!(world.balance(&bidder.public()), bidder_before - COST);
            assert_eq!(world.balance(&auction), auction_before + COST);
        }
    }
}

#[test]
fn test_outsider_bid_changes_nothing() {
    let world = World::new(2, 2, 1_000);
    let auction = world.deploy(10, 1_000_000);
    world.controller.submit_bid(&auction, &world.bidders[0], 400).unwrap();

    let balances = world.ledger().accounts();
    let state = world.state(&auction);

    let result = world.controller.submit_bid(&auction, &world.outsider, 1);
    assert_eq!(
        result,
        Err(LifecycleError::BidRejected(AuctionError::NotWhitelisted(
            world.outsider.public()
        )))
    );
    assert_eq!(world.ledger().accounts(), balances);
    assert_eq!(world.state(&auction), state);
}

#[test]
fn test_underfunded_bid_is_atomic() {
    let world = World::new(3, 1, 15);
    let bidder = &world.bidders[0];
    let auction = world.deploy(10, 1_000_000);

    world.controller.submit_bid(&auction, bidder, 900).unwrap();
    let state = world.state(&auction);

    // 5 left, cost 10: the lower bid must not be recorded
    assert_eq!(
        world.controller.submit_bid(&auction, bidder, 100),
        Err(LifecycleError::BidRejected(AuctionError::InsufficientFunds {
            required: 10,
            available: 5
        }))
    );
    assert_eq!(world.state(&auction), state);
    assert_eq!(world.balance(&bidder.public()), 5);
}

/// Only the winner or the auction authority may reveal.
#[test]
fn test_reveal_authorization() {
    let world = World::new(4, 5, 1_000);
    let auction = world.deploy(10, 1_000_000);
    let mut rng = StdRng::seed_from_u64(4);

    for bidder in &world.bidders {
        let amount = rng.gen_range(1..10_000);
        world.controller.submit_bid(&auction, bidder, amount).unwrap();
    }
    let winner = world.state(&auction).winner;
    let balances = world.ledger().accounts();

    let refused: Vec<&Keypair> = world
        .bidders
        .iter()
        .chain([&world.outsider, &world.payer])
        .filter(|k| k.public() != winner)
        .collect();
    assert_eq!(refused.len(), world.bidders.len() + 1);

    for caller in refused {
        assert_eq!(
            world.controller.reveal(&auction, caller),
            Err(LifecycleError::RevealRejected(AuctionError::Unauthorized(
                caller.public()
            )))
        );
    }
    assert_eq!(world.ledger().accounts(), balances);
    assert_eq!(world.state(&auction).phase, AuctionPhase::Created);

    let outcome = world.controller.reveal_as_authority(&auction).unwrap();
    assert_eq!(outcome.winner, winner);
}

/// Reveal pays out exactly once; afterwards the auction is closed.
#[test]
fn test_settlement_is_final() {
    let world = World::new(5, 2, 1_000);
    let (a, b) = (&world.bidders[0], &world.bidders[1]);
    let auction = world.deploy(10, 1_000_000);

    world.controller.submit_bid(&auction, a, 250).unwrap();
    world.controller.submit_bid(&auction, b, 750).unwrap();

    let auction_before = world.balance(&auction);
    let winner_before = world.balance(&a.public());
    let supply = world.total_supply();

    world.controller.reveal(&auction, a).unwrap();
    assert_eq!(world.balance(&auction), auction_before - 250);
    assert_eq!(world.balance(&a.public()), winner_before + 250);
    assert_eq!(world.total_supply(), supply);

    let balances = world.ledger().accounts();
    assert_eq!(
        world.controller.reveal(&auction, a),
        Err(LifecycleError::RevealRejected(AuctionError::AuctionSettled))
    );
    assert_eq!(
        world.controller.reveal_as_authority(&auction),
        Err(LifecycleError::RevealRejected(AuctionError::AuctionSettled))
    );
    assert_eq!(
        world.controller.submit_bid(&auction, b, 1),
        Err(LifecycleError::BidRejected(AuctionError::AuctionSettled))
    );
    assert_eq!(world.ledger().accounts(), balances);
}

#[test]
fn test_reveal_without_qualifying_bid() {
    let world = World::new(6, 2, 1_000);
    let auction = world.deploy(10, 100);

    // at or above the threshold never qualifies
    world.controller.submit_bid(&auction, &world.bidders[0], 100).unwrap();
    world.controller.submit_bid(&auction, &world.bidders[1], 5_000).unwrap();
    let before = world.balance(&auction);

    let outcome = world.controller.reveal_as_authority(&auction).unwrap();
    assert_eq!(
        outcome,
        RevealOutcome {
            lowest_bid: 100,
            winner: auction
        }
    );
    assert_eq!(world.balance(&auction), before);
}

#[test]
fn test_settle_without_winner_when_threshold_exceeds_funds() {
    let world = World::new(11, 1, 1_000);
    let auction = world.deploy(10, 2 * AUCTION_FUNDS);

    world
        .controller
        .submit_bid(&auction, &world.bidders[0], 4 * AUCTION_FUNDS)
        .unwrap();
    let balances = world.ledger().accounts();

    let outcome = world.controller.reveal_as_authority(&auction).unwrap();
    assert_eq!(
        outcome,
        RevealOutcome {
            lowest_bid: 2 * AUCTION_FUNDS,
            winner: auction
        }
    );
    assert_eq!(world.ledger().accounts(), balances);
    assert_eq!(world.state(&auction).phase, AuctionPhase::Settled);
}

#[test]
fn test_concurrent_bids_serialize() {
    const THRESHOLD: Amount = 1_000_000;
    const ROUNDS: usize = 25;

    let world = World::new(7, 8, 100_000);
    let auction = world.deploy(3, THRESHOLD);
    let start = world.balance(&auction);

    let plans: Vec<Vec<Amount>> = (0..world.bidders.len())
        .map(|i| {
            let mut rng = StdRng::seed_from_u64(i as u64);
            (0..ROUNDS).map(|_| rng.gen_range(1..2_000_000)).collect()
        })
        .collect();

    std::thread::scope(|s| {
        for (bidder, plan) in world.bidders.iter().zip(&plans) {
            let controller = &world.controller;
            s.spawn(move || {
                for amount in plan {
                    controller.submit_bid(&auction, bidder, *amount).unwrap();
                }
            });
        }
    });

    let total_bids = (world.bidders.len() * ROUNDS) as u64;
    let state = world.state(&auction);
    assert_eq!(state.bid_count, total_bids);
    assert_eq!(world.balance(&auction), start + 3 * total_bids);

    let minimum = plans.iter().flatten().copied().min().unwrap();
    assert!(minimum < THRESHOLD);
    assert_eq!(state.lowest_bid, minimum);

    let winner_index = world
        .bidders
        .iter()
        .position(|b| b.public() == state.winner)
        .unwrap();
    assert!(plans[winner_index].contains(&minimum));
}

#[test]
fn test_concurrent_deploys() {
    let world = World::new(8, 2, 1_000);
    let whitelist: Vec<Identity> = world.bidders.iter().map(Keypair::public).collect();

    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let params = AuctionParams::with_defaults(whitelist.clone());
                let world = &world;
                s.spawn(move || world.controller.deploy(params, &world.payer))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let deployed: Vec<_> = results.into_iter().filter_map(|r| r.unwrap()).collect();
    assert!(!deployed.is_empty());
    assert!(!world.controller.is_deploying());

    let listed = world.controller.auctions().unwrap();
    assert_eq!(listed.len(), deployed.len());
    assert_eq!(
        world.balance(&world.payer.public()),
        PAYER_FUNDS - AUCTION_FUNDS * deployed.len() as Amount
    );
    for auction in &deployed {
        assert_eq!(world.balance(&auction.address), AUCTION_FUNDS);
    }
}

#[test]
fn test_auctions_are_independent() {
    let world = World::new(9, 2, 1_000);
    let (a, b) = (&world.bidders[0], &world.bidders[1]);
    let first = world.deploy(10, 1_000);
    let second = world.deploy(20, 1_000);
    assert_ne!(first, second);

    world.controller.submit_bid(&first, a, 100).unwrap();
    world.controller.submit_bid(&second, b, 50).unwrap();
    world.controller.reveal(&first, a).unwrap();

    assert_eq!(world.state(&first).phase, AuctionPhase::Settled);
    let second_state = world.state(&second);
    assert_eq!(second_state.phase, AuctionPhase::Created);
    assert_eq!(second_state.winner, b.public());

    // a is whitelisted on the second auction too and may still bid there
    world.controller.submit_bid(&second, a, 10).unwrap();
    assert_eq!(world.balance(&a.public()), 1_000 - 10 - 20 + 100);
}

#[test]
fn test_bidder_view_follows_ledger() {
    let world = World::new(10, 2, 1_000);
    let auction = world.deploy(10, 1_000_000);
    let keypair = world.bidders[0].clone();

    let mut alice = Bidder::new("alice", keypair, world.balance(&world.bidders[0].public()));
    alice.set_bid(420).unwrap();

    let amount = alice.pending_bid().unwrap();
    world
        .controller
        .submit_bid(&auction, alice.keypair(), amount)
        .unwrap();
    alice.mark_submitted().unwrap();

    assert_eq!(alice.refresh_balance(world.ledger()), 990);
    assert_eq!(alice.balance_delta(), -10);
    assert!(alice.set_bid(1).is_err());

    world.controller.reveal(&auction, alice.keypair()).unwrap();
    assert_eq!(alice.refresh_balance(world.ledger()), 990 + 420);
}
