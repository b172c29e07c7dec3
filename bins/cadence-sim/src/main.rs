//! Cadence simulator: drives whole sequences through both auction
//! phases with jittered timing and a lossy relay bridge.
//!
//! Everything runs in-process on a simulated clock. The provider and
//! ledger are scripted stand-ins; the auction machines, relay channel,
//! and queue are the real ones.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use cadence_auction::{AuctionConfig, DrawAuction, RngAuction};
use cadence_core::constants::{
    DEFAULT_AUCTION_DURATION, DEFAULT_AUCTION_TARGET_TIME, DEFAULT_SEQUENCE_PERIOD,
};
use cadence_core::error::{LedgerError, ProviderError};
use cadence_core::traits::{DrawLedger, RngProvider};
use cadence_core::types::DrawId;
use cadence_core::{Address, RelayMessage};
use cadence_relay::{QueuedTransport, RelayChannel, RelayDelivery, RelayTransport};

/// CLI arguments for the simulator.
#[derive(Debug, Parser)]
#[command(name = "cadence-sim")]
#[command(about = "Cadence two-phase auction simulator", long_about = None)]
struct Args {
    /// Number of sequence periods to simulate.
    #[arg(long, default_value = "30")]
    days: u64,

    /// Reward reserve refilled at the start of every period.
    #[arg(long, default_value = "1000000")]
    reserve: u128,

    /// Sequence period in seconds.
    #[arg(long, default_value_t = DEFAULT_SEQUENCE_PERIOD)]
    period: u64,

    /// Auction duration in seconds (both phases).
    #[arg(long, default_value_t = DEFAULT_AUCTION_DURATION)]
    duration: u64,

    /// Auction target time in seconds (both phases).
    #[arg(long, default_value_t = DEFAULT_AUCTION_TARGET_TIME)]
    target_time: u64,

    /// Probability (percent) that a relay message is lost in transit.
    #[arg(long, default_value = "10")]
    loss_pct: u32,

    /// Probability (percent) that nobody starts a sequence at all.
    #[arg(long, default_value = "5")]
    miss_pct: u32,

    /// RNG seed for reproducible runs.
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Provider stand-in: requests always succeed, fulfillment is scripted
/// by the simulation loop with a configurable latency.
struct SimProvider {
    next_id: Mutex<u64>,
    fulfilled: Mutex<Vec<(u64, [u8; 32], u64)>>,
}

impl SimProvider {
    fn new() -> Self {
        Self { next_id: Mutex::new(1), fulfilled: Mutex::new(Vec::new()) }
    }

    fn fulfill(&self, request_id: u64, number: [u8; 32], at: u64) {
        self.fulfilled.lock().push((request_id, number, at));
    }

    fn lookup(&self, request_id: u64) -> Option<([u8; 32], u64)> {
        self.fulfilled
            .lock()
            .iter()
            .find(|(id, _, _)| *id == request_id)
            .map(|(_, n, at)| (*n, *at))
    }
}

impl RngProvider for SimProvider {
    fn fee(&self) -> Result<(Address, u128), ProviderError> {
        Ok((Address([0xFE; 20]), 25))
    }

    fn request_number(&self) -> Result<(u64, u64), ProviderError> {
        let mut next = self.next_id.lock();
        let id = *next;
        *next += 1;
        Ok((id, id + 1_000))
    }

    fn is_complete(&self, request_id: u64) -> bool {
        self.lookup(request_id).is_some()
    }

    fn completed_at(&self, request_id: u64) -> Result<u64, ProviderError> {
        self.lookup(request_id)
            .map(|(_, at)| at)
            .ok_or(ProviderError::NotCompleted { request_id })
    }

    fn number(&self, request_id: u64) -> Result<[u8; 32], ProviderError> {
        self.lookup(request_id)
            .map(|(n, _)| n)
            .ok_or(ProviderError::NotCompleted { request_id })
    }
}

/// Ledger stand-in with a refillable reserve.
struct SimLedger {
    reserve: Mutex<u128>,
    next_draw: Mutex<u32>,
    total_paid: Mutex<u128>,
}

impl SimLedger {
    fn new() -> Self {
        Self { reserve: Mutex::new(0), next_draw: Mutex::new(1), total_paid: Mutex::new(0) }
    }

    fn refill(&self, reserve: u128) {
        *self.reserve.lock() = reserve;
    }

    fn total_paid(&self) -> u128 {
        *self.total_paid.lock()
    }
}

impl DrawLedger for SimLedger {
    fn close_draw(&self, _random_number: [u8; 32]) -> Result<DrawId, LedgerError> {
        let mut next = self.next_draw.lock();
        let id = *next;
        *next += 1;
        Ok(id)
    }

    fn reserve_balance(&self) -> Result<u128, LedgerError> {
        Ok(*self.reserve.lock())
    }

    fn payout(&self, recipient: Address, amount: u128) -> Result<(), LedgerError> {
        *self.total_paid.lock() += amount;
        info!(recipient = %recipient, amount, "payout");
        Ok(())
    }
}

/// Adapter so the shared drainable queue can serve as the channel's
/// boxed transport.
struct SharedQueue(Arc<QueuedTransport>);

impl RelayTransport for SharedQueue {
    fn deliver(
        &self,
        now: u64,
        msg: RelayMessage,
    ) -> std::result::Result<RelayDelivery, cadence_core::error::RelayError> {
        self.0.deliver(now, msg)
    }
}

#[derive(Default)]
struct Tally {
    started: u64,
    missed: u64,
    expired_starts: u64,
    lost_relays: u64,
    completed: u64,
    failed_deliveries: u64,
}

fn run(args: &Args) -> Result<Tally> {
    let origin = Address([0x11; 20]);
    let cfg = AuctionConfig {
        duration: args.duration,
        target_time: args.target_time,
        period: args.period,
        offset: 0,
        trusted_relay_origin: origin,
        ..AuctionConfig::default()
    };
    cfg.validate().context("invalid auction geometry")?;

    let provider = Arc::new(SimProvider::new());
    let ledger = Arc::new(SimLedger::new());
    let rng_auction = Arc::new(Mutex::new(RngAuction::new(&cfg, provider.clone())?));
    let draw_auction = Arc::new(Mutex::new(DrawAuction::new(&cfg, ledger.clone())?));
    let queue = Arc::new(QueuedTransport::new());
    let channel = RelayChannel::new(rng_auction.clone(), Box::new(SharedQueue(queue.clone())));

    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut tally = Tally::default();

    for day in 0..args.days {
        let window = day * args.period;
        ledger.refill(args.reserve);

        if rng.gen_range(0..100) < args.miss_pct {
            warn!(day, "sequence missed: no starter showed up");
            tally.missed += 1;
            continue;
        }

        // Starters arrive with jitter; some show up after the window
        // has already expired.
        let start_elapsed = rng.gen_range(0..=args.duration + args.duration / 4);
        let starter = Address([rng.gen_range(1..=u8::MAX); 20]);
        match rng_auction.lock().start_auction(window + start_elapsed, starter) {
            Ok(()) => {
                info!(day, start_elapsed, "sequence started");
                tally.started += 1;
            }
            Err(e) => {
                warn!(day, start_elapsed, error = %e, "start rejected");
                tally.expired_starts += 1;
                continue;
            }
        }

        // Provider fulfillment after a short latency.
        let request_id = match rng_auction.lock().current_request() {
            Some(r) => r.request_id,
            None => continue,
        };
        let fulfilled_at = window + start_elapsed + rng.gen_range(30..900);
        provider.fulfill(request_id, rng.r#gen(), fulfilled_at);

        // The relay caller shows up with their own jitter, and the
        // bridge may lose the message entirely.
        let caller = Address([rng.gen_range(1..=u8::MAX); 20]);
        let relay_sent = fulfilled_at + rng.gen_range(0..args.target_time);
        channel.relay(relay_sent, caller)?;

        if rng.gen_range(0..100) < args.loss_pct {
            queue.drop_next();
            warn!(day, "relay message lost in transit");
            tally.lost_relays += 1;
            continue;
        }

        // Slow bridges overshoot the window now and then; phase two
        // rejects those on its own clock.
        let bridge_delay = rng.gen_range(60..=args.duration + args.duration / 8);
        let delivered_at = fulfilled_at + bridge_delay;
        match queue.deliver_next(delivered_at, origin, &draw_auction) {
            Some(Ok(draw_id)) => {
                info!(day, draw_id, bridge_delay, "sequence completed");
                tally.completed += 1;
            }
            Some(Err(e)) => {
                warn!(day, bridge_delay, error = %e, "delivery rejected");
                tally.failed_deliveries += 1;
            }
            None => {}
        }
    }

    info!(
        days = args.days,
        started = tally.started,
        completed = tally.completed,
        missed = tally.missed,
        expired_starts = tally.expired_starts,
        lost_relays = tally.lost_relays,
        failed_deliveries = tally.failed_deliveries,
        total_paid = ledger.total_paid(),
        "simulation finished"
    );
    Ok(tally)
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
        )
        .init();

    run(&args)?;
    Ok(())
}
