//! Shared test collaborators for E2E and adversarial tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use cadence_auction::{AuctionConfig, DrawAuction, RngAuction};
use cadence_core::error::{LedgerError, ProviderError};
use cadence_core::traits::{DrawLedger, RngProvider};
use cadence_core::types::DrawId;
use cadence_core::Address;
use cadence_relay::{DirectTransport, RelayChannel};

/// The relay identity both sides of the default harness agree on.
pub const RELAY_ORIGIN: Address = Address([0x11; 20]);

/// Simple address from a seed byte.
pub fn addr(seed: u8) -> Address {
    Address([seed; 20])
}

/// Default two-phase configuration: daily sequences, 4-hour auctions,
/// 2-hour target, first anchor one half.
pub fn config() -> AuctionConfig {
    AuctionConfig {
        trusted_relay_origin: RELAY_ORIGIN,
        ..AuctionConfig::default()
    }
}

/// Randomness provider with externally scripted fulfillment.
///
/// Each `request_number` hands out a fresh id; the test fulfills a
/// request explicitly with [`ManualProvider::fulfill`]. Unfulfilled
/// requests report incomplete.
pub struct ManualProvider {
    next_id: AtomicU64,
    fee: u128,
    fail_requests: Mutex<bool>,
    fulfilled: Mutex<Vec<(u64, [u8; 32], u64)>>,
}

impl ManualProvider {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            fee: 25,
            fail_requests: Mutex::new(false),
            fulfilled: Mutex::new(Vec::new()),
        }
    }

    /// Make every subsequent `request_number` call fail (or recover).
    pub fn set_failing(&self, fail: bool) {
        *self.fail_requests.lock() = fail;
    }

    /// Script the fulfillment of a request id.
    pub fn fulfill(&self, request_id: u64, number: [u8; 32], at: u64) {
        self.fulfilled.lock().push((request_id, number, at));
    }

    pub fn requests_made(&self) -> u64 {
        self.next_id.load(Ordering::SeqCst) - 1
    }

    fn lookup(&self, request_id: u64) -> Option<([u8; 32], u64)> {
        self.fulfilled
            .lock()
            .iter()
            .find(|(id, _, _)| *id == request_id)
            .map(|(_, n, at)| (*n, *at))
    }
}

impl Default for ManualProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RngProvider for ManualProvider {
    fn fee(&self) -> Result<(Address, u128), ProviderError> {
        Ok((addr(0xFE), self.fee))
    }

    fn request_number(&self) -> Result<(u64, u64), ProviderError> {
        if *self.fail_requests.lock() {
            return Err(ProviderError::RequestFailed("provider offline".into()));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
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

/// Draw ledger that records everything and lets tests mutate the
/// reserve between sequences.
pub struct RecordingLedger {
    reserve: Mutex<u128>,
    next_draw: AtomicU64,
    closed: Mutex<Vec<[u8; 32]>>,
    payouts: Mutex<Vec<(Address, u128)>>,
    fail_payouts: Mutex<bool>,
}

impl RecordingLedger {
    pub fn new(reserve: u128) -> Self {
        Self {
            reserve: Mutex::new(reserve),
            next_draw: AtomicU64::new(1),
            closed: Mutex::new(Vec::new()),
            payouts: Mutex::new(Vec::new()),
            fail_payouts: Mutex::new(false),
        }
    }

    pub fn set_reserve(&self, reserve: u128) {
        *self.reserve.lock() = reserve;
    }

    pub fn set_failing_payouts(&self, fail: bool) {
        *self.fail_payouts.lock() = fail;
    }

    pub fn closed_draws(&self) -> Vec<[u8; 32]> {
        self.closed.lock().clone()
    }

    pub fn payouts(&self) -> Vec<(Address, u128)> {
        self.payouts.lock().clone()
    }

    pub fn total_paid(&self) -> u128 {
        self.payouts.lock().iter().map(|(_, amount)| amount).sum()
    }
}

impl DrawLedger for RecordingLedger {
    fn close_draw(&self, random_number: [u8; 32]) -> Result<DrawId, LedgerError> {
        self.closed.lock().push(random_number);
        Ok(self.next_draw.fetch_add(1, Ordering::SeqCst) as DrawId)
    }

    fn reserve_balance(&self) -> Result<u128, LedgerError> {
        Ok(*self.reserve.lock())
    }

    fn payout(&self, recipient: Address, amount: u128) -> Result<(), LedgerError> {
        if *self.fail_payouts.lock() {
            return Err(LedgerError::PayoutFailed {
                recipient,
                amount,
                reason: "transfer reverted".into(),
            });
        }
        self.payouts.lock().push((recipient, amount));
        Ok(())
    }
}

/// A fully wired two-phase deployment with a synchronous relay.
pub struct Harness {
    pub provider: Arc<ManualProvider>,
    pub ledger: Arc<RecordingLedger>,
    pub rng_auction: Arc<Mutex<RngAuction>>,
    pub draw_auction: Arc<Mutex<DrawAuction>>,
    pub channel: RelayChannel,
}

impl Harness {
    pub fn new(reserve: u128) -> Self {
        Self::with_config(config(), reserve)
    }

    pub fn with_config(cfg: AuctionConfig, reserve: u128) -> Self {
        let provider = Arc::new(ManualProvider::new());
        let ledger = Arc::new(RecordingLedger::new(reserve));
        let rng_auction = Arc::new(Mutex::new(
            RngAuction::new(&cfg, provider.clone()).unwrap(),
        ));
        let draw_auction = Arc::new(Mutex::new(
            DrawAuction::new(&cfg, ledger.clone()).unwrap(),
        ));
        let channel = RelayChannel::new(
            rng_auction.clone(),
            Box::new(DirectTransport::new(draw_auction.clone(), RELAY_ORIGIN)),
        );
        Self { provider, ledger, rng_auction, draw_auction, channel }
    }

    /// Fulfill the request produced by the last successful start.
    pub fn fulfill_current(&self, number: [u8; 32], at: u64) {
        let request_id = self
            .rng_auction
            .lock()
            .current_request()
            .map(|r| r.request_id)
            .unwrap();
        self.provider.fulfill(request_id, number, at);
    }
}
