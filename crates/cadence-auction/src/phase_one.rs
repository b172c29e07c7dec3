//! Phase one: the randomness-request auction.
//!
//! For each sequence, exactly one caller wins the duty of triggering
//! the randomness request. The winner's reward fraction is set by the
//! curve at the moment of the call; the result and request handle are
//! persisted for the relay to pick up once the provider fulfills.
//!
//! The `last` record is the sole idempotency guard: a second start in
//! the same window fails against it, and losing callers simply retry in
//! the next window. A missed window is permanently missed — there is no
//! catch-up.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use cadence_core::clock::SequenceClock;
use cadence_core::curve::reward_fraction;
use cadence_core::error::{AuthError, CadenceError, ConfigError, ProviderError, TimingError};
use cadence_core::traits::RngProvider;
use cadence_core::types::SequenceId;
use cadence_core::{Address, AuctionResult, Fraction, RngRequest};

use crate::config::AuctionConfig;

/// The persisted outcome of a successful phase-one start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartedAuction {
    pub sequence_id: SequenceId,
    pub result: AuctionResult,
    pub request: RngRequest,
}

/// Phase-one auction state machine.
pub struct RngAuction {
    clock: SequenceClock,
    duration: u64,
    target_time: u64,
    first_target_fraction: Fraction,
    provider: Arc<dyn RngProvider>,
    pending_provider: Option<Arc<dyn RngProvider>>,
    last: Option<StartedAuction>,
}

impl std::fmt::Debug for RngAuction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RngAuction")
            .field("clock", &self.clock)
            .field("duration", &self.duration)
            .field("target_time", &self.target_time)
            .field("first_target_fraction", &self.first_target_fraction)
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}

impl RngAuction {
    /// Build the phase-one machine from a validated configuration and
    /// the initial randomness provider.
    pub fn new(config: &AuctionConfig, provider: Arc<dyn RngProvider>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            clock: config.clock()?,
            duration: config.duration,
            target_time: config.target_time,
            first_target_fraction: config.first_target_fraction,
            provider,
            pending_provider: None,
            last: None,
        })
    }

    /// Close the current sequence's phase-one auction.
    ///
    /// The first successful call per window wins; every later contender
    /// fails the idempotency check with no side effects. Provider
    /// failures propagate untouched and leave state unchanged.
    pub fn start_auction(&mut self, now: u64, recipient: Address) -> Result<(), CadenceError> {
        if recipient.is_zero() {
            return Err(AuthError::ZeroRecipient.into());
        }
        let sequence_id = self.clock.sequence_id(now);
        if self.last.map(|l| l.sequence_id) == Some(sequence_id) {
            return Err(TimingError::SequenceAlreadyStarted { sequence_id }.into());
        }
        let elapsed = self.clock.elapsed(now);
        if elapsed > self.duration {
            return Err(TimingError::AuctionExpired { elapsed, duration: self.duration }.into());
        }

        // A pending provider swap takes effect here, never mid-window.
        if let Some(next) = self.pending_provider.take() {
            self.provider = next;
            tracing::info!(target: "cadence::auction", sequence_id, "randomness provider swap applied");
        }

        let (fee_recipient, fee) = self.provider.fee()?;
        tracing::debug!(
            target: "cadence::auction",
            fee,
            fee_recipient = %fee_recipient,
            "randomness fee quoted"
        );
        let (request_id, lock_handle) = self.provider.request_number()?;
        let anchor = self.current_anchor();
        let fraction = reward_fraction(elapsed, self.duration, self.target_time, anchor);

        self.last = Some(StartedAuction {
            sequence_id,
            result: AuctionResult { recipient, reward_fraction: fraction },
            request: RngRequest { request_id, lock_handle, sequence_id, requested_at: now },
        });
        tracing::info!(
            target: "cadence::auction",
            sequence_id,
            elapsed,
            fraction = %fraction,
            recipient = %recipient,
            request_id,
            "phase-one auction closed"
        );
        Ok(())
    }

    /// Record a provider swap. Takes effect at the next successful
    /// start, so an in-flight request is never disturbed mid-window.
    pub fn set_provider(&mut self, provider: Arc<dyn RngProvider>) {
        self.pending_provider = Some(provider);
        tracing::info!(target: "cadence::auction", "randomness provider swap recorded");
    }

    /// The provider currently serving requests (excludes a pending
    /// swap).
    pub fn provider(&self) -> Arc<dyn RngProvider> {
        Arc::clone(&self.provider)
    }

    /// Whether a provider swap is recorded but not yet applied.
    pub fn has_pending_provider(&self) -> bool {
        self.pending_provider.is_some()
    }

    /// Fee the current provider would charge for the next request.
    pub fn provider_fee(&self) -> Result<(Address, u128), ProviderError> {
        self.provider.fee()
    }

    /// Whether the current sequence can still be started at `now`.
    pub fn is_auction_open(&self, now: u64) -> bool {
        let sequence_id = self.clock.sequence_id(now);
        self.last.map(|l| l.sequence_id) != Some(sequence_id)
            && self.clock.elapsed(now) <= self.duration
    }

    /// Elapsed time within the window open at `now`.
    pub fn elapsed(&self, now: u64) -> u64 {
        self.clock.elapsed(now)
    }

    /// The fraction a start at `now` would earn.
    pub fn current_fraction(&self, now: u64) -> Fraction {
        reward_fraction(
            self.clock.elapsed(now),
            self.duration,
            self.target_time,
            self.current_anchor(),
        )
    }

    /// The last completed auction, if any.
    pub fn last_auction(&self) -> Option<&StartedAuction> {
        self.last.as_ref()
    }

    pub fn last_result(&self) -> Option<&AuctionResult> {
        self.last.as_ref().map(|l| &l.result)
    }

    pub fn last_sequence_id(&self) -> Option<SequenceId> {
        self.last.map(|l| l.sequence_id)
    }

    /// The request handle produced by the last successful start.
    pub fn current_request(&self) -> Option<&RngRequest> {
        self.last.as_ref().map(|l| &l.request)
    }

    fn current_anchor(&self) -> Fraction {
        self.last
            .map(|l| l.result.reward_fraction)
            .unwrap_or(self.first_target_fraction)
    }
}
