//! Phase two: the draw-closing auction.
//!
//! Accepts exactly one completion per sequence, and only from the
//! trusted relay origin. The relay may cross an unreliable, unordered
//! transport with no shared clock, so this side never trusts the
//! message's timing: negative elapsed time clamps to zero and expiry is
//! re-derived locally on arrival.
//!
//! State is committed before payouts are issued. A payout failure after
//! the commit aborts the call but cannot re-open the sequence — the
//! alternative (commit last) would let a replayed message double-pay
//! the entries that already transferred.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use cadence_core::curve::reward_fraction;
use cadence_core::error::{AuthError, CadenceError, ConfigError, TimingError};
use cadence_core::traits::DrawLedger;
use cadence_core::types::{DrawId, SequenceId};
use cadence_core::{Address, AuctionResult, Fraction, Payout, RelayMessage};

use crate::allocator::RewardAllocator;
use crate::config::AuctionConfig;

/// The persisted outcome of a successful phase-two completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedAuction {
    pub sequence_id: SequenceId,
    pub result: AuctionResult,
    pub draw_id: DrawId,
    pub payouts: Vec<Payout>,
}

/// Phase-two auction state machine.
pub struct DrawAuction {
    duration: u64,
    target_time: u64,
    first_target_fraction: Fraction,
    max_rewards: Option<u128>,
    trusted_origin: Address,
    ledger: Arc<dyn DrawLedger>,
    allocator: RewardAllocator,
    last: Option<CompletedAuction>,
}

impl DrawAuction {
    /// Build the phase-two machine from a validated configuration and
    /// the draw ledger.
    pub fn new(config: &AuctionConfig, ledger: Arc<dyn DrawLedger>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            duration: config.duration,
            target_time: config.target_time,
            first_target_fraction: config.first_target_fraction,
            max_rewards: config.max_rewards,
            trusted_origin: config.trusted_relay_origin,
            allocator: RewardAllocator::new(Arc::clone(&ledger)),
            ledger,
            last: None,
        })
    }

    /// Complete a sequence with a relayed phase-one result and the
    /// fulfilled random number. Returns the closed draw's id.
    ///
    /// Timing is measured from the provider's fulfillment timestamp,
    /// clamped to zero when `completed_at` appears to be in the future
    /// relative to this clock.
    pub fn on_relay(
        &mut self,
        now: u64,
        origin: Address,
        msg: &RelayMessage,
    ) -> Result<DrawId, CadenceError> {
        if origin != self.trusted_origin {
            return Err(AuthError::UntrustedRelayOrigin { origin }.into());
        }
        if msg.reward_recipient.is_zero() {
            return Err(AuthError::ZeroRecipient.into());
        }
        if let Some(last) = &self.last {
            if msg.sequence_id <= last.sequence_id {
                return Err(TimingError::SequenceAlreadyCompleted {
                    sequence_id: msg.sequence_id,
                    last_sequence_id: last.sequence_id,
                }
                .into());
            }
        }

        let elapsed = now.saturating_sub(msg.completed_at);
        if elapsed > self.duration {
            return Err(TimingError::AuctionExpired { elapsed, duration: self.duration }.into());
        }

        let anchor = self.current_anchor();
        let fraction = reward_fraction(elapsed, self.duration, self.target_time, anchor);
        let result = AuctionResult {
            recipient: msg.reward_recipient,
            reward_fraction: fraction,
        };
        tracing::info!(
            target: "cadence::auction",
            sequence_id = msg.sequence_id,
            elapsed,
            fraction = %fraction,
            recipient = %msg.reward_recipient,
            "phase-two auction closed"
        );

        let draw_id = self.ledger.close_draw(msg.random_number)?;
        let reserve = self.ledger.reserve_balance()?;
        let pool = match self.max_rewards {
            Some(cap) => reserve.min(cap),
            None => reserve,
        };

        // Commit before paying; see module docs.
        self.last = Some(CompletedAuction {
            sequence_id: msg.sequence_id,
            result,
            draw_id,
            payouts: Vec::new(),
        });

        // Payouts land directly in the committed record, so even a
        // mid-chain ledger failure leaves it matching what the ledger
        // actually transferred.
        let chain = [msg.upstream_result, result];
        if let Some(last) = &mut self.last {
            self.allocator.distribute(pool, &chain, &mut last.payouts)?;
        }

        tracing::info!(
            target: "cadence::auction",
            sequence_id = msg.sequence_id,
            draw_id,
            "sequence completed"
        );
        Ok(draw_id)
    }

    /// Whether a completion arriving at `now` for a result fulfilled at
    /// `completed_at` would still be inside the window. Skew clamps the
    /// same way [`DrawAuction::on_relay`] does.
    pub fn is_completion_open(&self, now: u64, completed_at: u64) -> bool {
        now.saturating_sub(completed_at) <= self.duration
    }

    /// Whether a sequence id has already been consumed.
    pub fn is_sequence_completed(&self, sequence_id: SequenceId) -> bool {
        self.last
            .as_ref()
            .is_some_and(|l| sequence_id <= l.sequence_id)
    }

    /// The fraction a completion would earn after `elapsed` seconds of
    /// relay delay.
    pub fn fraction_at(&self, elapsed: u64) -> Fraction {
        reward_fraction(elapsed, self.duration, self.target_time, self.current_anchor())
    }

    pub fn last_completion(&self) -> Option<&CompletedAuction> {
        self.last.as_ref()
    }

    pub fn last_result(&self) -> Option<&AuctionResult> {
        self.last.as_ref().map(|l| &l.result)
    }

    pub fn last_sequence_id(&self) -> Option<SequenceId> {
        self.last.as_ref().map(|l| l.sequence_id)
    }

    fn current_anchor(&self) -> Fraction {
        self.last
            .as_ref()
            .map(|l| l.result.reward_fraction)
            .unwrap_or(self.first_target_fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::constants::{
        DEFAULT_AUCTION_DURATION, DEFAULT_AUCTION_TARGET_TIME, MAX_PAYOUT,
    };
    use cadence_core::error::LedgerError;
    use proptest::prelude::*;
    use std::sync::Mutex;

    const ORIGIN: Address = Address([0x11; 20]);

    struct FakeLedger {
        reserve: u128,
        next_draw: u32,
        payouts: Mutex<Vec<(Address, u128)>>,
        fail_close: bool,
        // Payouts fail once this many have succeeded.
        fail_payout_after: Option<usize>,
    }

    impl FakeLedger {
        fn new(reserve: u128) -> Self {
            Self {
                reserve,
                next_draw: 42,
                payouts: Mutex::new(Vec::new()),
                fail_close: false,
                fail_payout_after: None,
            }
        }

        fn failing_close(reserve: u128) -> Self {
            Self { fail_close: true, ..Self::new(reserve) }
        }

        fn failing_payout_after(reserve: u128, n: usize) -> Self {
            Self { fail_payout_after: Some(n), ..Self::new(reserve) }
        }
    }

    impl DrawLedger for FakeLedger {
        fn close_draw(&self, _random_number: [u8; 32]) -> Result<DrawId, LedgerError> {
            if self.fail_close {
                return Err(LedgerError::CloseFailed("draw not ready".into()));
            }
            Ok(self.next_draw)
        }

        fn reserve_balance(&self) -> Result<u128, LedgerError> {
            Ok(self.reserve)
        }

        fn payout(&self, recipient: Address, amount: u128) -> Result<(), LedgerError> {
            let mut payouts = self.payouts.lock().unwrap();
            if self.fail_payout_after.is_some_and(|n| payouts.len() >= n) {
                return Err(LedgerError::PayoutFailed {
                    recipient,
                    amount,
                    reason: "transfer reverted".into(),
                });
            }
            payouts.push((recipient, amount));
            Ok(())
        }
    }

    fn config() -> AuctionConfig {
        AuctionConfig {
            trusted_relay_origin: ORIGIN,
            ..AuctionConfig::default()
        }
    }

    fn auction(reserve: u128) -> (DrawAuction, Arc<FakeLedger>) {
        let ledger = Arc::new(FakeLedger::new(reserve));
        let a = DrawAuction::new(&config(), ledger.clone()).unwrap();
        (a, ledger)
    }

    fn message(sequence_id: u64, completed_at: u64) -> RelayMessage {
        RelayMessage {
            random_number: [9; 32],
            completed_at,
            reward_recipient: Address([0xBB; 20]),
            sequence_id,
            upstream_result: AuctionResult {
                recipient: Address([0xAA; 20]),
                reward_fraction: Fraction::from_ratio(1, 2).unwrap(),
            },
        }
    }

    #[test]
    fn completes_and_returns_draw_id() {
        let (mut a, ledger) = auction(100);
        let msg = message(0, 1_000);

        // Arrive exactly at the target time: phase two earns the first
        // anchor (0.5) of what remains after phase one's half.
        let draw_id = a
            .on_relay(1_000 + DEFAULT_AUCTION_TARGET_TIME, ORIGIN, &msg)
            .unwrap();

        assert_eq!(draw_id, 42);
        assert_eq!(a.last_sequence_id(), Some(0));
        assert_eq!(
            *ledger.payouts.lock().unwrap(),
            vec![(Address([0xAA; 20]), 50), (Address([0xBB; 20]), 25)]
        );
        let completion = a.last_completion().unwrap();
        assert_eq!(completion.draw_id, 42);
        assert_eq!(completion.payouts.len(), 2);
    }

    #[test]
    fn untrusted_origin_rejected() {
        let (mut a, ledger) = auction(100);
        let err = a.on_relay(1_000, Address([0x99; 20]), &message(0, 900)).unwrap_err();
        assert!(matches!(
            err,
            CadenceError::Auth(AuthError::UntrustedRelayOrigin { .. })
        ));
        assert!(a.last_completion().is_none());
        assert!(ledger.payouts.lock().unwrap().is_empty());
    }

    #[test]
    fn zero_recipient_rejected() {
        let (mut a, _) = auction(100);
        let mut msg = message(0, 900);
        msg.reward_recipient = Address::ZERO;
        let err = a.on_relay(1_000, ORIGIN, &msg).unwrap_err();
        assert!(matches!(err, CadenceError::Auth(AuthError::ZeroRecipient)));
    }

    #[test]
    fn replayed_sequence_rejected() {
        let (mut a, ledger) = auction(100);
        let msg = message(3, 1_000);
        a.on_relay(1_100, ORIGIN, &msg).unwrap();
        let paid = ledger.payouts.lock().unwrap().len();

        // Exact replay.
        let err = a.on_relay(1_200, ORIGIN, &msg).unwrap_err();
        assert!(matches!(
            err,
            CadenceError::Timing(TimingError::SequenceAlreadyCompleted {
                sequence_id: 3,
                last_sequence_id: 3,
            })
        ));

        // Stale lower sequence delivered late and out of order.
        let err = a.on_relay(1_300, ORIGIN, &message(1, 1_000)).unwrap_err();
        assert!(matches!(
            err,
            CadenceError::Timing(TimingError::SequenceAlreadyCompleted { .. })
        ));
        assert_eq!(ledger.payouts.lock().unwrap().len(), paid);
    }

    #[test]
    fn future_completed_at_clamps_to_zero() {
        let (mut a, _) = auction(100);
        // completedAt one second in the future of the receiving clock.
        let msg = message(0, 1_001);
        a.on_relay(1_000, ORIGIN, &msg).unwrap();
        // Zero elapsed means zero fraction for phase two.
        assert_eq!(a.last_result().unwrap().reward_fraction, Fraction::ZERO);
    }

    #[test]
    fn expired_relay_rejected() {
        let (mut a, ledger) = auction(100);
        let msg = message(0, 1_000);
        let err = a
            .on_relay(1_000 + DEFAULT_AUCTION_DURATION + 1, ORIGIN, &msg)
            .unwrap_err();
        assert!(matches!(
            err,
            CadenceError::Timing(TimingError::AuctionExpired { .. })
        ));
        assert!(a.last_completion().is_none());
        assert!(ledger.payouts.lock().unwrap().is_empty());
    }

    #[test]
    fn arrival_exactly_at_duration_allowed() {
        let (mut a, _) = auction(100);
        a.on_relay(1_000 + DEFAULT_AUCTION_DURATION, ORIGIN, &message(0, 1_000))
            .unwrap();
        assert_eq!(a.last_result().unwrap().reward_fraction, Fraction::ONE);
    }

    #[test]
    fn anchor_follows_own_history_not_upstream() {
        let (mut a, _) = auction(100);
        // Sequence 0 completes at full duration: own fraction 1.0.
        a.on_relay(1_000 + DEFAULT_AUCTION_DURATION, ORIGIN, &message(0, 1_000))
            .unwrap();
        assert_eq!(a.last_result().unwrap().reward_fraction, Fraction::ONE);

        // Sequence 1 at the target time anchors on the 1.0, not on the
        // upstream result's 0.5.
        a.on_relay(2_000 + DEFAULT_AUCTION_TARGET_TIME, ORIGIN, &message(1, 2_000))
            .unwrap();
        assert_eq!(a.last_result().unwrap().reward_fraction, Fraction::ONE);
    }

    #[test]
    fn ledger_close_failure_leaves_state_unchanged() {
        let ledger = Arc::new(FakeLedger::failing_close(100));
        let mut a = DrawAuction::new(&config(), ledger.clone()).unwrap();
        let err = a.on_relay(1_000, ORIGIN, &message(0, 900)).unwrap_err();
        assert!(matches!(
            err,
            CadenceError::Ledger(LedgerError::CloseFailed(_))
        ));
        assert!(a.last_completion().is_none());
        assert!(!a.is_sequence_completed(0));
        assert!(ledger.payouts.lock().unwrap().is_empty());
    }

    #[test]
    fn max_rewards_caps_the_pool() {
        let ledger = Arc::new(FakeLedger::new(1_000));
        let cfg = AuctionConfig { max_rewards: Some(100), ..config() };
        let mut a = DrawAuction::new(&cfg, ledger.clone()).unwrap();

        a.on_relay(1_000 + DEFAULT_AUCTION_TARGET_TIME, ORIGIN, &message(0, 1_000))
            .unwrap();
        // Pool capped at 100 even though the reserve holds 1,000.
        assert_eq!(
            *ledger.payouts.lock().unwrap(),
            vec![(Address([0xAA; 20]), 50), (Address([0xBB; 20]), 25)]
        );
    }

    #[test]
    fn saturated_payout_capped_not_rejected() {
        let (mut a, ledger) = auction(MAX_PAYOUT * 3);
        let mut msg = message(0, 1_000);
        msg.upstream_result.reward_fraction = Fraction::ONE;

        a.on_relay(1_000, ORIGIN, &msg).unwrap();
        // Phase one computed the full pool but transfers only the
        // ledger ceiling.
        assert_eq!(ledger.payouts.lock().unwrap()[0].1, MAX_PAYOUT);
    }

    #[test]
    fn zero_reserve_completes_without_payouts() {
        let (mut a, ledger) = auction(0);
        let draw_id = a.on_relay(1_000, ORIGIN, &message(0, 900)).unwrap();
        assert_eq!(draw_id, 42);
        assert!(ledger.payouts.lock().unwrap().is_empty());
        assert!(a.last_completion().unwrap().payouts.is_empty());
    }

    #[test]
    fn is_sequence_completed_covers_all_lower_ids() {
        let (mut a, _) = auction(100);
        assert!(!a.is_sequence_completed(0));
        a.on_relay(1_100, ORIGIN, &message(5, 1_000)).unwrap();
        for seq in 0..=5 {
            assert!(a.is_sequence_completed(seq));
        }
        assert!(!a.is_sequence_completed(6));
    }

    #[test]
    fn fraction_at_previews_with_own_anchor() {
        let (a, _) = auction(100);
        assert_eq!(a.fraction_at(0), Fraction::ZERO);
        assert_eq!(
            a.fraction_at(DEFAULT_AUCTION_TARGET_TIME),
            config().first_target_fraction
        );
        assert_eq!(a.fraction_at(DEFAULT_AUCTION_DURATION), Fraction::ONE);
    }

    #[test]
    fn is_completion_open_clamps_skew_like_on_relay() {
        let (a, _) = auction(100);
        assert!(a.is_completion_open(1_000, 1_000));
        assert!(a.is_completion_open(1_000 + DEFAULT_AUCTION_DURATION, 1_000));
        assert!(!a.is_completion_open(1_000 + DEFAULT_AUCTION_DURATION + 1, 1_000));
        // Fulfillment timestamp ahead of the receiving clock clamps to
        // zero elapsed: still open.
        assert!(a.is_completion_open(1_000, u64::MAX));
    }

    #[test]
    fn partial_payout_failure_records_the_issued_prefix() {
        // The first transfer lands, the second is rejected: the
        // committed record must hold exactly the issued payout.
        let ledger = Arc::new(FakeLedger::failing_payout_after(100, 1));
        let mut a = DrawAuction::new(&config(), ledger.clone()).unwrap();

        let err = a
            .on_relay(1_000 + DEFAULT_AUCTION_TARGET_TIME, ORIGIN, &message(0, 1_000))
            .unwrap_err();
        assert!(matches!(
            err,
            CadenceError::Ledger(LedgerError::PayoutFailed { .. })
        ));

        let completion = a.last_completion().unwrap();
        assert_eq!(completion.payouts.len(), 1);
        assert_eq!(completion.payouts[0].recipient, Address([0xAA; 20]));
        assert_eq!(completion.payouts[0].amount, 50);
        assert_eq!(*ledger.payouts.lock().unwrap(), vec![(Address([0xAA; 20]), 50)]);
    }

    // --- proptest ---

    proptest! {
        #[test]
        fn prop_completion_never_overpays_the_reserve(
            reserve in 0u128..=1_000_000,
            upstream_scaled in 0u64..=Fraction::ONE.as_scaled(),
            elapsed in 0u64..=DEFAULT_AUCTION_DURATION,
        ) {
            let (mut a, ledger) = auction(reserve);
            let mut msg = message(0, 1_000);
            msg.upstream_result.reward_fraction = Fraction::from_scaled(upstream_scaled);
            a.on_relay(1_000 + elapsed, ORIGIN, &msg).unwrap();
            let total: u128 = ledger
                .payouts
                .lock()
                .unwrap()
                .iter()
                .map(|(_, amount)| amount)
                .sum();
            prop_assert!(total <= reserve);
        }

        #[test]
        fn prop_replay_never_pays_twice(
            first_elapsed in 0u64..=DEFAULT_AUCTION_DURATION,
            retry_gap in 0u64..=DEFAULT_AUCTION_TARGET_TIME,
        ) {
            let (mut a, ledger) = auction(1_000);
            let msg = message(0, 1_000);
            a.on_relay(1_000 + first_elapsed, ORIGIN, &msg).unwrap();
            let paid = ledger.payouts.lock().unwrap().len();
            prop_assert!(a.on_relay(1_000 + first_elapsed + retry_gap, ORIGIN, &msg).is_err());
            prop_assert_eq!(ledger.payouts.lock().unwrap().len(), paid);
        }
    }
}
