//! Reward allocation against the draw ledger.
//!
//! Applies the compounding distribution to an ordered chain of auction
//! results and issues one payout per non-zero amount. Amounts above the
//! ledger's 96-bit ceiling are capped before transfer — the draw must
//! still close even when one reward saturates — while the remaining
//! pool shrinks by the full computed reward.

use std::sync::Arc;

use cadence_core::constants::MAX_PAYOUT;
use cadence_core::curve;
use cadence_core::error::CadenceError;
use cadence_core::traits::DrawLedger;
use cadence_core::{AuctionResult, Payout};

/// Expected reward amounts for an ordered result chain against a pool.
///
/// Pure preview of what [`RewardAllocator::distribute`] would pay
/// (before the per-payout ceiling), so callers can price the auction
/// without touching the ledger.
pub fn compute_rewards(results: &[AuctionResult], pool: u128) -> Vec<u128> {
    let fractions: Vec<_> = results.iter().map(|r| r.reward_fraction).collect();
    curve::compute_reward_amounts(pool, &fractions)
}

/// Issues compounding payouts through the ledger collaborator.
pub struct RewardAllocator {
    ledger: Arc<dyn DrawLedger>,
}

impl RewardAllocator {
    pub fn new(ledger: Arc<dyn DrawLedger>) -> Self {
        Self { ledger }
    }

    /// Distribute `pool` across `results` in order, recording each
    /// issued transfer in `payouts` as it lands.
    ///
    /// Zero amounts are skipped entirely (no transfer, no event).
    /// Ledger failures propagate and abort the remaining payouts; the
    /// sink then holds exactly the transfers that went through.
    pub fn distribute(
        &self,
        pool: u128,
        results: &[AuctionResult],
        payouts: &mut Vec<Payout>,
    ) -> Result<(), CadenceError> {
        let amounts = compute_rewards(results, pool);
        for (index, (result, amount)) in results.iter().zip(amounts).enumerate() {
            if amount == 0 {
                continue;
            }
            let capped = amount.min(MAX_PAYOUT);
            self.ledger.payout(result.recipient, capped)?;
            tracing::info!(
                target: "cadence::allocator",
                recipient = %result.recipient,
                index,
                amount = capped,
                "reward paid"
            );
            payouts.push(Payout { recipient: result.recipient, index, amount: capped });
        }
        Ok(())
    }
}
