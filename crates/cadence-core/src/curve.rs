//! Reward curve and compounding distribution.
//!
//! The reward fraction grows with elapsed time along two linear
//! segments anchored at `(target_time, target_fraction)`: from 0 at the
//! window open to the anchor, then from the anchor to exactly 1.0 at
//! `duration`. The anchor for sequence *n* is the previous sequence's
//! finalized fraction (a "last sold price" model), passed in as an
//! immutable snapshot so the function stays pure.
//!
//! Past `duration` the curve clamps at 1.0. Callers are expected to
//! reject expired windows before acting on the value; the clamp is a
//! second line of defense, not the primary enforcement.

use crate::fraction::Fraction;

/// Reward fraction for a given elapsed time within the auction window.
///
/// Piecewise linear:
/// - `[0, target_time]`: `elapsed / target_time * target_fraction`
/// - `(target_time, duration)`: `target_fraction + (elapsed - target_time)
///   / (duration - target_time) * (1 - target_fraction)`
/// - `[duration, ∞)`: exactly 1.0 (clamped)
///
/// The anchor fraction is itself clamped to 1.0 before use. Degenerate
/// geometry (`duration == 0`, `target_time == 0`, or `target_time >
/// duration`) is unreachable past config validation and yields 0.
pub fn reward_fraction(
    elapsed: u64,
    duration: u64,
    target_time: u64,
    target_fraction: Fraction,
) -> Fraction {
    if duration == 0 || target_time == 0 || target_time > duration {
        return Fraction::ZERO;
    }
    let target = target_fraction.clamp_one();
    if elapsed >= duration {
        return Fraction::ONE;
    }
    if elapsed <= target_time {
        // target scaled < 2^60 and elapsed < 2^64, product fits u128.
        let scaled = target.as_scaled() as u128 * elapsed as u128 / target_time as u128;
        return Fraction::from_scaled(scaled as u64);
    }
    let into_segment = (elapsed - target_time) as u128;
    let segment = (duration - target_time) as u128;
    let headroom = Fraction::ONE.saturating_sub(target).as_scaled() as u128;
    let rise = (headroom * into_segment / segment) as u64;
    Fraction::from_scaled(target.as_scaled() + rise)
}

/// Compounding distribution: convert an ordered fraction list into
/// absolute amounts against a shrinking pool.
///
/// Each fraction applies to what is left after all earlier entries, so
/// order is significant — the phase-one result must precede phase two.
/// Fractions are clamped to 1.0, which makes every amount at most the
/// remaining pool and the total at most `pool` (with equality when the
/// final fraction is 1.0 and no flooring occurred).
pub fn compute_reward_amounts(pool: u128, fractions: &[Fraction]) -> Vec<u128> {
    let mut remaining = pool;
    fractions
        .iter()
        .map(|f| {
            let reward = f.clamp_one().mul_amount(remaining);
            remaining -= reward;
            reward
        })
        .collect()
}
