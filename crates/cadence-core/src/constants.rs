//! Protocol constants. Reward fractions are unsigned fixed-point values
//! with 18 decimal places; payout amounts are integer reserve units.

/// Denominator of the fixed-point [`Fraction`](crate::fraction::Fraction)
/// representation: 1.0 == 10^18.
pub const FRACTION_SCALE: u64 = 1_000_000_000_000_000_000;

/// Largest payout amount the ledger can represent (96-bit unsigned).
///
/// Rewards computed above this ceiling are capped before transfer, never
/// rejected: the draw must still close even when one reward saturates.
pub const MAX_PAYOUT: u128 = (1 << 96) - 1;

/// Default recurring window length: one day.
pub const DEFAULT_SEQUENCE_PERIOD: u64 = 86_400;

/// Default auction duration within a window: four hours.
pub const DEFAULT_AUCTION_DURATION: u64 = 14_400;

/// Default target-time anchor: two hours.
pub const DEFAULT_AUCTION_TARGET_TIME: u64 = 7_200;

/// Default first-window target fraction: 0.5, used until a sequence has
/// produced a finalized fraction of its own.
pub const DEFAULT_FIRST_TARGET_FRACTION: u64 = FRACTION_SCALE / 2;
