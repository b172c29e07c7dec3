//! Unsigned fixed-point fraction with 18 decimal places.
//!
//! All reward-curve arithmetic uses integer math only. A [`Fraction`]
//! stores `value * 10^18` in a `u64`, which represents values up to
//! roughly 18.44 — far above the nominal `[0, 1]` range the curve
//! produces after clamping. Operations are checked or saturating;
//! nothing wraps.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::FRACTION_SCALE;

/// An unsigned fixed-point decimal with scale 10^18.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Fraction(u64);

impl Fraction {
    /// 0.0
    pub const ZERO: Fraction = Fraction(0);
    /// 1.0
    pub const ONE: Fraction = Fraction(FRACTION_SCALE);

    /// Build from a raw scaled value (`value * 10^18`).
    pub const fn from_scaled(scaled: u64) -> Self {
        Fraction(scaled)
    }

    /// The raw scaled value.
    pub const fn as_scaled(&self) -> u64 {
        self.0
    }

    /// `numerator / denominator` as a fraction.
    ///
    /// Returns `None` when the denominator is zero or the result does not
    /// fit the scaled `u64` representation.
    pub fn from_ratio(numerator: u64, denominator: u64) -> Option<Self> {
        if denominator == 0 {
            return None;
        }
        let scaled = (numerator as u128)
            .checked_mul(FRACTION_SCALE as u128)?
            / denominator as u128;
        u64::try_from(scaled).ok().map(Fraction)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Saturating subtraction; floors at zero.
    pub fn saturating_sub(self, other: Fraction) -> Fraction {
        Fraction(self.0.saturating_sub(other.0))
    }

    /// Clamp to at most 1.0.
    pub fn clamp_one(self) -> Fraction {
        if self > Self::ONE { Self::ONE } else { self }
    }

    /// Exact `floor(amount * self)` for an integer amount.
    ///
    /// Decomposes `amount = q * SCALE + r` so that
    /// `q * scaled + r * scaled / SCALE` never loses precision and the
    /// partial products stay within `u128`. For fractions at or below 1.0
    /// the result is at most `amount`; larger fractions saturate at
    /// `u128::MAX` rather than wrapping.
    pub fn mul_amount(&self, amount: u128) -> u128 {
        let scale = FRACTION_SCALE as u128;
        let scaled = self.0 as u128;
        let q = amount / scale;
        let r = amount % scale;
        // r < 10^18 and scaled < 2^64, so r * scaled < 2^124.
        let low = r * scaled / scale;
        q.checked_mul(scaled)
            .and_then(|high| high.checked_add(low))
            .unwrap_or(u128::MAX)
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let int = self.0 / FRACTION_SCALE;
        let frac = self.0 % FRACTION_SCALE;
        write!(f, "{int}.{frac:018}")
    }
}
