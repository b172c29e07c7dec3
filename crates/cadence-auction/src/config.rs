//! Auction configuration.
//!
//! All values are fixed at construction time; an invalid configuration
//! aborts deployment entirely rather than producing a half-working
//! engine. The randomness provider is the one hot-swappable
//! collaborator, handled separately by [`RngAuction`](crate::RngAuction)
//! with deferred effect.

use serde::{Deserialize, Serialize};

use cadence_core::clock::SequenceClock;
use cadence_core::constants::{
    DEFAULT_AUCTION_DURATION, DEFAULT_AUCTION_TARGET_TIME, DEFAULT_FIRST_TARGET_FRACTION,
    DEFAULT_SEQUENCE_PERIOD,
};
use cadence_core::error::ConfigError;
use cadence_core::{Address, Fraction};

/// Shared configuration for both auction phases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionConfig {
    /// Auction window length in seconds within each sequence.
    pub duration: u64,
    /// Elapsed time at which the curve hits the target-fraction anchor.
    pub target_time: u64,
    /// Recurring sequence period in seconds.
    pub period: u64,
    /// Timestamp at which sequence 0 opens.
    pub offset: u64,
    /// Curve anchor used until a phase has a finalized fraction of its
    /// own.
    pub first_target_fraction: Fraction,
    /// Optional ceiling on the reward pool taken from the reserve.
    pub max_rewards: Option<u128>,
    /// The only caller phase two accepts completions from.
    pub trusted_relay_origin: Address,
}

impl Default for AuctionConfig {
    fn default() -> Self {
        Self {
            duration: DEFAULT_AUCTION_DURATION,
            target_time: DEFAULT_AUCTION_TARGET_TIME,
            period: DEFAULT_SEQUENCE_PERIOD,
            offset: 0,
            first_target_fraction: Fraction::from_scaled(DEFAULT_FIRST_TARGET_FRACTION),
            max_rewards: None,
            // Must be set by the deployer; validate() rejects it.
            trusted_relay_origin: Address::ZERO,
        }
    }
}

impl AuctionConfig {
    /// Validate the configuration. Every failure here is fatal.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if self.target_time == 0 {
            return Err(ConfigError::ZeroTargetTime);
        }
        if self.target_time > self.duration {
            return Err(ConfigError::TargetTimeExceedsDuration {
                target_time: self.target_time,
                duration: self.duration,
            });
        }
        if self.period == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        if self.first_target_fraction > Fraction::ONE {
            return Err(ConfigError::FirstFractionAboveOne(
                self.first_target_fraction.as_scaled(),
            ));
        }
        if self.trusted_relay_origin.is_zero() {
            return Err(ConfigError::ZeroAddress("trusted relay origin"));
        }
        Ok(())
    }

    /// The sequence clock defined by this configuration.
    pub fn clock(&self) -> Result<SequenceClock, ConfigError> {
        SequenceClock::new(self.period, self.offset)
    }
}
