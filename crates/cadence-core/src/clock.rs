//! Sequence clock: maps wall-clock time to a recurring window.
//!
//! A sequence is one recurring time window of fixed `period` seconds,
//! numbered from an `offset`. Times before the offset belong to
//! sequence 0 with zero elapsed time — a documented edge case rather
//! than an error, since the first window has simply not opened yet.

use crate::error::ConfigError;

/// Pure mapping from timestamps to sequence ids and within-window
/// elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceClock {
    period: u64,
    offset: u64,
}

impl SequenceClock {
    /// Create a clock. The period must be non-zero.
    pub fn new(period: u64, offset: u64) -> Result<Self, ConfigError> {
        if period == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        Ok(Self { period, offset })
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The sequence id open at `now`: `floor((now - offset) / period)`,
    /// or 0 before the offset.
    pub fn sequence_id(&self, now: u64) -> u64 {
        if now < self.offset {
            return 0;
        }
        (now - self.offset) / self.period
    }

    /// Seconds elapsed within the window open at `now`, or 0 before the
    /// offset.
    pub fn elapsed(&self, now: u64) -> u64 {
        if now < self.offset {
            return 0;
        }
        (now - self.offset) % self.period
    }

    /// The timestamp at which a given sequence's window opens.
    pub fn window_start(&self, sequence_id: u64) -> u64 {
        self.offset.saturating_add(sequence_id.saturating_mul(self.period))
    }
}
