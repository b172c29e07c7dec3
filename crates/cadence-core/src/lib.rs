//! # cadence-core
//! Foundation types and traits for the Cadence auction engine.

pub mod clock;
pub mod constants;
pub mod curve;
pub mod error;
pub mod fraction;
pub mod traits;
pub mod types;

pub use clock::SequenceClock;
pub use fraction::Fraction;
pub use types::{Address, AuctionResult, Payout, RelayMessage, RngRequest};
