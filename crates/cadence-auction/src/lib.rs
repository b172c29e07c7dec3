//! # cadence-auction — two-phase auction engine.
//!
//! One canonical two-phase state machine:
//! - [`RngAuction`] (phase one) sells the duty of triggering the
//!   randomness request; one successful start per sequence.
//! - [`DrawAuction`] (phase two) sells the duty of closing the draw
//!   with the fulfilled number; one successful completion per sequence,
//!   accepted only from the trusted relay origin.
//!
//! Both phases price the duty with the reward curve in
//! `cadence_core::curve`, anchored on their own previous finalized
//! fraction, and the [`RewardAllocator`] converts the ordered result
//! chain into compounding payouts against the reserve.

pub mod allocator;
pub mod config;
pub mod phase_one;
pub mod phase_two;

pub use allocator::RewardAllocator;
pub use config::AuctionConfig;
pub use phase_one::{RngAuction, StartedAuction};
pub use phase_two::{CompletedAuction, DrawAuction};
