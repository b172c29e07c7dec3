//! # cadence-relay — carrying phase-one results to phase two.
//!
//! The [`RelayChannel`] reads a completed phase-one auction plus the
//! fulfilled random number, applies the caller's payout remap, and
//! hands a [`RelayMessage`](cadence_core::RelayMessage) to a pluggable
//! transport:
//! - [`DirectTransport`] — synchronous in-process call, failures
//!   surfaced to the relay caller as wrapped errors (testing and
//!   single-domain deployments);
//! - [`QueuedTransport`] — unordered store-and-forward queue modeling
//!   a cross-domain bridge with no delivery guarantee;
//! - [`DispatcherTransport`] — serde-encoded payload handed to an
//!   external message-dispatch collaborator.
//!
//! Phase two re-validates sequence and timing on arrival in every case;
//! the transport only moves bytes.

pub mod channel;
pub mod codec;
pub mod transport;

pub use channel::RelayChannel;
pub use codec::{decode_relay_message, encode_relay_message, DispatcherTransport};
pub use transport::{DirectTransport, QueuedTransport, RelayDelivery, RelayTransport};
