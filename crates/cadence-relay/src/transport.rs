//! Relay transport strategies.
//!
//! One canonical phase-two machine serves both synchronous and
//! cross-domain deployments; only the transport differs. Delivery and
//! ordering are guaranteed by no transport — phase two's own sequence
//! and timing checks are the correctness boundary.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use cadence_auction::DrawAuction;
use cadence_core::error::{CadenceError, RelayError};
use cadence_core::types::{DrawId, SequenceId};
use cadence_core::{Address, RelayMessage};

/// Outcome of handing a message to a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayDelivery {
    /// Synchronous delivery; the sequence completed with this draw id.
    Completed(DrawId),
    /// The message was accepted for asynchronous delivery. Whether it
    /// ever arrives is not this side's to know.
    Enqueued,
}

/// Strategy for moving a relay message toward phase two.
pub trait RelayTransport: Send + Sync {
    fn deliver(&self, now: u64, msg: RelayMessage) -> Result<RelayDelivery, RelayError>;
}

/// In-process synchronous delivery straight into the phase-two machine.
pub struct DirectTransport {
    auction: Arc<Mutex<DrawAuction>>,
    origin: Address,
}

impl DirectTransport {
    /// `origin` is the identity this transport presents to phase two;
    /// it must match the configured trusted relay origin.
    pub fn new(auction: Arc<Mutex<DrawAuction>>, origin: Address) -> Self {
        Self { auction, origin }
    }
}

impl RelayTransport for DirectTransport {
    fn deliver(&self, now: u64, msg: RelayMessage) -> Result<RelayDelivery, RelayError> {
        let mut auction = self.auction.lock();
        auction
            .on_relay(now, self.origin, &msg)
            .map(RelayDelivery::Completed)
            .map_err(|e| RelayError::DeliveryFailed(e.to_string()))
    }
}

/// Store-and-forward queue standing in for an unreliable cross-domain
/// bridge. Messages sit until something drains them; drains happen on
/// the receiver's clock, not the sender's.
#[derive(Default)]
pub struct QueuedTransport {
    queue: Mutex<VecDeque<RelayMessage>>,
}

impl QueuedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Drop the oldest pending message, simulating transport loss.
    pub fn drop_next(&self) -> Option<RelayMessage> {
        self.queue.lock().pop_front()
    }

    /// Deliver the oldest pending message to phase two.
    pub fn deliver_next(
        &self,
        now: u64,
        origin: Address,
        auction: &Mutex<DrawAuction>,
    ) -> Option<Result<DrawId, CadenceError>> {
        let msg = self.queue.lock().pop_front()?;
        Some(auction.lock().on_relay(now, origin, &msg))
    }

    /// Drain every pending message in arrival order, reporting each
    /// outcome. Failed deliveries are consumed, not retried.
    pub fn deliver_all(
        &self,
        now: u64,
        origin: Address,
        auction: &Mutex<DrawAuction>,
    ) -> Vec<(SequenceId, Result<DrawId, CadenceError>)> {
        let mut outcomes = Vec::new();
        while let Some(msg) = self.queue.lock().pop_front() {
            let result = auction.lock().on_relay(now, origin, &msg);
            outcomes.push((msg.sequence_id, result));
        }
        outcomes
    }
}

impl RelayTransport for QueuedTransport {
    fn deliver(&self, _now: u64, msg: RelayMessage) -> Result<RelayDelivery, RelayError> {
        self.queue.lock().push_back(msg);
        Ok(RelayDelivery::Enqueued)
    }
}
