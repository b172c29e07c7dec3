//! The relay channel: authentication, remapping, and packaging.
//!
//! A pure pass-through layer with no state of its own beyond the
//! optional recipient remap table (`caller → preferred payout address`,
//! default identity). It reads the completed phase-one auction and the
//! provider's fulfillment, builds the [`RelayMessage`], and hands it to
//! the configured transport.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use cadence_auction::RngAuction;
use cadence_core::error::{AuthError, CadenceError, RelayError};
use cadence_core::{Address, RelayMessage};

use crate::transport::{RelayDelivery, RelayTransport};

/// Carries a completed phase-one result to phase two.
pub struct RelayChannel {
    auction: Arc<Mutex<RngAuction>>,
    transport: Box<dyn RelayTransport>,
    remap: Mutex<HashMap<Address, Address>>,
}

impl RelayChannel {
    pub fn new(auction: Arc<Mutex<RngAuction>>, transport: Box<dyn RelayTransport>) -> Self {
        Self {
            auction,
            transport,
            remap: Mutex::new(HashMap::new()),
        }
    }

    /// Register a caller's preferred payout address. The zero address
    /// clears the entry back to identity.
    pub fn set_remap(&self, caller: Address, preferred: Address) {
        let mut remap = self.remap.lock();
        if preferred.is_zero() {
            remap.remove(&caller);
        } else {
            remap.insert(caller, preferred);
        }
        tracing::info!(
            target: "cadence::relay",
            caller = %caller,
            preferred = %preferred,
            "relay payout remap updated"
        );
    }

    /// Where a caller's phase-two reward would be paid.
    pub fn remap_of(&self, caller: Address) -> Address {
        self.remap.lock().get(&caller).copied().unwrap_or(caller)
    }

    /// Relay the last completed phase-one auction.
    ///
    /// Fails if no auction has completed, or if the provider has not
    /// fulfilled the request yet. The phase-two reward goes to the
    /// caller, or to the caller's remapped payout address.
    pub fn relay(&self, now: u64, caller: Address) -> Result<RelayDelivery, CadenceError> {
        if caller.is_zero() {
            return Err(AuthError::ZeroRecipient.into());
        }

        let (request, upstream_result, provider) = {
            let auction = self.auction.lock();
            let last = auction
                .last_auction()
                .ok_or(RelayError::NoAuctionToRelay)?;
            (last.request, last.result, auction.provider())
        };

        if !provider.is_complete(request.request_id) {
            return Err(RelayError::RngNotCompleted { request_id: request.request_id }.into());
        }
        let random_number = provider.number(request.request_id)?;
        let completed_at = provider.completed_at(request.request_id)?;

        let msg = RelayMessage {
            random_number,
            completed_at,
            reward_recipient: self.remap_of(caller),
            sequence_id: request.sequence_id,
            upstream_result,
        };
        tracing::debug!(
            target: "cadence::relay",
            sequence_id = msg.sequence_id,
            caller = %caller,
            recipient = %msg.reward_recipient,
            "relaying phase-one result"
        );
        Ok(self.transport.deliver(now, msg)?)
    }
}
