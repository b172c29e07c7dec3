//! Wire codec for dispatcher-based cross-domain relays.
//!
//! The message is encoded as JSON and handed to an external
//! [`MessageDispatcher`]; the receiving endpoint decodes and feeds it
//! into its local phase-two machine. Bridge-specific framing (gas
//! parameters, address aliasing) belongs to the dispatcher, not here.

use std::sync::Arc;

use cadence_auction::DrawAuction;
use cadence_core::error::{CadenceError, RelayError};
use cadence_core::traits::MessageDispatcher;
use cadence_core::types::DrawId;
use cadence_core::{Address, RelayMessage};

use crate::transport::{RelayDelivery, RelayTransport};

/// Encode a relay message for the wire.
pub fn encode_relay_message(msg: &RelayMessage) -> Result<Vec<u8>, RelayError> {
    serde_json::to_vec(msg).map_err(|e| RelayError::Encode(e.to_string()))
}

/// Decode a relay message received from the wire.
pub fn decode_relay_message(payload: &[u8]) -> Result<RelayMessage, RelayError> {
    serde_json::from_slice(payload).map_err(|e| RelayError::Decode(e.to_string()))
}

/// Receiving-endpoint entry point: decode and complete.
///
/// `origin` is the authenticated identity of the delivering transport
/// as seen by the receiver (after any bridge-side address remapping).
pub fn receive_dispatched(
    now: u64,
    origin: Address,
    payload: &[u8],
    auction: &mut DrawAuction,
) -> Result<DrawId, CadenceError> {
    let msg = decode_relay_message(payload)?;
    auction.on_relay(now, origin, &msg)
}

/// Transport that serializes messages and hands them to an external
/// dispatch collaborator. Fire-and-forget: a successful dispatch only
/// means the bridge accepted the payload.
pub struct DispatcherTransport {
    dispatcher: Arc<dyn MessageDispatcher>,
    /// Address of the receiving phase-two endpoint.
    endpoint: Address,
}

impl DispatcherTransport {
    pub fn new(dispatcher: Arc<dyn MessageDispatcher>, endpoint: Address) -> Self {
        Self { dispatcher, endpoint }
    }
}

impl RelayTransport for DispatcherTransport {
    fn deliver(&self, _now: u64, msg: RelayMessage) -> Result<RelayDelivery, RelayError> {
        let payload = encode_relay_message(&msg)?;
        self.dispatcher.dispatch(self.endpoint, payload)?;
        tracing::debug!(
            target: "cadence::relay",
            sequence_id = msg.sequence_id,
            endpoint = %self.endpoint,
            "relay message dispatched"
        );
        Ok(RelayDelivery::Enqueued)
    }
}
