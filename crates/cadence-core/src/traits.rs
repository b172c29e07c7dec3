//! Trait interfaces for the external collaborators.
//!
//! These traits are the engine's only view of the outside world:
//! - [`RngProvider`] — randomness request/fulfillment service
//! - [`DrawLedger`] — draw closing and reserve payouts
//! - [`MessageDispatcher`] — cross-domain message transport
//!
//! Collaborator failures are never caught or retried inside the engine;
//! they propagate through `?` and abort the whole call.

use crate::error::{LedgerError, ProviderError, RelayError};
use crate::types::{Address, DrawId};

/// Randomness-provider service consumed by phase one and read by the
/// relay channel.
pub trait RngProvider: Send + Sync {
    /// Fee asset and amount charged for the next request.
    fn fee(&self) -> Result<(Address, u128), ProviderError>;

    /// Open a new randomness request. Returns `(request_id, lock_handle)`.
    fn request_number(&self) -> Result<(u64, u64), ProviderError>;

    /// Whether the provider has fulfilled the request.
    fn is_complete(&self, request_id: u64) -> bool;

    /// Fulfillment timestamp of a completed request.
    fn completed_at(&self, request_id: u64) -> Result<u64, ProviderError>;

    /// The fulfilled random number. Fails if not yet complete.
    fn number(&self, request_id: u64) -> Result<[u8; 32], ProviderError>;
}

/// Draw/reserve ledger consumed by phase two.
///
/// From the engine's perspective the ledger is debit-only: one reserve
/// snapshot followed by payouts within a single "complete" call. The
/// ledger itself is expected to serialize concurrent debits.
pub trait DrawLedger: Send + Sync {
    /// Finalize the open draw with the fulfilled random number.
    fn close_draw(&self, random_number: [u8; 32]) -> Result<DrawId, LedgerError>;

    /// Current reserve available for rewards.
    fn reserve_balance(&self) -> Result<u128, LedgerError>;

    /// Transfer `amount` to `recipient` out of the reserve.
    fn payout(&self, recipient: Address, amount: u128) -> Result<(), LedgerError>;
}

/// External message-dispatch collaborator for cross-domain relay
/// deployments. Delivery and ordering are not guaranteed.
pub trait MessageDispatcher: Send + Sync {
    /// Hand an encoded relay payload to the transport, addressed to the
    /// receiving endpoint.
    fn dispatch(&self, to: Address, payload: Vec<u8>) -> Result<(), RelayError>;
}
