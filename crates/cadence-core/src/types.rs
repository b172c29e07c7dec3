//! Shared data types: addresses, auction results, requests, and the
//! relay message exchanged between the two phases.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AddressError;
use crate::fraction::Fraction;

/// Identifier of one recurring window; the unit of idempotency for both
/// phases.
pub type SequenceId = u64;

/// Identifier of a closed draw, assigned by the ledger collaborator.
pub type DrawId = u32;

/// 20-byte address-like identifier for recipients and collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        let arr: [u8; 20] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| AddressError::InvalidLength(bytes.len()))?;
        Ok(Address(arr))
    }
}

/// Outcome of one phase of one sequence's auction.
///
/// Immutable once written; superseded (not mutated) when the next
/// sequence's call succeeds. Only the last completed result per phase
/// is retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionResult {
    /// Who earns this phase's share of the reserve.
    pub recipient: Address,
    /// Share of the remaining pool, nominally in [0, 1].
    pub reward_fraction: Fraction,
}

/// Handle to an in-flight randomness request, created by phase one.
///
/// The `sequence_id` field is the idempotency key read by the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngRequest {
    pub request_id: u64,
    pub lock_handle: u64,
    pub sequence_id: SequenceId,
    pub requested_at: u64,
}

/// The payload carried from phase one to phase two.
///
/// Ephemeral: constructed by the relay channel and consumed exactly once
/// by phase two, which re-validates timing and sequence on arrival
/// because delivery and ordering are not guaranteed across transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayMessage {
    pub random_number: [u8; 32],
    /// Provider-side fulfillment timestamp; may lag or lead the
    /// receiving clock.
    pub completed_at: u64,
    /// Recipient of the phase-two reward (relay caller, possibly
    /// remapped).
    pub reward_recipient: Address,
    pub sequence_id: SequenceId,
    /// Phase one's finalized result, paid first in the compounding
    /// distribution.
    pub upstream_result: AuctionResult,
}

/// One issued reward transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub recipient: Address,
    /// Position in the ordered result chain.
    pub index: usize,
    /// Amount transferred, already capped at the ledger ceiling.
    pub amount: u128,
}
