//! Error types for the Cadence auction engine.
//!
//! Every rejection is a parameterized variant so callers and monitoring
//! can distinguish "try again next window" (timing) from "misconfigured"
//! (config) from "unauthorized" (auth).
use thiserror::Error;

use crate::types::Address;

/// Construction-time configuration failures. Fatal and non-recoverable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("auction duration is zero")] ZeroDuration,
    #[error("auction target time is zero")] ZeroTargetTime,
    #[error("target time {target_time} exceeds duration {duration}")] TargetTimeExceedsDuration { target_time: u64, duration: u64 },
    #[error("sequence period is zero")] ZeroPeriod,
    #[error("zero address for {0}")] ZeroAddress(&'static str),
    #[error("first target fraction {0} exceeds 1.0")] FirstFractionAboveOne(u64),
}

/// Per-call timing failures. Expected and frequent; no side effects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimingError {
    #[error("auction expired: elapsed {elapsed} > duration {duration}")] AuctionExpired { elapsed: u64, duration: u64 },
    #[error("sequence {sequence_id} already started")] SequenceAlreadyStarted { sequence_id: u64 },
    #[error("sequence {sequence_id} already completed (last {last_sequence_id})")] SequenceAlreadyCompleted { sequence_id: u64, last_sequence_id: u64 },
}

/// Authorization failures. Fatal, no state change.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("untrusted relay origin: {origin}")] UntrustedRelayOrigin { origin: Address },
    #[error("reward recipient is the zero address")] ZeroRecipient,
}

/// Failures surfaced by the randomness-provider collaborator.
///
/// Never caught or retried inside the engine; they propagate and abort
/// the whole call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("randomness request failed: {0}")] RequestFailed(String),
    #[error("unknown request: {request_id}")] UnknownRequest { request_id: u64 },
    #[error("request {request_id} not yet completed")] NotCompleted { request_id: u64 },
}

/// Failures surfaced by the draw-ledger collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("draw close failed: {0}")] CloseFailed(String),
    #[error("reserve unavailable: {0}")] ReserveUnavailable(String),
    #[error("payout of {amount} to {recipient} failed: {reason}")] PayoutFailed { recipient: Address, amount: u128, reason: String },
}

/// Relay-channel failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("no completed auction to relay")] NoAuctionToRelay,
    #[error("randomness for request {request_id} not yet fulfilled")] RngNotCompleted { request_id: u64 },
    #[error("relay delivery failed: {0}")] DeliveryFailed(String),
    #[error("relay message encode failed: {0}")] Encode(String),
    #[error("relay message decode failed: {0}")] Decode(String),
    #[error("message dispatch failed: {0}")] DispatchFailed(String),
}

/// Address parsing failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid length: {0} bytes")] InvalidLength(usize),
    #[error("invalid hex: {0}")] InvalidHex(String),
}

#[derive(Error, Debug)]
pub enum CadenceError {
    #[error(transparent)] Config(#[from] ConfigError),
    #[error(transparent)] Timing(#[from] TimingError),
    #[error(transparent)] Auth(#[from] AuthError),
    #[error(transparent)] Provider(#[from] ProviderError),
    #[error(transparent)] Ledger(#[from] LedgerError),
    #[error(transparent)] Relay(#[from] RelayError),
    #[error(transparent)] Address(#[from] AddressError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_error_messages_carry_parameters() {
        let e = TimingError::AuctionExpired { elapsed: 15_000, duration: 14_400 };
        assert_eq!(e.to_string(), "auction expired: elapsed 15000 > duration 14400");
    }

    #[test]
    fn replay_error_names_both_sequences() {
        let e = TimingError::SequenceAlreadyCompleted { sequence_id: 3, last_sequence_id: 7 };
        assert!(e.to_string().contains("3"));
        assert!(e.to_string().contains("7"));
    }

    #[test]
    fn umbrella_wraps_transparently() {
        let e: CadenceError = TimingError::SequenceAlreadyStarted { sequence_id: 9 }.into();
        assert_eq!(e.to_string(), "sequence 9 already started");
        assert!(matches!(e, CadenceError::Timing(_)));
    }

    #[test]
    fn auth_error_displays_origin() {
        let e = AuthError::UntrustedRelayOrigin { origin: Address([0xAB; 20]) };
        assert!(e.to_string().contains("0xabababab"));
    }

    #[test]
    fn config_error_zero_address_names_role() {
        let e = ConfigError::ZeroAddress("trusted relay origin");
        assert_eq!(e.to_string(), "zero address for trusted relay origin");
    }
}
