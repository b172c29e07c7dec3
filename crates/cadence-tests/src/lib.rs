//! End-to-end and adversarial test suite for Cadence.
//!
//! This crate wires real phase-one and phase-two machines together
//! through a relay channel, with scripted provider and ledger
//! collaborators, and verifies the full sequence lifecycle under both
//! cooperative and hostile delivery conditions.

pub mod helpers;
