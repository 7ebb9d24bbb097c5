//! Concrete protocol states.
//!
//! Each module wires the transitions for one node of the protocol graph.
//! The graph's edges are the `StateReference`s transitions return; the
//! references themselves live here so every module (and the driver) shares
//! one vocabulary.

pub mod authentication;
pub mod failed;
pub mod interrupted;
pub mod negotiation;
pub mod ready;
pub mod streaming;
pub mod transaction;

use crate::error::{Fatality, MachineError};
use crate::fsm::StateReference;

pub const NEGOTIATION: StateReference = StateReference::new("NEGOTIATION");
pub const AUTHENTICATION: StateReference = StateReference::new("AUTHENTICATION");
pub const READY: StateReference = StateReference::new("READY");
pub const STREAMING: StateReference = StateReference::new("STREAMING");
pub const IN_TRANSACTION: StateReference = StateReference::new("IN_TRANSACTION");
pub const TX_STREAMING: StateReference = StateReference::new("TX_STREAMING");
pub const INTERRUPTED: StateReference = StateReference::new("INTERRUPTED");
pub const FAILED: StateReference = StateReference::new("FAILED");

/// A transition received a request whose variant does not match its shape.
/// Dispatch guarantees this never happens; reaching it is a wiring bug.
pub(crate) fn shape_mismatch(expected: &'static str) -> MachineError {
    Fatality::Internal(format!("dispatch handed a non-{expected} request to the {expected} transition")).into()
}
