//! The failed state.
//!
//! Entered by the driver after any recoverable failure. Pipelined requests
//! drain with ignored responses instead of cascading failures; RESET clears
//! the condition and restores ready.

use super::FAILED;
use super::interrupted::IgnoreTransition;
use super::ready::SessionResetTransition;
use crate::fsm::{State, StateFactory};
use std::sync::Arc;

pub fn state() -> State {
    StateFactory::new(FAILED)
        .with_transition(Arc::new(SessionResetTransition))
        .with_transition(Arc::new(IgnoreTransition::parked_at(FAILED)))
        .build()
}
