//! Protocol version wiring.
//!
//! Each version assembles its own immutable state graph. Later versions
//! derive individual states from earlier ones through `builder_of`, adding
//! or replacing single transitions instead of re-declaring the rest. A
//! definition is built once at startup and shared by every connection
//! speaking that version.

use crate::fsm::StateMachineDefinition;
use crate::states::{self, authentication, failed, interrupted, negotiation, ready, streaming, transaction};
use std::sync::Arc;

/// First wired version: no routing support.
pub fn v1() -> StateMachineDefinition {
    StateMachineDefinition::new("weft/1", states::NEGOTIATION)
        .with_state(negotiation::state())
        .with_state(authentication::state())
        .with_state(ready::state())
        .with_state(streaming::auto_commit_state())
        .with_state(transaction::state())
        .with_state(streaming::tx_state())
        .with_state(interrupted::state())
        .with_state(failed::state())
}

/// Second version: identical graph, except the ready state gains ROUTE.
pub fn v2() -> StateMachineDefinition {
    let ready_with_route = ready::state()
        .builder_of()
        .with_transition(Arc::new(ready::RouteTransition))
        .build();

    StateMachineDefinition::new("weft/2", states::NEGOTIATION)
        .with_state(negotiation::state())
        .with_state(authentication::state())
        .with_state(ready_with_route)
        .with_state(streaming::auto_commit_state())
        .with_state(transaction::state())
        .with_state(streaming::tx_state())
        .with_state(interrupted::state())
        .with_state(failed::state())
}
