//! Protocol states.

use super::context::ConnectionContext;
use super::factory::StateFactory;
use super::reference::StateReference;
use super::registry::HandlerRegistry;
use super::transition::{Transition, TransitionResult};
use crate::collab::ResponseSink;
use crate::error::Failure;
use std::sync::Arc;
use weft_proto::{Request, RequestKind, RequestShape};

/// An immutable named node in the protocol graph.
///
/// The variant is decided by the builder from the number of registered
/// transitions. States are wired once per protocol version and shared across
/// every connection speaking that version.
pub enum State {
    /// Accepts nothing; every request is an illegal transition.
    Empty { reference: StateReference },
    /// Accepts exactly one shape, checked directly.
    Single {
        reference: StateReference,
        shape: RequestShape,
        transition: Arc<dyn Transition>,
    },
    /// Accepts several shapes through a registry.
    Multi {
        reference: StateReference,
        registry: HandlerRegistry,
    },
}

impl State {
    pub fn reference(&self) -> StateReference {
        match self {
            State::Empty { reference }
            | State::Single { reference, .. }
            | State::Multi { reference, .. } => *reference,
        }
    }

    /// Route `request` to the matching transition, or fail with an
    /// illegal-transition error. All side effects belong to the transition.
    pub async fn process(
        &self,
        ctx: &mut ConnectionContext,
        request: &Request,
        sink: &mut dyn ResponseSink,
    ) -> TransitionResult {
        let kind = request.kind();
        match self {
            State::Empty { reference } => Err(illegal_transition(*reference, kind)),
            State::Single {
                reference,
                shape,
                transition,
            } => {
                if shape.accepts(kind) {
                    transition.process(ctx, request, sink).await
                } else {
                    Err(illegal_transition(*reference, kind))
                }
            }
            State::Multi {
                reference,
                registry,
            } => match registry.find(kind) {
                Some(transition) => transition.process(ctx, request, sink).await,
                None => Err(illegal_transition(*reference, kind)),
            },
        }
    }

    /// A builder pre-seeded with this state's transitions, for deriving a
    /// variant in a later protocol version.
    pub fn builder_of(&self) -> StateFactory {
        let mut factory = StateFactory::new(self.reference());
        match self {
            State::Empty { .. } => {}
            State::Single { transition, .. } => {
                factory = factory.with_transition(Arc::clone(transition));
            }
            State::Multi { registry, .. } => {
                for (_, transition) in registry.entries() {
                    factory = factory.with_transition(transition);
                }
            }
        }
        factory
    }
}

fn illegal_transition(state: StateReference, kind: RequestKind) -> crate::error::MachineError {
    Failure::IllegalTransition {
        state: state.name(),
        request: kind.name(),
    }
    .into()
}
