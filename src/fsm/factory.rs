//! Builder for protocol states.

use super::reference::StateReference;
use super::registry::HandlerRegistry;
use super::state::State;
use super::transition::Transition;
use std::sync::Arc;
use weft_proto::RequestShape;

/// Accumulates (shape, transition) pairs and produces the right [`State`]
/// variant for the final cardinality: zero transitions build an empty state
/// that refuses everything, one builds a direct-check state, more build a
/// registry-backed state.
pub struct StateFactory {
    reference: StateReference,
    /// Registration order is kept; re-registering a shape overwrites the
    /// earlier entry in place.
    transitions: Vec<(RequestShape, Arc<dyn Transition>)>,
}

impl StateFactory {
    pub fn new(reference: StateReference) -> Self {
        Self {
            reference,
            transitions: Vec::new(),
        }
    }

    /// Register a transition under its own shape, replacing any earlier
    /// registration for the same shape.
    pub fn with_transition(mut self, transition: Arc<dyn Transition>) -> Self {
        let shape = transition.shape();
        if let Some(slot) = self.transitions.iter_mut().find(|(s, _)| *s == shape) {
            slot.1 = transition;
        } else {
            self.transitions.push((shape, transition));
        }
        self
    }

    /// Remove the transition registered for `shape`, if any.
    pub fn without_transition(mut self, shape: RequestShape) -> Self {
        self.transitions.retain(|(s, _)| *s != shape);
        self
    }

    pub fn build(self) -> State {
        let mut transitions = self.transitions;
        match transitions.len() {
            0 => State::Empty {
                reference: self.reference,
            },
            1 => {
                let (shape, transition) = transitions.remove(0);
                State::Single {
                    reference: self.reference,
                    shape,
                    transition,
                }
            }
            _ => State::Multi {
                reference: self.reference,
                registry: HandlerRegistry::from_entries(transitions),
            },
        }
    }
}
