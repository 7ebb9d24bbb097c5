//! The transition contract.

use super::context::ConnectionContext;
use super::reference::StateReference;
use crate::collab::ResponseSink;
use crate::error::MachineError;
use async_trait::async_trait;
use weft_proto::{Request, RequestShape};

/// Result of processing one request: the state to move to, or an error for
/// the driver to classify.
pub type TransitionResult = Result<StateReference, MachineError>;

/// A unit of behavior bound to exactly one request shape.
///
/// Transitions are built once at protocol-version wiring time and shared
/// across every connection of that version; all per-connection mutation goes
/// through the context argument.
#[async_trait]
pub trait Transition: Send + Sync {
    /// The single request shape this transition accepts. Used by the owning
    /// state to pre-filter and by the registry to index.
    fn shape(&self) -> RequestShape;

    /// Execute the transition and name the next state.
    async fn process(
        &self,
        ctx: &mut ConnectionContext,
        request: &Request,
        sink: &mut dyn ResponseSink,
    ) -> TransitionResult;
}
