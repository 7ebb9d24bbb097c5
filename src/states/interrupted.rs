//! The interrupted state.
//!
//! The driver parks sessions here whenever the interrupt signal is raised.
//! Every request other than RESET is answered with an explicit ignored
//! response, letting the client drain its pipeline; RESET consumes one
//! pending interrupt and, once none remain, restores the session to ready.

use super::{INTERRUPTED, READY, shape_mismatch};
use crate::collab::ResponseSink;
use crate::fsm::{ConnectionContext, State, StateFactory, StateReference, Transition, TransitionResult};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use weft_proto::{Metadata, Request, RequestKind, RequestShape};

/// Answers anything with an ignored response and stays parked.
///
/// Registered under the universal shape; the exact RESET registration in the
/// same state wins for RESET, everything else lands here.
pub struct IgnoreTransition {
    park: StateReference,
}

impl IgnoreTransition {
    pub fn parked_at(park: StateReference) -> Self {
        Self { park }
    }
}

#[async_trait]
impl Transition for IgnoreTransition {
    fn shape(&self) -> RequestShape {
        RequestShape::Any
    }

    async fn process(
        &self,
        _ctx: &mut ConnectionContext,
        request: &Request,
        sink: &mut dyn ResponseSink,
    ) -> TransitionResult {
        debug!(request = request.kind().name(), "request ignored while draining");
        sink.on_ignored().await;
        Ok(self.park)
    }
}

/// RESET while interrupted: each RESET consumes one pending interrupt. The
/// one matching the oldest signal is itself answered with ignored; the final
/// one clears session state and succeeds back to ready.
pub struct InterruptedResetTransition;

#[async_trait]
impl Transition for InterruptedResetTransition {
    fn shape(&self) -> RequestShape {
        RequestShape::Exact(RequestKind::Reset)
    }

    async fn process(
        &self,
        ctx: &mut ConnectionContext,
        request: &Request,
        sink: &mut dyn ResponseSink,
    ) -> TransitionResult {
        if !matches!(request, Request::Reset) {
            return Err(shape_mismatch("RESET"));
        }

        let remaining = ctx.acknowledge_interrupt();
        if remaining > 0 {
            debug!(remaining, "reset matched an earlier interrupt, staying parked");
            sink.on_ignored().await;
            return Ok(INTERRUPTED);
        }

        ctx.reset_session().await?;
        sink.on_success(Metadata::new()).await;
        Ok(READY)
    }
}

pub fn state() -> State {
    StateFactory::new(INTERRUPTED)
        .with_transition(Arc::new(InterruptedResetTransition))
        .with_transition(Arc::new(IgnoreTransition::parked_at(INTERRUPTED)))
        .build()
}
