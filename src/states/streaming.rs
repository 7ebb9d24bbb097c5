//! Result-consumption states, auto-commit and transaction-scoped.

use super::{IN_TRANSACTION, READY, STREAMING, TX_STREAMING, shape_mismatch};
use crate::collab::{ResponseSink, StreamProgress};
use crate::error::{Failure, Fatality};
use crate::fsm::{ConnectionContext, State, StateFactory, StateReference, Transition, TransitionResult};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use weft_proto::{Metadata, Request, RequestGroup, RequestShape};

/// Drains or discards the open result stream.
///
/// One transition covers the whole results family (PULL and DISCARD); the
/// request's own kind picks the mode. A bounded PULL that leaves records
/// behind keeps the session in its streaming state with a has-more marker;
/// exhaustion moves it to `done`. For the auto-commit variant, exhaustion
/// also pops any impersonation scope, since the session returns to ready.
pub struct ConsumeTransition {
    stay: StateReference,
    done: StateReference,
    clear_impersonation_on_done: bool,
}

impl ConsumeTransition {
    /// Streaming over an implicit (auto-commit) transaction.
    pub fn auto_commit() -> Self {
        Self {
            stay: STREAMING,
            done: READY,
            clear_impersonation_on_done: true,
        }
    }

    /// Streaming inside an explicit transaction; completion returns to the
    /// transaction, and the impersonation scope stays with it.
    pub fn in_transaction() -> Self {
        Self {
            stay: TX_STREAMING,
            done: IN_TRANSACTION,
            clear_impersonation_on_done: false,
        }
    }
}

#[async_trait]
impl Transition for ConsumeTransition {
    fn shape(&self) -> RequestShape {
        RequestShape::Group(RequestGroup::Results)
    }

    async fn process(
        &self,
        ctx: &mut ConnectionContext,
        request: &Request,
        sink: &mut dyn ResponseSink,
    ) -> TransitionResult {
        let (pull, n) = match request {
            Request::Pull(p) => (true, p.n),
            Request::Discard(d) => (false, d.n),
            _ => return Err(shape_mismatch("PULL/DISCARD")),
        };

        let outcome = match ctx.stream.as_mut() {
            Some(stream) => stream.consume(sink, pull, n).await,
            None => {
                return Err(Fatality::Internal(
                    "streaming state entered without an open result".into(),
                )
                .into());
            }
        };

        match outcome {
            Ok(StreamProgress::HasMore) => {
                let mut metadata = Metadata::new();
                metadata.insert("has_more".into(), json!(true));
                sink.on_success(metadata).await;
                Ok(self.stay)
            }
            Ok(StreamProgress::Done(summary)) => {
                ctx.stream = None;
                if self.clear_impersonation_on_done {
                    ctx.clear_impersonation();
                }
                sink.on_success(summary).await;
                Ok(self.done)
            }
            Err(e) => {
                ctx.stream = None;
                ctx.clear_impersonation();
                Err(Failure::Statement(e.to_string()).into())
            }
        }
    }
}

/// Auto-commit streaming: PULL/DISCARD only.
pub fn auto_commit_state() -> State {
    StateFactory::new(STREAMING)
        .with_transition(Arc::new(ConsumeTransition::auto_commit()))
        .build()
}

/// Transaction-scoped streaming: same shape, different exits.
pub fn tx_state() -> State {
    StateFactory::new(TX_STREAMING)
        .with_transition(Arc::new(ConsumeTransition::in_transaction()))
        .build()
}
