//! The explicit-transaction state.

use super::{IN_TRANSACTION, READY, TX_STREAMING, shape_mismatch};
use crate::collab::ResponseSink;
use crate::error::{Failure, Fatality};
use crate::fsm::{ConnectionContext, State, StateFactory, Transition, TransitionResult};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use weft_proto::{Metadata, Request, RequestKind, RequestShape};

/// Runs a statement inside the open transaction.
pub struct TxRunTransition;

#[async_trait]
impl Transition for TxRunTransition {
    fn shape(&self) -> RequestShape {
        RequestShape::Exact(RequestKind::Run)
    }

    async fn process(
        &self,
        ctx: &mut ConnectionContext,
        request: &Request,
        sink: &mut dyn ResponseSink,
    ) -> TransitionResult {
        let Request::Run(run) = request else {
            return Err(shape_mismatch("RUN"));
        };
        let received = ctx.clock.now_millis();

        let outcome = match ctx.tx.as_mut() {
            Some(tx) => tx.run(&run.statement, &run.parameters).await,
            None => {
                return Err(
                    Fatality::Internal("transaction state entered without a transaction".into())
                        .into(),
                );
            }
        };

        match outcome {
            Ok(stream) => {
                let mut metadata = Metadata::new();
                metadata.insert("fields".into(), json!(stream.fields()));
                metadata.insert(
                    "result_available_after".into(),
                    json!(ctx.clock.now_millis() - received),
                );
                ctx.stream = Some(stream);
                sink.on_success(metadata).await;
                Ok(TX_STREAMING)
            }
            Err(e) => Err(Failure::Statement(e.to_string()).into()),
        }
    }
}

/// Commits the open transaction and returns to ready.
pub struct CommitTransition;

#[async_trait]
impl Transition for CommitTransition {
    fn shape(&self) -> RequestShape {
        RequestShape::Exact(RequestKind::Commit)
    }

    async fn process(
        &self,
        ctx: &mut ConnectionContext,
        _request: &Request,
        sink: &mut dyn ResponseSink,
    ) -> TransitionResult {
        let Some(tx) = ctx.tx.take() else {
            return Err(
                Fatality::Internal("commit dispatched without an open transaction".into()).into(),
            );
        };

        let outcome = tx.commit().await;
        ctx.clear_impersonation();

        match outcome {
            Ok(metadata) => {
                sink.on_success(metadata).await;
                Ok(READY)
            }
            Err(e) => Err(Failure::Transaction(e.to_string()).into()),
        }
    }
}

/// Rolls the open transaction back and returns to ready.
pub struct RollbackTransition;

#[async_trait]
impl Transition for RollbackTransition {
    fn shape(&self) -> RequestShape {
        RequestShape::Exact(RequestKind::Rollback)
    }

    async fn process(
        &self,
        ctx: &mut ConnectionContext,
        _request: &Request,
        sink: &mut dyn ResponseSink,
    ) -> TransitionResult {
        let Some(tx) = ctx.tx.take() else {
            return Err(
                Fatality::Internal("rollback dispatched without an open transaction".into()).into(),
            );
        };

        let outcome = tx.rollback().await;
        ctx.clear_impersonation();

        match outcome {
            Ok(()) => {
                sink.on_success(Metadata::new()).await;
                Ok(READY)
            }
            Err(e) => Err(Failure::Transaction(e.to_string()).into()),
        }
    }
}

pub fn state() -> State {
    StateFactory::new(IN_TRANSACTION)
        .with_transition(Arc::new(TxRunTransition))
        .with_transition(Arc::new(CommitTransition))
        .with_transition(Arc::new(RollbackTransition))
        .build()
}
