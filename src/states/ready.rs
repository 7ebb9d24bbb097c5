//! The ready state: the session's home between operations.

use super::{IN_TRANSACTION, READY, STREAMING, shape_mismatch};
use crate::bookmark::parse_bookmarks;
use crate::collab::ResponseSink;
use crate::error::{Failure, Fatality};
use crate::fsm::{ConnectionContext, State, StateFactory, Transition, TransitionResult};
use crate::impersonation;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use weft_proto::{Metadata, Request, RequestKind, RequestShape, TxExtra};

/// Database targeted by a request, falling back to the configured default.
fn target_database(ctx: &ConnectionContext, requested: Option<&str>) -> String {
    requested
        .map(str::to_string)
        .unwrap_or_else(|| ctx.config.session.default_database.clone())
}

fn request_bookmarks(
    ctx: &ConnectionContext,
    extra: &TxExtra,
) -> Result<weft_proto::BookmarkList, Failure> {
    parse_bookmarks(
        &extra.bookmarks,
        ctx.databases.as_ref(),
        ctx.config.session.single_database_bookmarks,
    )
}

/// Auto-commit statement execution: RUN moves the session to streaming.
pub struct RunTransition;

#[async_trait]
impl Transition for RunTransition {
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

        let bookmarks = request_bookmarks(ctx, &run.extra)?;
        let subject =
            impersonation::enter_scope(ctx, run.extra.impersonated_user.as_deref()).await?;
        let database = target_database(ctx, run.extra.database.as_deref());

        let outcome = ctx
            .executor
            .run(
                &subject,
                &database,
                &run.statement,
                &run.parameters,
                &bookmarks,
                run.extra.access_mode,
            )
            .await;

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
                Ok(STREAMING)
            }
            Err(e) => {
                ctx.clear_impersonation();
                Err(Failure::Statement(e.to_string()).into())
            }
        }
    }
}

/// Opens an explicit transaction bound to the (possibly impersonated)
/// identity.
pub struct BeginTransition;

#[async_trait]
impl Transition for BeginTransition {
    fn shape(&self) -> RequestShape {
        RequestShape::Exact(RequestKind::Begin)
    }

    async fn process(
        &self,
        ctx: &mut ConnectionContext,
        request: &Request,
        sink: &mut dyn ResponseSink,
    ) -> TransitionResult {
        let Request::Begin(begin) = request else {
            return Err(shape_mismatch("BEGIN"));
        };

        let bookmarks = request_bookmarks(ctx, &begin.extra)?;
        let subject =
            impersonation::enter_scope(ctx, begin.extra.impersonated_user.as_deref()).await?;
        let database = target_database(ctx, begin.extra.database.as_deref());

        let outcome = ctx
            .tx_manager
            .begin(&subject, &database, &bookmarks, begin.extra.access_mode)
            .await;

        match outcome {
            Ok(tx) => {
                ctx.tx = Some(tx);
                sink.on_success(Metadata::new()).await;
                Ok(IN_TRANSACTION)
            }
            Err(e) => {
                ctx.clear_impersonation();
                Err(Failure::Transaction(e.to_string()).into())
            }
        }
    }
}

/// Answers a routing table request and stays in ready. The impersonation
/// scope, when one was named, is popped as soon as the call returns; it is
/// never carried into the next request.
pub struct RouteTransition;

#[async_trait]
impl Transition for RouteTransition {
    fn shape(&self) -> RequestShape {
        RequestShape::Exact(RequestKind::Route)
    }

    async fn process(
        &self,
        ctx: &mut ConnectionContext,
        request: &Request,
        sink: &mut dyn ResponseSink,
    ) -> TransitionResult {
        let Request::Route(route) = request else {
            return Err(shape_mismatch("ROUTE"));
        };

        let subject = impersonation::enter_scope(ctx, route.impersonated_user.as_deref()).await?;
        let database = target_database(ctx, route.database.as_deref());

        let outcome = ctx
            .routing
            .route(&route.routing_context, &database, &subject)
            .await;
        ctx.clear_impersonation();

        match outcome {
            Ok(table) => {
                let mut metadata = Metadata::new();
                metadata.insert("rt".into(), serde_json::Value::Object(table));
                sink.on_success(metadata).await;
                Ok(READY)
            }
            Err(e) => Err(Failure::Routing(e.0).into()),
        }
    }
}

/// Clears session state and returns to ready. Shared by the ready self-loop
/// and the failed state's recovery path.
pub struct SessionResetTransition;

#[async_trait]
impl Transition for SessionResetTransition {
    fn shape(&self) -> RequestShape {
        RequestShape::Exact(RequestKind::Reset)
    }

    async fn process(
        &self,
        ctx: &mut ConnectionContext,
        _request: &Request,
        sink: &mut dyn ResponseSink,
    ) -> TransitionResult {
        ctx.reset_session().await?;
        sink.on_success(Metadata::new()).await;
        Ok(READY)
    }
}

/// A second handshake on an authenticated session is not an ordinary
/// out-of-sequence message: it is a breach, and the connection is torn down.
pub struct RepeatedHelloTransition;

#[async_trait]
impl Transition for RepeatedHelloTransition {
    fn shape(&self) -> RequestShape {
        RequestShape::Exact(RequestKind::Hello)
    }

    async fn process(
        &self,
        _ctx: &mut ConnectionContext,
        _request: &Request,
        _sink: &mut dyn ResponseSink,
    ) -> TransitionResult {
        Err(Fatality::Breach("HELLO re-sent on an authenticated session".into()).into())
    }
}

/// Build the ready state as first wired: RUN, BEGIN, RESET, and the
/// handshake breach. Later protocol versions derive from this via
/// `builder_of`, adding ROUTE.
pub fn state() -> State {
    StateFactory::new(READY)
        .with_transition(Arc::new(RunTransition))
        .with_transition(Arc::new(BeginTransition))
        .with_transition(Arc::new(SessionResetTransition))
        .with_transition(Arc::new(RepeatedHelloTransition))
        .build()
}
