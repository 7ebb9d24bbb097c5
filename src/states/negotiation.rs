//! The initial handshake state.

use super::{AUTHENTICATION, NEGOTIATION, shape_mismatch};
use crate::collab::ResponseSink;
use crate::fsm::{ConnectionContext, State, StateFactory, Transition, TransitionResult};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use weft_proto::{Metadata, Request, RequestKind, RequestShape};

/// Accepts the handshake, records client metadata and announces the server.
pub struct HelloTransition;

#[async_trait]
impl Transition for HelloTransition {
    fn shape(&self) -> RequestShape {
        RequestShape::Exact(RequestKind::Hello)
    }

    async fn process(
        &self,
        ctx: &mut ConnectionContext,
        request: &Request,
        sink: &mut dyn ResponseSink,
    ) -> TransitionResult {
        let Request::Hello(hello) = request else {
            return Err(shape_mismatch("HELLO"));
        };

        ctx.user_agent = Some(hello.user_agent.clone());
        info!(
            connection_id = %ctx.connection_id,
            user_agent = %hello.user_agent,
            "handshake accepted"
        );

        let mut metadata = Metadata::new();
        metadata.insert("server".into(), json!(ctx.config.server.agent));
        metadata.insert("connection_id".into(), json!(ctx.connection_id));
        sink.on_success(metadata).await;

        Ok(AUTHENTICATION)
    }
}

/// Build the negotiation state: a single-transition state, so anything but
/// the handshake is an illegal transition.
pub fn state() -> State {
    StateFactory::new(NEGOTIATION)
        .with_transition(Arc::new(HelloTransition))
        .build()
}
