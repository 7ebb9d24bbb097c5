//! The credential gate.

use super::{AUTHENTICATION, READY, shape_mismatch};
use crate::collab::ResponseSink;
use crate::error::Fatality;
use crate::fsm::{ConnectionContext, State, StateFactory, Transition, TransitionResult};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use weft_proto::{Metadata, Request, RequestKind, RequestShape};

/// Verifies submitted credentials through the authentication collaborator.
///
/// A verification failure is terminal for the connection: the driver emits
/// the failure response and the transport closes the socket. Nothing short
/// of a fresh connection gets another attempt.
pub struct LogonTransition;

#[async_trait]
impl Transition for LogonTransition {
    fn shape(&self) -> RequestShape {
        RequestShape::Exact(RequestKind::Logon)
    }

    async fn process(
        &self,
        ctx: &mut ConnectionContext,
        request: &Request,
        sink: &mut dyn ResponseSink,
    ) -> TransitionResult {
        let Request::Logon(credentials) = request else {
            return Err(shape_mismatch("LOGON"));
        };

        match ctx.auth.verify(credentials).await {
            Ok(subject) => {
                info!(
                    connection_id = %ctx.connection_id,
                    user = %subject.username,
                    "authenticated"
                );
                let mut metadata = Metadata::new();
                if subject.credentials_expired {
                    metadata.insert("credentials_expired".into(), json!(true));
                }
                ctx.set_login(subject);
                sink.on_success(metadata).await;
                Ok(READY)
            }
            Err(e) => Err(Fatality::Authentication(e.to_string()).into()),
        }
    }
}

pub fn state() -> State {
    StateFactory::new(AUTHENTICATION)
        .with_transition(Arc::new(LogonTransition))
        .build()
}
