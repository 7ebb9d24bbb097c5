//! Scoped identity substitution.
//!
//! A request may name an "as user" target; the operation it starts then runs
//! under that identity and only that operation. The overlay lives on the
//! connection context; this module owns entering the scope, and each state's
//! transitions own leaving it (on return to a non-impersonating state, or
//! immediately on error).

use crate::collab::{AuthError, AuthSubject};
use crate::error::{Failure, MachineError};
use crate::fsm::ConnectionContext;
use tracing::debug;

/// Resolve the identity a request should execute under and, when it names an
/// impersonation target, push the overlay onto the context.
///
/// With no target this is a plain read of the active identity. With a target
/// the authentication collaborator decides whether the acting identity may
/// borrow it; a refusal fails the whole operation before any work starts.
pub async fn enter_scope(
    ctx: &mut ConnectionContext,
    target: Option<&str>,
) -> Result<AuthSubject, MachineError> {
    let Some(target) = target else {
        return Ok(ctx.active_subject()?.clone());
    };

    if !ctx.config.session.allow_impersonation {
        return Err(Failure::ImpersonationNotPermitted(
            "impersonation is disabled on this server".into(),
        )
        .into());
    }

    let acting = ctx.active_subject()?.clone();
    match ctx.auth.impersonate(&acting, target).await {
        Ok(subject) => {
            debug!(acting = %acting.username, target = %subject.username, "impersonation resolved");
            ctx.set_impersonation(subject.clone());
            Ok(subject)
        }
        Err(e @ AuthError::NotPermitted { .. }) => {
            Err(Failure::ImpersonationNotPermitted(e.to_string()).into())
        }
        Err(e) => Err(Failure::ImpersonationNotPermitted(format!(
            "impersonation target could not be resolved: {e}"
        ))
        .into()),
    }
}
