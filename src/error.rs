//! Unified error handling for weftd-ng.
//!
//! Two disjoint error classes drive the protocol engine: per-request
//! failures, which the connection survives, and connection fatalities, which
//! it does not. The driver is the only place that classifies; transitions
//! and the registry propagate typed errors upward without swallowing them.

use thiserror::Error;
use weft_proto::ErrorCode;

// ============================================================================
// Per-request (recoverable) failures
// ============================================================================

/// Failures scoped to a single request. The connection survives: the driver
/// emits a failure response and parks the session in the Failed state until
/// a RESET arrives.
#[derive(Debug, Error)]
pub enum Failure {
    #[error("{request} cannot be handled by a session in the {state} state")]
    IllegalTransition {
        state: &'static str,
        request: &'static str,
    },

    #[error("invalid bookmark: {0}")]
    InvalidBookmark(String),

    #[error("invalid bookmark mixture: {0}")]
    InvalidBookmarkMixture(String),

    #[error("impersonation denied: {0}")]
    ImpersonationNotPermitted(String),

    #[error("statement execution failed: {0}")]
    Statement(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("routing unavailable: {0}")]
    Routing(String),
}

impl Failure {
    /// Wire classification code for the failure response.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::IllegalTransition { .. } => ErrorCode::RequestInvalid,
            Self::InvalidBookmark(_) => ErrorCode::TransactionInvalidBookmark,
            Self::InvalidBookmarkMixture(_) => ErrorCode::TransactionInvalidBookmarkMixture,
            Self::ImpersonationNotPermitted(_) => ErrorCode::SecurityForbidden,
            Self::Statement(_) => ErrorCode::StatementExecutionFailed,
            Self::Transaction(_) => ErrorCode::TransactionFailed,
            Self::Routing(_) => ErrorCode::RoutingUnavailable,
        }
    }

    /// Static label for log fields.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::IllegalTransition { .. } => "illegal_transition",
            Self::InvalidBookmark(_) => "invalid_bookmark",
            Self::InvalidBookmarkMixture(_) => "invalid_bookmark_mixture",
            Self::ImpersonationNotPermitted(_) => "impersonation_not_permitted",
            Self::Statement(_) => "statement_failed",
            Self::Transaction(_) => "transaction_failed",
            Self::Routing(_) => "routing_unavailable",
        }
    }
}

// ============================================================================
// Connection-fatal failures
// ============================================================================

/// Failures that terminate the connection. A failure response is emitted
/// best-effort; afterwards the transport must close the socket.
#[derive(Debug, Error)]
pub enum Fatality {
    /// The client violated the protocol's own invariants, beyond an ordinary
    /// out-of-sequence message.
    #[error("protocol breach: {0}")]
    Breach(String),

    /// Credential verification failed at the authentication gate.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The session was closed; no further requests are accepted.
    #[error("session is closed")]
    Closed,

    #[error("internal error: {0}")]
    Internal(String),
}

impl Fatality {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Breach(_) => ErrorCode::RequestInvalid,
            Self::Authentication(_) => ErrorCode::SecurityUnauthorized,
            Self::Closed => ErrorCode::RequestInvalid,
            Self::Internal(_) => ErrorCode::GeneralUnknown,
        }
    }

    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Breach(_) => "protocol_breach",
            Self::Authentication(_) => "authentication_failed",
            Self::Closed => "session_closed",
            Self::Internal(_) => "internal_error",
        }
    }
}

// ============================================================================
// Combined transition error
// ============================================================================

/// Error raised by a state or transition, classified by the driver.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error(transparent)]
    Recoverable(#[from] Failure),
    #[error(transparent)]
    Fatal(#[from] Fatality),
}
