//! Wire-level error classification codes.
//!
//! Every failure response carries one of these codes so drivers can react
//! without parsing message text.

use std::fmt;

/// Classification code attached to a failure response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Request not legal in the current session state, or otherwise invalid.
    RequestInvalid,
    /// Credential verification failed.
    SecurityUnauthorized,
    /// The authenticated identity may not perform the requested substitution.
    SecurityForbidden,
    /// A supplied bookmark could not be parsed or resolved.
    TransactionInvalidBookmark,
    /// Supplied bookmarks mix databases in a way the request disallows.
    TransactionInvalidBookmarkMixture,
    /// Statement execution failed.
    StatementExecutionFailed,
    /// Transaction begin/commit/rollback failed.
    TransactionFailed,
    /// Routing table acquisition failed.
    RoutingUnavailable,
    /// Unclassified server-side error.
    GeneralUnknown,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::RequestInvalid => "Request.Invalid",
            ErrorCode::SecurityUnauthorized => "Security.Unauthorized",
            ErrorCode::SecurityForbidden => "Security.Forbidden",
            ErrorCode::TransactionInvalidBookmark => "Transaction.InvalidBookmark",
            ErrorCode::TransactionInvalidBookmarkMixture => "Transaction.InvalidBookmarkMixture",
            ErrorCode::StatementExecutionFailed => "Statement.ExecutionFailed",
            ErrorCode::TransactionFailed => "Transaction.Failed",
            ErrorCode::RoutingUnavailable => "Routing.Unavailable",
            ErrorCode::GeneralUnknown => "General.UnknownError",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
