//! Decoded protocol requests.
//!
//! The transport decodes wire bytes into these structures and hands them to
//! the engine one at a time per connection. Everything here is already
//! validated at the framing level; semantic validation (bookmarks,
//! impersonation, transaction rules) is the engine's job.

use crate::shape::RequestKind;
use crate::value::{Metadata, Value};
use serde::Deserialize;

/// A decoded client request.
#[derive(Debug, Clone)]
pub enum Request {
    /// Connection handshake carrying client metadata.
    Hello(Hello),
    /// Credential submission.
    Logon(Credentials),
    /// Auto-commit statement execution.
    Run(Run),
    /// Open an explicit transaction.
    Begin(Begin),
    /// Commit the open explicit transaction.
    Commit,
    /// Roll back the open explicit transaction.
    Rollback,
    /// Consume records from the open result stream.
    Pull(Pull),
    /// Drop remaining records from the open result stream.
    Discard(Discard),
    /// Request a routing table.
    Route(Route),
    /// Clear failure state and return the session to ready.
    Reset,
}

impl Request {
    /// The dispatch tag for this request.
    pub fn kind(&self) -> RequestKind {
        match self {
            Request::Hello(_) => RequestKind::Hello,
            Request::Logon(_) => RequestKind::Logon,
            Request::Run(_) => RequestKind::Run,
            Request::Begin(_) => RequestKind::Begin,
            Request::Commit => RequestKind::Commit,
            Request::Rollback => RequestKind::Rollback,
            Request::Pull(_) => RequestKind::Pull,
            Request::Discard(_) => RequestKind::Discard,
            Request::Route(_) => RequestKind::Route,
            Request::Reset => RequestKind::Reset,
        }
    }
}

/// Client metadata from the handshake.
#[derive(Debug, Clone, Default)]
pub struct Hello {
    pub user_agent: String,
    pub extra: Metadata,
}

/// Credentials submitted for verification.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub scheme: String,
    pub principal: Option<String>,
    pub credentials: Option<String>,
}

/// Auto-commit or in-transaction statement execution.
#[derive(Debug, Clone)]
pub struct Run {
    pub statement: String,
    pub parameters: Metadata,
    pub extra: TxExtra,
}

/// Explicit transaction begin.
#[derive(Debug, Clone, Default)]
pub struct Begin {
    pub extra: TxExtra,
}

/// Result consumption. `n == -1` requests the whole remaining stream.
#[derive(Debug, Clone)]
pub struct Pull {
    pub n: i64,
}

impl Default for Pull {
    fn default() -> Self {
        Self { n: -1 }
    }
}

/// Result disposal. `n == -1` drops the whole remaining stream.
#[derive(Debug, Clone)]
pub struct Discard {
    pub n: i64,
}

impl Default for Discard {
    fn default() -> Self {
        Self { n: -1 }
    }
}

/// Routing table request.
#[derive(Debug, Clone, Default)]
pub struct Route {
    pub routing_context: Metadata,
    pub database: Option<String>,
    pub impersonated_user: Option<String>,
}

/// Transaction-scoped extras shared by `Run` and `Begin`.
#[derive(Debug, Clone, Default)]
pub struct TxExtra {
    pub database: Option<String>,
    pub bookmarks: RawBookmarks,
    pub impersonated_user: Option<String>,
    pub access_mode: AccessMode,
    pub tx_metadata: Option<Metadata>,
}

/// Transaction access mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    Read,
    #[default]
    Write,
}

/// Bookmarks exactly as they arrived on the wire.
///
/// Old clients send a single string, newer ones a list. Both forms are kept
/// apart here so the engine's validator can report list-level problems (a
/// non-string entry, for instance) against the form that actually arrived.
#[derive(Debug, Clone, Default)]
pub enum RawBookmarks {
    #[default]
    None,
    Single(String),
    Many(Vec<Value>),
}

impl RawBookmarks {
    pub fn is_empty(&self) -> bool {
        match self {
            RawBookmarks::None => true,
            RawBookmarks::Single(_) => false,
            RawBookmarks::Many(entries) => entries.is_empty(),
        }
    }
}
