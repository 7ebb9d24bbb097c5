//! Boundary contracts consumed by the protocol engine.
//!
//! The engine never talks to storage, the query planner or the credential
//! store directly; everything goes through the narrow async traits in this
//! module. Implementations live with the database kernel and are assumed
//! correct. Tests substitute mocks.

mod sink;

pub use sink::ResponseSink;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;
use weft_proto::{AccessMode, Bookmark, Credentials, Metadata};

// ============================================================================
// Identity
// ============================================================================

/// An authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSubject {
    pub username: String,
    /// Set when the credential store wants the client told its password is
    /// due for rotation.
    pub credentials_expired: bool,
}

impl AuthSubject {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            credentials_expired: false,
        }
    }
}

/// Authentication collaborator errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials for scheme '{0}'")]
    InvalidCredentials(String),

    #[error("user '{acting}' is not permitted to impersonate '{target}'")]
    NotPermitted { acting: String, target: String },

    #[error("authentication provider unavailable: {0}")]
    Provider(String),
}

/// Verifies credentials and resolves impersonation targets.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn verify(&self, credentials: &Credentials) -> Result<AuthSubject, AuthError>;

    /// Resolve the identity `acting` wants to borrow. Permission checking
    /// happens here; the engine only scopes the result.
    async fn impersonate(
        &self,
        acting: &AuthSubject,
        target: &str,
    ) -> Result<AuthSubject, AuthError>;
}

// ============================================================================
// Databases
// ============================================================================

/// A database known to this server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseIdentity {
    pub uuid: Uuid,
    pub name: String,
}

/// Maps bookmark uuids onto databases hosted here.
pub trait DatabaseResolver: Send + Sync {
    fn resolve(&self, uuid: Uuid) -> Option<DatabaseIdentity>;
}

// ============================================================================
// Execution
// ============================================================================

/// Transaction and statement execution errors.
#[derive(Debug, Error)]
pub enum TxError {
    #[error("could not begin transaction: {0}")]
    Begin(String),

    #[error("commit failed: {0}")]
    Commit(String),

    #[error("rollback failed: {0}")]
    Rollback(String),

    #[error("statement failed: {0}")]
    Statement(String),

    #[error("result stream failed: {0}")]
    Stream(String),
}

/// Outcome of one `consume` call on a result stream.
#[derive(Debug)]
pub enum StreamProgress {
    /// Records remain; the session stays in its streaming state.
    HasMore,
    /// The stream is exhausted (or discarded); summary metadata attached.
    Done(Metadata),
}

/// An open result stream.
///
/// Field metadata is available synchronously; records flow through the sink
/// on demand. For an auto-commit stream, draining or discarding the final
/// record commits the implicit transaction before `Done` is returned.
#[async_trait]
pub trait RecordStream: Send {
    fn fields(&self) -> &[String];

    /// Stream up to `n` records into `sink` (`n == -1` for all). `pull`
    /// false discards instead of emitting.
    async fn consume(
        &mut self,
        sink: &mut dyn ResponseSink,
        pull: bool,
        n: i64,
    ) -> Result<StreamProgress, TxError>;
}

/// An open explicit transaction.
#[async_trait]
pub trait Transaction: Send {
    async fn run(
        &mut self,
        statement: &str,
        parameters: &Metadata,
    ) -> Result<Box<dyn RecordStream>, TxError>;

    /// Commit; metadata may carry the resulting bookmark.
    async fn commit(self: Box<Self>) -> Result<Metadata, TxError>;

    async fn rollback(self: Box<Self>) -> Result<(), TxError>;
}

/// Opens explicit transactions.
#[async_trait]
pub trait TransactionManager: Send + Sync {
    async fn begin(
        &self,
        subject: &AuthSubject,
        database: &str,
        bookmarks: &[Bookmark],
        mode: AccessMode,
    ) -> Result<Box<dyn Transaction>, TxError>;
}

/// Executes auto-commit statements.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn run(
        &self,
        subject: &AuthSubject,
        database: &str,
        statement: &str,
        parameters: &Metadata,
        bookmarks: &[Bookmark],
        mode: AccessMode,
    ) -> Result<Box<dyn RecordStream>, TxError>;
}

// ============================================================================
// Routing
// ============================================================================

/// Routing table acquisition errors.
#[derive(Debug, Error)]
#[error("routing unavailable: {0}")]
pub struct RouteError(pub String);

/// Produces routing tables for driver-side topology awareness.
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    async fn route(
        &self,
        routing_context: &Metadata,
        database: &str,
        subject: &AuthSubject,
    ) -> Result<Metadata, RouteError>;
}
