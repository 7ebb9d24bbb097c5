//! Unit-test doubles shared across modules.
//!
//! Integration tests carry their own richer mocks under `tests/common`;
//! these are the minimal stand-ins unit tests need to build a context or
//! call `process` on a single state.

#![allow(dead_code)]

use crate::collab::{
    AuthError, AuthSubject, Authenticator, DatabaseIdentity, DatabaseResolver, QueryExecutor,
    RecordStream, ResponseSink, RouteError, RoutingProvider, Transaction, TransactionManager,
    TxError,
};
use crate::config::Config;
use crate::fsm::{Clock, ConnectionContext};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;
use weft_proto::{AccessMode, Bookmark, Credentials, ErrorCode, Metadata, Record, Value};

/// Clock pinned to a fixed instant.
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

/// Accepts any credentials and any impersonation target.
pub struct AcceptAllAuth;

#[async_trait]
impl Authenticator for AcceptAllAuth {
    async fn verify(&self, credentials: &Credentials) -> Result<AuthSubject, AuthError> {
        let name = credentials.principal.clone().unwrap_or_default();
        Ok(AuthSubject::new(name))
    }

    async fn impersonate(
        &self,
        _acting: &AuthSubject,
        target: &str,
    ) -> Result<AuthSubject, AuthError> {
        Ok(AuthSubject::new(target))
    }
}

/// Transaction that accepts commit/rollback and refuses statements.
pub struct NoopTransaction;

#[async_trait]
impl Transaction for NoopTransaction {
    async fn run(
        &mut self,
        _statement: &str,
        _parameters: &Metadata,
    ) -> Result<Box<dyn RecordStream>, TxError> {
        Err(TxError::Statement("no statements in unit tests".into()))
    }

    async fn commit(self: Box<Self>) -> Result<Metadata, TxError> {
        Ok(Metadata::new())
    }

    async fn rollback(self: Box<Self>) -> Result<(), TxError> {
        Ok(())
    }
}

pub struct NoopTxManager;

#[async_trait]
impl TransactionManager for NoopTxManager {
    async fn begin(
        &self,
        _subject: &AuthSubject,
        _database: &str,
        _bookmarks: &[Bookmark],
        _mode: AccessMode,
    ) -> Result<Box<dyn Transaction>, TxError> {
        Ok(Box::new(NoopTransaction))
    }
}

pub struct NullExecutor;

#[async_trait]
impl QueryExecutor for NullExecutor {
    async fn run(
        &self,
        _subject: &AuthSubject,
        _database: &str,
        _statement: &str,
        _parameters: &Metadata,
        _bookmarks: &[Bookmark],
        _mode: AccessMode,
    ) -> Result<Box<dyn RecordStream>, TxError> {
        Err(TxError::Statement("no executor in unit tests".into()))
    }
}

pub struct NullRouting;

#[async_trait]
impl RoutingProvider for NullRouting {
    async fn route(
        &self,
        _routing_context: &Metadata,
        _database: &str,
        _subject: &AuthSubject,
    ) -> Result<Metadata, RouteError> {
        Err(RouteError("no routing in unit tests".into()))
    }
}

/// Resolver over a fixed set of databases.
pub struct StaticResolver {
    pub known: Vec<DatabaseIdentity>,
}

impl StaticResolver {
    pub fn empty() -> Self {
        Self { known: Vec::new() }
    }

    pub fn with(names: &[(Uuid, &str)]) -> Self {
        Self {
            known: names
                .iter()
                .map(|(uuid, name)| DatabaseIdentity {
                    uuid: *uuid,
                    name: (*name).to_string(),
                })
                .collect(),
        }
    }
}

impl DatabaseResolver for StaticResolver {
    fn resolve(&self, uuid: Uuid) -> Option<DatabaseIdentity> {
        self.known.iter().find(|db| db.uuid == uuid).cloned()
    }
}

/// Sink that remembers terminal calls and drops everything else.
#[derive(Default)]
pub struct NullSink {
    pub successes: usize,
    pub failures: Vec<(ErrorCode, String)>,
    pub ignored: usize,
}

#[async_trait]
impl ResponseSink for NullSink {
    async fn on_success(&mut self, _metadata: Metadata) {
        self.successes += 1;
    }

    async fn on_failure(&mut self, code: ErrorCode, message: &str) {
        self.failures.push((code, message.to_string()));
    }

    async fn on_ignored(&mut self) {
        self.ignored += 1;
    }

    async fn on_record(&mut self, _record: Record) {}

    async fn on_metadata(&mut self, _key: &str, _value: Value) {}
}

/// A context wired to the null collaborators above.
pub fn context() -> ConnectionContext {
    context_with_resolver(Arc::new(StaticResolver::empty()))
}

pub fn context_with_resolver(databases: Arc<dyn DatabaseResolver>) -> ConnectionContext {
    ConnectionContext::new(
        Arc::new(Config::default()),
        Arc::new(FixedClock(1_700_000_000_000)),
        Arc::new(AcceptAllAuth),
        Arc::new(NoopTxManager),
        Arc::new(NullExecutor),
        Arc::new(NullRouting),
        databases,
    )
}
