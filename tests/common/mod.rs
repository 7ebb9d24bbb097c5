//! Shared scaffolding for integration tests: mock collaborators, a recording
//! sink and request constructors.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use uuid::Uuid;
use weftd::collab::{
    AuthError, AuthSubject, Authenticator, DatabaseIdentity, DatabaseResolver, QueryExecutor,
    RecordStream, ResponseSink, RouteError, RoutingProvider, StreamProgress, Transaction,
    TransactionManager, TxError,
};
use weftd::config::Config;
use weftd::fsm::{Clock, ConnectionContext, Inbound, StateMachine};
use weftd::versions;
use weft_proto::{
    AccessMode, Begin, Bookmark, Credentials, Discard, ErrorCode, Hello, Metadata, Pull,
    RawBookmarks, Record, Request, Route, Run, TxExtra, Value,
};

pub fn db(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

// ============================================================================
// Recording sink
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Success(Metadata),
    Failure(ErrorCode, String),
    Ignored,
    Record(Record),
    Metadata(String, Value),
}

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
}

#[async_trait]
impl ResponseSink for RecordingSink {
    async fn on_success(&mut self, metadata: Metadata) {
        self.events.push(SinkEvent::Success(metadata));
    }

    async fn on_failure(&mut self, code: ErrorCode, message: &str) {
        self.events.push(SinkEvent::Failure(code, message.to_string()));
    }

    async fn on_ignored(&mut self) {
        self.events.push(SinkEvent::Ignored);
    }

    async fn on_record(&mut self, record: Record) {
        self.events.push(SinkEvent::Record(record));
    }

    async fn on_metadata(&mut self, key: &str, value: Value) {
        self.events.push(SinkEvent::Metadata(key.to_string(), value));
    }
}

impl RecordingSink {
    pub fn successes(&self) -> Vec<&Metadata> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Success(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn failures(&self) -> Vec<(&ErrorCode, &str)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Failure(code, message) => Some((code, message.as_str())),
                _ => None,
            })
            .collect()
    }

    pub fn ignored_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SinkEvent::Ignored))
            .count()
    }

    pub fn records(&self) -> Vec<&Record> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Record(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    pub fn last_success(&self) -> &Metadata {
        self.successes().last().copied().expect("a success response")
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

// ============================================================================
// Mock collaborators
// ============================================================================

pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

/// Credential store with a fixed user table and impersonation grants.
pub struct MockAuth {
    users: HashMap<String, String>,
    expired: HashSet<String>,
    grants: HashSet<(String, String)>,
}

impl Default for MockAuth {
    fn default() -> Self {
        let mut users = HashMap::new();
        users.insert("alice".to_string(), "secret".to_string());
        users.insert("stale".to_string(), "secret".to_string());
        let mut expired = HashSet::new();
        expired.insert("stale".to_string());
        let mut grants = HashSet::new();
        grants.insert(("alice".to_string(), "bob".to_string()));
        Self {
            users,
            expired,
            grants,
        }
    }
}

#[async_trait]
impl Authenticator for MockAuth {
    async fn verify(&self, credentials: &Credentials) -> Result<AuthSubject, AuthError> {
        let principal = credentials.principal.as_deref().unwrap_or_default();
        let supplied = credentials.credentials.as_deref().unwrap_or_default();
        match self.users.get(principal) {
            Some(stored) if stored == supplied => Ok(AuthSubject {
                username: principal.to_string(),
                credentials_expired: self.expired.contains(principal),
            }),
            _ => Err(AuthError::InvalidCredentials(credentials.scheme.clone())),
        }
    }

    async fn impersonate(
        &self,
        acting: &AuthSubject,
        target: &str,
    ) -> Result<AuthSubject, AuthError> {
        if self
            .grants
            .contains(&(acting.username.clone(), target.to_string()))
        {
            Ok(AuthSubject::new(target))
        } else {
            Err(AuthError::NotPermitted {
                acting: acting.username.clone(),
                target: target.to_string(),
            })
        }
    }
}

/// Result stream over a scripted record set.
pub struct ScriptedStream {
    fields: Vec<String>,
    records: VecDeque<Record>,
    summary: Metadata,
    fail: bool,
}

impl ScriptedStream {
    pub fn new(fields: &[&str], rows: Vec<Vec<Value>>) -> Self {
        let mut summary = Metadata::new();
        summary.insert("type".into(), Value::String("r".into()));
        Self {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            records: rows.into_iter().map(Record::new).collect(),
            summary,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        let mut stream = Self::new(&["x"], vec![]);
        stream.fail = true;
        stream
    }
}

#[async_trait]
impl RecordStream for ScriptedStream {
    fn fields(&self) -> &[String] {
        &self.fields
    }

    async fn consume(
        &mut self,
        sink: &mut dyn ResponseSink,
        pull: bool,
        n: i64,
    ) -> Result<StreamProgress, TxError> {
        if self.fail {
            return Err(TxError::Stream("scripted stream failure".into()));
        }
        let mut remaining = n;
        while remaining != 0 {
            match self.records.pop_front() {
                Some(record) => {
                    if pull {
                        sink.on_record(record).await;
                    }
                    if remaining > 0 {
                        remaining -= 1;
                    }
                }
                None => break,
            }
        }
        if self.records.is_empty() {
            Ok(StreamProgress::Done(self.summary.clone()))
        } else {
            Ok(StreamProgress::HasMore)
        }
    }
}

/// One recorded call into the execution layer.
#[derive(Debug, Clone)]
pub struct ExecCall {
    pub subject: String,
    pub database: String,
    pub statement: String,
    pub bookmarks: Vec<Bookmark>,
    pub mode: AccessMode,
}

fn scripted_for(statement: &str) -> Result<Box<dyn RecordStream>, TxError> {
    match statement {
        "FAIL" => Err(TxError::Statement("scripted statement failure".into())),
        "FAIL STREAM" => Ok(Box::new(ScriptedStream::failing())),
        "RETURN 1" => Ok(Box::new(ScriptedStream::new(
            &["1"],
            vec![vec![Value::from(1)]],
        ))),
        _ => Ok(Box::new(ScriptedStream::new(
            &["x"],
            vec![
                vec![Value::from(1)],
                vec![Value::from(2)],
                vec![Value::from(3)],
            ],
        ))),
    }
}

/// Auto-commit executor that records every call.
#[derive(Default)]
pub struct MockExecutor {
    pub calls: Mutex<Vec<ExecCall>>,
}

#[async_trait]
impl QueryExecutor for MockExecutor {
    async fn run(
        &self,
        subject: &AuthSubject,
        database: &str,
        statement: &str,
        parameters: &Metadata,
        bookmarks: &[Bookmark],
        mode: AccessMode,
    ) -> Result<Box<dyn RecordStream>, TxError> {
        let _ = parameters;
        self.calls.lock().unwrap().push(ExecCall {
            subject: subject.username.clone(),
            database: database.to_string(),
            statement: statement.to_string(),
            bookmarks: bookmarks.to_vec(),
            mode,
        });
        scripted_for(statement)
    }
}

/// Transaction manager that records begin/run/commit/rollback into a log.
#[derive(Default)]
pub struct MockTxManager {
    pub log: Arc<Mutex<Vec<String>>>,
}

pub struct MockTransaction {
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Transaction for MockTransaction {
    async fn run(
        &mut self,
        statement: &str,
        _parameters: &Metadata,
    ) -> Result<Box<dyn RecordStream>, TxError> {
        self.log.lock().unwrap().push(format!("run {statement}"));
        scripted_for(statement)
    }

    async fn commit(self: Box<Self>) -> Result<Metadata, TxError> {
        self.log.lock().unwrap().push("commit".to_string());
        let mut metadata = Metadata::new();
        metadata.insert(
            "bookmark".into(),
            Value::String(format!("{}:17", db(1))),
        );
        Ok(metadata)
    }

    async fn rollback(self: Box<Self>) -> Result<(), TxError> {
        self.log.lock().unwrap().push("rollback".to_string());
        Ok(())
    }
}

#[async_trait]
impl TransactionManager for MockTxManager {
    async fn begin(
        &self,
        subject: &AuthSubject,
        database: &str,
        bookmarks: &[Bookmark],
        _mode: AccessMode,
    ) -> Result<Box<dyn Transaction>, TxError> {
        self.log.lock().unwrap().push(format!(
            "begin user={} db={} bookmarks={}",
            subject.username,
            database,
            bookmarks.len()
        ));
        Ok(Box::new(MockTransaction {
            log: Arc::clone(&self.log),
        }))
    }
}

/// Routing provider answering with a fixed table.
#[derive(Default)]
pub struct MockRouting {
    pub calls: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl RoutingProvider for MockRouting {
    async fn route(
        &self,
        _routing_context: &Metadata,
        database: &str,
        subject: &AuthSubject,
    ) -> Result<Metadata, RouteError> {
        self.calls
            .lock()
            .unwrap()
            .push((database.to_string(), subject.username.clone()));
        let mut table = Metadata::new();
        table.insert("ttl".into(), Value::from(300));
        table.insert(
            "servers".into(),
            Value::Array(vec![Value::String("weft-0:7687".into())]),
        );
        Ok(table)
    }
}

/// Resolver over two fixed databases.
pub struct TwoDatabases;

impl DatabaseResolver for TwoDatabases {
    fn resolve(&self, uuid: Uuid) -> Option<DatabaseIdentity> {
        let name = match uuid {
            u if u == db(1) => "alpha",
            u if u == db(2) => "beta",
            _ => return None,
        };
        Some(DatabaseIdentity {
            uuid,
            name: name.to_string(),
        })
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub machine: StateMachine,
    pub auth: Arc<MockAuth>,
    pub executor: Arc<MockExecutor>,
    pub tx_manager: Arc<MockTxManager>,
    pub routing: Arc<MockRouting>,
}

impl Harness {
    /// Fresh machine on the v2 graph with default config.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self::build(config, true)
    }

    /// Fresh machine on the v1 graph (no ROUTE).
    pub fn v1() -> Self {
        Self::build(Config::default(), false)
    }

    fn build(config: Config, v2: bool) -> Self {
        let auth = Arc::new(MockAuth::default());
        let executor = Arc::new(MockExecutor::default());
        let tx_manager = Arc::new(MockTxManager::default());
        let routing = Arc::new(MockRouting::default());

        let ctx = ConnectionContext::new(
            Arc::new(config),
            Arc::new(FixedClock(1_700_000_000_000)),
            auth.clone(),
            tx_manager.clone(),
            executor.clone(),
            routing.clone(),
            Arc::new(TwoDatabases),
        );
        let definition = if v2 { versions::v2() } else { versions::v1() };
        let machine = StateMachine::new(Arc::new(definition), ctx);

        Self {
            machine,
            auth,
            executor,
            tx_manager,
            routing,
        }
    }

    /// Drive one request, expecting the connection to survive.
    pub async fn send(&mut self, request: Request, sink: &mut RecordingSink) {
        self.machine
            .process(Inbound::Request(request), sink)
            .await
            .expect("connection should survive");
    }

    /// Drive hello + logon to land in READY.
    pub async fn authenticate(&mut self) {
        let mut sink = RecordingSink::default();
        self.send(hello(), &mut sink).await;
        self.send(logon("alice", "secret"), &mut sink).await;
        assert_eq!(sink.successes().len(), 2, "handshake and logon succeed");
        assert_eq!(self.machine.current(), weftd::states::READY);
    }

    pub fn executor_calls(&self) -> Vec<ExecCall> {
        self.executor.calls.lock().unwrap().clone()
    }

    pub fn tx_log(&self) -> Vec<String> {
        self.tx_manager.log.lock().unwrap().clone()
    }
}

// ============================================================================
// Request constructors
// ============================================================================

pub fn hello() -> Request {
    Request::Hello(Hello {
        user_agent: "weft-test/1.0".into(),
        extra: Metadata::new(),
    })
}

pub fn logon(principal: &str, password: &str) -> Request {
    Request::Logon(Credentials {
        scheme: "basic".into(),
        principal: Some(principal.into()),
        credentials: Some(password.into()),
    })
}

pub fn run(statement: &str) -> Request {
    Request::Run(Run {
        statement: statement.into(),
        parameters: Metadata::new(),
        extra: TxExtra::default(),
    })
}

pub fn run_as(statement: &str, user: &str) -> Request {
    Request::Run(Run {
        statement: statement.into(),
        parameters: Metadata::new(),
        extra: TxExtra {
            impersonated_user: Some(user.into()),
            ..TxExtra::default()
        },
    })
}

pub fn run_with_bookmarks(statement: &str, bookmarks: Vec<Value>) -> Request {
    Request::Run(Run {
        statement: statement.into(),
        parameters: Metadata::new(),
        extra: TxExtra {
            bookmarks: RawBookmarks::Many(bookmarks),
            ..TxExtra::default()
        },
    })
}

pub fn begin() -> Request {
    Request::Begin(Begin::default())
}

pub fn begin_with_bookmarks(bookmarks: Vec<Value>) -> Request {
    Request::Begin(Begin {
        extra: TxExtra {
            bookmarks: RawBookmarks::Many(bookmarks),
            ..TxExtra::default()
        },
    })
}

pub fn begin_as(user: &str) -> Request {
    Request::Begin(Begin {
        extra: TxExtra {
            impersonated_user: Some(user.into()),
            ..TxExtra::default()
        },
    })
}

pub fn pull() -> Request {
    Request::Pull(Pull::default())
}

pub fn pull_n(n: i64) -> Request {
    Request::Pull(Pull { n })
}

pub fn discard() -> Request {
    Request::Discard(Discard::default())
}

pub fn commit() -> Request {
    Request::Commit
}

pub fn rollback() -> Request {
    Request::Rollback
}

pub fn route() -> Request {
    Request::Route(Route::default())
}

pub fn route_as(user: &str) -> Request {
    Request::Route(Route {
        impersonated_user: Some(user.into()),
        ..Route::default()
    })
}

pub fn reset() -> Request {
    Request::Reset
}
