//! Per-connection mutable state.

use crate::collab::{
    AuthSubject, Authenticator, DatabaseResolver, QueryExecutor, RecordStream, RoutingProvider,
    Transaction, TransactionManager,
};
use crate::config::Config;
use crate::error::Fatality;
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;
use uuid::Uuid;

/// Millisecond clock, abstracted so tests control timing metadata.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Everything one connection owns.
///
/// Exclusively owned by the connection's driver and mutated only by the
/// transition currently executing for it, so no field needs a lock. The one
/// exception is the interrupt counter, which the transport increments from
/// outside while a transition may be in flight.
pub struct ConnectionContext {
    pub connection_id: String,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<Config>,

    // Collaborators (shared, internally synchronized).
    pub auth: Arc<dyn Authenticator>,
    pub tx_manager: Arc<dyn TransactionManager>,
    pub executor: Arc<dyn QueryExecutor>,
    pub routing: Arc<dyn RoutingProvider>,
    pub databases: Arc<dyn DatabaseResolver>,

    /// Client agent string recorded at handshake.
    pub user_agent: Option<String>,

    login: Option<AuthSubject>,
    impersonated: Option<AuthSubject>,

    /// Open explicit transaction, if any.
    pub tx: Option<Box<dyn Transaction>>,
    /// Open result stream, if any.
    pub stream: Option<Box<dyn RecordStream>>,

    interrupts: Arc<AtomicUsize>,
    closed: bool,
}

impl ConnectionContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<Config>,
        clock: Arc<dyn Clock>,
        auth: Arc<dyn Authenticator>,
        tx_manager: Arc<dyn TransactionManager>,
        executor: Arc<dyn QueryExecutor>,
        routing: Arc<dyn RoutingProvider>,
        databases: Arc<dyn DatabaseResolver>,
    ) -> Self {
        Self {
            connection_id: format!("weft-{}", Uuid::new_v4()),
            clock,
            config,
            auth,
            tx_manager,
            executor,
            routing,
            databases,
            user_agent: None,
            login: None,
            impersonated: None,
            tx: None,
            stream: None,
            interrupts: Arc::new(AtomicUsize::new(0)),
            closed: false,
        }
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    /// Record the verified login identity.
    pub fn set_login(&mut self, subject: AuthSubject) {
        self.login = Some(subject);
    }

    pub fn login(&self) -> Option<&AuthSubject> {
        self.login.as_ref()
    }

    /// Push an impersonation overlay. Cleared by [`clear_impersonation`],
    /// never by a later push alone.
    ///
    /// [`clear_impersonation`]: Self::clear_impersonation
    pub fn set_impersonation(&mut self, subject: AuthSubject) {
        debug!(connection_id = %self.connection_id, target = %subject.username, "impersonation scope entered");
        self.impersonated = Some(subject);
    }

    /// Drop the impersonation overlay, restoring the login identity.
    pub fn clear_impersonation(&mut self) {
        if self.impersonated.take().is_some() {
            debug!(connection_id = %self.connection_id, "impersonation scope left");
        }
    }

    pub fn impersonated(&self) -> Option<&AuthSubject> {
        self.impersonated.as_ref()
    }

    /// The identity requests execute under: the impersonation overlay when
    /// one is active, the login identity otherwise.
    pub fn active_subject(&self) -> Result<&AuthSubject, Fatality> {
        self.impersonated
            .as_ref()
            .or(self.login.as_ref())
            .ok_or_else(|| Fatality::Internal("no authenticated identity on connection".into()))
    }

    // ------------------------------------------------------------------
    // Interrupts
    // ------------------------------------------------------------------

    pub(super) fn interrupt_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.interrupts)
    }

    pub fn interrupt_depth(&self) -> usize {
        self.interrupts.load(Ordering::SeqCst)
    }

    /// Consume one pending interrupt; returns the remaining depth.
    pub fn acknowledge_interrupt(&self) -> usize {
        let mut current = self.interrupts.load(Ordering::SeqCst);
        loop {
            if current == 0 {
                return 0;
            }
            match self.interrupts.compare_exchange(
                current,
                current - 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return current - 1,
                Err(observed) => current = observed,
            }
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub(super) fn mark_closed(&mut self) {
        self.closed = true;
    }

    /// Roll back open work and clear session overlays. Shared by RESET
    /// handling and connection teardown.
    pub async fn reset_session(&mut self) -> Result<(), Fatality> {
        self.stream = None;
        self.clear_impersonation();
        if let Some(tx) = self.tx.take() {
            tx.rollback()
                .await
                .map_err(|e| Fatality::Internal(format!("rollback during reset failed: {e}")))?;
        }
        Ok(())
    }
}
