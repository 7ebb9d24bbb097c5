//! The state machine driver.
//!
//! One driver per connection. It owns the connection context, tracks the
//! current state reference, applies interrupts at dispatch boundaries and is
//! the single place failures are classified into per-request and
//! connection-fatal.

use super::context::ConnectionContext;
use super::reference::StateReference;
use super::state::State;
use crate::collab::ResponseSink;
use crate::error::{Fatality, MachineError};
use crate::states;
use crate::telemetry::{self, RequestTimer};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{Instrument, debug, error, warn};
use weft_proto::{ErrorCode, Request};

/// One inbound unit from the transport: a decoded request, or the interrupt
/// signal raised out-of-band.
pub enum Inbound {
    Request(Request),
    Interrupt,
}

/// Immutable wiring for one protocol version: the full state graph plus the
/// initial state. Built once at startup and shared by every connection
/// speaking that version.
pub struct StateMachineDefinition {
    name: &'static str,
    initial: StateReference,
    states: HashMap<StateReference, Arc<State>>,
}

impl StateMachineDefinition {
    pub fn new(name: &'static str, initial: StateReference) -> Self {
        Self {
            name,
            initial,
            states: HashMap::new(),
        }
    }

    /// Add a state, keyed by its own reference. Replaces any earlier state
    /// with the same reference, which is how derived versions override.
    pub fn with_state(mut self, state: State) -> Self {
        self.states.insert(state.reference(), Arc::new(state));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn initial(&self) -> StateReference {
        self.initial
    }

    pub fn state(&self, reference: StateReference) -> Option<&Arc<State>> {
        self.states.get(&reference)
    }
}

/// Cloneable handle for raising the interrupt signal from outside the
/// connection's task, typically when the transport spots a RESET ahead in
/// the inbound queue.
#[derive(Clone)]
pub struct InterruptHandle {
    counter: Arc<AtomicUsize>,
}

impl InterruptHandle {
    pub fn interrupt(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }
}

/// Per-connection protocol state machine.
pub struct StateMachine {
    definition: Arc<StateMachineDefinition>,
    current: StateReference,
    ctx: ConnectionContext,
}

impl StateMachine {
    pub fn new(definition: Arc<StateMachineDefinition>, ctx: ConnectionContext) -> Self {
        let current = definition.initial();
        Self {
            definition,
            current,
            ctx,
        }
    }

    pub fn current(&self) -> StateReference {
        self.current
    }

    pub fn context(&self) -> &ConnectionContext {
        &self.ctx
    }

    pub fn is_closed(&self) -> bool {
        self.ctx.is_closed()
    }

    /// Handle for signalling interrupts from outside the connection task.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        InterruptHandle {
            counter: self.ctx.interrupt_counter(),
        }
    }

    /// Raise the interrupt signal on this machine directly.
    pub fn interrupt(&self) {
        self.interrupt_handle().interrupt();
    }

    /// Process one inbound unit.
    ///
    /// `Ok(())` means the connection lives on, whether the request succeeded
    /// or failed recoverably. `Err` carries a connection fatality: the
    /// transport must stop feeding this machine and close the socket.
    pub async fn process(
        &mut self,
        inbound: Inbound,
        sink: &mut dyn ResponseSink,
    ) -> Result<(), Fatality> {
        if self.ctx.is_closed() {
            return Err(Fatality::Closed);
        }

        match inbound {
            Inbound::Interrupt => {
                // Pre-empts normal dispatch: no transition runs, no response
                // is emitted. The counter was possibly already bumped via an
                // InterruptHandle; this path covers in-band delivery.
                self.ctx.interrupt_counter().fetch_add(1, Ordering::SeqCst);
                self.apply_pending_interrupt();
                Ok(())
            }
            Inbound::Request(request) => self.dispatch(&request, sink).await,
        }
    }

    /// Force the machine into the interrupted state if an interrupt is
    /// pending. Called at every dispatch boundary so a signal raised during
    /// an in-flight transition takes effect on the next unit.
    fn apply_pending_interrupt(&mut self) {
        if self.ctx.interrupt_depth() > 0 && self.current != states::INTERRUPTED {
            debug!(
                connection_id = %self.ctx.connection_id,
                from = %self.current,
                "interrupt pending, parking session"
            );
            self.current = states::INTERRUPTED;
        }
    }

    async fn dispatch(
        &mut self,
        request: &Request,
        sink: &mut dyn ResponseSink,
    ) -> Result<(), Fatality> {
        self.apply_pending_interrupt();

        let kind = request.kind();
        let state = self
            .definition
            .state(self.current)
            .ok_or_else(|| {
                Fatality::Internal(format!(
                    "state {} is not wired in protocol {}",
                    self.current,
                    self.definition.name()
                ))
            })?
            .clone();

        let span = telemetry::spans::request(&self.ctx.connection_id, self.current.name(), kind.name());
        let _timer = RequestTimer::new(kind.name());

        let result = state
            .process(&mut self.ctx, request, sink)
            .instrument(span)
            .await;

        match result {
            Ok(next) => {
                if next != self.current {
                    debug!(
                        connection_id = %self.ctx.connection_id,
                        from = %self.current,
                        to = %next,
                        request = kind.name(),
                        "state transition"
                    );
                }
                self.current = next;
                Ok(())
            }
            Err(MachineError::Recoverable(failure)) => {
                warn!(
                    connection_id = %self.ctx.connection_id,
                    state = %self.current,
                    request = kind.name(),
                    error_code = failure.error_code(),
                    error = %failure,
                    "request failed"
                );
                sink.on_failure(failure.code(), &failure.to_string()).await;
                self.current = self.failure_parking();
                Ok(())
            }
            Err(MachineError::Fatal(fatality)) => {
                error!(
                    connection_id = %self.ctx.connection_id,
                    state = %self.current,
                    request = kind.name(),
                    error_code = fatality.error_code(),
                    error = %fatality,
                    "connection fatality"
                );
                // Best-effort failure response; the transport closes the
                // socket regardless.
                sink.on_failure(fatality.code(), &fatality.to_string()).await;
                if let Err(e) = self.ctx.reset_session().await {
                    warn!(
                        connection_id = %self.ctx.connection_id,
                        error = %e,
                        "rollback during teardown failed"
                    );
                }
                self.ctx.mark_closed();
                Err(fatality)
            }
        }
    }

    /// Where a recoverable failure parks the session. Before authentication
    /// the session stays where it is: FAILED's RESET path restores READY,
    /// which would let an unauthenticated client walk past the credential
    /// gate.
    fn failure_parking(&self) -> StateReference {
        if self.current == states::NEGOTIATION || self.current == states::AUTHENTICATION {
            self.current
        } else {
            states::FAILED
        }
    }

    /// Inject an out-of-band failure observed by the transport (for example
    /// a write error on a different channel). Emits the failure response and
    /// parks the session in the failed state.
    pub async fn external_error(
        &mut self,
        code: ErrorCode,
        message: &str,
        sink: &mut dyn ResponseSink,
    ) {
        warn!(
            connection_id = %self.ctx.connection_id,
            state = %self.current,
            %code,
            message,
            "external error"
        );
        sink.on_failure(code, message).await;
        self.current = states::FAILED;
    }

    /// Tear the connection down: roll back open work and refuse anything
    /// further. Idempotent.
    pub async fn close(&mut self) {
        if self.ctx.is_closed() {
            return;
        }
        if let Err(e) = self.ctx.reset_session().await {
            warn!(
                connection_id = %self.ctx.connection_id,
                error = %e,
                "rollback during close failed"
            );
        }
        self.ctx.mark_closed();
        debug!(connection_id = %self.ctx.connection_id, "session closed");
    }
}
