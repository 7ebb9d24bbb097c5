//! weftd-ng: the Weft graph-database wire-protocol connection engine.
//!
//! Per client connection, this library decides which requests are legal,
//! dispatches each one to the transition that knows how to handle it, and
//! names the state the connection moves to next. A network listener owns the
//! sockets and framing; it feeds decoded requests into a [`fsm::StateMachine`]
//! and implements the collaborator traits in [`collab`] against the database
//! kernel.
//!
//! ```no_run
//! use std::sync::Arc;
//! use weftd::fsm::{ConnectionContext, StateMachine, SystemClock};
//! # fn collaborators() -> (Arc<dyn weftd::collab::Authenticator>, Arc<dyn weftd::collab::TransactionManager>, Arc<dyn weftd::collab::QueryExecutor>, Arc<dyn weftd::collab::RoutingProvider>, Arc<dyn weftd::collab::DatabaseResolver>) { unimplemented!() }
//!
//! let definition = Arc::new(weftd::versions::v2());
//! let (auth, tx_manager, executor, routing, databases) = collaborators();
//! let ctx = ConnectionContext::new(
//!     Arc::new(weftd::config::Config::default()),
//!     Arc::new(SystemClock),
//!     auth,
//!     tx_manager,
//!     executor,
//!     routing,
//!     databases,
//! );
//! let machine = StateMachine::new(definition, ctx);
//! // transport loop: machine.process(inbound, &mut sink).await
//! ```

pub mod bookmark;
pub mod collab;
pub mod config;
pub mod error;
pub mod fsm;
pub mod impersonation;
pub mod states;
pub mod telemetry;
pub mod versions;

#[cfg(test)]
mod testkit;

pub use config::Config;
pub use error::{Failure, Fatality, MachineError};
pub use fsm::{Inbound, StateMachine, StateMachineDefinition, StateReference};
