//! The generic state machine framework.
//!
//! Everything protocol-version-agnostic lives here: state references, the
//! transition trait, the shape-indexed handler registry, the state variants
//! with their builder, the per-connection context and the driver. Concrete
//! protocol states are wired on top in [`crate::states`] and
//! [`crate::versions`].

mod context;
mod factory;
mod machine;
mod reference;
mod registry;
mod state;
mod transition;

pub use context::{Clock, ConnectionContext, SystemClock};
pub use factory::StateFactory;
pub use machine::{Inbound, InterruptHandle, StateMachine, StateMachineDefinition};
pub use reference::StateReference;
pub use registry::HandlerRegistry;
pub use state::State;
pub use transition::{Transition, TransitionResult};
