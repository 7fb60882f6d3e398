//! Game phase state machine
//!
//! Elm-style: a pure transition function returns the next phase plus the
//! effects for the runtime to execute.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::PhaseEvent;
pub use state::{EndReason, Phase, PhaseContext};
pub use transition::{transition, TransitionError, TransitionResult};
