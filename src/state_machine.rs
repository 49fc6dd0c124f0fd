//! Call status state machine
//!
//! Pure transitions over the call lifecycle: the store feeds provider events
//! in and applies the resulting status, the runtime executes the effects.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::CallEvent;
pub use state::CallStatus;
pub use transition::transition;
