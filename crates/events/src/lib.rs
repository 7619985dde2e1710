//! Event Bus: name-keyed publish/subscribe used by the core and by scripts to
//! talk without holding references to each other.
//!
//! # Invariants
//! - `emit` visits listeners in registration order with the same payload.
//! - A failing listener never stops the remaining listeners or reaches the caller.
//! - `once` listeners are gone after their first invocation, even a failed one.

mod bus;
mod event;

pub use bus::{EventBus, Listener, listener};
pub use event::{EventData, PerformanceSample, names};
