//! Input: raw host events and the listener hub behaviours subscribe to.
//!
//! # Invariants
//! - Listeners only record plain data; effects apply it on the next update.
//! - Events are delivered on the same thread as frame callbacks.

mod event;
mod hub;

pub use event::{InputEvent, normalize_pointer};
pub use hub::{EventHub, Subscription};

pub fn crate_info() -> &'static str {
    "lumen-input v0.1.0"
}
