//! Host-facing events and commands.
//!
//! The host translates browser callbacks (scroll, resize, visibility
//! observer entries, route changes, key presses) into `Event`s stamped with
//! the time they happened, and carries out the `Command`s the engine hands
//! back. Both sides serialize to JSON so traces can be recorded and replayed.

mod command;
mod event;

pub use command::{Command, ScrollBehavior};
pub use event::{ComponentSpec, Event, ScrollKey, Timed, parse_trace};
