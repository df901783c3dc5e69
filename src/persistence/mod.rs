//! Scroll position persistence across route changes.
//!
//! `store` abstracts the tab-scoped key-value storage, `cache` keeps one
//! position per route on top of it, and `restoration` is the state machine
//! that decides when to save and when to restore.

mod cache;
mod restoration;
mod store;

pub use cache::{PositionCache, SavedScrollPosition, route_key};
pub use restoration::{RestorationEvent, RestorationOptions, RestorationState, ScrollRestoration};
pub use store::{MemoryStore, SessionStore, SharedStore, UnavailableStore};
