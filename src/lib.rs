//! Scroll-driven motion for web front-ends, without a DOM.
//!
//! The host reports what happens on the page (scrolls, resizes, element
//! layout, route changes) as timestamped [`events::Event`]s. The
//! [`engine::MotionEngine`] turns them into reveal styles, stagger sequences,
//! parallax transforms, counters, a reading progress indicator and per-route
//! scroll restoration, and hands back the few [`events::Command`]s the host
//! has to carry out itself.

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod geometry;
pub mod log;
pub mod motion;
pub mod navigation;
pub mod parallax;
pub mod persistence;
pub mod reveal;
pub mod runtime;
pub mod scheduler;
pub mod scroll;
pub mod stagger;
pub mod visibility;

pub use config::Config;
pub use engine::{EngineSettings, MotionEngine};
pub use error::{MotionError, Result};
pub use events::{Command, Event, Timed};
