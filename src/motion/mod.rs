//! Motion primitives shared by every component.
//!
//! The variant table, easing curves, springs and tweens are all pure values.
//! Preferences that change how they behave (reduced motion, device tier) are
//! carried by a `MotionContext` that callers pass in explicitly.

mod context;
mod easing;
mod spring;
mod tween;
mod variants;

pub use context::{MotionContext, PerformanceTier};
pub use easing::Easing;
pub use spring::{Spring, SpringConfig};
pub use tween::{CountUp, CountUpOptions, Tween};
pub use variants::{
    REDUCED_MOTION_DURATION_S, StyleProps, Transition, UnknownVariant, Variant, VariantName,
    resolve,
};
