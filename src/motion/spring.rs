//! Critically damped spring used to smooth scroll-mapped values.
//!
//! Integration uses the closed-form solution of
//! `x'' + 2ωx' + ω²(x - target) = 0`, so the result does not depend on how
//! the frame interval is sliced and never overshoots from rest.

use serde::{Deserialize, Serialize};

/// Spring tuning. `ω = sqrt(stiffness / mass)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringConfig {
    pub stiffness: f32,
    pub mass: f32,
    /// Distance and speed below which the spring snaps to its target.
    pub rest_delta: f32,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            stiffness: 100.0,
            mass: 1.0,
            rest_delta: 0.001,
        }
    }
}

impl SpringConfig {
    fn omega(&self) -> f32 {
        (self.stiffness.max(0.0) / self.mass.max(f32::EPSILON)).sqrt()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Spring {
    config: SpringConfig,
    position: f32,
    velocity: f32,
    target: f32,
}

impl Spring {
    pub fn new(config: SpringConfig, initial: f32) -> Self {
        Self {
            config,
            position: initial,
            velocity: 0.0,
            target: initial,
        }
    }

    pub fn value(&self) -> f32 {
        self.position
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Move straight to `value` with no residual velocity.
    pub fn jump(&mut self, value: f32) {
        self.position = value;
        self.target = value;
        self.velocity = 0.0;
    }

    pub fn settled(&self) -> bool {
        self.position == self.target && self.velocity == 0.0
    }

    /// Advance the spring by `dt_ms` and return the new position.
    pub fn step(&mut self, dt_ms: u64) -> f32 {
        if self.settled() || dt_ms == 0 {
            return self.position;
        }

        let omega = self.config.omega();
        let t = dt_ms as f32 / 1000.0;
        let d0 = self.position - self.target;
        let k = self.velocity + omega * d0;
        let decay = (-omega * t).exp();

        let displacement = (d0 + k * t) * decay;
        self.velocity = (self.velocity - omega * k * t) * decay;
        self.position = self.target + displacement;

        let rest = self.config.rest_delta;
        if displacement.abs() < rest && self.velocity.abs() < rest {
            self.position = self.target;
            self.velocity = 0.0;
        }
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spring_converges_without_overshoot() {
        let mut spring = Spring::new(SpringConfig::default(), 0.0);
        spring.set_target(100.0);

        let mut last = 0.0;
        for _ in 0..120 {
            let value = spring.step(16);
            assert!(value >= last - 1e-3, "spring moved backwards");
            assert!(value <= 100.0 + 1e-3, "spring overshot: {}", value);
            last = value;
        }
        assert!(spring.settled());
        assert_eq!(spring.value(), 100.0);
    }

    #[test]
    fn test_step_is_frame_rate_independent() {
        let mut coarse = Spring::new(SpringConfig::default(), 0.0);
        let mut fine = Spring::new(SpringConfig::default(), 0.0);
        coarse.set_target(50.0);
        fine.set_target(50.0);

        coarse.step(32);
        fine.step(16);
        fine.step(16);

        assert!((coarse.value() - fine.value()).abs() < 1e-2);
    }

    #[test]
    fn test_jump_clears_velocity() {
        let mut spring = Spring::new(SpringConfig::default(), 0.0);
        spring.set_target(10.0);
        spring.step(16);
        spring.jump(3.0);
        assert!(spring.settled());
        assert_eq!(spring.step(16), 3.0);
    }
}
