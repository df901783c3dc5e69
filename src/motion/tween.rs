use serde::{Deserialize, Serialize};

use super::{Easing, MotionContext};

/// A time-boxed interpolation started at a known timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub start_ms: u64,
    pub duration_ms: u64,
    pub easing: Easing,
}

impl Tween {
    pub fn new(start_ms: u64, duration_ms: u64, easing: Easing) -> Self {
        Self {
            start_ms,
            duration_ms,
            easing,
        }
    }

    /// Eased progress in [0, 1] at `now_ms`.
    pub fn progress(&self, now_ms: u64) -> f32 {
        if self.duration_ms == 0 {
            return if now_ms >= self.start_ms { 1.0 } else { 0.0 };
        }
        let elapsed = now_ms.saturating_sub(self.start_ms) as f32;
        self.easing.apply(elapsed / self.duration_ms as f32)
    }

    pub fn is_finished(&self, now_ms: u64) -> bool {
        now_ms >= self.start_ms.saturating_add(self.duration_ms)
    }
}

/// Options for an animated number (stat counters and the like).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountUpOptions {
    pub from: f64,
    pub to: f64,
    pub duration_ms: u64,
    pub delay_ms: u64,
    pub easing: Easing,
    /// Digits kept after rounding.
    pub decimals: u32,
}

impl Default for CountUpOptions {
    fn default() -> Self {
        Self {
            from: 0.0,
            to: 100.0,
            duration_ms: 2000,
            delay_ms: 0,
            easing: Easing::EaseOut,
            decimals: 0,
        }
    }
}

/// A number that counts towards its target once started.
#[derive(Debug, Clone)]
pub struct CountUp {
    options: CountUpOptions,
    tween: Option<Tween>,
}

impl CountUp {
    pub fn new(options: CountUpOptions) -> Self {
        Self {
            options,
            tween: None,
        }
    }

    pub fn options(&self) -> &CountUpOptions {
        &self.options
    }

    pub fn is_started(&self) -> bool {
        self.tween.is_some()
    }

    /// Start counting at `now_ms`. Restarting an active counter is a no-op.
    /// Reduced motion jumps straight to the target.
    pub fn start(&mut self, now_ms: u64, ctx: &MotionContext) {
        if self.tween.is_some() {
            return;
        }
        let (delay, duration) = if ctx.reduced_motion {
            (0, 0)
        } else {
            (self.options.delay_ms, self.options.duration_ms)
        };
        self.tween = Some(Tween::new(
            now_ms.saturating_add(delay),
            duration,
            self.options.easing,
        ));
    }

    pub fn value(&self, now_ms: u64) -> f64 {
        let Some(tween) = self.tween else {
            return self.options.from;
        };
        if now_ms < tween.start_ms {
            return self.options.from;
        }
        let t = tween.progress(now_ms) as f64;
        let raw = self.options.from + (self.options.to - self.options.from) * t;
        let scale = 10f64.powi(self.options.decimals as i32);
        (raw * scale).round() / scale
    }

    pub fn is_finished(&self, now_ms: u64) -> bool {
        self.tween.is_some_and(|t| t.is_finished(now_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tween_progress_bounds() {
        let tween = Tween::new(100, 200, Easing::Linear);
        assert_eq!(tween.progress(50), 0.0);
        assert_eq!(tween.progress(200), 0.5);
        assert_eq!(tween.progress(400), 1.0);
        assert!(tween.is_finished(300));
    }

    #[test]
    fn test_zero_duration_tween_is_instant() {
        let tween = Tween::new(10, 0, Easing::EaseOut);
        assert_eq!(tween.progress(9), 0.0);
        assert_eq!(tween.progress(10), 1.0);
    }

    #[test]
    fn test_count_up_reaches_target() {
        let mut counter = CountUp::new(CountUpOptions {
            to: 250.0,
            duration_ms: 1000,
            easing: Easing::Linear,
            ..Default::default()
        });
        assert_eq!(counter.value(0), 0.0);
        counter.start(0, &MotionContext::default());
        assert_eq!(counter.value(500), 125.0);
        assert_eq!(counter.value(1500), 250.0);
        assert!(counter.is_finished(1000));
    }

    #[test]
    fn test_count_up_reduced_motion_jumps() {
        let mut counter = CountUp::new(CountUpOptions {
            to: 42.0,
            delay_ms: 300,
            ..Default::default()
        });
        counter.start(1000, &MotionContext::reduced());
        assert_eq!(counter.value(1000), 42.0);
    }
}
