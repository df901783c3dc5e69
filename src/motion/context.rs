use serde::{Deserialize, Serialize};

/// Rough capability class of the device, used to turn off optional smoothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceTier {
    Low,
    #[default]
    Standard,
    High,
}

/// Animation preferences threaded through every component at construction.
///
/// This is deliberately a small `Copy` value: components take it by value
/// when they are built and never consult a global.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotionContext {
    pub reduced_motion: bool,
    pub tier: PerformanceTier,
}

impl MotionContext {
    pub fn new(reduced_motion: bool, tier: PerformanceTier) -> Self {
        Self {
            reduced_motion,
            tier,
        }
    }

    /// Context with the reduced-motion preference active.
    pub fn reduced() -> Self {
        Self {
            reduced_motion: true,
            ..Default::default()
        }
    }

    /// Spring smoothing is skipped on low-end devices and under reduced motion.
    pub fn smoothing_enabled(&self) -> bool {
        !self.reduced_motion && self.tier != PerformanceTier::Low
    }

    /// Scale a scheduling delay. Reduced motion collapses delays to zero
    /// while callers keep their sequencing.
    pub fn delay_ms(&self, ms: u64) -> u64 {
        if self.reduced_motion { 0 } else { ms }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduced_context_collapses_delays() {
        let ctx = MotionContext::reduced();
        assert_eq!(ctx.delay_ms(400), 0);
        assert!(!ctx.smoothing_enabled());
    }

    #[test]
    fn test_low_tier_disables_smoothing_only() {
        let ctx = MotionContext::new(false, PerformanceTier::Low);
        assert!(!ctx.smoothing_enabled());
        assert_eq!(ctx.delay_ms(400), 400);
    }
}
