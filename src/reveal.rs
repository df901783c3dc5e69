//! Single-element reveal on viewport entry.

use serde::{Deserialize, Serialize};

use crate::motion::{Easing, MotionContext, StyleProps, Tween, Variant, VariantName};
use crate::scheduler::{Scheduler, TaskHandle};
use crate::visibility::VisibilityOptions;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealOptions {
    pub threshold: f64,
    pub trigger_once: bool,
    pub delay_ms: u64,
    /// Overrides the variant's own duration.
    pub duration_ms: Option<u64>,
    /// Overrides the variant's own easing.
    pub easing: Option<Easing>,
    pub variant: VariantName,
}

impl Default for RevealOptions {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            trigger_once: true,
            delay_ms: 0,
            duration_ms: None,
            easing: None,
            variant: VariantName::FadeUp,
        }
    }
}

impl RevealOptions {
    pub fn visibility(&self) -> VisibilityOptions {
        VisibilityOptions {
            threshold: self.threshold,
            trigger_once: self.trigger_once,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RevealPhase {
    Hidden,
    Waiting,
    Animating,
    Shown,
}

#[derive(Debug)]
pub struct Reveal {
    options: RevealOptions,
    variant: Variant,
    scheduler: Scheduler<()>,
    start: Option<TaskHandle>,
    tween: Option<Tween>,
}

impl Reveal {
    pub fn new(options: RevealOptions, ctx: MotionContext) -> Self {
        let mut variant = options.variant.variant();
        if let Some(ms) = options.duration_ms {
            variant.transition.duration_s = ms as f32 / 1000.0;
        }
        if let Some(easing) = options.easing {
            variant.transition.easing = easing;
        }
        variant.transition.delay_s = options.delay_ms as f32 / 1000.0;

        Self {
            options,
            // Reduced motion is applied last so it wins over the overrides.
            variant: variant.for_context(&ctx),
            scheduler: Scheduler::new(),
            start: None,
            tween: None,
        }
    }

    pub fn options(&self) -> &RevealOptions {
        &self.options
    }

    pub fn variant(&self) -> &Variant {
        &self.variant
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.scheduler.next_deadline()
    }

    pub fn on_visibility(&mut self, now_ms: u64, visible: bool) {
        if visible {
            if self.start.is_some() || self.tween.is_some() {
                return;
            }
            let delay = self.variant.transition.delay_ms();
            self.start = Some(self.scheduler.schedule(now_ms, delay, ()));
        } else if !self.options.trigger_once {
            self.dispose();
            self.tween = None;
        }
    }

    /// Start the transition once the entry delay has elapsed.
    pub fn advance(&mut self, now_ms: u64) -> bool {
        if self.scheduler.due(now_ms).is_empty() {
            return false;
        }
        self.start = None;
        self.tween = Some(Tween::new(
            now_ms,
            self.variant.transition.duration_ms(),
            self.variant.transition.easing,
        ));
        true
    }

    pub fn phase(&self, now_ms: u64) -> RevealPhase {
        match (&self.start, &self.tween) {
            (Some(_), _) => RevealPhase::Waiting,
            (None, None) => RevealPhase::Hidden,
            (None, Some(tween)) if tween.is_finished(now_ms) => RevealPhase::Shown,
            (None, Some(_)) => RevealPhase::Animating,
        }
    }

    pub fn style(&self, now_ms: u64) -> StyleProps {
        match self.tween {
            None => self.variant.hidden,
            Some(tween) => self.variant.style_at(tween.progress(now_ms)),
        }
    }

    /// Cancel the pending start, if any.
    pub fn dispose(&mut self) -> bool {
        match self.start.take() {
            Some(handle) => self.scheduler.cancel(handle),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_then_animate_then_shown() {
        let mut reveal = Reveal::new(
            RevealOptions {
                delay_ms: 200,
                duration_ms: Some(400),
                easing: Some(Easing::Linear),
                ..Default::default()
            },
            MotionContext::default(),
        );
        assert_eq!(reveal.phase(0), RevealPhase::Hidden);

        reveal.on_visibility(1000, true);
        assert_eq!(reveal.phase(1000), RevealPhase::Waiting);
        assert!(!reveal.advance(1199));
        assert!(reveal.advance(1200));

        assert_eq!(reveal.phase(1400), RevealPhase::Animating);
        assert_eq!(reveal.style(1400).opacity, 0.5);
        assert_eq!(reveal.phase(1600), RevealPhase::Shown);
        assert_eq!(reveal.style(1600), StyleProps::VISIBLE);
    }

    #[test]
    fn test_leaving_during_delay_cancels_start() {
        let mut reveal = Reveal::new(
            RevealOptions {
                delay_ms: 300,
                trigger_once: false,
                ..Default::default()
            },
            MotionContext::default(),
        );
        reveal.on_visibility(0, true);
        reveal.on_visibility(100, false);
        assert!(!reveal.advance(1000));
        assert_eq!(reveal.phase(1000), RevealPhase::Hidden);
    }

    #[test]
    fn test_repeatable_reveal_hides_on_leave() {
        let mut reveal = Reveal::new(
            RevealOptions {
                trigger_once: false,
                ..Default::default()
            },
            MotionContext::default(),
        );
        reveal.on_visibility(0, true);
        assert!(reveal.advance(0));
        reveal.on_visibility(5000, false);
        assert_eq!(reveal.style(5000), reveal.variant().hidden);
    }

    #[test]
    fn test_reduced_motion_overrides_custom_duration() {
        let reveal = Reveal::new(
            RevealOptions {
                duration_ms: Some(2000),
                delay_ms: 500,
                variant: VariantName::SlideUp,
                ..Default::default()
            },
            MotionContext::reduced(),
        );
        assert!(reveal.variant().transition.duration_ms() <= 10);
        assert_eq!(reveal.variant().transition.delay_ms(), 0);
        assert_eq!(reveal.variant().hidden.y, 0.0);
    }
}
