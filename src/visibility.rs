//! Viewport visibility detection.
//!
//! A `VisibilityDetector` turns a stream of visible-fraction readings into
//! enter/leave crossings. The `ObserverRegistry` owns every live detector,
//! keeps the latest known geometry for each, and re-evaluates them against
//! the viewport when the host reports a scroll, resize or layout change.
//!
//! Fractions follow the convention of [`crate::geometry::visible_fraction`]
//! everywhere: measured against `min(element height, viewport height)`, with
//! an optional uniform `root_margin_px` applied to the viewport.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, ScrollMetrics, visible_fraction};
use crate::log;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityOptions {
    /// Visible fraction that counts as "in view". `0.0` means any overlap.
    pub threshold: f64,
    /// Once in view, stay in view.
    pub trigger_once: bool,
    /// Grows (positive) or shrinks (negative) the viewport on every side.
    pub root_margin_px: f64,
}

impl Default for VisibilityOptions {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            trigger_once: true,
            root_margin_px: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossing {
    Entered,
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisibilityState {
    pub is_visible: bool,
    pub has_triggered_once: bool,
}

#[derive(Debug, Clone)]
pub struct VisibilityDetector {
    options: VisibilityOptions,
    state: VisibilityState,
}

impl VisibilityDetector {
    pub fn new(options: VisibilityOptions) -> Self {
        Self {
            options: VisibilityOptions {
                threshold: options.threshold.clamp(0.0, 1.0),
                ..options
            },
            state: VisibilityState::default(),
        }
    }

    pub fn options(&self) -> &VisibilityOptions {
        &self.options
    }

    pub fn state(&self) -> VisibilityState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state.is_visible
    }

    fn meets_threshold(&self, fraction: f64) -> bool {
        if self.options.threshold <= 0.0 {
            fraction > 0.0
        } else {
            fraction >= self.options.threshold
        }
    }

    /// Feed a new visible fraction. Returns a crossing only when the visible
    /// state actually changes.
    pub fn observe(&mut self, fraction: f64) -> Option<Crossing> {
        if self.options.trigger_once && self.state.has_triggered_once {
            return None;
        }

        let meets = self.meets_threshold(fraction);
        match (self.state.is_visible, meets) {
            (false, true) => {
                self.state.is_visible = true;
                self.state.has_triggered_once = true;
                Some(Crossing::Entered)
            }
            (true, false) => {
                self.state.is_visible = false;
                Some(Crossing::Left)
            }
            _ => None,
        }
    }

    /// Observe an element given its geometry and the current scroll offset.
    pub fn observe_geometry(
        &mut self,
        element: &Rect,
        scroll: (f64, f64),
        metrics: &ScrollMetrics,
    ) -> Option<Crossing> {
        let viewport =
            metrics
                .viewport
                .visible_rect(scroll.0, scroll.1, self.options.root_margin_px);
        self.observe(visible_fraction(element, &viewport))
    }
}

/// Identifier of a live observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObservationId(u64);

#[derive(Debug)]
struct Observation {
    detector: VisibilityDetector,
    target: Option<Rect>,
}

/// Every observation must be unregistered before the registry is dropped;
/// leftovers are reported as leaks.
#[derive(Debug, Default)]
pub struct ObserverRegistry {
    next_id: u64,
    observations: BTreeMap<ObservationId, Observation>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, options: VisibilityOptions) -> ObservationId {
        let id = ObservationId(self.next_id);
        self.next_id += 1;
        self.observations.insert(
            id,
            Observation {
                detector: VisibilityDetector::new(options),
                target: None,
            },
        );
        id
    }

    pub fn unregister(&mut self, id: ObservationId) -> bool {
        self.observations.remove(&id).is_some()
    }

    /// Number of observations still registered.
    pub fn live(&self) -> usize {
        self.observations.len()
    }

    pub fn detector(&self, id: ObservationId) -> Option<&VisibilityDetector> {
        self.observations.get(&id).map(|o| &o.detector)
    }

    /// Record the element's geometry. Returns false for an unknown id.
    pub fn set_target(&mut self, id: ObservationId, rect: Rect) -> bool {
        match self.observations.get_mut(&id) {
            Some(observation) => {
                observation.target = Some(rect);
                true
            }
            None => false,
        }
    }

    /// Re-evaluate one observation.
    pub fn evaluate(
        &mut self,
        id: ObservationId,
        scroll: (f64, f64),
        metrics: &ScrollMetrics,
    ) -> Option<Crossing> {
        let observation = self.observations.get_mut(&id)?;
        let target = observation.target?;
        observation.detector.observe_geometry(&target, scroll, metrics)
    }

    /// Re-evaluate every observation that has geometry. Observations whose
    /// element has not been laid out yet are skipped.
    pub fn evaluate_all(
        &mut self,
        scroll: (f64, f64),
        metrics: &ScrollMetrics,
    ) -> Vec<(ObservationId, Crossing)> {
        self.observations
            .iter_mut()
            .filter_map(|(id, observation)| {
                let target = observation.target?;
                observation
                    .detector
                    .observe_geometry(&target, scroll, metrics)
                    .map(|crossing| (*id, crossing))
            })
            .collect()
    }
}

impl Drop for ObserverRegistry {
    fn drop(&mut self) {
        if !self.observations.is_empty() {
            log::warn(&format!(
                "{} visibility observation(s) were never unregistered",
                self.observations.len()
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Viewport;

    fn metrics() -> ScrollMetrics {
        ScrollMetrics::new(Viewport::new(1000.0, 800.0), 5000.0)
    }

    #[test]
    fn test_single_crossing_per_threshold_pass() {
        let mut detector = VisibilityDetector::new(VisibilityOptions {
            threshold: 0.5,
            trigger_once: false,
            ..Default::default()
        });

        let readings = [0.0, 0.2, 0.49, 0.5, 0.7, 1.0, 0.9, 0.6];
        let crossings: Vec<_> = readings.iter().filter_map(|f| detector.observe(*f)).collect();
        assert_eq!(crossings, vec![Crossing::Entered]);

        let back: Vec<_> = [0.4, 0.1, 0.0]
            .iter()
            .filter_map(|f| detector.observe(*f))
            .collect();
        assert_eq!(back, vec![Crossing::Left]);
    }

    #[test]
    fn test_threshold_sweep_never_flickers() {
        for step in 0..=10 {
            let threshold = step as f64 / 10.0;
            let mut detector = VisibilityDetector::new(VisibilityOptions {
                threshold,
                trigger_once: false,
                ..Default::default()
            });
            let mut entered = 0;
            let mut left = 0;
            for i in (0..=100).chain((0..=100).rev()) {
                match detector.observe(i as f64 / 100.0) {
                    Some(Crossing::Entered) => entered += 1,
                    Some(Crossing::Left) => left += 1,
                    None => {}
                }
            }
            assert_eq!(entered, 1, "threshold {}", threshold);
            assert!(left <= 1, "threshold {}", threshold);
        }
    }

    #[test]
    fn test_trigger_once_stays_visible() {
        let mut detector = VisibilityDetector::new(VisibilityOptions::default());
        assert_eq!(detector.observe(0.5), Some(Crossing::Entered));
        assert_eq!(detector.observe(0.0), None);
        assert!(detector.is_visible());
        assert!(detector.state().has_triggered_once);
    }

    #[test]
    fn test_zero_threshold_counts_one_pixel() {
        let mut detector = VisibilityDetector::new(VisibilityOptions {
            threshold: 0.0,
            ..Default::default()
        });
        let element = Rect::new(0.0, 799.0, 400.0, 300.0);
        assert_eq!(
            detector.observe_geometry(&element, (0.0, 0.0), &metrics()),
            Some(Crossing::Entered)
        );
    }

    #[test]
    fn test_registry_skips_unlaid_targets_and_tracks_live_count() {
        let mut registry = ObserverRegistry::new();
        let laid_out = registry.register(VisibilityOptions::default());
        let pending = registry.register(VisibilityOptions::default());
        assert!(registry.set_target(laid_out, Rect::new(0.0, 100.0, 400.0, 200.0)));

        let crossings = registry.evaluate_all((0.0, 0.0), &metrics());
        assert_eq!(crossings, vec![(laid_out, Crossing::Entered)]);
        assert_eq!(registry.evaluate(pending, (0.0, 0.0), &metrics()), None);

        assert_eq!(registry.live(), 2);
        assert!(registry.unregister(laid_out));
        assert!(registry.unregister(pending));
        assert!(!registry.unregister(pending));
        assert_eq!(registry.live(), 0);
    }

    #[test]
    fn test_dropping_registry_with_live_observations_reports_leak() {
        log::start_capture();
        {
            let mut registry = ObserverRegistry::new();
            let _ = registry.register(VisibilityOptions::default());
        }
        let lines = log::take_capture();
        assert!(lines.iter().any(|l| l.contains("never unregistered")));
    }
}
