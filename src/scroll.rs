//! Scroll position tracking.
//!
//! Samples the window offset, derives scroll direction with a noise floor and
//! the normalized progress through the document. Raw events closer together
//! than `throttle_ms` are coalesced: the newest offset is held back and folded
//! into the next accepted sample (or flushed on the next animation frame), so
//! a burst never produces more than one derivation per throttle window.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut tracker = ScrollTracker::new(TrackerOptions::default());
//!
//! // In the scroll handler:
//! if let Some(snapshot) = tracker.record(sample, &probe) {
//!     progress_bar.set(snapshot.progress);
//! }
//! ```

use std::cell::Cell;

use serde::{Deserialize, Serialize};

use crate::geometry::ScrollMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    None,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollSample {
    pub x: f64,
    pub y: f64,
    pub at_ms: u64,
}

impl ScrollSample {
    pub fn new(x: f64, y: f64, at_ms: u64) -> Self {
        Self { x, y, at_ms }
    }
}

/// Values derived from one pair of samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScrollSnapshot {
    pub x: f64,
    pub y: f64,
    pub direction: Direction,
    /// Percentage in [0, 100].
    pub progress: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerOptions {
    /// Movement since the last direction change needed to change it again.
    pub noise_floor_px: f64,
    /// Minimum spacing between accepted samples.
    pub throttle_ms: u64,
    /// Minimum spacing between reads of document metrics.
    pub metrics_refresh_ms: u64,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            noise_floor_px: 10.0,
            throttle_ms: 16,
            metrics_refresh_ms: 100,
        }
    }
}

/// Source of layout measurements. Reading them may force a layout on the
/// host, so the tracker calls `read` as rarely as it can.
pub trait MetricsProbe {
    fn read(&self) -> ScrollMetrics;
}

impl MetricsProbe for ScrollMetrics {
    fn read(&self) -> ScrollMetrics {
        *self
    }
}

/// Probe wrapper that counts reads.
#[derive(Debug)]
pub struct CountingProbe<P> {
    inner: P,
    reads: Cell<usize>,
}

impl<P: MetricsProbe> CountingProbe<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            reads: Cell::new(0),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.get()
    }
}

impl<P: MetricsProbe> MetricsProbe for CountingProbe<P> {
    fn read(&self) -> ScrollMetrics {
        self.reads.set(self.reads.get() + 1);
        self.inner.read()
    }
}

/// Progress percentage for vertical offset `y`, clamped to [0, 100].
/// Zero when the document fits in the viewport.
pub fn progress_percent(y: f64, metrics: &ScrollMetrics) -> f64 {
    let scrollable = metrics.document_height - metrics.viewport.height;
    if scrollable <= 0.0 {
        return 0.0;
    }
    (y / scrollable * 100.0).clamp(0.0, 100.0)
}

#[derive(Debug, Clone)]
pub struct ScrollTracker {
    options: TrackerOptions,
    current: Option<ScrollSample>,
    previous: Option<ScrollSample>,
    /// Held-back sample from inside the throttle window.
    pending: Option<ScrollSample>,
    direction: Direction,
    /// Extreme offset reached in the current direction, or the starting
    /// offset while the direction is still `None`.
    anchor_y: f64,
    metrics: ScrollMetrics,
    metrics_read_at: Option<u64>,
}

impl ScrollTracker {
    pub fn new(options: TrackerOptions) -> Self {
        Self {
            options,
            current: None,
            previous: None,
            pending: None,
            direction: Direction::None,
            anchor_y: 0.0,
            metrics: ScrollMetrics::default(),
            metrics_read_at: None,
        }
    }

    pub fn options(&self) -> &TrackerOptions {
        &self.options
    }

    pub fn current(&self) -> Option<ScrollSample> {
        self.current
    }

    pub fn previous(&self) -> Option<ScrollSample> {
        self.previous
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn metrics(&self) -> &ScrollMetrics {
        &self.metrics
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Force the next accepted sample to re-read metrics (after a resize).
    pub fn invalidate_metrics(&mut self) {
        self.metrics_read_at = None;
    }

    /// Record a raw scroll event. Returns the derived snapshot if the sample
    /// was accepted, `None` if it was coalesced into the throttle window.
    pub fn record(
        &mut self,
        sample: ScrollSample,
        probe: &dyn MetricsProbe,
    ) -> Option<ScrollSnapshot> {
        if let Some(current) = self.current {
            let elapsed = sample.at_ms.saturating_sub(current.at_ms);
            if elapsed < self.options.throttle_ms {
                self.pending = Some(sample);
                return None;
            }
        }
        self.pending = None;
        Some(self.accept(sample, probe))
    }

    /// Time at which the held-back sample is due, if there is one.
    pub fn pending_deadline(&self) -> Option<u64> {
        let pending = self.pending?;
        let due = self
            .current
            .map_or(pending.at_ms, |c| c.at_ms.saturating_add(self.options.throttle_ms));
        Some(due.max(pending.at_ms))
    }

    /// Accept the held-back sample, if any. Call once per animation frame.
    pub fn flush(&mut self, probe: &dyn MetricsProbe) -> Option<ScrollSnapshot> {
        let sample = self.pending.take()?;
        Some(self.accept(sample, probe))
    }

    /// Snapshot for the latest accepted sample.
    pub fn snapshot(&self) -> ScrollSnapshot {
        let (x, y) = self.current.map(|s| (s.x, s.y)).unwrap_or((0.0, 0.0));
        ScrollSnapshot {
            x,
            y,
            direction: self.direction,
            progress: progress_percent(y, &self.metrics),
        }
    }

    /// True once the page has been scrolled further than `px`.
    pub fn is_scrolled_past(&self, px: f64) -> bool {
        self.current.is_some_and(|s| s.y > px)
    }

    fn accept(&mut self, sample: ScrollSample, probe: &dyn MetricsProbe) -> ScrollSnapshot {
        self.refresh_metrics(sample.at_ms, probe);

        if self.current.is_none() {
            self.anchor_y = sample.y;
        }
        self.previous = self.current.replace(sample);
        self.update_direction(sample.y);
        self.snapshot()
    }

    fn refresh_metrics(&mut self, now_ms: u64, probe: &dyn MetricsProbe) {
        let stale = match self.metrics_read_at {
            None => true,
            Some(at) => now_ms.saturating_sub(at) >= self.options.metrics_refresh_ms,
        };
        if stale {
            self.metrics = probe.read();
            self.metrics_read_at = Some(now_ms);
        }
    }

    fn update_direction(&mut self, y: f64) {
        let floor = self.options.noise_floor_px;
        match self.direction {
            Direction::None => {
                if y - self.anchor_y > floor {
                    self.direction = Direction::Down;
                    self.anchor_y = y;
                } else if self.anchor_y - y > floor {
                    self.direction = Direction::Up;
                    self.anchor_y = y;
                }
            }
            Direction::Down => {
                if y > self.anchor_y {
                    self.anchor_y = y;
                } else if self.anchor_y - y > floor {
                    self.direction = Direction::Up;
                    self.anchor_y = y;
                }
            }
            Direction::Up => {
                if y < self.anchor_y {
                    self.anchor_y = y;
                } else if y - self.anchor_y > floor {
                    self.direction = Direction::Down;
                    self.anchor_y = y;
                }
            }
        }
    }
}
