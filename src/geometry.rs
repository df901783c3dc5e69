//! Document-space geometry.
//!
//! All rectangles are in document coordinates (scroll offset already added),
//! so they stay valid while the page scrolls and only change on layout.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// The visible document region at scroll offset `(x, y)`, grown (or shrunk,
    /// when negative) by `margin` px on every side.
    pub fn visible_rect(&self, x: f64, y: f64, margin: f64) -> Rect {
        Rect::new(
            x - margin,
            y - margin,
            (self.width + 2.0 * margin).max(0.0),
            (self.height + 2.0 * margin).max(0.0),
        )
    }
}

/// Layout measurements that are expensive to read from the host.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollMetrics {
    pub viewport: Viewport,
    pub document_height: f64,
}

impl ScrollMetrics {
    pub fn new(viewport: Viewport, document_height: f64) -> Self {
        Self {
            viewport,
            document_height,
        }
    }

    /// Largest reachable vertical offset. Zero when the content fits.
    pub fn max_scroll_y(&self) -> f64 {
        (self.document_height - self.viewport.height).max(0.0)
    }
}

/// Fraction of `element` that is visible, in [0, 1].
///
/// Visibility is measured against the smaller of the element height and the
/// (margin-adjusted) viewport height. An element taller than the viewport is
/// therefore "fully visible" when it covers the whole viewport, and a
/// threshold means the same thing for small and tall elements. Elements with
/// no horizontal overlap are never visible.
pub fn visible_fraction(element: &Rect, viewport: &Rect) -> f64 {
    let overlap_w = element.right().min(viewport.right()) - element.left().max(viewport.left());
    let overlap_h = element.bottom().min(viewport.bottom()) - element.top().max(viewport.top());

    if element.height <= 0.0 {
        let inside = element.top() >= viewport.top() && element.top() <= viewport.bottom();
        return if inside && overlap_w > 0.0 { 1.0 } else { 0.0 };
    }
    if overlap_w <= 0.0 || overlap_h <= 0.0 {
        return 0.0;
    }

    let basis = element.height.min(viewport.height);
    if basis <= 0.0 {
        return 0.0;
    }
    (overlap_h / basis).clamp(0.0, 1.0)
}
