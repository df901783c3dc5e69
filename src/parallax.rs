//! Scroll-driven parallax transforms.
//!
//! Progress in [0, 1] maps linearly onto `[offset * speed, -offset * speed]`,
//! so the layer drifts against the scroll direction. Scale and rotation
//! channels are driven from the same progress value, which callers compute
//! once per frame.

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;
use crate::motion::{MotionContext, Spring, SpringConfig};
use crate::visibility::VisibilityOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressSource {
    /// Whole-document scroll progress.
    #[default]
    Global,
    /// The element's own transit through the viewport.
    Element,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParallaxDirection {
    #[default]
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallaxOptions {
    pub speed: f32,
    pub direction: ParallaxDirection,
    pub offset_px: f32,
    /// Scale at progress 0 and 1.
    pub scale: Option<(f32, f32)>,
    /// Rotation in degrees reached at progress 1.
    pub rotate: Option<f32>,
    pub source: ProgressSource,
    pub smoothing: Option<SpringConfig>,
    /// Freeze the layer while its element is out of view.
    pub only_when_visible: bool,
}

impl Default for ParallaxOptions {
    fn default() -> Self {
        Self {
            speed: 0.5,
            direction: ParallaxDirection::Up,
            offset_px: 100.0,
            scale: None,
            rotate: None,
            source: ProgressSource::Global,
            smoothing: None,
            only_when_visible: false,
        }
    }
}

impl ParallaxOptions {
    pub fn visibility(&self) -> VisibilityOptions {
        VisibilityOptions {
            threshold: 0.0,
            trigger_once: false,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    pub translate_x: f32,
    pub translate_y: f32,
    pub scale: f32,
    pub rotate: f32,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translate_x: 0.0,
        translate_y: 0.0,
        scale: 1.0,
        rotate: 0.0,
    };

    pub fn to_css(&self) -> String {
        format!(
            "translate3d({:.2}px, {:.2}px, 0) scale({:.4}) rotate({:.2}deg)",
            self.translate_x, self.translate_y, self.scale, self.rotate
        )
    }
}

impl Default for Transform {
    fn default() -> Self {
        Transform::IDENTITY
    }
}

/// Progress of `element` through the viewport: 0 when its top edge meets the
/// bottom of the viewport, 1 when its bottom edge leaves through the top.
pub fn element_progress(element: &Rect, scroll_y: f64, viewport_height: f64) -> f64 {
    let start = element.top() - viewport_height;
    let travel = element.height + viewport_height;
    if travel <= 0.0 {
        return 0.0;
    }
    ((scroll_y - start) / travel).clamp(0.0, 1.0)
}

#[derive(Debug, Clone)]
pub struct ParallaxLayer {
    options: ParallaxOptions,
    ctx: MotionContext,
    spring: Option<Spring>,
    last: Transform,
}

impl ParallaxLayer {
    pub fn new(options: ParallaxOptions, ctx: MotionContext) -> Self {
        let spring = options
            .smoothing
            .filter(|_| ctx.smoothing_enabled())
            .map(|config| Spring::new(config, options.offset_px * options.speed));
        Self {
            options,
            ctx,
            spring,
            last: Transform::IDENTITY,
        }
    }

    pub fn options(&self) -> &ParallaxOptions {
        &self.options
    }

    pub fn transform(&self) -> Transform {
        self.last
    }

    /// True while a smoothing spring is still catching up.
    pub fn is_settling(&self) -> bool {
        self.spring.is_some_and(|s| !s.settled())
    }

    /// Raw translation for `progress` before smoothing.
    pub fn travel(&self, progress: f32) -> f32 {
        let extent = self.options.offset_px * self.options.speed;
        extent + (-extent - extent) * progress.clamp(0.0, 1.0)
    }

    /// Compute this frame's transform. `dt_ms` is the time since the last
    /// frame and only matters for smoothing.
    pub fn frame(&mut self, progress: f32, dt_ms: u64, visible: bool) -> Transform {
        if self.ctx.reduced_motion {
            self.last = Transform::IDENTITY;
            return self.last;
        }
        if self.options.only_when_visible && !visible {
            return self.last;
        }

        let p = progress.clamp(0.0, 1.0);
        let raw = self.travel(p);
        let offset = match self.spring.as_mut() {
            Some(spring) => {
                spring.set_target(raw);
                spring.step(dt_ms)
            }
            None => raw,
        };

        let (translate_x, translate_y) = match self.options.direction {
            ParallaxDirection::Up => (0.0, offset),
            ParallaxDirection::Down => (0.0, -offset),
            ParallaxDirection::Left => (offset, 0.0),
            ParallaxDirection::Right => (-offset, 0.0),
        };
        let scale = match self.options.scale {
            Some((from, to)) => from + (to - from) * p,
            None => 1.0,
        };
        let rotate = self.options.rotate.map_or(0.0, |deg| deg * p);

        self.last = Transform {
            translate_x,
            translate_y,
            scale,
            rotate,
        };
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_travel_runs_against_scroll() {
        let mut layer = ParallaxLayer::new(
            ParallaxOptions {
                speed: 0.5,
                offset_px: 100.0,
                ..Default::default()
            },
            MotionContext::default(),
        );
        assert_eq!(layer.frame(0.0, 16, true).translate_y, 50.0);
        assert_eq!(layer.frame(0.5, 16, true).translate_y, 0.0);
        assert_eq!(layer.frame(1.0, 16, true).translate_y, -50.0);
    }

    #[test]
    fn test_direction_picks_axis_and_sign() {
        let mut left = ParallaxLayer::new(
            ParallaxOptions {
                direction: ParallaxDirection::Left,
                ..Default::default()
            },
            MotionContext::default(),
        );
        let t = left.frame(0.0, 16, true);
        assert_eq!((t.translate_x, t.translate_y), (50.0, 0.0));

        let mut down = ParallaxLayer::new(
            ParallaxOptions {
                direction: ParallaxDirection::Down,
                ..Default::default()
            },
            MotionContext::default(),
        );
        assert_eq!(down.frame(0.0, 16, true).translate_y, -50.0);
    }

    #[test]
    fn test_compound_channels_share_progress() {
        let mut layer = ParallaxLayer::new(
            ParallaxOptions {
                scale: Some((1.0, 1.5)),
                rotate: Some(20.0),
                ..Default::default()
            },
            MotionContext::default(),
        );
        let t = layer.frame(0.5, 16, true);
        assert_eq!(t.scale, 1.25);
        assert_eq!(t.rotate, 10.0);
        assert_eq!(t.translate_y, 0.0);
    }

    #[test]
    fn test_smoothing_lags_then_settles() {
        let mut layer = ParallaxLayer::new(
            ParallaxOptions {
                smoothing: Some(SpringConfig::default()),
                ..Default::default()
            },
            MotionContext::default(),
        );
        let first = layer.frame(1.0, 16, true).translate_y;
        assert!(first > -50.0 && first < 50.0);
        assert!(layer.is_settling());

        let mut last = first;
        for _ in 0..300 {
            last = layer.frame(1.0, 16, true).translate_y;
        }
        assert_eq!(last, -50.0);
        assert!(!layer.is_settling());
    }

    #[test]
    fn test_frozen_while_hidden() {
        let mut layer = ParallaxLayer::new(
            ParallaxOptions {
                only_when_visible: true,
                ..Default::default()
            },
            MotionContext::default(),
        );
        let shown = layer.frame(0.25, 16, true);
        assert_eq!(layer.frame(0.9, 16, false), shown);
    }

    #[test]
    fn test_reduced_motion_is_identity() {
        let mut layer = ParallaxLayer::new(
            ParallaxOptions {
                scale: Some((0.5, 2.0)),
                ..Default::default()
            },
            MotionContext::reduced(),
        );
        assert_eq!(layer.frame(0.3, 16, true), Transform::IDENTITY);
    }

    #[test]
    fn test_element_progress_spans_full_transit() {
        let element = Rect::new(0.0, 2000.0, 800.0, 400.0);
        assert_eq!(element_progress(&element, 1200.0, 800.0), 0.0);
        assert_eq!(element_progress(&element, 1800.0, 800.0), 0.5);
        assert_eq!(element_progress(&element, 2400.0, 800.0), 1.0);
        assert_eq!(element_progress(&element, 9000.0, 800.0), 1.0);
    }
}
