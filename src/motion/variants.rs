//! Named hidden/visible style pairs for reveal animations.
//!
//! Every `VariantName` maps to a complete `Variant` through an exhaustive
//! match, so there is no lookup that can come back empty. String names coming
//! from markup, traces or configuration go through [`VariantName::lenient`]
//! (also used by `Deserialize`), which falls back to [`VariantName::FadeUp`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use super::{Easing, MotionContext};
use crate::log;

/// Transition length used for every variant under reduced motion.
pub const REDUCED_MOTION_DURATION_S: f32 = 0.01;

/// Animatable style state of one element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StyleProps {
    pub opacity: f32,
    /// Horizontal translation in px.
    pub x: f32,
    /// Vertical translation in px.
    pub y: f32,
    pub scale: f32,
    /// Rotation in degrees.
    pub rotate: f32,
    /// Blur radius in px.
    pub blur: f32,
}

impl StyleProps {
    pub const VISIBLE: StyleProps = StyleProps {
        opacity: 1.0,
        x: 0.0,
        y: 0.0,
        scale: 1.0,
        rotate: 0.0,
        blur: 0.0,
    };

    const fn hidden() -> StyleProps {
        StyleProps {
            opacity: 0.0,
            ..StyleProps::VISIBLE
        }
    }

    pub fn lerp(&self, to: &StyleProps, t: f32) -> StyleProps {
        let mix = |a: f32, b: f32| a + (b - a) * t;
        StyleProps {
            opacity: mix(self.opacity, to.opacity),
            x: mix(self.x, to.x),
            y: mix(self.y, to.y),
            scale: mix(self.scale, to.scale),
            rotate: mix(self.rotate, to.rotate),
            blur: mix(self.blur, to.blur),
        }
    }

    /// CSS `transform` value for this state.
    pub fn transform_css(&self) -> String {
        format!(
            "translate3d({}px, {}px, 0) scale({}) rotate({}deg)",
            self.x, self.y, self.scale, self.rotate
        )
    }
}

impl Default for StyleProps {
    fn default() -> Self {
        StyleProps::VISIBLE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub duration_s: f32,
    pub delay_s: f32,
    pub easing: Easing,
}

impl Transition {
    const fn new(duration_s: f32, easing: Easing) -> Self {
        Self {
            duration_s,
            delay_s: 0.0,
            easing,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        (self.duration_s.max(0.0) * 1000.0).round() as u64
    }

    pub fn delay_ms(&self) -> u64 {
        (self.delay_s.max(0.0) * 1000.0).round() as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub name: VariantName,
    pub hidden: StyleProps,
    pub visible: StyleProps,
    pub transition: Transition,
}

impl Variant {
    /// Adjust the variant for the active preferences.
    ///
    /// Under reduced motion the transition becomes near-instant and linear,
    /// and every positional, scale, rotation and blur delta in `hidden` is
    /// collapsed onto `visible`. Only the opacity change survives.
    pub fn for_context(&self, ctx: &MotionContext) -> Variant {
        if !ctx.reduced_motion {
            return *self;
        }
        Variant {
            name: self.name,
            hidden: StyleProps {
                opacity: self.hidden.opacity,
                ..self.visible
            },
            visible: self.visible,
            transition: Transition::new(REDUCED_MOTION_DURATION_S, Easing::Linear),
        }
    }

    /// Style at eased progress `t` between hidden (0) and visible (1).
    pub fn style_at(&self, t: f32) -> StyleProps {
        self.hidden.lerp(&self.visible, t.clamp(0.0, 1.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariantName {
    #[default]
    FadeUp,
    FadeDown,
    FadeLeft,
    FadeRight,
    FadeIn,
    ScaleUp,
    ScaleDown,
    ZoomIn,
    RotateIn,
    SlideUp,
    SlideDown,
    BlurIn,
}

impl VariantName {
    pub const ALL: [VariantName; 12] = [
        VariantName::FadeUp,
        VariantName::FadeDown,
        VariantName::FadeLeft,
        VariantName::FadeRight,
        VariantName::FadeIn,
        VariantName::ScaleUp,
        VariantName::ScaleDown,
        VariantName::ZoomIn,
        VariantName::RotateIn,
        VariantName::SlideUp,
        VariantName::SlideDown,
        VariantName::BlurIn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VariantName::FadeUp => "fade-up",
            VariantName::FadeDown => "fade-down",
            VariantName::FadeLeft => "fade-left",
            VariantName::FadeRight => "fade-right",
            VariantName::FadeIn => "fade-in",
            VariantName::ScaleUp => "scale-up",
            VariantName::ScaleDown => "scale-down",
            VariantName::ZoomIn => "zoom-in",
            VariantName::RotateIn => "rotate-in",
            VariantName::SlideUp => "slide-up",
            VariantName::SlideDown => "slide-down",
            VariantName::BlurIn => "blur-in",
        }
    }

    pub fn variant(&self) -> Variant {
        let hidden = StyleProps::hidden();
        let (hidden, transition) = match self {
            VariantName::FadeUp => (
                StyleProps { y: 40.0, ..hidden },
                Transition::new(0.6, Easing::SMOOTH),
            ),
            VariantName::FadeDown => (
                StyleProps { y: -40.0, ..hidden },
                Transition::new(0.6, Easing::SMOOTH),
            ),
            VariantName::FadeLeft => (
                StyleProps { x: -40.0, ..hidden },
                Transition::new(0.6, Easing::SMOOTH),
            ),
            VariantName::FadeRight => (
                StyleProps { x: 40.0, ..hidden },
                Transition::new(0.6, Easing::SMOOTH),
            ),
            VariantName::FadeIn => (hidden, Transition::new(0.5, Easing::EaseOut)),
            VariantName::ScaleUp => (
                StyleProps {
                    scale: 0.8,
                    ..hidden
                },
                Transition::new(0.5, Easing::SMOOTH),
            ),
            VariantName::ScaleDown => (
                StyleProps {
                    scale: 1.2,
                    ..hidden
                },
                Transition::new(0.5, Easing::SMOOTH),
            ),
            VariantName::ZoomIn => (
                StyleProps {
                    scale: 0.5,
                    ..hidden
                },
                Transition::new(0.5, Easing::EaseOut),
            ),
            VariantName::RotateIn => (
                StyleProps {
                    rotate: -10.0,
                    scale: 0.9,
                    ..hidden
                },
                Transition::new(0.7, Easing::SMOOTH),
            ),
            VariantName::SlideUp => (
                StyleProps {
                    y: 100.0,
                    ..hidden
                },
                Transition::new(0.8, Easing::CubicBezier(0.16, 1.0, 0.3, 1.0)),
            ),
            VariantName::SlideDown => (
                StyleProps {
                    y: -100.0,
                    ..hidden
                },
                Transition::new(0.8, Easing::CubicBezier(0.16, 1.0, 0.3, 1.0)),
            ),
            VariantName::BlurIn => (
                StyleProps {
                    blur: 10.0,
                    ..hidden
                },
                Transition::new(0.6, Easing::EaseOut),
            ),
        };

        Variant {
            name: *self,
            hidden,
            visible: StyleProps::VISIBLE,
            transition,
        }
    }
}

impl fmt::Display for VariantName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown animation variant '{}'", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

impl FromStr for VariantName {
    type Err = UnknownVariant;

    /// Accepts `fade-up`, `fade_up`, `fadeUp` and `FadeUp` alike.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        VariantName::ALL
            .into_iter()
            .find(|name| name.as_str().replace('-', "") == key)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

impl VariantName {
    /// Parse a name, falling back to the default for unknown names.
    pub fn lenient(name: &str) -> VariantName {
        name.parse().unwrap_or_else(|err: UnknownVariant| {
            log::debug(&format!("{}, using {}", err, VariantName::default()));
            VariantName::default()
        })
    }
}

/// Names in traces and config never fail to load; unknown ones become the default.
impl<'de> Deserialize<'de> for VariantName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(VariantName::lenient(&name))
    }
}

/// Resolve a variant by name, falling back to the default variant.
pub fn resolve(name: &str) -> Variant {
    VariantName::lenient(name).variant()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_name_falls_back_to_default() {
        let variant = resolve("doesNotExist");
        assert_eq!(variant.name, VariantName::FadeUp);
        assert_eq!(variant.hidden.opacity, 0.0);
        assert_eq!(variant.hidden.y, 40.0);
        assert_eq!(variant.visible, StyleProps::VISIBLE);
    }

    #[test]
    fn test_deserialize_accepts_any_spelling_and_falls_back() {
        let names: Vec<VariantName> =
            serde_json::from_str(r#"["zoom-in", "rotateIn", "blur_in", "doesNotExist"]"#).unwrap();
        assert_eq!(
            names,
            vec![
                VariantName::ZoomIn,
                VariantName::RotateIn,
                VariantName::BlurIn,
                VariantName::FadeUp,
            ]
        );
        assert!(serde_json::from_str::<VariantName>("42").is_err());
    }

    #[test]
    fn test_name_spellings_resolve() {
        assert_eq!(resolve("scale-up").name, VariantName::ScaleUp);
        assert_eq!(resolve("scaleUp").name, VariantName::ScaleUp);
        assert_eq!(resolve("SCALE_UP").name, VariantName::ScaleUp);
        assert_eq!(resolve("blurIn").name, VariantName::BlurIn);
    }

    #[test]
    fn test_every_variant_ends_fully_visible() {
        for name in VariantName::ALL {
            let variant = name.variant();
            assert_eq!(variant.visible, StyleProps::VISIBLE, "{}", name);
            assert!(variant.transition.duration_s > 0.0);
            assert_eq!(name.as_str().parse::<VariantName>(), Ok(name));
        }
    }

    #[test]
    fn test_reduced_motion_neutralizes_every_variant() {
        let ctx = MotionContext::reduced();
        for name in VariantName::ALL {
            let variant = name.variant().for_context(&ctx);
            assert!(variant.transition.duration_ms() <= 10);
            assert_eq!(variant.transition.easing, Easing::Linear);
            assert_eq!(variant.hidden.x, 0.0);
            assert_eq!(variant.hidden.y, 0.0);
            assert_eq!(variant.hidden.scale, 1.0);
            assert_eq!(variant.hidden.rotate, 0.0);
            assert_eq!(variant.hidden.blur, 0.0);
        }
    }

    #[test]
    fn test_style_at_interpolates() {
        let variant = VariantName::FadeUp.variant();
        let mid = variant.style_at(0.5);
        assert_eq!(mid.opacity, 0.5);
        assert_eq!(mid.y, 20.0);
        assert_eq!(variant.style_at(2.0), StyleProps::VISIBLE);
    }

    #[test]
    fn test_unknown_variant_is_logged_in_debug_builds() {
        log::start_capture();
        resolve("wobble");
        let lines = log::take_capture();
        if cfg!(debug_assertions) {
            assert!(lines.iter().any(|l| l.contains("wobble")));
        } else {
            assert!(lines.is_empty());
        }
    }
}
