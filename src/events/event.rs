use serde::{Deserialize, Serialize};

use crate::error::{MotionError, Result};
use crate::geometry::{Rect, Viewport};
use crate::motion::CountUpOptions;
use crate::parallax::ParallaxOptions;
use crate::reveal::RevealOptions;
use crate::stagger::StaggerOptions;

/// Keys with built-in scroll handling. Raw `KeyboardEvent.key` values are
/// accepted too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollKey {
    #[serde(alias = "Home")]
    Home,
    #[serde(alias = "End")]
    End,
}

/// What a mounted element does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComponentSpec {
    Reveal(RevealOptions),
    Stagger(StaggerOptions),
    Parallax(ParallaxOptions),
    Counter(CountUpOptions),
    /// Plain element, tracked only so anchor links can find it
    Target,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    // === Component lifecycle ===
    /// Element `id` mounted with the given behaviour
    Mount { id: String, component: ComponentSpec },
    /// Element `id` unmounted
    Unmount { id: String },
    /// New document-space geometry for element `id`
    Layout { id: String, rect: Rect },

    // === Window ===
    Resize {
        viewport: Viewport,
        document_height: f64,
    },
    Scroll { x: f64, y: f64 },
    /// The page became hidden or visible again
    VisibilityChange { hidden: bool },
    Unload,
    /// Animation frame tick
    Frame,

    // === Navigation ===
    RouteChange { path: String },
    Key { key: ScrollKey },
    AnchorClick { target_id: String },
}

/// An event stamped with the host time it happened at, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timed<E> {
    pub at_ms: u64,
    #[serde(flatten)]
    pub event: E,
}

impl<E> Timed<E> {
    pub fn new(at_ms: u64, event: E) -> Self {
        Self { at_ms, event }
    }
}

/// Parse a JSON-lines trace of timed events. Blank lines and lines starting
/// with `#` are skipped. Line numbers in errors are 1-based.
pub fn parse_trace(input: &str) -> Result<Vec<Timed<Event>>> {
    let mut events = Vec::new();
    for (index, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let timed = serde_json::from_str(line).map_err(|source| MotionError::Trace {
            line: index + 1,
            source,
        })?;
        events.push(timed);
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::VariantName;

    #[test]
    fn test_parse_trace_line() {
        let line = r#"{"at_ms": 120, "type": "scroll", "x": 0, "y": 340.5}"#;
        let timed: Timed<Event> = serde_json::from_str(line).unwrap();
        assert_eq!(timed.at_ms, 120);
        assert_eq!(timed.event, Event::Scroll { x: 0.0, y: 340.5 });
    }

    #[test]
    fn test_parse_mount_with_partial_options() {
        let line = r#"{"at_ms": 0, "type": "mount", "id": "hero",
            "component": {"kind": "reveal", "variant": "scale-up", "delay_ms": 200}}"#;
        let timed: Timed<Event> = serde_json::from_str(line).unwrap();
        let Event::Mount { id, component } = timed.event else {
            panic!("expected mount");
        };
        assert_eq!(id, "hero");
        let ComponentSpec::Reveal(options) = component else {
            panic!("expected reveal");
        };
        assert_eq!(options.variant, VariantName::ScaleUp);
        assert_eq!(options.delay_ms, 200);
        assert_eq!(options.threshold, 0.1);
    }

    #[test]
    fn test_unknown_variant_mounts_with_default() {
        let trace = r#"{"at_ms":0,"type":"mount","id":"hero","component":{"kind":"reveal","variant":"doesNotExist"}}
{"at_ms":0,"type":"mount","id":"list","component":{"kind":"stagger","item_count":2,"variant":"slideUp"}}"#;
        let events = parse_trace(trace).unwrap();
        assert_eq!(events.len(), 2);

        let Event::Mount {
            component: ComponentSpec::Reveal(reveal),
            ..
        } = &events[0].event
        else {
            panic!("expected reveal mount");
        };
        assert_eq!(reveal.variant, VariantName::FadeUp);

        let Event::Mount {
            component: ComponentSpec::Stagger(stagger),
            ..
        } = &events[1].event
        else {
            panic!("expected stagger mount");
        };
        assert_eq!(stagger.variant, VariantName::SlideUp);
    }

    #[test]
    fn test_parse_trace_skips_comments_and_reports_bad_lines() {
        let trace = "# warm-up\n\n{\"at_ms\": 0, \"type\": \"frame\"}\n{\"at_ms\": 16, \"type\": \"unload\"}\n";
        let events = parse_trace(trace).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], Timed::new(16, Event::Unload));

        let err = parse_trace("{\"at_ms\": 0, \"type\": \"frame\"}\n{\"type\": \"teleport\"}").unwrap_err();
        assert!(matches!(err, MotionError::Trace { line: 2, .. }));
    }

    #[test]
    fn test_key_names() {
        let events = parse_trace(
            "{\"at_ms\": 0, \"type\": \"key\", \"key\": \"End\"}\n{\"at_ms\": 1, \"type\": \"key\", \"key\": \"home\"}",
        )
        .unwrap();
        assert_eq!(events[0].event, Event::Key { key: ScrollKey::End });
        assert_eq!(events[1].event, Event::Key { key: ScrollKey::Home });
        assert!(parse_trace("{\"at_ms\": 0, \"type\": \"key\", \"key\": \"PageDown\"}").is_err());
    }
}
