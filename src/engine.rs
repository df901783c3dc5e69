//! The engine: every component wired to one stream of host events.
//!
//! Each `handle` call first fires timers that fell due before the event,
//! applies the event, then fires anything the event itself made due (a
//! zero-delay reveal under reduced motion, for instance). Between events the
//! host only has to call `advance` at `next_deadline()`.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::events::{Command, ComponentSpec, Event, Timed};
use crate::geometry::{Rect, ScrollMetrics};
use crate::log;
use crate::motion::{CountUp, MotionContext, StyleProps};
use crate::navigation::{Navigator, ProgressIndicator, ProgressView, ScrollInitOptions};
use crate::parallax::{ParallaxLayer, ProgressSource, Transform, element_progress};
use crate::persistence::{
    PositionCache, RestorationEvent, RestorationOptions, RestorationState, ScrollRestoration,
    SharedStore,
};
use crate::reveal::{Reveal, RevealPhase};
use crate::scroll::{ScrollSample, ScrollSnapshot, ScrollTracker, TrackerOptions};
use crate::stagger::StaggerSequencer;
use crate::visibility::{Crossing, ObservationId, ObserverRegistry, VisibilityOptions};

/// Everything the engine needs to know up front.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub context: MotionContext,
    pub tracker: TrackerOptions,
    pub restoration: RestorationOptions,
    pub scroll_init: ScrollInitOptions,
    pub progress: ProgressIndicator,
    /// Applied to every visibility observation.
    pub root_margin_px: f64,
    /// Prefix for keys in session storage.
    pub namespace: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            context: MotionContext::default(),
            tracker: TrackerOptions::default(),
            restoration: RestorationOptions::default(),
            scroll_init: ScrollInitOptions::default(),
            progress: ProgressIndicator::default(),
            root_margin_px: 0.0,
            namespace: "scrollcue".to_string(),
        }
    }
}

#[derive(Debug)]
enum Component {
    Reveal(Reveal),
    Stagger(StaggerSequencer),
    Parallax(ParallaxLayer),
    Counter(CountUp),
    Target,
}

#[derive(Debug)]
struct Mounted {
    observation: Option<ObservationId>,
    rect: Option<Rect>,
    component: Component,
}

/// Serializable view of one mounted component.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComponentReport {
    Reveal { phase: RevealPhase, style: StyleProps },
    Stagger { revealed: Vec<bool> },
    Parallax { transform: Transform },
    Counter { value: f64 },
    Target,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineReport {
    pub at_ms: u64,
    pub scroll: ScrollSnapshot,
    pub progress: ProgressView,
    pub route: Option<String>,
    pub restoring: bool,
    pub live_observations: usize,
    pub components: BTreeMap<String, ComponentReport>,
}

pub struct MotionEngine {
    settings: EngineSettings,
    tracker: ScrollTracker,
    metrics: ScrollMetrics,
    /// Latest raw offset, unthrottled. Visibility is evaluated against it.
    scroll: (f64, f64),
    observers: ObserverRegistry,
    components: BTreeMap<String, Mounted>,
    observed: HashMap<ObservationId, String>,
    restoration: ScrollRestoration,
    navigator: Navigator,
    last_frame_ms: Option<u64>,
    now_ms: u64,
}

impl MotionEngine {
    pub fn new(settings: EngineSettings, store: SharedStore) -> Self {
        let restoration_options = RestorationOptions {
            enabled: settings.restoration.enabled && settings.scroll_init.enable_scroll_restoration,
            ..settings.restoration
        };
        let cache = PositionCache::new(store, &settings.namespace);

        Self {
            tracker: ScrollTracker::new(settings.tracker),
            metrics: ScrollMetrics::default(),
            scroll: (0.0, 0.0),
            observers: ObserverRegistry::new(),
            components: BTreeMap::new(),
            observed: HashMap::new(),
            restoration: ScrollRestoration::new(restoration_options, cache),
            navigator: Navigator::new(settings.scroll_init, settings.context),
            last_frame_ms: None,
            now_ms: 0,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn context(&self) -> MotionContext {
        self.settings.context
    }

    /// Latest host time seen.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn handle(&mut self, timed: Timed<Event>) -> Vec<Command> {
        let now = timed.at_ms;
        if now < self.now_ms {
            log::warn(&format!(
                "Event at {}ms arrived after {}ms, treating as current",
                now, self.now_ms
            ));
        }
        let now = now.max(self.now_ms);

        let mut commands = self.advance(now);
        commands.extend(self.apply(now, timed.event));
        commands.extend(self.advance(now));
        commands
    }

    fn apply(&mut self, now: u64, event: Event) -> Vec<Command> {
        match event {
            Event::Mount { id, component } => {
                self.mount(id, component);
                vec![]
            }
            Event::Unmount { id } => {
                if !self.unmount(&id) {
                    log::warn(&format!("Unmount of unknown element '{}'", id));
                }
                vec![]
            }
            Event::Layout { id, rect } => {
                self.layout(now, &id, rect);
                vec![]
            }
            Event::Resize {
                viewport,
                document_height,
            } => {
                self.metrics = ScrollMetrics::new(viewport, document_height);
                self.tracker.invalidate_metrics();
                self.evaluate_all(now);
                vec![]
            }
            Event::Scroll { x, y } => {
                self.scroll = (x, y);
                self.tracker.record(ScrollSample::new(x, y, now), &self.metrics);
                self.evaluate_all(now);
                self.restoration.handle(now, RestorationEvent::Scroll { x, y })
            }
            Event::VisibilityChange { hidden } => {
                if hidden {
                    self.restoration.handle(now, RestorationEvent::VisibilityHidden)
                } else {
                    vec![]
                }
            }
            Event::Unload => self.restoration.handle(now, RestorationEvent::Unload),
            Event::Frame => {
                self.frame(now);
                vec![]
            }
            Event::RouteChange { path } => {
                self.restoration.handle(now, RestorationEvent::RouteChange { path })
            }
            Event::Key { key } => vec![self.navigator.key(key, &self.metrics)],
            Event::AnchorClick { target_id } => {
                let rect = self.components.get(&target_id).and_then(|m| m.rect);
                self.navigator.anchor_click(&target_id, rect.as_ref())
            }
        }
    }

    /// Fire every timer due at `now_ms`.
    pub fn advance(&mut self, now_ms: u64) -> Vec<Command> {
        self.now_ms = self.now_ms.max(now_ms);

        if self.tracker.pending_deadline().is_some_and(|due| due <= now_ms) {
            self.tracker.flush(&self.metrics);
        }

        for (id, mounted) in self.components.iter_mut() {
            match &mut mounted.component {
                Component::Reveal(reveal) => {
                    if reveal.advance(now_ms) {
                        log::debug(&format!("{}: reveal started at {}ms", id, now_ms));
                    }
                }
                Component::Stagger(stagger) => {
                    let fired = stagger.advance(now_ms);
                    if !fired.is_empty() {
                        log::debug(&format!("{}: revealed items {:?} at {}ms", id, fired, now_ms));
                    }
                }
                Component::Parallax(_) | Component::Counter(_) | Component::Target => {}
            }
        }
        self.restoration.advance(now_ms)
    }

    /// Earliest pending timer across all components.
    pub fn next_deadline(&self) -> Option<u64> {
        let components = self.components.values().filter_map(|m| match &m.component {
            Component::Reveal(reveal) => reveal.next_deadline(),
            Component::Stagger(stagger) => stagger.next_deadline(),
            Component::Parallax(_) | Component::Counter(_) | Component::Target => None,
        });
        components
            .chain(self.restoration.next_deadline())
            .chain(self.tracker.pending_deadline())
            .min()
    }

    fn mount(&mut self, id: String, component: ComponentSpec) {
        if self.unmount(&id) {
            log::warn(&format!("Element '{}' mounted twice, replacing", id));
        }

        let ctx = self.settings.context;
        let (visibility, component) = match component {
            ComponentSpec::Reveal(options) => {
                (Some(options.visibility()), Component::Reveal(Reveal::new(options, ctx)))
            }
            ComponentSpec::Stagger(options) => (
                Some(options.visibility()),
                Component::Stagger(StaggerSequencer::new(options, ctx)),
            ),
            ComponentSpec::Parallax(options) => (
                Some(options.visibility()),
                Component::Parallax(ParallaxLayer::new(options, ctx)),
            ),
            ComponentSpec::Counter(options) => (
                Some(VisibilityOptions::default()),
                Component::Counter(CountUp::new(options)),
            ),
            ComponentSpec::Target => (None, Component::Target),
        };

        let observation = visibility.map(|options| {
            let observation = self.observers.register(VisibilityOptions {
                root_margin_px: self.settings.root_margin_px,
                ..options
            });
            self.observed.insert(observation, id.clone());
            observation
        });

        self.components.insert(
            id,
            Mounted {
                observation,
                rect: None,
                component,
            },
        );
    }

    /// Remove a component, cancelling its timers and its observation.
    fn unmount(&mut self, id: &str) -> bool {
        let Some(mut mounted) = self.components.remove(id) else {
            return false;
        };
        if let Some(observation) = mounted.observation {
            self.observers.unregister(observation);
            self.observed.remove(&observation);
        }
        match &mut mounted.component {
            Component::Reveal(reveal) => {
                reveal.dispose();
            }
            Component::Stagger(stagger) => {
                let cancelled = stagger.dispose();
                if cancelled > 0 {
                    log::debug(&format!("{}: cancelled {} pending reveals", id, cancelled));
                }
            }
            Component::Parallax(_) | Component::Counter(_) | Component::Target => {}
        }
        true
    }

    fn layout(&mut self, now: u64, id: &str, rect: Rect) {
        let Some(mounted) = self.components.get_mut(id) else {
            log::warn(&format!("Layout for unknown element '{}'", id));
            return;
        };
        mounted.rect = Some(rect);
        let Some(observation) = mounted.observation else {
            return;
        };

        self.observers.set_target(observation, rect);
        if let Some(crossing) = self.observers.evaluate(observation, self.scroll, &self.metrics) {
            self.dispatch(now, observation, crossing);
        }
    }

    fn evaluate_all(&mut self, now: u64) {
        for (observation, crossing) in self.observers.evaluate_all(self.scroll, &self.metrics) {
            self.dispatch(now, observation, crossing);
        }
    }

    fn dispatch(&mut self, now: u64, observation: ObservationId, crossing: Crossing) {
        let Some(mounted) = self
            .observed
            .get(&observation)
            .and_then(|id| self.components.get_mut(id))
        else {
            return;
        };

        let visible = crossing == Crossing::Entered;
        match &mut mounted.component {
            Component::Reveal(reveal) => reveal.on_visibility(now, visible),
            Component::Stagger(stagger) => stagger.on_visibility(now, visible),
            Component::Counter(counter) => {
                if visible {
                    counter.start(now, &self.settings.context);
                }
            }
            // Parallax reads visibility on each frame
            Component::Parallax(_) | Component::Target => {}
        }
    }

    fn frame(&mut self, now: u64) {
        self.tracker.flush(&self.metrics);
        let dt = self
            .last_frame_ms
            .map_or(0, |last| now.saturating_sub(last));
        self.last_frame_ms = Some(now);

        let snapshot = self.tracker.snapshot();
        let global = (snapshot.progress / 100.0) as f32;
        let viewport_height = self.metrics.viewport.height;

        for mounted in self.components.values_mut() {
            let Component::Parallax(layer) = &mut mounted.component else {
                continue;
            };
            let progress = match (layer.options().source, mounted.rect) {
                (ProgressSource::Global, _) => global,
                (ProgressSource::Element, Some(rect)) => {
                    element_progress(&rect, snapshot.y, viewport_height) as f32
                }
                // Not laid out yet
                (ProgressSource::Element, None) => continue,
            };
            let visible = mounted
                .observation
                .and_then(|o| self.observers.detector(o))
                .is_some_and(|d| d.is_visible());
            layer.frame(progress, dt, visible);
        }
    }

    // === Read accessors ===

    pub fn snapshot(&self) -> ScrollSnapshot {
        self.tracker.snapshot()
    }

    pub fn metrics(&self) -> &ScrollMetrics {
        &self.metrics
    }

    pub fn progress_view(&self) -> ProgressView {
        self.settings.progress.view(&self.tracker.snapshot())
    }

    pub fn restoration_state(&self) -> &RestorationState {
        self.restoration.state()
    }

    /// Clear the saved position of one route.
    pub fn clear_saved_position(&self, route: &str) -> bool {
        self.restoration.clear(route)
    }

    pub fn clear_saved_positions(&self) -> bool {
        self.restoration.clear_all()
    }

    pub fn is_mounted(&self, id: &str) -> bool {
        self.components.contains_key(id)
    }

    pub fn live_observations(&self) -> usize {
        self.observers.live()
    }

    pub fn is_visible(&self, id: &str) -> Option<bool> {
        let observation = self.components.get(id)?.observation?;
        self.observers.detector(observation).map(|d| d.is_visible())
    }

    pub fn style(&self, id: &str, now_ms: u64) -> Option<StyleProps> {
        match &self.components.get(id)?.component {
            Component::Reveal(reveal) => Some(reveal.style(now_ms)),
            _ => None,
        }
    }

    pub fn reveal_phase(&self, id: &str, now_ms: u64) -> Option<RevealPhase> {
        match &self.components.get(id)?.component {
            Component::Reveal(reveal) => Some(reveal.phase(now_ms)),
            _ => None,
        }
    }

    pub fn revealed_flags(&self, id: &str) -> Option<Vec<bool>> {
        match &self.components.get(id)?.component {
            Component::Stagger(stagger) => Some(stagger.revealed_flags()),
            _ => None,
        }
    }

    pub fn item_styles(&self, id: &str, now_ms: u64) -> Option<Vec<StyleProps>> {
        match &self.components.get(id)?.component {
            Component::Stagger(stagger) => Some(
                (0..stagger.item_count())
                    .map(|i| stagger.item_style(i, now_ms))
                    .collect(),
            ),
            _ => None,
        }
    }

    pub fn transform(&self, id: &str) -> Option<Transform> {
        match &self.components.get(id)?.component {
            Component::Parallax(layer) => Some(layer.transform()),
            _ => None,
        }
    }

    pub fn counter_value(&self, id: &str, now_ms: u64) -> Option<f64> {
        match &self.components.get(id)?.component {
            Component::Counter(counter) => Some(counter.value(now_ms)),
            _ => None,
        }
    }

    pub fn report(&self) -> EngineReport {
        let now = self.now_ms;
        let components = self
            .components
            .iter()
            .map(|(id, mounted)| {
                let report = match &mounted.component {
                    Component::Reveal(reveal) => ComponentReport::Reveal {
                        phase: reveal.phase(now),
                        style: reveal.style(now),
                    },
                    Component::Stagger(stagger) => ComponentReport::Stagger {
                        revealed: stagger.revealed_flags(),
                    },
                    Component::Parallax(layer) => ComponentReport::Parallax {
                        transform: layer.transform(),
                    },
                    Component::Counter(counter) => ComponentReport::Counter {
                        value: counter.value(now),
                    },
                    Component::Target => ComponentReport::Target,
                };
                (id.clone(), report)
            })
            .collect();

        EngineReport {
            at_ms: now,
            scroll: self.tracker.snapshot(),
            progress: self.progress_view(),
            route: self.restoration.state().route().map(str::to_string),
            restoring: self.restoration.is_restoring(),
            live_observations: self.observers.live(),
            components,
        }
    }

    /// Unmount everything and flush the pending position save.
    pub fn shutdown(&mut self) {
        self.restoration.flush();
        self.restoration.dispose();
        let ids: Vec<String> = self.components.keys().cloned().collect();
        for id in ids {
            self.unmount(&id);
        }
    }
}

impl std::fmt::Debug for MotionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionEngine")
            .field("now_ms", &self.now_ms)
            .field("components", &self.components.len())
            .field("restoration", self.restoration.state())
            .finish()
    }
}

impl Drop for MotionEngine {
    fn drop(&mut self) {
        let ids: Vec<String> = self.components.keys().cloned().collect();
        for id in ids {
            self.unmount(&id);
        }
    }
}
