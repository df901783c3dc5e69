//! Save-and-restore of scroll offsets as a state machine.
//!
//! ```text
//!            RouteChange (nothing saved)
//!   Idle ───────────────────────────────▶ Tracking ◀─────────────┐
//!     │                                     │  ▲                 │
//!     │ RouteChange (saved position)        │  │ RouteChange     │ grace elapsed
//!     ▼                                     ▼  │ (nothing saved) │
//!   Restoring ◀──────────────────────── RouteChange (saved) ─────┘
//!     │ settle elapsed: ScrollTo(saved, instant), start grace
//! ```
//!
//! Scroll writes are only ever persisted from `Tracking`. While `Restoring`,
//! including the grace window after the restoring scroll, offsets are noted
//! but never written, so the restoration cannot overwrite its own source.

use serde::{Deserialize, Serialize};

use super::cache::{PositionCache, SavedScrollPosition, route_key};
use crate::events::{Command, ScrollBehavior};
use crate::log;
use crate::scheduler::{Scheduler, TaskHandle};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestorationOptions {
    pub enabled: bool,
    /// Wait before restoring so late layout (images, fonts) can settle.
    pub settle_delay_ms: u64,
    /// Window after the restoring scroll during which writes are ignored.
    pub grace_ms: u64,
    pub save_debounce_ms: u64,
}

impl Default for RestorationOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            settle_delay_ms: 100,
            grace_ms: 150,
            save_debounce_ms: 150,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RestorationState {
    Idle,
    Tracking {
        route: String,
    },
    Restoring {
        route: String,
        target: SavedScrollPosition,
    },
}

impl RestorationState {
    pub fn route(&self) -> Option<&str> {
        match self {
            RestorationState::Idle => None,
            RestorationState::Tracking { route } | RestorationState::Restoring { route, .. } => {
                Some(route)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RestorationEvent {
    Scroll { x: f64, y: f64 },
    RouteChange { path: String },
    VisibilityHidden,
    Unload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timer {
    Settle,
    Grace,
    SaveDebounce,
}

#[derive(Debug)]
pub struct ScrollRestoration {
    options: RestorationOptions,
    cache: PositionCache,
    state: RestorationState,
    last_offset: SavedScrollPosition,
    scheduler: Scheduler<Timer>,
    debounce: Option<TaskHandle>,
    phase_timer: Option<TaskHandle>,
}

impl ScrollRestoration {
    pub fn new(options: RestorationOptions, cache: PositionCache) -> Self {
        Self {
            options,
            cache,
            state: RestorationState::Idle,
            last_offset: SavedScrollPosition::new(0.0, 0.0),
            scheduler: Scheduler::new(),
            debounce: None,
            phase_timer: None,
        }
    }

    pub fn state(&self) -> &RestorationState {
        &self.state
    }

    pub fn is_restoring(&self) -> bool {
        matches!(self.state, RestorationState::Restoring { .. })
    }

    pub fn cache(&self) -> &PositionCache {
        &self.cache
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.scheduler.next_deadline()
    }

    pub fn handle(&mut self, now_ms: u64, event: RestorationEvent) -> Vec<Command> {
        if !self.options.enabled {
            return vec![];
        }

        match event {
            RestorationEvent::Scroll { x, y } => {
                self.last_offset = SavedScrollPosition::new(x, y);
                if matches!(self.state, RestorationState::Tracking { .. }) {
                    if let Some(handle) = self.debounce.take() {
                        self.scheduler.cancel(handle);
                    }
                    self.debounce = Some(self.scheduler.schedule(
                        now_ms,
                        self.options.save_debounce_ms,
                        Timer::SaveDebounce,
                    ));
                }
            }
            RestorationEvent::RouteChange { path } => {
                let route = route_key(&path);
                if self.state.route() == Some(route) {
                    // Same page, only the fragment changed
                    return vec![];
                }
                self.flush();
                self.dispose();
                self.enter(now_ms, route.to_string());
            }
            RestorationEvent::VisibilityHidden | RestorationEvent::Unload => {
                self.flush();
            }
        }
        vec![]
    }

    /// Fire due timers.
    pub fn advance(&mut self, now_ms: u64) -> Vec<Command> {
        let mut commands = vec![];

        for timer in self.scheduler.due(now_ms) {
            match (timer, &self.state) {
                (Timer::Settle, RestorationState::Restoring { target, .. }) => {
                    let target = *target;
                    commands.push(Command::ScrollTo {
                        x: target.x,
                        y: target.y,
                        behavior: ScrollBehavior::Instant,
                    });
                    self.last_offset = target;
                    self.phase_timer =
                        Some(
                            self.scheduler
                                .schedule(now_ms, self.options.grace_ms, Timer::Grace),
                        );
                }
                (Timer::Grace, RestorationState::Restoring { route, .. }) => {
                    self.phase_timer = None;
                    self.state = RestorationState::Tracking {
                        route: route.clone(),
                    };
                }
                (Timer::SaveDebounce, RestorationState::Tracking { route }) => {
                    let route = route.clone();
                    self.debounce = None;
                    self.save(&route);
                }
                (timer, state) => {
                    log::debug(&format!("Ignoring {:?} timer in state {:?}", timer, state));
                }
            }
        }
        commands
    }

    /// Persist the current offset immediately (page hide, unload, leaving
    /// the route). Pending debounced writes are superseded.
    pub fn flush(&mut self) {
        if let Some(handle) = self.debounce.take() {
            self.scheduler.cancel(handle);
        }
        if let RestorationState::Tracking { route } = &self.state {
            let route = route.clone();
            self.save(&route);
        }
    }

    /// Forget the saved position for one route.
    pub fn clear(&self, route: &str) -> bool {
        match self.cache.remove(route) {
            Ok(()) => true,
            Err(err) => {
                log::warn(&format!("Failed to clear scroll position for {}: {}", route, err));
                false
            }
        }
    }

    /// Forget every saved position.
    pub fn clear_all(&self) -> bool {
        match self.cache.clear_all() {
            Ok(()) => true,
            Err(err) => {
                log::warn(&format!("Failed to clear scroll positions: {}", err));
                false
            }
        }
    }

    /// Cancel every pending timer.
    pub fn dispose(&mut self) {
        self.debounce = None;
        self.phase_timer = None;
        self.scheduler.cancel_all();
    }

    fn enter(&mut self, now_ms: u64, route: String) {
        self.last_offset = SavedScrollPosition::new(0.0, 0.0);
        match self.load(&route) {
            Some(target) => {
                self.state = RestorationState::Restoring { route, target };
                self.phase_timer = Some(self.scheduler.schedule(
                    now_ms,
                    self.options.settle_delay_ms,
                    Timer::Settle,
                ));
            }
            None => {
                self.state = RestorationState::Tracking { route };
            }
        }
    }

    fn save(&self, route: &str) {
        if let Err(err) = self.cache.save(route, self.last_offset) {
            log::warn(&format!("Failed to save scroll position for {}: {}", route, err));
        }
    }

    fn load(&self, route: &str) -> Option<SavedScrollPosition> {
        match self.cache.load(route) {
            Ok(saved) => saved,
            Err(err) => {
                log::warn(&format!("Failed to load scroll position for {}: {}", route, err));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StorageError, StorageResult};
    use crate::persistence::{MemoryStore, SessionStore, SharedStore};
    use std::sync::Arc;

    fn restoration(store: SharedStore) -> ScrollRestoration {
        ScrollRestoration::new(
            RestorationOptions::default(),
            PositionCache::new(store, "test"),
        )
    }

    fn route(path: &str) -> RestorationEvent {
        RestorationEvent::RouteChange {
            path: path.to_string(),
        }
    }

    fn scroll(x: f64, y: f64) -> RestorationEvent {
        RestorationEvent::Scroll { x, y }
    }

    #[test]
    fn test_debounced_save_waits_for_quiet() {
        let store = MemoryStore::new();
        let mut r = restoration(Arc::new(store.clone()));
        r.handle(0, route("/projects"));

        r.handle(10, scroll(0.0, 100.0));
        r.handle(100, scroll(0.0, 200.0));
        r.advance(200);
        assert_eq!(r.cache().load("/projects").unwrap(), None);

        r.advance(250);
        assert_eq!(
            r.cache().load("/projects").unwrap(),
            Some(SavedScrollPosition::new(0.0, 200.0))
        );
    }

    #[test]
    fn test_round_trip_restores_after_settle_and_ignores_grace_writes() {
        let store = MemoryStore::new();
        let mut first = restoration(Arc::new(store.clone()));
        first.handle(0, route("/projects"));
        first.handle(10, scroll(120.0, 450.0));
        first.handle(20, RestorationEvent::Unload);

        // Remount with the same tab storage
        let mut r = restoration(Arc::new(store.clone()));
        r.handle(1000, route("/projects"));
        assert!(r.is_restoring());
        assert!(r.advance(1099).is_empty());

        let commands = r.advance(1100);
        assert_eq!(
            commands,
            vec![Command::ScrollTo {
                x: 120.0,
                y: 450.0,
                behavior: ScrollBehavior::Instant,
            }]
        );

        // The restoring scroll echoes back a transient offset
        r.handle(1110, scroll(0.0, 30.0));
        r.advance(1200);
        assert!(r.is_restoring());
        assert_eq!(
            r.cache().load("/projects").unwrap(),
            Some(SavedScrollPosition::new(120.0, 450.0))
        );

        r.advance(1250);
        assert!(!r.is_restoring());
        assert_eq!(
            r.state(),
            &RestorationState::Tracking {
                route: "/projects".to_string()
            }
        );
    }

    #[test]
    fn test_leaving_route_flushes_pending_save() {
        let store = MemoryStore::new();
        let mut r = restoration(Arc::new(store.clone()));
        r.handle(0, route("/a"));
        r.handle(5, scroll(0.0, 640.0));
        r.handle(10, route("/b"));

        assert_eq!(r.cache().load("/a").unwrap().map(|p| p.y), Some(640.0));
        assert_eq!(r.state().route(), Some("/b"));
        assert_eq!(r.next_deadline(), None);
    }

    #[test]
    fn test_hidden_page_saves_synchronously() {
        let store = MemoryStore::new();
        let mut r = restoration(Arc::new(store.clone()));
        r.handle(0, route("/"));
        r.handle(5, scroll(0.0, 75.0));
        r.handle(6, RestorationEvent::VisibilityHidden);
        assert_eq!(r.cache().load("/").unwrap().map(|p| p.y), Some(75.0));
    }

    #[test]
    fn test_fragment_change_keeps_state() {
        let mut r = restoration(Arc::new(MemoryStore::new()));
        r.handle(0, route("/projects"));
        r.handle(5, scroll(0.0, 300.0));
        r.handle(6, route("/projects#team"));
        assert_eq!(r.cache().load("/projects").unwrap(), None);
        assert_eq!(r.next_deadline(), Some(155));
    }

    #[test]
    fn test_clear_one_and_all() {
        let store = MemoryStore::new();
        let mut r = restoration(Arc::new(store.clone()));
        for (i, path) in ["/a", "/b", "/c"].into_iter().enumerate() {
            r.handle(i as u64 * 10, route(path));
            r.handle(i as u64 * 10 + 1, scroll(0.0, 10.0));
        }
        r.handle(100, RestorationEvent::Unload);

        assert!(r.clear("/a"));
        assert_eq!(r.cache().routes().unwrap(), vec!["/b", "/c"]);
        assert!(r.clear_all());
        assert!(store.is_empty());
    }

    #[test]
    fn test_disabled_restoration_does_nothing() {
        let store = MemoryStore::new();
        let mut r = ScrollRestoration::new(
            RestorationOptions {
                enabled: false,
                ..Default::default()
            },
            PositionCache::new(Arc::new(store.clone()), "test"),
        );
        r.handle(0, route("/"));
        r.handle(1, scroll(0.0, 10.0));
        r.handle(2, RestorationEvent::Unload);
        assert!(store.is_empty());
        assert_eq!(r.state(), &RestorationState::Idle);
    }

    struct QuotaExceededStore;

    impl SessionStore for QuotaExceededStore {
        fn get(&self, _key: &str) -> StorageResult<Option<String>> {
            Ok(None)
        }

        fn set(&self, key: &str, value: &str) -> StorageResult<()> {
            Err(StorageError::QuotaExceeded {
                key: key.to_string(),
                needed: value.len(),
                limit: 0,
            })
        }

        fn remove(&self, _key: &str) -> StorageResult<()> {
            Ok(())
        }

        fn clear(&self) -> StorageResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_quota_errors_are_swallowed() {
        crate::log::start_capture();
        let mut r = restoration(Arc::new(QuotaExceededStore));
        r.handle(0, route("/"));
        r.handle(1, scroll(0.0, 500.0));
        r.handle(2, RestorationEvent::Unload);
        r.handle(3, route("/other"));
        r.handle(4, route("/"));

        // Nothing was saved, so there is nothing to restore
        assert!(!r.is_restoring());
        assert!(r.advance(10_000).is_empty());

        let lines = crate::log::take_capture();
        assert!(lines.iter().any(|l| l.starts_with("WARN") && l.contains("Quota")));
    }

    #[test]
    fn test_unavailable_storage_degrades_to_tracking() {
        let mut r = restoration(Arc::new(crate::persistence::UnavailableStore));
        r.handle(0, route("/"));
        r.handle(1, scroll(0.0, 500.0));
        r.handle(2, RestorationEvent::VisibilityHidden);
        assert_eq!(r.state().route(), Some("/"));
        assert!(!r.clear_all());
    }
}
