//! Configuration file support for scrollcue.
//!
//! Configuration is loaded from `~/.config/scrollcue/config.toml` with the following precedence:
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`SCROLLCUE_REDUCED_MOTION`)
//! 3. Configuration file
//! 4. Default values (lowest priority)
//!
//! # Example Configuration
//!
//! ```toml
//! # ~/.config/scrollcue/config.toml
//! reduced_motion = false
//! performance_tier = "standard"
//! storage_namespace = "portfolio"
//! root_margin_px = 0
//!
//! [tracker]
//! noise_floor_px = 10
//! throttle_ms = 16
//!
//! [restoration]
//! settle_delay_ms = 100
//! grace_ms = 150
//!
//! [scroll_init]
//! hash_scroll_offset = 80
//! enable_smooth_links = true
//!
//! [progress]
//! back_to_top_after_px = 400
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::engine::EngineSettings;
use crate::error::{ConfigError, ConfigResult};
use crate::log;
use crate::motion::{MotionContext, PerformanceTier};
use crate::navigation::{ProgressIndicator, ScrollInitOptions};
use crate::persistence::RestorationOptions;
use crate::scroll::TrackerOptions;

/// Environment variable overriding the reduced-motion preference.
pub const REDUCED_MOTION_ENV: &str = "SCROLLCUE_REDUCED_MOTION";

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Unset means "follow the host preference", which defaults to off.
    pub reduced_motion: Option<bool>,

    pub performance_tier: PerformanceTier,

    /// Grows or shrinks the viewport for every visibility observation
    pub root_margin_px: f64,

    /// Prefix for session storage keys
    pub storage_namespace: String,

    pub tracker: TrackerOptions,
    pub restoration: RestorationOptions,
    pub scroll_init: ScrollInitOptions,
    pub progress: ProgressIndicator,

    #[serde(skip)]
    overrides: Overrides,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default, PartialEq)]
struct Overrides {
    reduced_motion: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reduced_motion: None,
            performance_tier: PerformanceTier::Standard,
            root_margin_px: 0.0,
            storage_namespace: "scrollcue".to_string(),
            tracker: TrackerOptions::default(),
            restoration: RestorationOptions::default(),
            scroll_init: ScrollInitOptions::default(),
            progress: ProgressIndicator::default(),
            overrides: Overrides::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default config file path.
    ///
    /// Returns default configuration if file doesn't exist or can't be used.
    pub fn load() -> Self {
        let config_path = Self::config_path();

        if !config_path.exists() {
            return Self::default();
        }

        match Self::load_from(&config_path) {
            Ok(config) => config,
            Err(e) => {
                log::warn(&format!("Ignoring config file: {}", e));
                Self::default()
            }
        }
    }

    /// Load and validate a specific config file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scrollcue")
    }

    /// Merge with CLI overrides.
    ///
    /// CLI arguments take precedence over the environment and the config file.
    pub fn with_overrides(mut self, reduced_motion: Option<bool>, namespace: Option<String>) -> Self {
        if reduced_motion.is_some() {
            self.overrides.reduced_motion = reduced_motion;
        }
        if let Some(namespace) = namespace {
            self.storage_namespace = namespace;
        }
        self
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !self.root_margin_px.is_finite() {
            return Err(invalid("root_margin_px", "must be a finite number"));
        }
        if self.storage_namespace.trim().is_empty() {
            return Err(invalid("storage_namespace", "must not be empty"));
        }
        if self.tracker.noise_floor_px < 0.0 {
            return Err(invalid("tracker.noise_floor_px", "must not be negative"));
        }
        if self.scroll_init.hash_scroll_offset < 0.0 {
            return Err(invalid("scroll_init.hash_scroll_offset", "must not be negative"));
        }
        Ok(())
    }

    /// Reduced-motion preference after applying CLI and environment overrides.
    pub fn reduced_motion(&self) -> bool {
        let env = std::env::var(REDUCED_MOTION_ENV).ok();
        self.resolve_reduced_motion(env.as_deref())
    }

    fn resolve_reduced_motion(&self, env: Option<&str>) -> bool {
        self.overrides
            .reduced_motion
            .or_else(|| env.and_then(parse_flag))
            .or(self.reduced_motion)
            .unwrap_or(false)
    }

    pub fn context(&self) -> MotionContext {
        MotionContext::new(self.reduced_motion(), self.performance_tier)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            context: self.context(),
            tracker: self.tracker,
            restoration: self.restoration,
            scroll_init: self.scroll_init,
            progress: self.progress,
            root_margin_px: self.root_margin_px,
            namespace: self.storage_namespace.clone(),
        }
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "reduce" => Some(true),
        "0" | "false" | "no" | "off" | "no-preference" => Some(false),
        other => {
            log::warn(&format!("Ignoring {}={:?}", REDUCED_MOTION_ENV, other));
            None
        }
    }
}
