//! Page-level scroll behaviour: in-page anchor links, Home/End keys and the
//! reading progress indicator.

use serde::{Deserialize, Serialize};

use crate::error::MotionError;
use crate::events::{Command, ScrollBehavior, ScrollKey};
use crate::geometry::{Rect, ScrollMetrics};
use crate::log;
use crate::motion::MotionContext;
use crate::scroll::ScrollSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollInitOptions {
    /// Space left above an anchor target, usually the sticky header height.
    pub hash_scroll_offset: f64,
    pub enable_smooth_links: bool,
    pub enable_scroll_restoration: bool,
}

impl Default for ScrollInitOptions {
    fn default() -> Self {
        Self {
            hash_scroll_offset: 80.0,
            enable_smooth_links: true,
            enable_scroll_restoration: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Navigator {
    options: ScrollInitOptions,
    ctx: MotionContext,
}

impl Navigator {
    pub fn new(options: ScrollInitOptions, ctx: MotionContext) -> Self {
        Self { options, ctx }
    }

    pub fn options(&self) -> &ScrollInitOptions {
        &self.options
    }

    fn behavior(&self) -> ScrollBehavior {
        if self.ctx.reduced_motion || !self.options.enable_smooth_links {
            ScrollBehavior::Instant
        } else {
            ScrollBehavior::Smooth
        }
    }

    /// Commands for a click on `#target_id`. A target that is not mounted
    /// (or has no layout yet) is logged and ignored.
    pub fn anchor_click(&self, target_id: &str, target: Option<&Rect>) -> Vec<Command> {
        let Some(rect) = target else {
            log::warn(&MotionError::MissingTarget(format!("#{}", target_id)).to_string());
            return vec![];
        };

        let y = (rect.top() - self.options.hash_scroll_offset).max(0.0);
        vec![
            Command::scroll_to(y, self.behavior()),
            Command::ReplaceHistory {
                hash: format!("#{}", target_id),
            },
        ]
    }

    pub fn key(&self, key: ScrollKey, metrics: &ScrollMetrics) -> Command {
        let y = match key {
            ScrollKey::Home => 0.0,
            ScrollKey::End => metrics.max_scroll_y(),
        };
        Command::scroll_to(y, self.behavior())
    }

    pub fn back_to_top(&self) -> Command {
        Command::scroll_to(0.0, self.behavior())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressIndicator {
    /// Offset after which the back-to-top button appears.
    pub back_to_top_after_px: f64,
}

impl Default for ProgressIndicator {
    fn default() -> Self {
        Self {
            back_to_top_after_px: 400.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressView {
    pub bar_width_percent: f64,
    pub show_back_to_top: bool,
}

impl ProgressIndicator {
    pub fn view(&self, snapshot: &ScrollSnapshot) -> ProgressView {
        ProgressView {
            bar_width_percent: snapshot.progress,
            show_back_to_top: snapshot.y > self.back_to_top_after_px,
        }
    }
}
