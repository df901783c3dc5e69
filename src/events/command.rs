use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollBehavior {
    #[default]
    Instant,
    Smooth,
}

/// Side effects the host must perform for the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Scroll the window to an absolute offset
    ScrollTo {
        x: f64,
        y: f64,
        behavior: ScrollBehavior,
    },
    /// Update the URL fragment without adding a history entry
    ReplaceHistory { hash: String },
}

impl Command {
    pub fn scroll_to(y: f64, behavior: ScrollBehavior) -> Self {
        Command::ScrollTo { x: 0.0, y, behavior }
    }
}
