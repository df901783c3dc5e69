//! File logging with an optional per-thread capture buffer.
//!
//! Nothing in the engine is allowed to fail loudly, so warnings about missing
//! targets, storage failures and unknown variants all end up here.

use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use once_cell::sync::Lazy;

static LOG_FILE: Lazy<Mutex<Option<File>>> = Lazy::new(|| Mutex::new(None));

thread_local! {
    static CAPTURE: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn label(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

/// Initialize logging to a timestamped file under `~/.scrollcue/logs`
pub fn init() -> std::io::Result<PathBuf> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let log_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".scrollcue")
        .join("logs");

    std::fs::create_dir_all(&log_dir)?;

    let log_path = log_dir.join(format!("scrollcue_{}.log", timestamp));
    init_at(&log_path)?;
    Ok(log_path)
}

/// Initialize logging to an explicit file
pub fn init_at(path: &Path) -> std::io::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;

    if let Ok(mut guard) = LOG_FILE.lock() {
        *guard = Some(file);
    }

    info("=== scrollcue started ===");
    Ok(())
}

/// Log a message with timestamp and level
pub fn log(level: Level, msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {:5} {}\n", timestamp, level.label(), msg);

    CAPTURE.with(|slot| {
        if let Some(lines) = slot.borrow_mut().as_mut() {
            lines.push(format!("{} {}", level.label(), msg));
        }
    });

    if let Ok(mut guard) = LOG_FILE.lock() {
        if let Some(ref mut file) = *guard {
            let _ = file.write_all(line.as_bytes());
            let _ = file.flush();
        }
    }
}

/// Development-only diagnostics. Compiled out of release builds.
pub fn debug(msg: &str) {
    if cfg!(debug_assertions) {
        log(Level::Debug, msg);
    }
}

pub fn info(msg: &str) {
    log(Level::Info, msg);
}

pub fn warn(msg: &str) {
    log(Level::Warn, msg);
}

pub fn error(msg: &str) {
    log(Level::Error, msg);
}

/// Start capturing log lines emitted on the current thread.
pub fn start_capture() {
    CAPTURE.with(|slot| *slot.borrow_mut() = Some(Vec::new()));
}

/// Stop capturing and return everything captured on the current thread.
pub fn take_capture() -> Vec<String> {
    CAPTURE.with(|slot| slot.borrow_mut().take().unwrap_or_default())
}
