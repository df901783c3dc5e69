//! Async driver for the engine.
//!
//! Events arrive on a stream, commands leave on an mpsc channel, and between
//! events the driver sleeps until the engine's next timer deadline. Host
//! milliseconds are mapped onto tokio time from the moment `run` starts.

use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};

use crate::engine::MotionEngine;
use crate::events::{Command, Event, Timed};
use crate::log;

/// Drive `engine` until `events` ends and every pending timer has fired.
/// Returns the engine so callers can inspect its final state.
pub async fn run<S>(
    mut engine: MotionEngine,
    mut events: S,
    commands: mpsc::Sender<Command>,
) -> MotionEngine
where
    S: Stream<Item = Timed<Event>> + Unpin,
{
    let origin = Instant::now();
    let at = |ms: u64| origin + Duration::from_millis(ms);
    log::info("Driver started");

    loop {
        let deadline = engine.next_deadline();

        tokio::select! {
            maybe_event = events.next() => {
                let Some(timed) = maybe_event else {
                    break;
                };
                let out = engine.handle(timed);
                if !forward(&commands, out).await {
                    return engine;
                }
            }

            // Next component or restoration timer
            _ = sleep_until(at(deadline.unwrap_or_default())), if deadline.is_some() => {
                if let Some(ms) = deadline {
                    let out = engine.advance(ms);
                    if !forward(&commands, out).await {
                        return engine;
                    }
                }
            }
        }
    }

    // Event stream closed: let outstanding timers play out
    while let Some(ms) = engine.next_deadline() {
        sleep_until(at(ms)).await;
        let out = engine.advance(ms);
        if !forward(&commands, out).await {
            break;
        }
    }

    log::info("Driver stopped");
    engine
}

/// Send commands to the host. Returns false once the host has gone away.
async fn forward(tx: &mpsc::Sender<Command>, commands: Vec<Command>) -> bool {
    for command in commands {
        if tx.send(command).await.is_err() {
            log::warn("Command receiver closed, stopping driver");
            return false;
        }
    }
    true
}
