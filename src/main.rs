use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::sync::mpsc;

use scrollcue::config::Config;
use scrollcue::engine::MotionEngine;
use scrollcue::events::{Command, Event, Timed, parse_trace};
use scrollcue::log;
use scrollcue::persistence::MemoryStore;
use scrollcue::runtime;

const USAGE: &str = "usage: scrollcue replay <trace.jsonl> [--reduced-motion] [--config <path>] [--namespace <name>] [--realtime]";

struct ReplayArgs {
    trace: PathBuf,
    reduced_motion: Option<bool>,
    config: Option<PathBuf>,
    namespace: Option<String>,
    realtime: bool,
}

fn parse_args(args: &[String]) -> Result<ReplayArgs> {
    if args.get(1).map(String::as_str) != Some("replay") {
        bail!(USAGE);
    }

    let mut trace = None;
    let mut reduced_motion = None;
    let mut config = None;
    let mut namespace = None;
    let mut realtime = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--reduced-motion" => reduced_motion = Some(true),
            "--no-reduced-motion" => reduced_motion = Some(false),
            "--realtime" => realtime = true,
            "--config" | "-c" => {
                let Some(path) = args.get(i + 1) else {
                    bail!("--config requires a path argument");
                };
                config = Some(PathBuf::from(path));
                i += 1;
            }
            "--namespace" => {
                let Some(name) = args.get(i + 1) else {
                    bail!("--namespace requires a name argument");
                };
                namespace = Some(name.clone());
                i += 1;
            }
            arg if !arg.starts_with('-') && trace.is_none() => {
                trace = Some(PathBuf::from(arg));
            }
            other => {
                eprintln!("Warning: ignoring unknown argument '{}'", other);
            }
        }
        i += 1;
    }

    let Some(trace) = trace else {
        bail!(USAGE);
    };
    Ok(ReplayArgs {
        trace,
        reduced_motion,
        config,
        namespace,
        realtime,
    })
}

fn print_command(at_ms: u64, command: Command) -> Result<()> {
    println!("{}", serde_json::to_string(&Timed::new(at_ms, command))?);
    Ok(())
}

/// Feed every event straight into the engine, then let pending timers fire
/// in deadline order.
fn replay_instant(engine: &mut MotionEngine, events: Vec<Timed<Event>>) -> Result<()> {
    for timed in events {
        let at = timed.at_ms;
        for command in engine.handle(timed) {
            print_command(at, command)?;
        }
    }
    while let Some(at) = engine.next_deadline() {
        for command in engine.advance(at) {
            print_command(at, command)?;
        }
    }
    Ok(())
}

/// Deliver events at their recorded times through the async driver.
async fn replay_realtime(engine: MotionEngine, events: Vec<Timed<Event>>) -> Result<MotionEngine> {
    let (event_tx, event_rx) = futures::channel::mpsc::unbounded();
    let (command_tx, mut command_rx) = mpsc::channel::<Command>(64);

    let feeder = tokio::spawn(async move {
        let origin = tokio::time::Instant::now();
        for timed in events {
            tokio::time::sleep_until(origin + Duration::from_millis(timed.at_ms)).await;
            if event_tx.unbounded_send(timed).is_err() {
                break;
            }
        }
    });

    let printer = tokio::spawn(async move {
        let origin = tokio::time::Instant::now();
        while let Some(command) = command_rx.recv().await {
            let at = origin.elapsed().as_millis() as u64;
            if let Err(e) = print_command(at, command) {
                log::error(&format!("Failed to print command: {}", e));
            }
        }
    });

    let engine = runtime::run(engine, event_rx, command_tx).await;
    feeder.await.context("event feeder panicked")?;
    printer.await.context("command printer panicked")?;
    Ok(engine)
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Ok(log_path) = log::init() {
        log::info(&format!("Log file: {}", log_path.display()));
    }

    let args: Vec<String> = std::env::args().collect();
    let args = parse_args(&args)?;

    // Precedence: CLI > env var > config file > defaults
    let config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::load(),
    }
    .with_overrides(args.reduced_motion, args.namespace);

    let contents = tokio::fs::read_to_string(&args.trace)
        .await
        .with_context(|| format!("reading trace {}", args.trace.display()))?;
    let events = parse_trace(&contents)?;
    log::info(&format!(
        "Replaying {} events from {}",
        events.len(),
        args.trace.display()
    ));

    let store = Arc::new(MemoryStore::new());
    let mut engine = MotionEngine::new(config.engine_settings(), store);

    if args.realtime {
        engine = replay_realtime(engine, events).await?;
    } else {
        replay_instant(&mut engine, events)?;
    }

    println!("{}", serde_json::to_string_pretty(&engine.report())?);
    engine.shutdown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrollcue::engine::{ComponentReport, EngineSettings};

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_replay_args() {
        let parsed = parse_args(&args(&[
            "scrollcue",
            "replay",
            "trace.jsonl",
            "--reduced-motion",
            "--namespace",
            "demo",
        ]))
        .unwrap();
        assert_eq!(parsed.trace, PathBuf::from("trace.jsonl"));
        assert_eq!(parsed.reduced_motion, Some(true));
        assert_eq!(parsed.namespace.as_deref(), Some("demo"));
        assert!(!parsed.realtime);
        assert!(parsed.config.is_none());
    }

    #[test]
    fn test_missing_trace_is_an_error() {
        assert!(parse_args(&args(&["scrollcue", "replay"])).is_err());
        assert!(parse_args(&args(&["scrollcue"])).is_err());
        assert!(parse_args(&args(&["scrollcue", "replay", "t.jsonl", "--config"])).is_err());
    }

    #[test]
    fn test_demo_trace_replays() {
        let events = parse_trace(include_str!("../demos/portfolio.jsonl")).unwrap();
        let mut engine = MotionEngine::new(EngineSettings::default(), Arc::new(MemoryStore::new()));
        replay_instant(&mut engine, events).unwrap();

        let report = engine.report();
        assert_eq!(report.components.len(), 5);
        assert_eq!(
            report.components["stats"],
            ComponentReport::Counter { value: 42.0 }
        );
        assert_eq!(report.route.as_deref(), Some("/"));
        assert_eq!(engine.next_deadline(), None);
        engine.shutdown();
        assert_eq!(engine.live_observations(), 0);
    }
}
