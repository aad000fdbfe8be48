//! Hood fan controller: host entry point.
//!
//! Runs the controller against the simulated kitchen on a scaled clock.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SimulatedKitchen          LogEventSink   NvsAdapter           │
//! │  (Sensor+Actuator+Hazard   (EventSink)    (Config+Storage)     │
//! │   +Dashboard)                             ScaledClock          │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  History · Fsm · Cooldown · Alarm · Override           │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  control loop: poll tick · timer tick · console input          │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `hoodfan [config.json] [--speedup N]`.  Type `0`–`4` and Enter
//! to move the speed slider, `q` to quit.

#![deny(unused_must_use)]

use std::io::BufRead;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};

use hoodfan::adapters::log_sink::LogEventSink;
use hoodfan::adapters::nvs::NvsAdapter;
use hoodfan::adapters::sim::SimulatedKitchen;
use hoodfan::adapters::time::{Clock, ScaledClock, SystemClock};
use hoodfan::app::ports::ConfigPort;
use hoodfan::app::service::AppService;
use hoodfan::config::HoodConfig;
use hoodfan::events::{self, Input};

const DEFAULT_SPEEDUP: u32 = 10;
const TIMER_TICK_MS: u64 = 20;

struct Args {
    config_path: Option<String>,
    speedup: u32,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        config_path: None,
        speedup: DEFAULT_SPEEDUP,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        if arg == "--speedup" {
            let value = it.next().context("--speedup needs a value")?;
            args.speedup = value
                .parse()
                .with_context(|| format!("invalid --speedup '{value}'"))?;
            anyhow::ensure!(args.speedup > 0, "--speedup must be at least 1");
        } else {
            args.config_path = Some(arg);
        }
    }
    Ok(args)
}

fn load_config_file(path: &Path) -> Result<HoodConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: HoodConfig = serde_json::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("validating config {}", path.display()))?;
    Ok(config)
}

/// Console reader: one selection per line.
fn spawn_console() {
    std::thread::spawn(|| {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match events::parse_line(&line) {
                Some(input) => {
                    if !events::push_input(input) {
                        warn!("Input queue full, dropping '{}'", line.trim());
                    }
                }
                None => warn!("Unrecognised input '{}' (0-4 or q)", line.trim()),
            }
        }
    });
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("hoodfan v{}", env!("CARGO_PKG_VERSION"));

    let args = parse_args()?;

    // ── Config ────────────────────────────────────────────────
    let mut nvs = NvsAdapter::new();
    let config = match &args.config_path {
        Some(path) => {
            let cfg = load_config_file(Path::new(path))?;
            nvs.save(&cfg).context("storing config")?;
            info!("Config loaded from {}", path);
            cfg
        }
        None => nvs.load().unwrap_or_else(|e| {
            warn!("Config load failed ({}), using defaults", e);
            HoodConfig::default()
        }),
    };

    // ── Adapters ──────────────────────────────────────────────
    let clock = ScaledClock::new(SystemClock.now_ms(), args.speedup);
    let mut kitchen = SimulatedKitchen::new(clock.now_ms(), config.devices.outputs);
    let mut sink = LogEventSink::new();

    // ── Service ───────────────────────────────────────────────
    let sample_ms = config.timing.win.sample_s.saturating_mul(1000);
    let mut app = AppService::new(config);
    let restored = app.restore(&nvs, clock.now_ms());
    app.start(restored, &mut kitchen, &mut sink);

    spawn_console();
    info!(
        "Simulating at {}x, polling every {} ms of virtual time",
        clock.speedup(),
        sample_ms
    );

    // ── Control loop ──────────────────────────────────────────
    let mut poll_tick = tokio::time::interval(Duration::from_millis(
        (sample_ms / u64::from(clock.speedup())).max(1),
    ));
    let mut timer_tick = tokio::time::interval(Duration::from_millis(TIMER_TICK_MS));

    loop {
        tokio::select! {
            _ = poll_tick.tick() => {
                let now = clock.now_ms();
                kitchen.set_time(now);
                app.poll(now, &mut kitchen, &mut sink);
            }
            _ = timer_tick.tick() => {
                let now = clock.now_ms();
                app.run_timers(now, &mut kitchen, &mut nvs);
            }
            input = events::recv_input() => match input {
                Input::Command(cmd) => {
                    app.handle_command(cmd, clock.now_ms(), &mut kitchen, &mut sink);
                }
                Input::Quit => break,
            },
        }
    }

    info!(
        "Shutting down: fan {}, {} speed changes",
        kitchen.fan(),
        app.transitions()
    );
    Ok(())
}
