//! Sensor demo entry point.
//!
//! Builds a simulated robot board, then cycles through the battery,
//! infrared, distance and ambient light routines, rendering the 8x2
//! display through `tracing`.

mod board;
mod display;
mod routines;

use anyhow::{Context, Result};
use clap::Parser;
use embedded_hal::delay::DelayNs;
use pulse_common::config::{ClockSource, PulseConfig};
use pulse_common::sim::VirtualClock;
use pulse_common::{Clock, SystemClock};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::board::simulated_board;
use crate::display::TracingDisplay;

/// Virtual microseconds that pass on every clock read, so polling loops
/// without delays still make progress.
const VIRTUAL_TICK_US: u64 = 1;

/// Sensor demo command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "pulse-demo",
    about = "Robot sensor demo - battery, IR, distance and light routines on a simulated board",
    version,
    long_about = None
)]
struct Args {
    /// Path to a configuration file (TOML).
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Demo cycles to run (0 = forever).
    #[arg(long, default_value = "1")]
    cycles: u64,

    /// Run on the wall clock instead of virtual time.
    #[arg(long)]
    wall_clock: bool,

    /// Distance to the simulated obstacle (overrides config file).
    #[arg(long, value_name = "CM")]
    distance_cm: Option<u64>,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    print_config: bool,

    /// Print one JSON report per cycle on stdout.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting sensor demo");

    // Load configuration
    let mut config = load_config(&args)?;

    // Override with command-line arguments
    if args.wall_clock {
        config.simulation.clock = ClockSource::System;
    }
    if let Some(cm) = args.distance_cm {
        config.simulation.target_distance_cm = Some(cm);
    }
    config.validate().context("Invalid configuration")?;

    if args.print_config {
        print!("{}", config.to_toml().context("Failed to render configuration")?);
        return Ok(());
    }

    info!(
        clock = ?config.simulation.clock,
        rise_timeout = ?config.echo.rise_timeout,
        width_timeout = ?config.echo.width_timeout,
        "Configuration loaded"
    );

    match config.simulation.clock {
        ClockSource::Virtual => {
            let clock = VirtualClock::with_auto_advance(VIRTUAL_TICK_US);
            run_demo(clock, &config, &args)
        }
        ClockSource::System => run_demo(SystemClock::new(), &config, &args),
    }
}

/// Initialize logging with the specified log level.
fn init_logging(level: &str) {
    let filter = format!(
        "pulse_demo={},pulse_timing={},pulse_common={},lcd={}",
        level, level, level, level
    );

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&filter)),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Resolution priority (first existing file wins):
/// 1. Command-line `--config` argument
/// 2. `PULSE_CONFIG_PATH` environment variable
/// 3. `config/default.toml` (local development)
/// 4. Built-in defaults
fn load_config(args: &Args) -> Result<PulseConfig> {
    // 1. Command-line argument (highest priority)
    if let Some(config_path) = &args.config {
        info!(?config_path, "Loading config from command-line argument");
        return PulseConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path));
    }

    // 2. Environment variable
    if let Ok(env_path) = std::env::var("PULSE_CONFIG_PATH") {
        let config_path = PathBuf::from(&env_path);
        if config_path.exists() {
            info!(?config_path, "Loading config from PULSE_CONFIG_PATH");
            return PulseConfig::from_file(&config_path).with_context(|| {
                format!("Failed to load config from PULSE_CONFIG_PATH={:?}", env_path)
            });
        }
        warn!(
            path = %env_path,
            "PULSE_CONFIG_PATH set but file does not exist, checking other locations"
        );
    }

    // 3. Local development path
    let local_path = PathBuf::from("config/default.toml");
    if local_path.exists() {
        info!(?local_path, "Loading config from local path");
        return PulseConfig::from_file(&local_path)
            .with_context(|| format!("Failed to load config from {:?}", local_path));
    }

    // 4. Built-in defaults
    info!("No config file found, using built-in defaults");
    Ok(PulseConfig::default())
}

/// Main demo loop.
fn run_demo<C>(clock: C, config: &PulseConfig, args: &Args) -> Result<()>
where
    C: Clock + DelayNs + Clone,
{
    let (mut board, ranger) =
        simulated_board(clock.clone(), &config.simulation, config.demo.analog_mode);
    let mut display = TracingDisplay::new();
    let started = clock.now();

    let mut cycle = 0u64;
    while args.cycles == 0 || cycle < args.cycles {
        cycle += 1;
        let report = board
            .run_cycle(&mut display, config, cycle)
            .with_context(|| format!("Demo cycle {cycle} failed"))?;

        info!(
            cycle,
            battery_mv = ?report.battery_millivolts,
            ir_edges = report.ir_edges,
            ranging_attempts = report.ranging.attempts,
            ranging_completed = report.ranging.completed,
            light_readings = report.light_readings,
            "Cycle complete"
        );

        if args.json {
            println!(
                "{}",
                serde_json::to_string(&report).context("Failed to encode cycle report")?
            );
        }
    }

    // Read these before `info!`: its expansion imports `tracing::field::display`,
    // which shadows the local `display` binding inside the macro.
    let frames = display.frames();
    let last_frame = display.buffer().rows();
    info!(
        cycles = cycle,
        triggers = ranger.trigger_count(),
        frames,
        last_frame = ?last_frame,
        elapsed_secs = pulse_common::elapsed_seconds(&clock, started),
        "Demo complete"
    );

    Ok(())
}
