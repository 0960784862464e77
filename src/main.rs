//! tickfair - Main Entry Point
//!
//! Replays a JSON-lines tick file through the engine and logs every
//! decision. One line of the input file is one [`TickState`].

use std::fs::File;
use std::io::{BufRead, BufReader};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use tickfair::{load_config, Engine, TickState};

/// CLI arguments for the replay harness
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// JSON-lines file with one tick state per line
    #[arg(short, long)]
    ticks: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let config = load_config(Some(&args.config))?;
    let engine = Engine::new(config)?;
    let mut state = engine.new_state();

    info!("Replaying ticks from {}", args.ticks);
    let file =
        File::open(&args.ticks).with_context(|| format!("opening tick file {}", args.ticks))?;
    let reader = BufReader::new(file);

    let mut ticks = 0usize;
    let mut total_orders = 0usize;
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let tick: TickState = serde_json::from_str(&line)
            .with_context(|| format!("parsing tick on line {}", line_no + 1))?;
        let output = engine.on_tick(&mut state, &tick);

        for (instrument, orders) in &output.orders {
            for order in orders {
                info!("t={} {} {}", tick.timestamp, instrument, order);
            }
        }
        if output.conversions != 0 {
            info!("t={} conversions {:+}", tick.timestamp, output.conversions);
        }
        info!("t={} {}", tick.timestamp, output.diagnostics);

        total_orders += output.order_count();
        ticks += 1;
    }

    info!("Replay complete: {} ticks, {} orders", ticks, total_orders);
    Ok(())
}
