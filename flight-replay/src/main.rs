use std::fs::{self, File};

use anyhow::{Context, Result};
use clap::Parser;
use flight_state_engine::RecordLayout;
use log::{LevelFilter, info};

use crate::args::Cli;
use crate::config::load_flight_config;
use crate::replay::{read_frames, replay_flight};

mod args;
mod config;
mod replay;

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .try_init()?;

    let args = Cli::parse();
    let config = load_flight_config(args.config.as_deref())?;
    let layout = RecordLayout::from(args.layout);

    let input = File::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;
    let frames = read_frames(input)?;
    info!("Replaying {} frames from {}", frames.len(), args.input.display());

    let output = replay_flight(config, layout, &frames)?;
    fs::write(&args.output, &output.records)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!(
        "Wrote {} records to {}, final phase {}",
        frames.len(),
        args.output.display(),
        output.final_frame.phase
    );
    for transition in &output.transitions {
        info!(
            "{:>8} ms  {} -> {}",
            transition.time_ms, transition.from, transition.to
        );
    }

    if args.debug {
        let mut debug = String::new();
        let formatter = flight_state_engine::RecordFormatter::new("", layout);
        formatter.write_debug(&mut debug, &output.final_frame)?;
        formatter.write_cycle_rate(&mut debug, output.final_delta_ms)?;
        print!("{}", debug);
    }

    Ok(())
}
