//! Binary entry point: read the config, open the log file, seed the sample
//! service and drive the Ratatui event loop until the user exits.
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use log::LevelFilter;
use service_planner::logging::init_logging;
use service_planner::sample::{sample_program, song_library};
use service_planner::{run_app, App, AppConfig};

fn print_usage() {
    println!("Usage: service-planner [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --config <PATH>  Read configuration from PATH");
    println!("  -v, --verbose    Log at debug level");
    println!("  -h, --help       Show this help message");
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }
    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    let config_path = match args.iter().position(|a| a == "--config") {
        Some(i) => Some(
            args.get(i + 1)
                .map(PathBuf::from)
                .ok_or_else(|| anyhow!("--config needs a path"))?,
        ),
        None => AppConfig::default_path(),
    };

    let config = match config_path {
        Some(path) => AppConfig::load(&path)?,
        None => AppConfig::default(),
    };

    let level = if verbose {
        LevelFilter::Debug
    } else {
        config.level_filter()
    };
    if let Err(err) = init_logging(level) {
        eprintln!("Warning: logging disabled: {err:#}");
    }

    let mut app = App::new(config, "Sunday Service", sample_program(), song_library());
    run_app(&mut app)
}
