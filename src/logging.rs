//! File logging. The terminal belongs to the TUI, so log lines go to
//! `<data dir>/service-planner.log` (or the temp dir when there is no data
//! dir).

use std::fs::{self, File};
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};

use crate::config::project_dirs;

const LOG_FILE_NAME: &str = "service-planner.log";

pub fn log_file_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(std::env::temp_dir)
        .join(LOG_FILE_NAME)
}

/// Install the global logger. Returns the file being written to.
pub fn init_logging(level: LevelFilter) -> Result<PathBuf> {
    let path = log_file_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create log directory")?;
    }
    let file = File::create(&path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;

    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .build();
    WriteLogger::init(level, config, file).context("logger already initialized")?;

    log::info!("service-planner starting (log level: {level:?})");
    Ok(path)
}
