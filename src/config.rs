//! User configuration read from `config.toml` in the platform config
//! directory. Every field has a default, so a missing file or a partial one is
//! fine; only unreadable or malformed files are reported.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use log::LevelFilter;
use serde::Deserialize;

use crate::ui_state::{FilesView, ItemUiState};

const CONFIG_FILE_NAME: &str = "config.toml";
/// A bordered row with one line of content.
pub const MIN_ROW_HEIGHT: u16 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// One of off, error, warn, info, debug, trace.
    pub log_level: String,
    /// Capture the mouse so rows can be dragged with the pointer. Keyboard
    /// reordering works either way.
    pub mouse_capture: bool,
    pub collapsed_row_height: u16,
    pub expanded_row_height: u16,
    pub note_types: Vec<String>,
    pub default_files_view: FilesView,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            mouse_capture: true,
            collapsed_row_height: 3,
            expanded_row_height: 9,
            note_types: ["general", "vocals", "band", "tech"]
                .iter()
                .map(|kind| kind.to_string())
                .collect(),
            default_files_view: FilesView::Grid,
        }
    }
}

impl AppConfig {
    /// `<config dir>/config.toml`, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Read `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(contents).context("failed to parse config")?;
        if config.note_types.is_empty() {
            config.note_types = Self::default().note_types;
        }
        config.collapsed_row_height = config.collapsed_row_height.max(MIN_ROW_HEIGHT);
        config.expanded_row_height = config.expanded_row_height.max(config.collapsed_row_height);
        Ok(config)
    }

    /// Parsed `log_level`; unknown names fall back to `Info`.
    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.trim().parse().unwrap_or(LevelFilter::Info)
    }

    /// Starting state for items the user has not touched yet.
    pub fn item_defaults(&self) -> ItemUiState {
        ItemUiState {
            files_view: self.default_files_view,
            active_note_type: self
                .note_types
                .first()
                .cloned()
                .unwrap_or_else(|| "general".to_string()),
            ..ItemUiState::default()
        }
    }
}

pub(crate) fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "service-planner", "service-planner")
}
