use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ristretto_export::ExportConfig;
use serde::{Deserialize, Serialize};

use crate::cli::ApplyArgs;

pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub export: ExportConfig,
    /// Maximum undo entries kept per image.
    pub history_limit: usize,
    /// Session database path. Defaults to the platform data directory.
    pub session_db: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            export: ExportConfig::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            session_db: None,
        }
    }
}

impl AppConfig {
    /// Load `path` if given, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))
    }

    /// Command-line flags take precedence over the file.
    pub fn apply_overrides(&mut self, args: &ApplyArgs) {
        if let Some(quality) = args.quality {
            self.export.quality = quality.min(100);
        }
        if let Some(workers) = args.workers {
            self.export.max_workers = Some(workers);
        }
        if let Some(ms) = args.timeout_ms {
            self.export.task_timeout_ms = (ms > 0).then_some(ms);
        }
        if let Some(db) = &args.session.session_db {
            self.session_db = Some(db.clone());
        }
    }

    /// The configured database path, or `<data dir>/ristretto/sessions.db`.
    pub fn session_db_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.session_db {
            return Ok(path.clone());
        }
        let data = dirs::data_dir().context("no platform data directory for the session database")?;
        Ok(data.join("ristretto").join("sessions.db"))
    }
}
