use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Study-level configuration, one JSON file per study.
#[derive(Debug, Clone, Deserialize)]
pub struct StudyConfig {
    /// Tree of per-session resource directories holding the raw behavioral
    /// data, one `<subject>_<session>` directory each.
    pub resources_dir: PathBuf,
    /// Where per-subject output directories are created.
    pub output_dir: PathBuf,
    /// Directory holding the reference tables (gold-standard ratings and
    /// video lengths).
    pub assets_dir: PathBuf,
    /// Substring that selects this task's log files among a session's
    /// resources.
    #[serde(default = "default_log_pattern")]
    pub log_pattern: String,
}

fn default_log_pattern() -> String {
    "UCLAEmpAcc".to_string()
}

impl StudyConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open study config {}", path.display()))?;
        serde_json::from_reader(file)
            .with_context(|| format!("failed to parse study config {}", path.display()))
    }
}
