mod assets;
mod config;
mod subject;
mod task;

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use crate::assets::ReferenceAssets;
use crate::config::StudyConfig;
use crate::subject::{analyze_subject, SubjectStatus};

/// Convert empathic-accuracy behavioral logs into amplitude-modulated
/// stimulus-timing files for the downstream GLM.
#[derive(Parser)]
#[command(name = "ea-proc")]
#[command(about = "Empathic-accuracy behavioral timing pipeline")]
struct Args {
    /// Study configuration JSON
    #[arg(short, long)]
    config: PathBuf,

    /// Run on a single subject
    #[arg(long)]
    subject: Option<String>,

    /// Show lots of output
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let filter = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let config = StudyConfig::load(&args.config)?;
    let assets = ReferenceAssets::load(&config.assets_dir).with_context(|| {
        format!(
            "failed to load reference assets from {}",
            config.assets_dir.display()
        )
    })?;
    for message in assets.label_mismatches() {
        log::warn!("{message}");
    }

    let subjects = match args.subject {
        Some(subject) => vec![subject],
        None => list_subjects(&config.resources_dir)?,
    };

    let mut failures = 0usize;
    for subject in &subjects {
        if subject.contains("_PHA_") {
            log::error!("{subject} is a phantom, cannot analyze");
            continue;
        }
        match analyze_subject(subject, &config, &assets) {
            SubjectStatus::Done => log::info!("{subject} done"),
            SubjectStatus::Skipped => {}
            SubjectStatus::Failed(message) => {
                log::error!("{message}");
                failures += 1;
            }
        }
    }
    if failures > 0 {
        log::warn!("{failures} of {} subjects failed", subjects.len());
    }
    Ok(())
}

/// Subject ids are the session directory names with their `_<session>`
/// suffix stripped; a subject with several sessions appears once.
fn list_subjects(resources_dir: &Path) -> Result<Vec<String>> {
    let mut subjects = BTreeSet::new();
    let entries = fs::read_dir(resources_dir).with_context(|| {
        format!("failed to list resources dir {}", resources_dir.display())
    })?;
    for entry in entries {
        let entry = entry?;
        if !entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some((subject, session)) = name.rsplit_once('_') {
            if session.len() == 2 && !subject.is_empty() {
                subjects.insert(subject.to_string());
            }
        }
    }
    Ok(subjects.into_iter().collect())
}
