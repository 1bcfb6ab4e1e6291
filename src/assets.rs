use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::task::TaskError;

/// Gold-standard rating series per block label.
pub const TIMING_TABLE: &str = "EA-timing.csv";
/// Nominal video duration (seconds) per block label.
pub const LENGTHS_TABLE: &str = "EA-vid-lengths.csv";

/// The external reference tables, loaded once per invocation. Block labels
/// are matched case-insensitively.
pub struct ReferenceAssets {
    series: HashMap<String, Vec<f64>>,
    durations: HashMap<String, f64>,
}

impl ReferenceAssets {
    pub fn load(assets_dir: &Path) -> Result<Self, TaskError> {
        let series = load_columns(&assets_dir.join(TIMING_TABLE))?
            .into_iter()
            .collect();
        let durations = load_columns(&assets_dir.join(LENGTHS_TABLE))?
            .into_iter()
            .filter_map(|(label, values)| values.first().map(|&v| (label, v)))
            .collect();
        Ok(Self { series, durations })
    }

    /// The reference ("actor") rating series for a block.
    pub fn gold_series(&self, label: &str) -> Result<&[f64], TaskError> {
        self.series
            .get(&label.to_lowercase())
            .map(Vec::as_slice)
            .ok_or_else(|| TaskError::UnknownBlockLabel {
                label: label.to_string(),
                table: TIMING_TABLE.to_string(),
            })
    }

    /// The nominal block duration in seconds.
    pub fn duration(&self, label: &str) -> Result<f64, TaskError> {
        self.durations
            .get(&label.to_lowercase())
            .copied()
            .ok_or_else(|| TaskError::UnknownBlockLabel {
                label: label.to_string(),
                table: LENGTHS_TABLE.to_string(),
            })
    }

    /// Labels present in one table but not the other. The two tables are
    /// maintained by hand and nothing else cross-checks them.
    pub fn label_mismatches(&self) -> Vec<String> {
        let mut messages = Vec::new();
        for label in self.series.keys() {
            if !self.durations.contains_key(label) {
                messages.push(format!("{label} is in {TIMING_TABLE} but not {LENGTHS_TABLE}"));
            }
        }
        for label in self.durations.keys() {
            if !self.series.contains_key(label) {
                messages.push(format!("{label} is in {LENGTHS_TABLE} but not {TIMING_TABLE}"));
            }
        }
        messages.sort();
        messages
    }
}

fn load_columns(path: &Path) -> Result<Vec<(String, Vec<f64>)>, TaskError> {
    let text = fs::read_to_string(path)?;
    parse_columns(&text, path)
}

/// Column-oriented reference table: a header row of block labels, one
/// sub-header row that is skipped, then rows of floats. Cells that do not
/// parse as finite numbers (blank tails of short columns, NaN) are
/// stripped, as columns have uneven lengths.
fn parse_columns(text: &str, path: &Path) -> Result<Vec<(String, Vec<f64>)>, TaskError> {
    let mut lines = text.lines();
    let header = lines.next().ok_or_else(|| TaskError::MalformedTable {
        path: path.to_path_buf(),
        reason: "missing header row".into(),
    })?;
    let labels: Vec<String> = header
        .split(',')
        .map(|s| s.trim().trim_end_matches('\r').to_lowercase())
        .collect();
    if labels.iter().all(String::is_empty) {
        return Err(TaskError::MalformedTable {
            path: path.to_path_buf(),
            reason: "header row has no labels".into(),
        });
    }
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); labels.len()];
    for line in lines.skip(1) {
        let cells: Vec<&str> = line.split(',').collect();
        for (column, cell) in columns.iter_mut().zip(cells.iter()) {
            if let Ok(value) = cell.trim().parse::<f64>() {
                if value.is_finite() {
                    column.push(value);
                }
            }
        }
    }
    Ok(labels.into_iter().zip(columns).collect())
}
