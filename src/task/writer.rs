use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::task::blocks::Condition;
use crate::task::error::TaskError;
use crate::task::score::BlockResult;

/// Onsets are shifted back by the 4 volumes (8 seconds) trimmed from the
/// start of each acquisition upstream.
pub const ONSET_TRIM_SECONDS: f64 = 8.0;

/// The four per-condition artifacts, in the order they are written. Used by
/// the orchestrator's already-done check.
pub fn expected_outputs(subject: &str, condition: Condition) -> [String; 4] {
    let cond = condition.as_str();
    [
        format!("{subject}_{cond}_block-times_ea.1D"),
        format!("{subject}_{cond}_corr_push.csv"),
        format!("{subject}_{cond}_button-times.csv"),
        format!("{subject}_{cond}_vid-onsets.csv"),
    ]
}

/// One stimulus-timing token: `[onset]*[amplitude],[pushes/min]:[length]`,
/// the AM2 format consumed by the downstream GLM.
pub fn timing_token(result: &BlockResult) -> String {
    format!(
        "{:.2}*{:.2},{}:{:.2} ",
        result.onset - ONSET_TRIM_SECONDS,
        result.correlation,
        result.push_rate,
        result.duration
    )
}

/// Write all four per-condition files. Existing files are truncated, never
/// appended to.
pub fn write_condition_outputs(
    out_dir: &Path,
    subject: &str,
    condition: Condition,
    results: &[BlockResult],
) -> Result<(), TaskError> {
    let [block_times, corr_push, button_times, onsets] = expected_outputs(subject, condition);
    write_block_times(&out_dir.join(block_times), results)?;
    write_corr_push(&out_dir.join(corr_push), results)?;
    write_button_times(&out_dir.join(button_times), results)?;
    write_onsets(&out_dir.join(onsets), results)?;
    Ok(())
}

fn write_block_times(path: &Path, results: &[BlockResult]) -> Result<(), TaskError> {
    let mut w = BufWriter::new(File::create(path)?);
    let mut current_run = None;
    for result in results {
        if current_run.is_some() && current_run != Some(result.run) {
            writeln!(w)?;
        }
        current_run = Some(result.run);
        write!(w, "{}", timing_token(result))?;
    }
    writeln!(w)?;
    w.flush()?;
    Ok(())
}

fn write_corr_push(path: &Path, results: &[BlockResult]) -> Result<(), TaskError> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "correlation,n-pushes-per-minute")?;
    for result in results {
        writeln!(w, "{:.2},{}", result.correlation, result.push_rate)?;
    }
    w.flush()?;
    Ok(())
}

fn write_button_times(path: &Path, results: &[BlockResult]) -> Result<(), TaskError> {
    let mut rows: Vec<(char, &str, u8, f64)> = results
        .iter()
        .flat_map(|result| {
            result
                .ratings
                .iter()
                .map(|&(value, time)| (result.run, result.label.as_str(), value, time))
        })
        .collect();
    // ordering across runs is a contract of the output, not a nicety
    rows.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then_with(|| a.1.cmp(b.1))
            .then_with(|| a.3.total_cmp(&b.3))
    });

    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "Block_ID,Video,Response,Timing")?;
    for (run, label, value, time) in rows {
        writeln!(w, "{run},{label},{value},{time:.2}")?;
    }
    w.flush()?;
    Ok(())
}

fn write_onsets(path: &Path, results: &[BlockResult]) -> Result<(), TaskError> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "Block_ID,Video,Onset")?;
    for result in results {
        writeln!(w, "{},{},{:.2}", result.run, result.label, result.onset)?;
    }
    w.flush()?;
    Ok(())
}

/// Persist a rating vector as a one-value-per-line QC artifact.
pub fn write_rating_vector<I>(path: &Path, values: I) -> Result<(), TaskError>
where
    I: IntoIterator<Item = f64>,
{
    let mut w = BufWriter::new(File::create(path)?);
    for value in values {
        writeln!(w, "{value}")?;
    }
    w.flush()?;
    Ok(())
}
