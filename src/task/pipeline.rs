use std::fs;
use std::path::Path;

use ndarray::Array1;

use crate::assets::ReferenceAssets;
use crate::task::align::align_to_reference;
use crate::task::blocks::{segment_blocks, Condition};
use crate::task::error::TaskError;
use crate::task::events::{parse_log, TICKS_PER_SECOND};
use crate::task::plot::{render_comparison_png, BlockPanel, PlotStyle};
use crate::task::ratings::extract_ratings;
use crate::task::score::{correlate, push_rate, r2z, zscore, BlockResult};
use crate::task::writer;

/// Everything one (log, condition) pass produces: scored results for the
/// blocks the condition keeps, and warnings for the orchestrator's log
/// sink. QC artifacts (debug vectors, the comparison plot) are written as
/// a side effect, covering every block in the run.
#[derive(Debug)]
pub struct LogOutcome {
    pub blocks: Vec<BlockResult>,
    pub warnings: Vec<String>,
}

/// Run id, the trailing character of the log file stem.
pub fn run_id(log_path: &Path) -> char {
    log_path
        .file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.chars().last())
        .unwrap_or('?')
}

/// Drive one behavioral log through parse → segment → extract → align →
/// score for one condition.
pub fn process_log(
    log_path: &Path,
    assets: &ReferenceAssets,
    condition: Condition,
    subject: &str,
    out_dir: &Path,
) -> Result<LogOutcome, TaskError> {
    let run = run_id(log_path);
    let parsed = parse_log(log_path)?;
    let blocks = segment_blocks(&parsed.videos, parsed.mri_start);

    let mut results = Vec::new();
    let mut warnings = Vec::new();
    let mut panels = Vec::new();

    for (i, block) in blocks.iter().enumerate() {
        // a block ends where the next one starts; the last runs out the log
        let end_trial = blocks.get(i + 1).map(|next| next.index);
        let gold = assets.gold_series(&block.label)?;
        let duration_s = assets.duration(&block.label)?;
        let duration_ticks = (duration_s * TICKS_PER_SECOND) as usize;

        let trace = extract_ratings(
            &parsed.pictures,
            block.index,
            end_trial,
            block.start_time,
            duration_ticks,
        );
        warnings.extend(trace.warnings.iter().cloned());

        writer::write_rating_vector(
            &out_dir.join(format!("{subject}_{}_DEBUG.csv", block.label)),
            trace.samples.iter().copied(),
        )?;

        if gold.len() != duration_s.round() as usize {
            warnings.push(format!(
                "reference tables disagree for {}: {} gold samples vs {} s nominal \
                 duration, using the series length",
                block.label,
                gold.len(),
                duration_s
            ));
        }

        let aligned = align_to_reference(gold.len(), &trace);
        writer::write_rating_vector(
            &out_dir.join(format!("{subject}_{}_ratings.csv", block.label)),
            aligned.iter().copied(),
        )?;

        let gold_z = zscore(&Array1::from_iter(gold.iter().copied()));
        let subject_z = zscore(&aligned);
        let fisher_z = r2z(correlate(&gold_z, &subject_z));

        panels.push(BlockPanel {
            label: block.label.clone(),
            gold: gold_z.to_vec(),
            subject: subject_z.to_vec(),
            fisher_z,
        });

        if condition.keeps(&block.label) {
            let ratings = trace
                .ratings
                .iter()
                .map(|r| (r.value, (r.time - parsed.mri_start) as f64 / TICKS_PER_SECOND))
                .collect();
            results.push(BlockResult {
                run,
                label: block.label.clone(),
                onset: block.onset,
                duration: duration_s,
                correlation: fisher_z,
                push_rate: push_rate(trace.pushes, duration_s),
                ratings,
            });
        }
    }

    if !panels.is_empty() {
        let stem = log_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("log");
        let png = render_comparison_png(stem, &panels, PlotStyle::default())?;
        fs::write(out_dir.join(format!("{subject}_{stem}.png")), png)?;
    }

    Ok(LogOutcome {
        blocks: results,
        warnings,
    })
}
