use std::fs;
use std::path::{Path, PathBuf};

use crate::assets::ReferenceAssets;
use crate::config::StudyConfig;
use crate::task::writer;
use crate::task::{process_log, Condition, TaskError};

/// What happened to one subject. Failures are isolated; the batch caller
/// logs them and moves on to the next subject.
#[derive(Debug, PartialEq, Eq)]
pub enum SubjectStatus {
    Done,
    Skipped,
    Failed(String),
}

pub fn analyze_subject(
    subject: &str,
    config: &StudyConfig,
    assets: &ReferenceAssets,
) -> SubjectStatus {
    let out_dir = config.output_dir.join(subject);

    if outputs_complete(&out_dir, subject) {
        log::info!("{subject} already analysed");
        return SubjectStatus::Skipped;
    }

    if let Err(err) = fs::create_dir_all(&out_dir) {
        return SubjectStatus::Failed(format!(
            "failed to create {}: {err}",
            out_dir.display()
        ));
    }

    // a fresh attempt invalidates any previous failure record
    let error_log = out_dir.join("error.log");
    if error_log.is_file() {
        let _ = fs::remove_file(&error_log);
    }

    match process_subject(subject, config, assets, &out_dir) {
        Ok(()) => SubjectStatus::Done,
        Err(err) => {
            let message = format!("Failed to process {subject}: {err}");
            write_error_log(&error_log, &message);
            SubjectStatus::Failed(message)
        }
    }
}

fn process_subject(
    subject: &str,
    config: &StudyConfig,
    assets: &ReferenceAssets,
    out_dir: &Path,
) -> Result<(), TaskError> {
    let logs = discover_logs(&config.resources_dir, subject, &config.log_pattern)?;
    if logs.len() != 3 {
        return Err(TaskError::WrongLogCount {
            found: logs.len(),
            listing: logs
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        });
    }

    for condition in Condition::ALL {
        let mut results = Vec::new();
        let mut warnings = Vec::new();
        for log in &logs {
            log::debug!("processing {} for {}", log.display(), condition.as_str());
            let outcome = process_log(log, assets, condition, subject, out_dir)?;
            results.extend(outcome.blocks);
            warnings.extend(outcome.warnings);
        }
        writer::write_condition_outputs(out_dir, subject, condition, &results)?;
        for warning in warnings {
            log::warn!("{subject}: {warning}");
        }
    }
    Ok(())
}

/// The subject is done when every artifact this tool owns already exists;
/// a crash mid-write leaves an incomplete set, which reads as "not done"
/// on the next invocation.
pub fn outputs_complete(out_dir: &Path, subject: &str) -> bool {
    Condition::ALL.iter().all(|&condition| {
        writer::expected_outputs(subject, condition)
            .iter()
            .all(|name| out_dir.join(name).is_file())
    })
}

/// Find the subject's behavioral logs: walk every `<subject>_<session>`
/// resource directory and keep files whose name carries both `.log` and
/// the task pattern. Sorted, so run order follows file naming.
pub fn discover_logs(
    resources_dir: &Path,
    subject: &str,
    pattern: &str,
) -> Result<Vec<PathBuf>, TaskError> {
    let prefix = format!("{subject}_");
    let mut files = Vec::new();
    for entry in fs::read_dir(resources_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !entry.path().is_dir()
            || !name.starts_with(&prefix)
            || name.len() != prefix.len() + 2
        {
            continue;
        }
        collect_files(&entry.path(), &mut files)?;
    }
    files.retain(|path| {
        path.file_name().map_or(false, |n| {
            let name = n.to_string_lossy();
            name.contains(".log") && name.contains(pattern)
        })
    });
    files.sort();
    Ok(files)
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), TaskError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

fn write_error_log(path: &Path, message: &str) {
    let body = format!("{message}\n{}", node_name());
    if let Err(err) = fs::write(path, body) {
        log::error!("failed to write {}: {err}", path.display());
    }
}

/// Host identifier recorded with failures for operator triage.
fn node_name() -> String {
    fs::read_to_string("/proc/sys/kernel/hostname")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| std::env::var("HOSTNAME").ok())
        .unwrap_or_else(|| "unknown-host".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ea-proc-{}-{}", name, std::process::id()));
        if dir.exists() {
            fs::remove_dir_all(&dir).unwrap();
        }
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn study(dir: &Path) -> StudyConfig {
        StudyConfig {
            resources_dir: dir.join("resources"),
            output_dir: dir.join("ea"),
            assets_dir: dir.join("assets"),
            log_pattern: "UCLAEmpAcc".to_string(),
        }
    }

    fn write_assets(dir: &Path) -> ReferenceAssets {
        let assets_dir = dir.join("assets");
        fs::create_dir_all(&assets_dir).unwrap();
        fs::write(
            assets_dir.join("EA-timing.csv"),
            "vid_a,vid_z,cvid_b\nactor,actor,actor\n1,4,5\n2,3,5\n3,2,4\n4,1,2\n",
        )
        .unwrap();
        fs::write(
            assets_dir.join("EA-vid-lengths.csv"),
            "vid_a,vid_z,cvid_b\nlength\n2,2,2\n",
        )
        .unwrap();
        ReferenceAssets::load(&assets_dir).unwrap()
    }

    fn picture(trial: i64, code: &str, time: i64) -> String {
        format!("s01\t{trial}\tPicture\t{code}\t{time}\t0\t1\t20\t1\t0\t0\tOther\t0")
    }

    fn video(trial: i64, code: &str, time: i64) -> String {
        format!("s01\t{trial}\tVideo\t{code}\t{time}\t0\t1")
    }

    // two blocks per run, labeled so that log order differs from the
    // sorted button-table order
    fn write_run_log(session_dir: &Path, run: usize) {
        let lines = [
            picture(0, "MRI_start", 100000),
            video(1, "vid_z", 200000),
            picture(2, "rating_6", 210000),
            video(5, "vid_a", 500000),
            picture(6, "rating_2", 510000),
        ];
        fs::write(
            session_dir.join(format!("s01_UCLAEmpAcc_run{run}.log")),
            lines.join("\n"),
        )
        .unwrap();
    }

    fn write_three_runs(dir: &Path) {
        let session_dir = dir.join("resources").join("s01_01");
        fs::create_dir_all(&session_dir).unwrap();
        for run in 1..=3 {
            write_run_log(&session_dir, run);
        }
    }

    #[test]
    fn wrong_log_count_writes_error_log_and_no_outputs() {
        let dir = scratch_dir("wrong-count");
        let assets = write_assets(&dir);
        let session_dir = dir.join("resources").join("s01_01");
        fs::create_dir_all(&session_dir).unwrap();
        write_run_log(&session_dir, 1);
        write_run_log(&session_dir, 2);

        let status = analyze_subject("s01", &study(&dir), &assets);
        assert!(matches!(status, SubjectStatus::Failed(_)));

        let error_log = fs::read_to_string(dir.join("ea").join("s01").join("error.log")).unwrap();
        assert!(error_log.contains("did not find exactly 3 logs"), "{error_log}");
        assert!(error_log.lines().count() >= 2, "missing host line: {error_log}");
        for condition in Condition::ALL {
            for name in writer::expected_outputs("s01", condition) {
                assert!(!dir.join("ea").join("s01").join(name).exists());
            }
        }
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn complete_outputs_skip_the_subject_without_writes() {
        let dir = scratch_dir("skip");
        let assets = write_assets(&dir);
        let out_dir = dir.join("ea").join("s01");
        fs::create_dir_all(&out_dir).unwrap();
        for condition in Condition::ALL {
            for name in writer::expected_outputs("s01", condition) {
                fs::write(out_dir.join(name), "sentinel").unwrap();
            }
        }

        // no resources exist at all; a skip must not even look for them
        let status = analyze_subject("s01", &study(&dir), &assets);
        assert_eq!(status, SubjectStatus::Skipped);

        let entries: Vec<_> = fs::read_dir(&out_dir).unwrap().collect();
        assert_eq!(entries.len(), 8, "skip must not create or remove files");
        for condition in Condition::ALL {
            for name in writer::expected_outputs("s01", condition) {
                assert_eq!(fs::read_to_string(out_dir.join(name)).unwrap(), "sentinel");
            }
        }
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn three_runs_aggregate_into_sorted_tables() {
        let dir = scratch_dir("three-runs");
        let assets = write_assets(&dir);
        write_three_runs(&dir);

        let status = analyze_subject("s01", &study(&dir), &assets);
        assert_eq!(status, SubjectStatus::Done);

        let out_dir = dir.join("ea").join("s01");
        // one line per run in the stimulus-timing file
        let timing = fs::read_to_string(out_dir.join("s01_vid_block-times_ea.1D")).unwrap();
        assert_eq!(timing.lines().count(), 3);
        assert!(timing.ends_with('\n'));

        // button presses sorted by (run id, video label, time), which
        // reverses the within-run log order of vid_z before vid_a
        let buttons = fs::read_to_string(out_dir.join("s01_vid_button-times.csv")).unwrap();
        assert_eq!(
            buttons,
            "Block_ID,Video,Response,Timing\n\
             1,vid_a,2,41.00\n\
             1,vid_z,6,11.00\n\
             2,vid_a,2,41.00\n\
             2,vid_z,6,11.00\n\
             3,vid_a,2,41.00\n\
             3,vid_z,6,11.00\n"
        );

        // onsets keep run/block processing order
        let onsets = fs::read_to_string(out_dir.join("s01_vid_vid-onsets.csv")).unwrap();
        assert!(onsets.starts_with("Block_ID,Video,Onset\n1,vid_z,10.00\n1,vid_a,40.00\n"));

        // cvid pass has no kept blocks but still writes its artifact set
        for name in writer::expected_outputs("s01", Condition::Cvid) {
            assert!(out_dir.join(&name).is_file(), "{name} missing");
        }

        // second invocation finds everything in place and skips
        let status = analyze_subject("s01", &study(&dir), &assets);
        assert_eq!(status, SubjectStatus::Skipped);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn discover_logs_filters_by_pattern_and_sorts() {
        let dir = scratch_dir("discover");
        let session_a = dir.join("resources").join("s01_01");
        let session_b = dir.join("resources").join("s01_02").join("nested");
        fs::create_dir_all(&session_a).unwrap();
        fs::create_dir_all(&session_b).unwrap();
        fs::write(session_a.join("s01_UCLAEmpAcc_run1.log"), "").unwrap();
        fs::write(session_a.join("s01_OtherTask_run3.log"), "").unwrap();
        fs::write(session_a.join("notes.txt"), "").unwrap();
        fs::write(session_b.join("s01_UCLAEmpAcc_run2.log"), "").unwrap();
        // other subject's directory is not visited
        let other = dir.join("resources").join("s02_01");
        fs::create_dir_all(&other).unwrap();
        fs::write(other.join("s02_UCLAEmpAcc_run3.log"), "").unwrap();

        let logs = discover_logs(&dir.join("resources"), "s01", "UCLAEmpAcc").unwrap();
        let names: Vec<_> = logs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["s01_UCLAEmpAcc_run1.log", "s01_UCLAEmpAcc_run2.log"]
        );
        fs::remove_dir_all(&dir).unwrap();
    }
}
