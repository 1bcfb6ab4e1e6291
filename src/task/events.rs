use std::fs;
use std::path::Path;

use crate::task::error::TaskError;

/// All log timestamps are integer ticks at 10000 ticks per second.
pub const TICKS_PER_SECOND: f64 = 10_000.0;

/// Sentinel code on the first Picture row; its time field is tick zero for
/// every downstream onset.
pub const MRI_START_CODE: &str = "MRI_start";

/// One `Picture` row of the stimulus-presentation log. Picture rows carry
/// the full field set, including the participant's rating codes.
#[derive(Clone, Debug, PartialEq)]
pub struct PictureEvent {
    pub subject: String,
    pub trial: i64,
    pub code: String,
    pub time: i64,
    pub ttime: i64,
    pub uncertainty1: i64,
    pub duration: i64,
    pub uncertainty2: i64,
    pub req_time: i64,
    pub req_duration: i64,
    pub stim_type: String,
    pub pair_index: i64,
}

/// One `Video` row, marking the start of a trial block. Video rows carry a
/// reduced field set.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoEvent {
    pub subject: String,
    pub trial: i64,
    pub code: String,
    pub time: i64,
    pub ttime: i64,
    pub uncertainty1: i64,
}

/// Typed view of one behavioral log: the Picture and Video event sequences
/// plus the MRI start tick. `Response` rows are never consumed.
#[derive(Clone, Debug)]
pub struct ParsedLog {
    pub pictures: Vec<PictureEvent>,
    pub videos: Vec<VideoEvent>,
    pub mri_start: i64,
}

pub fn parse_log(path: &Path) -> Result<ParsedLog, TaskError> {
    let text = fs::read_to_string(path)?;
    parse_log_text(&text, path)
}

/// Rows are selected by the event-type discriminator in the third column,
/// not by shape; the file mixes row widths freely and anything that is not
/// a Picture or Video row (headers, Response rows) is passed over.
pub fn parse_log_text(text: &str, path: &Path) -> Result<ParsedLog, TaskError> {
    let mut pictures = Vec::new();
    let mut videos = Vec::new();

    for (line_no, raw) in text.lines().enumerate() {
        let fields: Vec<&str> = raw.trim_end_matches('\r').split('\t').collect();
        match fields.get(2).map(|s| s.trim()) {
            Some("Picture") => {
                pictures.push(parse_picture(&fields, line_no + 1, path)?);
            }
            Some("Video") => {
                videos.push(parse_video(&fields, line_no + 1, path)?);
            }
            _ => {}
        }
    }

    let mri_start = match pictures.first() {
        Some(first) if first.code == MRI_START_CODE => first.time,
        _ => {
            return Err(TaskError::MissingStartMarker {
                path: path.to_path_buf(),
            })
        }
    };

    Ok(ParsedLog {
        pictures,
        videos,
        mri_start,
    })
}

fn parse_picture(fields: &[&str], line: usize, path: &Path) -> Result<PictureEvent, TaskError> {
    let field = |idx: usize, name: &str| field_at(fields, idx, name, "Picture", line, path);
    let int = |idx: usize, name: &str| int_at(fields, idx, name, "Picture", line, path);
    Ok(PictureEvent {
        subject: field(0, "subject")?.to_string(),
        trial: int(1, "trial")?,
        code: field(3, "code")?.trim().to_string(),
        time: int(4, "time")?,
        ttime: int(5, "ttime")?,
        uncertainty1: int(6, "uncertainty1")?,
        duration: int(7, "duration")?,
        uncertainty2: int(8, "uncertainty2")?,
        req_time: int(9, "reqtime")?,
        req_duration: int(10, "reqduration")?,
        stim_type: field(11, "stimtype")?.trim().to_string(),
        pair_index: int(12, "pairindex")?,
    })
}

fn parse_video(fields: &[&str], line: usize, path: &Path) -> Result<VideoEvent, TaskError> {
    let field = |idx: usize, name: &str| field_at(fields, idx, name, "Video", line, path);
    let int = |idx: usize, name: &str| int_at(fields, idx, name, "Video", line, path);
    Ok(VideoEvent {
        subject: field(0, "subject")?.to_string(),
        trial: int(1, "trial")?,
        code: field(3, "code")?.trim().to_string(),
        time: int(4, "time")?,
        ttime: int(5, "ttime")?,
        uncertainty1: int(6, "uncertainty1")?,
    })
}

fn field_at<'a>(
    fields: &[&'a str],
    idx: usize,
    name: &str,
    event: &'static str,
    line: usize,
    path: &Path,
) -> Result<&'a str, TaskError> {
    fields.get(idx).copied().ok_or_else(|| TaskError::MalformedLine {
        event,
        line,
        path: path.to_path_buf(),
        reason: format!("missing {name} field"),
    })
}

fn int_at(
    fields: &[&str],
    idx: usize,
    name: &str,
    event: &'static str,
    line: usize,
    path: &Path,
) -> Result<i64, TaskError> {
    let raw = field_at(fields, idx, name, event, line, path)?;
    raw.trim().parse::<i64>().map_err(|_| TaskError::MalformedLine {
        event,
        line,
        path: path.to_path_buf(),
        reason: format!("unable to parse {name} {raw:?} as integer"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn path() -> PathBuf {
        PathBuf::from("test.log")
    }

    #[test]
    fn parses_picture_and_video_rows_by_discriminator() {
        let log = "Scenario - UCLAEmpAcc\n\
Subject\tTrial\tEvent Type\tCode\tTime\tTTime\tUncertainty\tDuration\tUncertainty\tReqTime\tReqDur\tStim Type\tPair Index\n\
s01\t0\tPicture\tMRI_start\t100000\t0\t1\t20\t1\t0\t0\tOther\t0\n\
s01\t1\tVideo\tvid_4\t200000\t0\t1\n\
s01\t2\tResponse\t102\t215000\t0\t1\n\
s01\t2\tPicture\trating_7\t215000\t0\t1\t20\t1\t0\t0\tOther\t0\n";
        let parsed = parse_log_text(log, &path()).unwrap();
        assert_eq!(parsed.mri_start, 100000);
        assert_eq!(
            parsed.pictures,
            vec![
                PictureEvent {
                    subject: "s01".into(),
                    trial: 0,
                    code: "MRI_start".into(),
                    time: 100000,
                    ttime: 0,
                    uncertainty1: 1,
                    duration: 20,
                    uncertainty2: 1,
                    req_time: 0,
                    req_duration: 0,
                    stim_type: "Other".into(),
                    pair_index: 0,
                },
                PictureEvent {
                    subject: "s01".into(),
                    trial: 2,
                    code: "rating_7".into(),
                    time: 215000,
                    ttime: 0,
                    uncertainty1: 1,
                    duration: 20,
                    uncertainty2: 1,
                    req_time: 0,
                    req_duration: 0,
                    stim_type: "Other".into(),
                    pair_index: 0,
                },
            ]
        );
        assert_eq!(
            parsed.videos,
            vec![VideoEvent {
                subject: "s01".into(),
                trial: 1,
                code: "vid_4".into(),
                time: 200000,
                ttime: 0,
                uncertainty1: 1,
            }]
        );
    }

    #[test]
    fn rejects_log_without_start_marker() {
        let log = "s01\t1\tPicture\trating_5\t100\t0\t1\t20\t1\t0\t0\tOther\t0\n";
        let err = parse_log_text(log, &path()).unwrap_err();
        assert!(matches!(err, TaskError::MissingStartMarker { .. }));
    }

    #[test]
    fn rejects_log_with_no_pictures_at_all() {
        let log = "s01\t1\tVideo\tvid_4\t200000\t0\t1\n";
        let err = parse_log_text(log, &path()).unwrap_err();
        assert!(matches!(err, TaskError::MissingStartMarker { .. }));
    }

    #[test]
    fn reports_unparseable_numeric_field_with_line_number() {
        let log = "s01\t0\tPicture\tMRI_start\t100000\t0\t1\t20\t1\t0\t0\tOther\t0\n\
s01\tx\tVideo\tvid_4\t200000\t0\t1\n";
        let err = parse_log_text(log, &path()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Video line 2"), "{message}");
        assert!(message.contains("trial"), "{message}");
    }
}
