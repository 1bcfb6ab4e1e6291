use crate::task::events::{VideoEvent, TICKS_PER_SECOND};

/// One trial/video presentation within a run. The first character of the
/// label encodes the trial type: `v` for the empathic-accuracy videos,
/// `c` for the control (color/shapes) videos.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    /// Trial number of the Video event, used to window the rating search.
    pub index: i64,
    pub label: String,
    /// Start time in ticks.
    pub start_time: i64,
    /// Start in seconds relative to the MRI start marker.
    pub onset: f64,
}

/// The two experiment conditions, split by block-label prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Condition {
    Vid,
    Cvid,
}

impl Condition {
    pub const ALL: [Condition; 2] = [Condition::Vid, Condition::Cvid];

    pub fn as_str(self) -> &'static str {
        match self {
            Condition::Vid => "vid",
            Condition::Cvid => "cvid",
        }
    }

    /// Whether a block with this label belongs to the condition. Each
    /// condition only excludes the other's prefix.
    pub fn keeps(self, label: &str) -> bool {
        match self {
            Condition::Vid => !label.starts_with('c'),
            Condition::Cvid => !label.starts_with('v'),
        }
    }
}

/// Emit one Block per Video event, in log order. Block i conceptually ends
/// at the start of block i+1; the last block extends to the end of the log,
/// which callers express as an absent end trial.
pub fn segment_blocks(videos: &[VideoEvent], mri_start: i64) -> Vec<Block> {
    videos
        .iter()
        .map(|v| Block {
            index: v.trial,
            label: v.code.clone(),
            start_time: v.time,
            onset: (v.time - mri_start) as f64 / TICKS_PER_SECOND,
        })
        .collect()
}
