use crate::task::events::PictureEvent;

/// Rating shown before any button push, and for blocks with no pushes.
pub const NEUTRAL_RATING: f64 = 5.0;

/// One discrete rating response: the digit at the end of the Picture code,
/// and the event's timestamp in ticks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rating {
    pub value: u8,
    pub time: i64,
}

/// Dense per-tick rating signal reconstructed for one block, together with
/// the discrete responses it was built from. Warnings describe recovered
/// data problems; the orchestrator decides where they go.
#[derive(Clone, Debug)]
pub struct RatingTrace {
    pub samples: Vec<f64>,
    pub pushes: usize,
    pub ratings: Vec<Rating>,
    pub warnings: Vec<String>,
}

/// Reconstruct the participant's rating signal over one block.
///
/// Picture events are windowed by trial number (`[start_trial, end_trial)`,
/// or everything from `start_trial` on when the block is the last of the
/// run) and kept when their code contains "rating". Zero retained events is
/// not an error: the participant simply never moved off the neutral value.
pub fn extract_ratings(
    pictures: &[PictureEvent],
    start_trial: i64,
    end_trial: Option<i64>,
    start_time: i64,
    duration_ticks: usize,
) -> RatingTrace {
    let mut warnings = Vec::new();
    let mut ratings = Vec::new();

    for pic in pictures {
        let in_window =
            pic.trial >= start_trial && end_trial.map_or(true, |end| pic.trial < end);
        if !in_window || !pic.code.contains("rating") {
            continue;
        }
        match pic.code.chars().last().and_then(|c| c.to_digit(10)) {
            Some(digit) => ratings.push(Rating {
                value: digit as u8,
                time: pic.time,
            }),
            None => warnings.push(format!(
                "rating code {:?} at trial {} does not end in a digit, dropped",
                pic.code, pic.trial
            )),
        }
    }

    if ratings.is_empty() {
        return RatingTrace {
            samples: vec![NEUTRAL_RATING; duration_ticks],
            pushes: 0,
            ratings,
            warnings,
        };
    }

    let changeovers = changeover_indices(&ratings, start_time, duration_ticks, &mut warnings);
    let samples = materialize_step(duration_ticks, &changeovers);
    let pushes = ratings.len();

    RatingTrace {
        samples,
        pushes,
        ratings,
        warnings,
    }
}

/// Map each rating onto the block's per-tick axis `[start_time,
/// start_time + duration)`. A timestamp that misses the axis (log jitter)
/// falls back to one past the previous changeover; that recovery is lossy
/// but deliberate.
fn changeover_indices(
    ratings: &[Rating],
    start_time: i64,
    duration_ticks: usize,
    warnings: &mut Vec<String>,
) -> Vec<(usize, f64)> {
    let mut changeovers = Vec::with_capacity(ratings.len());
    let mut last = 0usize;
    for rating in ratings {
        let offset = rating.time - start_time;
        let idx = if offset >= 0 && (offset as usize) < duration_ticks {
            offset as usize
        } else {
            warnings.push(format!(
                "rating at tick {} is off the block axis (start {}, {} ticks), \
                 falling back to index {}",
                rating.time,
                start_time,
                duration_ticks,
                last + 1
            ));
            last + 1
        };
        changeovers.push((idx, f64::from(rating.value)));
        last = idx;
    }
    changeovers
}

/// Materialize a step function from (changeover-index, value) pairs: every
/// index before the first changeover holds the neutral value, and each
/// changeover sets the value held until the next one. Indices at or past
/// `duration` only contribute their value to the tail.
pub fn materialize_step(duration: usize, changeovers: &[(usize, f64)]) -> Vec<f64> {
    let mut samples = vec![0.0; duration];
    let mut held = NEUTRAL_RATING;
    let mut cursor = 0usize;
    for &(idx, value) in changeovers {
        let idx = idx.min(duration);
        if idx > cursor {
            samples[cursor..idx].fill(held);
        }
        held = value;
        cursor = idx;
    }
    samples[cursor..].fill(held);
    samples
}
