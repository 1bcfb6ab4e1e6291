use ndarray::Array1;

/// Scored outcome for one block kept by the requested condition. Onset and
/// rating times are in seconds relative to the MRI start; `correlation` is
/// already Fisher-transformed.
#[derive(Clone, Debug)]
pub struct BlockResult {
    /// Run id, the trailing character of the log file stem.
    pub run: char,
    pub label: String,
    pub onset: f64,
    pub duration: f64,
    pub correlation: f64,
    pub push_rate: f64,
    /// Raw (value, time-in-seconds) rating list for the button-press table.
    pub ratings: Vec<(u8, f64)>,
}

/// z-transform a vector. A constant (zero-variance) input has no z-score;
/// it becomes an all-zero vector of the same length instead of a numeric
/// error.
pub fn zscore(data: &Array1<f64>) -> Array1<f64> {
    let n = data.len();
    if n == 0 {
        return Array1::zeros(0);
    }
    let mean = data.mean().unwrap_or(0.0);
    let std = data.std(0.0);
    if !std.is_finite() || std == 0.0 {
        return Array1::zeros(n);
    }
    data.mapv(|v| (v - mean) / std)
}

/// Pearson correlation coefficient of two equal-length vectors. Degenerate
/// variance on either side produces NaN, which is substituted with 0 so the
/// Fisher transform stays defined.
pub fn correlate(gold: &Array1<f64>, subject: &Array1<f64>) -> f64 {
    if gold.len() != subject.len() || gold.is_empty() {
        return 0.0;
    }
    let gold_mean = gold.mean().unwrap_or(0.0);
    let subject_mean = subject.mean().unwrap_or(0.0);
    let mut cov = 0.0;
    let mut gold_var = 0.0;
    let mut subject_var = 0.0;
    for (&g, &s) in gold.iter().zip(subject.iter()) {
        let dg = g - gold_mean;
        let ds = s - subject_mean;
        cov += dg * ds;
        gold_var += dg * dg;
        subject_var += ds * ds;
    }
    let r = cov / (gold_var.sqrt() * subject_var.sqrt());
    if r.is_nan() {
        0.0
    } else {
        r
    }
}

/// Fisher's r-to-z transform, used to make correlation amplitudes additive
/// and unbounded for the downstream regression.
pub fn r2z(r: f64) -> f64 {
    0.5 * ((1.0 + r) / (1.0 - r)).ln()
}

/// Button pushes per minute of block duration (duration in seconds).
pub fn push_rate(pushes: usize, duration_seconds: f64) -> f64 {
    pushes as f64 / (duration_seconds / 60.0)
}
