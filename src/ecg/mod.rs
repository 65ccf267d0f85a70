//! ECG heart-rate estimation
//!
//! Works on raw `(time, voltage)` samples: normalize the voltage channel,
//! count R peaks over the first six seconds of the trace, and extrapolate
//! the count to a per-minute rate.

use std::fmt;
use std::fs;
use std::path::Path;

/// Minimum normalized height for a local maximum to count as an R peak.
const PEAK_HEIGHT: f64 = 0.41;

/// Length of the analysis window, in the trace's time units (seconds).
const ANALYSIS_WINDOW: f64 = 6.0;

/// Converts a 6-second peak count to a per-minute rate.
const WINDOW_TO_MINUTE: i64 = 10;

#[derive(Debug)]
pub enum EcgError {
    /// Fewer than two samples; the sampling rate is undefined.
    InsufficientData(String),
    /// Flat voltage channel; min-max normalization is undefined.
    DegenerateSignal(String),
    TraceFormat(String),
    Io(String),
}

impl fmt::Display for EcgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcgError::InsufficientData(msg) => write!(f, "Insufficient ECG data: {}", msg),
            EcgError::DegenerateSignal(msg) => write!(f, "Degenerate ECG signal: {}", msg),
            EcgError::TraceFormat(msg) => write!(f, "Malformed ECG trace: {}", msg),
            EcgError::Io(msg) => write!(f, "Failed to read ECG trace: {}", msg),
        }
    }
}

impl std::error::Error for EcgError {}

/// Estimates the average heart rate of a raw ECG trace, in beats per minute.
///
/// The sampling rate comes from the interval between the first two samples,
/// rounded to 3 decimal places; consecutive accepted peaks must be at least
/// `fs * 0.5` samples apart. The voltage channel is min-max normalized over
/// the full trace, then only samples with `time <= 6.0` are searched for
/// peaks. The peak count times ten is the estimate; zero peaks is a valid
/// result of 0.
pub fn estimate(samples: &[(f64, f64)]) -> Result<i64, EcgError> {
    let min_distance = peak_distance(samples)?;
    let normalized = normalize(samples)?;

    let windowed: Vec<f64> = samples
        .iter()
        .zip(normalized.iter())
        .take_while(|((time, _), _)| *time <= ANALYSIS_WINDOW)
        .map(|(_, value)| *value)
        .collect();

    let peaks = count_peaks(&windowed, min_distance);
    Ok(peaks as i64 * WINDOW_TO_MINUTE)
}

/// Minimum peak separation in samples: half the sampling rate.
fn peak_distance(samples: &[(f64, f64)]) -> Result<f64, EcgError> {
    if samples.len() < 2 {
        return Err(EcgError::InsufficientData(
            "at least two samples are needed to derive a sampling rate".to_string(),
        ));
    }
    let interval = samples[1].0 - samples[0].0;
    if interval <= 0.0 {
        return Err(EcgError::TraceFormat(
            "sample times must be strictly increasing".to_string(),
        ));
    }
    let fs = (1.0 / interval * 1000.0).round() / 1000.0;
    Ok(fs * 0.5)
}

/// Min-max normalizes the voltage channel to `[0, 1]` over the full trace.
fn normalize(samples: &[(f64, f64)]) -> Result<Vec<f64>, EcgError> {
    let min = samples.iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
    let max = samples
        .iter()
        .map(|(_, v)| *v)
        .fold(f64::NEG_INFINITY, f64::max);
    if max == min {
        return Err(EcgError::DegenerateSignal(
            "flat voltage signal cannot be normalized".to_string(),
        ));
    }
    Ok(samples.iter().map(|(_, v)| (v - min) / (max - min)).collect())
}

/// Counts local maxima at or above [`PEAK_HEIGHT`], enforcing the minimum
/// spacing greedily left to right so the earlier of two close peaks wins.
fn count_peaks(signal: &[f64], min_distance: f64) -> usize {
    let mut count = 0;
    let mut last_peak: Option<usize> = None;

    for i in 1..signal.len().saturating_sub(1) {
        if signal[i] > signal[i - 1] && signal[i] > signal[i + 1] && signal[i] >= PEAK_HEIGHT {
            let far_enough = match last_peak {
                Some(prev) => (i - prev) as f64 >= min_distance,
                None => true,
            };
            if far_enough {
                count += 1;
                last_peak = Some(i);
            }
        }
    }

    count
}

/// Parses a two-column `time,voltage` CSV trace with no header.
pub fn parse_trace(raw: &str) -> Result<Vec<(f64, f64)>, EcgError> {
    let mut samples = Vec::new();

    for (line_no, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split(',');
        let time = fields.next().map(str::trim);
        let voltage = fields.next().map(str::trim);
        match (time, voltage) {
            (Some(t), Some(v)) => {
                let t = t.parse::<f64>().map_err(|_| {
                    EcgError::TraceFormat(format!("line {}: bad time value {:?}", line_no + 1, t))
                })?;
                let v = v.parse::<f64>().map_err(|_| {
                    EcgError::TraceFormat(format!("line {}: bad voltage value {:?}", line_no + 1, v))
                })?;
                samples.push((t, v));
            }
            _ => {
                return Err(EcgError::TraceFormat(format!(
                    "line {}: expected two comma-separated values",
                    line_no + 1
                )))
            }
        }
    }

    Ok(samples)
}

/// Reads and parses an ECG trace file.
pub fn load_trace(path: &Path) -> Result<Vec<(f64, f64)>, EcgError> {
    let raw = fs::read_to_string(path).map_err(|e| EcgError::Io(e.to_string()))?;
    parse_trace(&raw)
}
