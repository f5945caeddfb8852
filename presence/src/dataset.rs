//! Labelled motion logs and offline window features.
//!
//! Log lines are `ts,ax,ay,az,gx,gy,gz,LABEL` with `ts` in fractional unix
//! seconds. Feature rows use the live classifier's layout, one column per
//! entry of [`FEATURE_NAMES`], followed by the label.

use std::fmt;
use std::io::{BufRead, Write};
use std::str::FromStr;

use proxima_types::MotionSample;
use serde::{Deserialize, Serialize};

use crate::{FeatureVector, PresenceError, FEATURE_NAMES};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DatasetLabel {
    /// Lying on a desk: the only "not with user" class.
    Desk,
    HandStill,
    HandMove,
    Pocket,
}

impl DatasetLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Desk => "DESK",
            Self::HandStill => "HANDSTILL",
            Self::HandMove => "HANDMOVE",
            Self::Pocket => "POCKET",
        }
    }

    pub fn is_with_user(&self) -> bool {
        !matches!(self, Self::Desk)
    }
}

impl fmt::Display for DatasetLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "DESK" => Ok(Self::Desk),
            "HANDSTILL" => Ok(Self::HandStill),
            "HANDMOVE" => Ok(Self::HandMove),
            "POCKET" => Ok(Self::Pocket),
            other => Err(format!("unknown label {other:?}")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabeledSample {
    pub sample: MotionSample,
    pub label: DatasetLabel,
}

/// Parse one log line. `line_no` is 1-based and only used for errors.
pub fn parse_log_line(line: &str, line_no: usize) -> Result<LabeledSample, PresenceError> {
    let bad = |reason: String| PresenceError::Dataset {
        line: line_no,
        reason,
    };
    let fields: Vec<&str> = line.trim().split(',').collect();
    if fields.len() != 8 {
        return Err(bad(format!("expected 8 fields, got {}", fields.len())));
    }
    let mut values = [0.0f64; 7];
    for (i, field) in fields[..7].iter().enumerate() {
        values[i] = field
            .trim()
            .parse()
            .map_err(|e| bad(format!("field {}: {e}", i + 1)))?;
    }
    if !values[0].is_finite() || values[0] < 0.0 {
        return Err(bad(format!("bad timestamp {}", values[0])));
    }
    let label = fields[7].parse().map_err(bad)?;
    let captured_at_ms = (values[0] * 1_000.0).round() as u64;
    Ok(LabeledSample {
        sample: MotionSample::new(
            [values[1], values[2], values[3]],
            [values[4], values[5], values[6]],
            captured_at_ms,
        ),
        label,
    })
}

pub fn format_log_line(entry: &LabeledSample) -> String {
    let s = &entry.sample;
    format!(
        "{:.3},{},{},{},{},{},{},{}",
        s.captured_at_ms as f64 / 1_000.0,
        s.accel[0],
        s.accel[1],
        s.accel[2],
        s.gyro[0],
        s.gyro[1],
        s.gyro[2],
        entry.label
    )
}

/// Read a whole log, skipping blank lines.
pub fn read_log<R: BufRead>(reader: R) -> Result<Vec<LabeledSample>, PresenceError> {
    let mut samples = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        samples.push(parse_log_line(&line, i + 1)?);
    }
    Ok(samples)
}

/// Slide a `window`-sample window by `hop` over the log. Windows spanning
/// more than one label are skipped.
pub fn extract_windows(
    samples: &[LabeledSample],
    window: usize,
    hop: usize,
) -> Vec<(FeatureVector, DatasetLabel)> {
    if window == 0 || hop == 0 || samples.len() < window {
        return Vec::new();
    }
    (0..=samples.len() - window)
        .step_by(hop)
        .filter_map(|start| {
            let slice = &samples[start..start + window];
            let label = slice[0].label;
            if slice.iter().any(|s| s.label != label) {
                return None;
            }
            let motion: Vec<MotionSample> = slice.iter().map(|s| s.sample).collect();
            Some((FeatureVector::extract(&motion), label))
        })
        .collect()
}

pub fn feature_csv_header() -> String {
    let mut header = FEATURE_NAMES.join(",");
    header.push_str(",label");
    header
}

pub fn feature_csv_row(features: &FeatureVector, label: DatasetLabel) -> String {
    let mut row = features
        .as_slice()
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",");
    row.push(',');
    row.push_str(label.as_str());
    row
}

/// Write the header and one row per window. Returns the number of rows.
pub fn write_feature_csv<W: Write>(
    mut out: W,
    windows: &[(FeatureVector, DatasetLabel)],
) -> Result<usize, PresenceError> {
    writeln!(out, "{}", feature_csv_header())?;
    for (features, label) in windows {
        writeln!(out, "{}", feature_csv_row(features, *label))?;
    }
    out.flush()?;
    Ok(windows.len())
}
