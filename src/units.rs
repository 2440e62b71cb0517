//! Human-readable sizes and durations for listings and access logs.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

const SIZE_LABELS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Unit system used when formatting file sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeUnits {
    /// Powers of 1024
    #[default]
    Binary,
    /// Powers of 1000
    Metric,
}

impl SizeUnits {
    fn factor(self) -> u64 {
        match self {
            SizeUnits::Binary => 1024,
            SizeUnits::Metric => 1000,
        }
    }
}

impl FromStr for SizeUnits {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "binary" => Ok(SizeUnits::Binary),
            "metric" => Ok(SizeUnits::Metric),
            other => Err(format!("invalid size units {other:?}, expected binary or metric")),
        }
    }
}

impl fmt::Display for SizeUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeUnits::Binary => f.write_str("binary"),
            SizeUnits::Metric => f.write_str("metric"),
        }
    }
}

/// Format a byte count with two decimals and the largest fitting unit, e.g. `1.00KB`.
pub fn format_size(size: u64, units: SizeUnits) -> String {
    let factor = units.factor();
    let mut divisor = 1u64;
    let mut label = SIZE_LABELS[0];

    for next in &SIZE_LABELS[1..] {
        match divisor.checked_mul(factor) {
            Some(d) if size >= d => {
                divisor = d;
                label = next;
            }
            _ => break,
        }
    }

    format!("{:.2}{}", size as f64 / divisor as f64, label)
}

pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();

    let (factor, label): (u128, &str) = if nanos >= 60_000_000_000 {
        (60_000_000_000, "min")
    } else if nanos >= 1_000_000_000 {
        (1_000_000_000, "s")
    } else if nanos >= 1_000_000 {
        (1_000_000, "ms")
    } else if nanos >= 1_000 {
        (1_000, "µs")
    } else {
        (1, "ns")
    };

    format!("{:.2}{}", nanos as f64 / factor as f64, label)
}
