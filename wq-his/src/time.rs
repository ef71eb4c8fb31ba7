//! CF-style time axis decoding.
//!
//! Model output encodes its time axis as numeric offsets from an epoch,
//! declared in a units attribute such as `"seconds since 2020-01-01
//! 00:00:00"`. Decoding turns each offset into a calendar timestamp.

use crate::error::{HisError, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::str::FromStr;

/// Epoch formats accepted in units attributes, most common first.
const EPOCH_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d",
];

/// Step size of a time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Step length in seconds.
    pub fn seconds(&self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Minutes => 60.0,
            TimeUnit::Hours => 3600.0,
            TimeUnit::Days => 86400.0,
        }
    }
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "seconds" | "second" | "secs" | "sec" | "s" => Ok(TimeUnit::Seconds),
            "minutes" | "minute" | "mins" | "min" => Ok(TimeUnit::Minutes),
            "hours" | "hour" | "hrs" | "hr" | "h" => Ok(TimeUnit::Hours),
            "days" | "day" | "d" => Ok(TimeUnit::Days),
            other => Err(format!("unknown time step {other:?}")),
        }
    }
}

/// Parsed form of a `"<step> since <epoch>"` units attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeEncoding {
    pub step: TimeUnit,
    pub epoch: NaiveDateTime,
}

impl TimeEncoding {
    /// Parses a units attribute. Missing `since`, an unknown step word
    /// and an undecodable epoch each fail explicitly.
    pub fn parse(units: &str) -> Result<Self> {
        let mut tokens = units.split_whitespace();
        let step_word = tokens.next().ok_or_else(|| HisError::UnitParse {
            units: units.to_string(),
            reason: "empty units attribute".to_string(),
        })?;
        let step = TimeUnit::from_str(step_word).map_err(|reason| HisError::UnitParse {
            units: units.to_string(),
            reason,
        })?;
        if tokens.next().map(str::to_ascii_lowercase).as_deref() != Some("since") {
            return Err(HisError::UnitParse {
                units: units.to_string(),
                reason: "expected \"since\" after the step word".to_string(),
            });
        }
        let epoch_str = tokens.collect::<Vec<_>>().join(" ");
        let epoch_str = epoch_str.trim_end_matches('Z').trim();
        let epoch = parse_epoch(epoch_str).ok_or_else(|| HisError::UnitParse {
            units: units.to_string(),
            reason: format!("undecodable epoch {epoch_str:?}"),
        })?;
        Ok(TimeEncoding { step, epoch })
    }

    /// Timestamp for a single offset on this axis.
    pub fn decode(&self, offset: f64) -> NaiveDateTime {
        let millis = (offset * self.step.seconds() * 1e3).round() as i64;
        self.epoch + Duration::milliseconds(millis)
    }
}

fn parse_epoch(s: &str) -> Option<NaiveDateTime> {
    for format in EPOCH_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(s, format) {
            return Some(parsed);
        }
        if let Ok(parsed) = NaiveDate::parse_from_str(s, format) {
            return parsed.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Decodes a whole axis, one timestamp per stored offset.
pub fn decode_times(offsets: &[f64], encoding: &TimeEncoding) -> Vec<NaiveDateTime> {
    offsets.iter().map(|&o| encoding.decode(o)).collect()
}
