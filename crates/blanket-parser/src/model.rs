use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Identifier of one physical temperature logger, as printed in the file header.
///
/// Some loggers carry a trailing revision character after the seven-character
/// serial; only the first [`SensorId::SIGNIFICANT_CHARS`] characters take part
/// in calibration lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SensorId(String);

impl SensorId {
    pub const SIGNIFICANT_CHARS: usize = 7;

    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The lookup key: the first seven characters, or the whole id when it is
    /// shorter than that.
    pub fn normalized(&self) -> &str {
        match self.0.char_indices().nth(Self::SIGNIFICANT_CHARS) {
            Some((byte_idx, _)) => &self.0[..byte_idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SensorId {
    fn from(value: &str) -> Self {
        SensorId::new(value)
    }
}

/// One sample line of a logger stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoggerRecord {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub raw_count: f64,
    pub resistance_ohm: f64,
    pub temperature_c: f64,
}

/// Key/value block between the two banner lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggerHeader {
    pub logger_identifier: Option<String>,
    pub comment: Option<String>,
    pub pc_time: Option<NaiveDateTime>,
    pub logger_time: Option<NaiveDateTime>,
    pub start_battery_mv: Option<f64>,
    pub end_battery_mv: Option<f64>,
    pub total_sample_count: Option<u64>,
    pub resistance_offset: Option<f64>,
    pub resistance_scale: Option<f64>,
    pub temperature_offset: Option<f64>,
    pub temperature_linear: Option<f64>,
    pub temperature_cubic: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct ParsedLoggerFile {
    pub parser: &'static str,
    pub sensor_id: SensorId,
    pub header: LoggerHeader,
    pub records: Vec<LoggerRecord>,
}

impl ParsedLoggerFile {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
