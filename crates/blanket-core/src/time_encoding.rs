use std::fmt;

use blanket_parser::LoggerRecord;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Years are shifted by this amount before taking the proleptic Gregorian day
/// ordinal. Both logger samples and deployment bounds go through
/// [`encode_time`], so comparisons within one run stay consistent.
pub const YEAR_SHIFT: i32 = 1;

const HOURS_PER_DAY: f64 = 24.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Day count plus fractional day. Two instants derived independently may
/// differ by about 1e-4 day from floating-point rounding.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedTime(f64);

impl EncodedTime {
    pub fn from_days(days: f64) -> Self {
        Self(days)
    }

    pub fn days(self) -> f64 {
        self.0
    }

    /// Exact identity used for set intersection.
    pub(crate) fn bits(self) -> u64 {
        self.0.to_bits()
    }

    /// Calendar instant this value encodes, undoing [`YEAR_SHIFT`].
    pub fn to_calendar(self) -> Option<NaiveDateTime> {
        let whole_days = self.0.floor();
        let date = NaiveDate::from_num_days_from_ce_opt(whole_days as i32)?;
        let date = date.with_year(date.year() - YEAR_SHIFT)?;
        let seconds = ((self.0 - whole_days) * SECONDS_PER_DAY).round() as i64;
        date.and_hms_opt(0, 0, 0)
            .map(|midnight| midnight + chrono::Duration::seconds(seconds))
    }
}

impl fmt::Display for EncodedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn encode_time(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> Result<EncodedTime> {
    let shifted = year + YEAR_SHIFT;
    let date = NaiveDate::from_ymd_opt(shifted, month, day).ok_or_else(|| {
        PipelineError::InvalidTimestamp(format!(
            "{year:04}-{month:02}-{day:02} has no calendar date in shifted year {shifted}"
        ))
    })?;
    let ordinal = f64::from(date.num_days_from_ce());
    let fraction =
        (f64::from(hour) + (f64::from(minute) + f64::from(second) / 60.0) / 60.0) / HOURS_PER_DAY;
    Ok(EncodedTime(ordinal + fraction))
}

pub fn encode_record(record: &LoggerRecord) -> Result<EncodedTime> {
    encode_time(
        record.year,
        record.month,
        record.day,
        record.hour,
        record.minute,
        record.second,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinal_uses_shifted_year() {
        // 0001-01-01 has ordinal 1, so year 0 maps onto it.
        let t = encode_time(0, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(t.days(), 1.0);
    }

    #[test]
    fn fraction_of_day() {
        let midnight = encode_time(2003, 7, 16, 0, 0, 0).unwrap();
        let noon = encode_time(2003, 7, 16, 12, 0, 0).unwrap();
        assert_eq!(noon.days() - midnight.days(), 0.5);
    }

    #[test]
    fn leap_day_without_shifted_counterpart_is_rejected() {
        assert!(encode_time(2004, 2, 29, 0, 0, 0).is_err());
        assert!(encode_time(2003, 2, 29, 0, 0, 0).is_ok());
    }

    #[test]
    fn calendar_round_trip() {
        let t = encode_time(2003, 7, 16, 15, 0, 4).unwrap();
        let expected = NaiveDate::from_ymd_opt(2003, 7, 16)
            .unwrap()
            .and_hms_opt(15, 0, 4)
            .unwrap();
        assert_eq!(t.to_calendar(), Some(expected));
    }
}
