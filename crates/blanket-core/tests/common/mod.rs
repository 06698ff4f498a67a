#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use blanket_core::alignment::{align_series, AlignedSeries, SensorSeries};
use blanket_parser::{LoggerRecord, SensorId};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};

pub const RECORD_WIDTH: usize = 54;
pub const HEADER_LINES: usize = 16;

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../blanket-parser/tests/data")
        .join(name)
}

pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, minute, second)
        .unwrap()
}

/// `count` instants spaced `step_seconds` apart, starting at `start`.
pub fn instants(start: NaiveDateTime, step_seconds: i64, count: usize) -> Vec<NaiveDateTime> {
    (0..count)
        .map(|idx| start + Duration::seconds(step_seconds * idx as i64))
        .collect()
}

pub fn record(at: NaiveDateTime, raw_count: f64, temperature_c: f64) -> LoggerRecord {
    LoggerRecord {
        year: at.year(),
        month: at.month(),
        day: at.day(),
        hour: at.hour(),
        minute: at.minute(),
        second: at.second(),
        raw_count,
        resistance_ohm: 45981.044 + raw_count / 1000.0,
        temperature_c,
    }
}

pub fn aligned(top: Vec<LoggerRecord>, bottom: Vec<LoggerRecord>) -> AlignedSeries {
    aligned_with_offsets(top, Some(0.0), bottom, Some(0.0))
}

pub fn aligned_with_offsets(
    top: Vec<LoggerRecord>,
    top_offset: Option<f64>,
    bottom: Vec<LoggerRecord>,
    bottom_offset: Option<f64>,
) -> AlignedSeries {
    let top = SensorSeries::from_records(SensorId::new("0000014"), top_offset, top).unwrap();
    let bottom =
        SensorSeries::from_records(SensorId::new("0000231"), bottom_offset, bottom).unwrap();
    align_series(top, bottom)
}

/// An ANTARES export with one data line per record. The comment header is
/// padded when needed so the reader's length-derived line budget covers
/// every row.
pub fn logger_stream(identifier: &str, records: &[LoggerRecord]) -> String {
    let data: String = records
        .iter()
        .map(|r| {
            format!(
                "{:04} {:02} {:02} {:02} {:02} {:02}    {:5.0}    {:9.3}       {:6.3}\n",
                r.year,
                r.month,
                r.day,
                r.hour,
                r.minute,
                r.second,
                r.raw_count,
                r.resistance_ohm,
                r.temperature_c
            )
        })
        .collect();

    let unpadded = header_block(identifier, "") + &data;
    let needed = (HEADER_LINES + records.len() + 1) * RECORD_WIDTH;
    let comment = if unpadded.len() < needed {
        "x".repeat(needed - unpadded.len())
    } else {
        String::new()
    };

    header_block(identifier, &comment) + &data
}

fn header_block(identifier: &str, comment: &str) -> String {
    let banner = "#".repeat(70);
    let lines = [
        banner.clone(),
        "#".to_string(),
        format!("# LoggerIdentifier    : {identifier}"),
        format!("# Comment             : {comment}"),
        "# PC Time             : 24 August 2011 , 00:06:05".to_string(),
        "# Logger Time         : 24 August 2011 , 00:05:49".to_string(),
        "# StartBatteryVoltage :      2970 mV".to_string(),
        "# EndBatteryVoltage   :      2928 mV".to_string(),
        "# TotalSampleCount    :       100".to_string(),
        "# ResistanceOffset    :     11913.96429".to_string(),
        "# ResistanceScale     :     90906.90354".to_string(),
        "# TemperatureOffset   :         0.0010743547".to_string(),
        "# TemperatureLinear   :         0.0002113377".to_string(),
        "# TemperatureCubic    :         0.0000000922".to_string(),
        "#".to_string(),
        banner,
    ];
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

pub const METADATA_HEADER: &str = "latDeg,latMin,lonDeg,lonMin,blanketLetter,diveNumber,deploymentLabel,deployDay,deployHour,deployMinute,recoverDay,recoverHour,recoverMinute";

/// One metadata row for blanket `A` on dive `3921`.
pub fn metadata_row(label: &str, deploy: (u32, u32, u32), recover: (u32, u32, u32)) -> String {
    format!(
        "47,57.1234,-127,5.5,A,3921,{label},{},{},{},{},{},{}",
        deploy.0, deploy.1, deploy.2, recover.0, recover.1, recover.2
    )
}

pub fn write_metadata(dir: &Path, rows: &[String]) -> PathBuf {
    let mut content = String::from(METADATA_HEADER);
    content.push('\n');
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    let path = dir.join("metadata.csv");
    fs::write(&path, content).unwrap();
    path
}

pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
