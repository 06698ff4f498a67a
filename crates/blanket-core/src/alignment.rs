use std::collections::HashSet;

use blanket_parser::{LoggerRecord, SensorId};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::time_encoding::{encode_record, EncodedTime};

/// A logger sample paired with its encoded time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedRecord {
    pub record: LoggerRecord,
    pub time: EncodedTime,
}

/// One sensor's samples in file order, plus its resolved calibration offset.
#[derive(Debug, Clone)]
pub struct SensorSeries {
    pub sensor_id: SensorId,
    pub offset: Option<f64>,
    pub samples: Vec<TimedRecord>,
}

impl SensorSeries {
    pub fn from_records(
        sensor_id: SensorId,
        offset: Option<f64>,
        records: Vec<LoggerRecord>,
    ) -> Result<Self> {
        let samples = records
            .into_iter()
            .map(|record| {
                encode_record(&record).map(|time| TimedRecord { record, time })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            sensor_id,
            offset,
            samples,
        })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// A retained sample with its offset-corrected temperature. When the sensor
/// has no calibration offset the corrected value is NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectedSample {
    pub record: LoggerRecord,
    pub time: EncodedTime,
    pub corrected_temperature_c: f64,
}

#[derive(Debug, Clone)]
pub struct AlignedSensor {
    pub sensor_id: SensorId,
    pub offset: Option<f64>,
    pub samples: Vec<CorrectedSample>,
    /// Samples dropped because the other logger had no matching time.
    pub unmatched: usize,
    /// Later repeats of a time already kept from this logger.
    pub duplicates: usize,
}

/// Top and bottom series restricted to the times both loggers recorded.
#[derive(Debug, Clone)]
pub struct AlignedSeries {
    pub top: AlignedSensor,
    pub bottom: AlignedSensor,
}

impl AlignedSeries {
    pub fn len(&self) -> usize {
        self.top.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.top.samples.is_empty()
    }

    pub fn times(&self) -> impl Iterator<Item = EncodedTime> + '_ {
        self.top.samples.iter().map(|sample| sample.time)
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&CorrectedSample, &CorrectedSample)> + '_ {
        self.top.samples.iter().zip(self.bottom.samples.iter())
    }
}

/// Keeps only samples whose encoded time occurs in both series, matched by
/// exact floating-point equality, and subtracts each sensor's offset.
///
/// Each series keeps its own file order. A time repeated within one series is
/// kept once (first occurrence), so both outputs always have the same length.
pub fn align_series(top: SensorSeries, bottom: SensorSeries) -> AlignedSeries {
    if top.len() != bottom.len() {
        warn!(
            top_samples = top.len(),
            bottom_samples = bottom.len(),
            "Timing is off. Reconciling times between top and bottom thermistors."
        );
    }

    let top_times: HashSet<u64> = top.samples.iter().map(|s| s.time.bits()).collect();
    let bottom_times: HashSet<u64> = bottom.samples.iter().map(|s| s.time.bits()).collect();
    let common: HashSet<u64> = top_times.intersection(&bottom_times).copied().collect();

    let top = retain_common(top, &common);
    let bottom = retain_common(bottom, &common);

    debug_assert_eq!(top.samples.len(), bottom.samples.len());

    for sensor in [&top, &bottom] {
        if sensor.duplicates > 0 {
            warn!(
                sensor_id = %sensor.sensor_id,
                duplicates = sensor.duplicates,
                "Dropped repeated timestamps"
            );
        }
    }

    info!(
        aligned_samples = top.samples.len(),
        top_unmatched = top.unmatched,
        bottom_unmatched = bottom.unmatched,
        "Aligned top and bottom series"
    );

    AlignedSeries { top, bottom }
}

fn retain_common(series: SensorSeries, common: &HashSet<u64>) -> AlignedSensor {
    let mut seen: HashSet<u64> = HashSet::with_capacity(common.len());
    let mut samples = Vec::with_capacity(common.len());
    let mut unmatched = 0usize;
    let mut duplicates = 0usize;

    for timed in series.samples {
        let key = timed.time.bits();
        if !common.contains(&key) {
            unmatched += 1;
            continue;
        }
        if !seen.insert(key) {
            duplicates += 1;
            continue;
        }
        samples.push(CorrectedSample {
            record: timed.record,
            time: timed.time,
            corrected_temperature_c: apply_offset(timed.record.temperature_c, series.offset),
        });
    }

    debug!(
        sensor_id = %series.sensor_id,
        retained = samples.len(),
        unmatched,
        duplicates,
        "Filtered sensor series"
    );

    AlignedSensor {
        sensor_id: series.sensor_id,
        offset: series.offset,
        samples,
        unmatched,
        duplicates,
    }
}

pub fn apply_offset(raw_temperature_c: f64, offset: Option<f64>) -> f64 {
    match offset {
        Some(offset) => raw_temperature_c - offset,
        None => f64::NAN,
    }
}
