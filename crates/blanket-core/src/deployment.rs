use std::io::Read;
use std::path::Path;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, Timelike};
use csv::StringRecord;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::alignment::{AlignedSeries, CorrectedSample};
use crate::error::{PipelineError, Result};
use crate::ingestion::read_input;
use crate::time_encoding::{encode_time, EncodedTime};

pub const METADATA_COLUMNS: usize = 13;

/// Degrees plus decimal minutes, as written in the station log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub degrees: f64,
    pub minutes: f64,
}

impl Coordinate {
    /// Minutes extend the magnitude of the degrees, so a negative (southern or
    /// western) degree field subtracts them.
    pub fn decimal_degrees(&self) -> f64 {
        if self.degrees.is_sign_negative() {
            self.degrees - self.minutes / 60.0
        } else {
            self.degrees + self.minutes / 60.0
        }
    }
}

/// Day-of-year and clock time of a deployment or recovery event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTime {
    pub day_of_year: u32,
    pub hour: u32,
    pub minute: u32,
}

/// One row of the deployment metadata table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRow {
    pub row_index: usize,
    pub dive_number: String,
    pub blanket_letter: String,
    pub deployment_label: String,
    pub latitude: Coordinate,
    pub longitude: Coordinate,
    pub deployed: EventTime,
    pub recovered: EventTime,
}

impl DeploymentRow {
    /// `{diveNumber}_{blanketLetter}_{deploymentLabel}`, shared by both artifacts.
    pub fn base_name(&self) -> String {
        format!(
            "{}_{}_{}",
            self.dive_number, self.blanket_letter, self.deployment_label
        )
    }
}

#[derive(Debug, Deserialize)]
struct RawMetadataRow {
    lat_deg: f64,
    lat_min: f64,
    lon_deg: f64,
    lon_min: f64,
    blanket_letter: String,
    dive_number: String,
    deployment_label: String,
    deploy_day_of_year: f64,
    deploy_hour: f64,
    deploy_minute: f64,
    recover_day_of_year: f64,
    recover_hour: f64,
    recover_minute: f64,
}

pub fn load_metadata(path: &Path) -> Result<Vec<DeploymentRow>> {
    let contents = read_input(path)?;
    read_metadata(contents.as_slice())
}

/// Parses the metadata table. The first row is a header and is skipped; each
/// following row must have at least [`METADATA_COLUMNS`] columns.
pub fn read_metadata<R: Read>(reader: R) -> Result<Vec<DeploymentRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (row_index, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() < METADATA_COLUMNS {
            return Err(PipelineError::Metadata {
                row: row_index,
                message: format!(
                    "expected {METADATA_COLUMNS} columns, found {}",
                    record.len()
                ),
            });
        }
        let leading: StringRecord = record.iter().take(METADATA_COLUMNS).collect();
        let raw: RawMetadataRow =
            leading
                .deserialize(None)
                .map_err(|err| PipelineError::Metadata {
                    row: row_index,
                    message: err.to_string(),
                })?;
        rows.push(DeploymentRow::from_raw(row_index, raw)?);
    }

    Ok(rows)
}

impl DeploymentRow {
    fn from_raw(row_index: usize, raw: RawMetadataRow) -> Result<Self> {
        let whole = |value: f64, column: &str| -> Result<u32> {
            if value.is_finite() && value >= 0.0 && value <= f64::from(u32::MAX) {
                Ok(value.trunc() as u32)
            } else {
                Err(PipelineError::Metadata {
                    row: row_index,
                    message: format!("column '{column}' out of range: {value}"),
                })
            }
        };

        Ok(Self {
            row_index,
            dive_number: raw.dive_number,
            blanket_letter: raw.blanket_letter,
            deployment_label: raw.deployment_label,
            latitude: Coordinate {
                degrees: raw.lat_deg,
                minutes: raw.lat_min,
            },
            longitude: Coordinate {
                degrees: raw.lon_deg,
                minutes: raw.lon_min,
            },
            deployed: EventTime {
                day_of_year: whole(raw.deploy_day_of_year, "deploy_day_of_year")?,
                hour: whole(raw.deploy_hour, "deploy_hour")?,
                minute: whole(raw.deploy_minute, "deploy_minute")?,
            },
            recovered: EventTime {
                day_of_year: whole(raw.recover_day_of_year, "recover_day_of_year")?,
                hour: whole(raw.recover_hour, "recover_hour")?,
                minute: whole(raw.recover_minute, "recover_minute")?,
            },
        })
    }
}

/// A metadata row with its deployment window resolved against the series.
#[derive(Debug, Clone, PartialEq)]
pub struct Deployment {
    pub row: DeploymentRow,
    pub deployed_at: NaiveDateTime,
    pub recovered_at: NaiveDateTime,
    pub deploy_time: EncodedTime,
    pub recover_time: EncodedTime,
}

impl Deployment {
    pub fn base_name(&self) -> String {
        self.row.base_name()
    }

    pub fn contains(&self, time: EncodedTime) -> bool {
        self.deploy_time <= time && time <= self.recover_time
    }
}

/// Samples of the aligned series that fall inside one deployment window.
#[derive(Debug, Clone)]
pub struct DeploymentExtract<'a> {
    pub deployment: Deployment,
    series: &'a AlignedSeries,
    indices: Vec<usize>,
}

impl<'a> DeploymentExtract<'a> {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn series(&self) -> &'a AlignedSeries {
        self.series
    }

    /// `(top, bottom)` sample pairs in series order.
    pub fn pairs(&self) -> impl Iterator<Item = (&'a CorrectedSample, &'a CorrectedSample)> + '_ {
        let series = self.series;
        self.indices
            .iter()
            .map(move |&idx| (&series.top.samples[idx], &series.bottom.samples[idx]))
    }

    pub fn times(&self) -> Vec<f64> {
        self.pairs().map(|(top, _)| top.time.days()).collect()
    }

    pub fn top_corrected(&self) -> Vec<f64> {
        self.pairs()
            .map(|(top, _)| top.corrected_temperature_c)
            .collect()
    }

    pub fn bottom_corrected(&self) -> Vec<f64> {
        self.pairs()
            .map(|(_, bottom)| bottom.corrected_temperature_c)
            .collect()
    }
}

/// Slices an aligned series into deployment windows.
///
/// Day-of-year values are anchored to the year of the bottom logger's first
/// sample (deployment) and last sample (recovery), so a window may straddle
/// New Year.
#[derive(Debug, Clone, Copy)]
pub struct DeploymentSegmenter<'a> {
    series: &'a AlignedSeries,
    deploy_year: i32,
    recover_year: i32,
}

impl<'a> DeploymentSegmenter<'a> {
    pub fn new(series: &'a AlignedSeries) -> Result<Self> {
        let (Some(first), Some(last)) = (series.bottom.samples.first(), series.bottom.samples.last())
        else {
            return Err(PipelineError::Validation(
                "top and bottom loggers share no timestamps".to_string(),
            ));
        };

        Ok(Self {
            series,
            deploy_year: first.record.year,
            recover_year: last.record.year,
        })
    }

    pub fn resolve(&self, row: &DeploymentRow) -> Result<Deployment> {
        let deployed_at = event_datetime(row, self.deploy_year, row.deployed)?;
        let recovered_at = event_datetime(row, self.recover_year, row.recovered)?;

        Ok(Deployment {
            row: row.clone(),
            deployed_at,
            recovered_at,
            deploy_time: encode_event(deployed_at)?,
            recover_time: encode_event(recovered_at)?,
        })
    }

    /// Indices of the series with `deploy_time <= t <= recover_time`.
    pub fn select(&self, deployment: &Deployment) -> Vec<usize> {
        self.series
            .times()
            .enumerate()
            .filter(|(_, time)| deployment.contains(*time))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Resolves and slices one row. `Ok(None)` when the window is empty.
    pub fn extract(&self, row: &DeploymentRow) -> Result<Option<DeploymentExtract<'a>>> {
        let deployment = self.resolve(row)?;

        info!(
            deployment = %row.deployment_label,
            deploy_time = %deployment.deploy_time,
            recover_time = %deployment.recover_time,
            "Resolved deployment window"
        );

        let indices = self.select(&deployment);
        if indices.is_empty() {
            error!(
                deployment = %row.deployment_label,
                "Wrong times for deployment: no aligned samples in window"
            );
            return Ok(None);
        }

        info!(
            deployment = %row.deployment_label,
            records = indices.len(),
            "Found records within deployment window"
        );

        Ok(Some(DeploymentExtract {
            deployment,
            series: self.series,
            indices,
        }))
    }
}

fn event_datetime(row: &DeploymentRow, year: i32, event: EventTime) -> Result<NaiveDateTime> {
    let invalid = |message: String| PipelineError::Metadata {
        row: row.row_index,
        message,
    };

    if event.day_of_year == 0 {
        return Err(invalid("day of year must be at least 1".to_string()));
    }
    let date = NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|jan1| jan1.checked_add_days(Days::new(u64::from(event.day_of_year - 1))))
        .ok_or_else(|| invalid(format!("day {} of {year} is out of range", event.day_of_year)))?;

    date.and_hms_opt(event.hour, event.minute, 0).ok_or_else(|| {
        invalid(format!(
            "time {:02}:{:02} is not a valid clock time",
            event.hour, event.minute
        ))
    })
}

fn encode_event(at: NaiveDateTime) -> Result<EncodedTime> {
    encode_time(at.year(), at.month(), at.day(), at.hour(), at.minute(), 0)
}
