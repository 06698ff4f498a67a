// crates/blanket-core/src/pipeline.rs

use std::fmt;
use std::path::PathBuf;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::alignment::{align_series, AlignedSeries, SensorSeries};
use crate::calibration::CalibrationTable;
use crate::config::{MissingOffsetPolicy, PipelineConfig};
use crate::deployment::{read_metadata, DeploymentSegmenter};
use crate::error::{PipelineError, Result};
use crate::ingestion::{parse_logger_bytes, read_input, LoggerInput};
use crate::outputs::{ArtifactPaths, ArtifactWriter, SensorSource, SensorSources};

/// The three input tables of one run. The metadata path is optional so that a
/// missing argument surfaces as [`PipelineError::ArgumentCountMismatch`].
#[derive(Debug, Clone)]
pub struct PipelineInputs {
    pub top_path: PathBuf,
    pub bottom_path: PathBuf,
    pub metadata_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentStatus {
    Written,
    EmptyWindow,
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentStatus::Written => f.write_str("written"),
            DeploymentStatus::EmptyWindow => f.write_str("empty window"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeploymentOutcome {
    pub label: String,
    pub sample_count: usize,
    pub status: DeploymentStatus,
    pub artifacts: Option<ArtifactPaths>,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub aligned_samples: usize,
    pub outcomes: Vec<DeploymentOutcome>,
}

impl RunSummary {
    pub fn written(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status == DeploymentStatus::Written)
            .count()
    }
}

/// Runs one batch: parse both loggers, align them, then write the artifact
/// pair of every deployment row as soon as its window is resolved.
///
/// An aborting empty window returns the error after earlier deployments have
/// already been written; those artifacts stay on disk.
pub fn run(inputs: &PipelineInputs, config: &PipelineConfig) -> Result<RunSummary> {
    let metadata_path = inputs.metadata_path.as_deref().ok_or_else(|| {
        PipelineError::ArgumentCountMismatch(
            "expected <TOP> <BOTTOM> <METADATA>; the deployment metadata table was not given"
                .to_string(),
        )
    })?;

    // Every input must be readable before any processing starts.
    let top_bytes = read_input(&inputs.top_path)?;
    let bottom_bytes = read_input(&inputs.bottom_path)?;
    let metadata_bytes = read_input(metadata_path)?;

    let calibration = CalibrationTable::load(&config.offsets_path)?;

    let top = parse_logger_bytes(&inputs.top_path, &top_bytes)?;
    let bottom = parse_logger_bytes(&inputs.bottom_path, &bottom_bytes)?;

    let top_source = resolve_source(&top, &calibration, config.missing_offset_policy)?;
    let bottom_source = resolve_source(&bottom, &calibration, config.missing_offset_policy)?;

    let series = align_inputs(top, &top_source, bottom, &bottom_source)?;
    let sources = SensorSources {
        top: top_source,
        bottom: bottom_source,
    };

    let rows = read_metadata(metadata_bytes.as_slice())?;
    let run_id = Uuid::new_v4();
    let writer = ArtifactWriter::new(
        config.output_dir.clone(),
        config.container_compression,
        run_id,
    );

    info!(
        %run_id,
        metadata = %metadata_path.display(),
        deployments = rows.len(),
        aligned_samples = series.len(),
        "Segmenting aligned series"
    );
    if rows.is_empty() {
        warn!(metadata = %metadata_path.display(), "Metadata table has no deployment rows");
    }

    let segmenter = DeploymentSegmenter::new(&series)?;
    let mut outcomes = Vec::with_capacity(rows.len());

    for (idx, row) in rows.iter().enumerate() {
        let is_last = idx + 1 == rows.len();
        info!(deployment_number = idx + 1, label = %row.deployment_label, "Processing deployment");

        match segmenter.extract(row)? {
            Some(extract) => {
                let paths = writer.write(&extract, &sources)?;
                outcomes.push(DeploymentOutcome {
                    label: row.deployment_label.clone(),
                    sample_count: extract.len(),
                    status: DeploymentStatus::Written,
                    artifacts: Some(paths),
                });
            }
            None => {
                if config.empty_window_policy.should_abort(is_last) {
                    let deployment = segmenter.resolve(row)?;
                    error!(
                        deployment = %row.deployment_label,
                        policy = %config.empty_window_policy,
                        "Aborting run on empty deployment window"
                    );
                    return Err(PipelineError::EmptyDeploymentWindow {
                        deployment: row.base_name(),
                        deploy_time: deployment.deploy_time.days(),
                        recover_time: deployment.recover_time.days(),
                    });
                }
                outcomes.push(DeploymentOutcome {
                    label: row.deployment_label.clone(),
                    sample_count: 0,
                    status: DeploymentStatus::EmptyWindow,
                    artifacts: None,
                });
            }
        }
    }

    let summary = RunSummary {
        run_id,
        aligned_samples: series.len(),
        outcomes,
    };
    info!(
        %run_id,
        written = summary.written(),
        skipped = summary.outcomes.len() - summary.written(),
        "Run complete"
    );
    Ok(summary)
}

fn resolve_source(
    input: &LoggerInput,
    calibration: &CalibrationTable,
    policy: MissingOffsetPolicy,
) -> Result<SensorSource> {
    let sensor_id = input.parsed.sensor_id.clone();
    let offset = calibration.resolve(&sensor_id)?;

    if offset.is_none() && policy == MissingOffsetPolicy::Fail {
        return Err(PipelineError::MissingCalibrationOffset {
            sensor_id: sensor_id.normalized().to_string(),
        });
    }

    Ok(SensorSource {
        path: input.path.clone(),
        sensor_id,
        offset,
        file_hash: input.file_hash.clone(),
    })
}

fn align_inputs(
    top: LoggerInput,
    top_source: &SensorSource,
    bottom: LoggerInput,
    bottom_source: &SensorSource,
) -> Result<AlignedSeries> {
    let top_series = SensorSeries::from_records(
        top_source.sensor_id.clone(),
        top_source.offset,
        top.parsed.records,
    )?;
    let bottom_series = SensorSeries::from_records(
        bottom_source.sensor_id.clone(),
        bottom_source.offset,
        bottom.parsed.records,
    )?;

    Ok(align_series(top_series, bottom_series))
}

