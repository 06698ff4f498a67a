use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use blanket_parser::SensorId;
use polars::df;
use polars::prelude::*;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;
use ::zip::write::FileOptions;
use ::zip::ZipWriter;

use crate::config::ContainerCompression;
use crate::deployment::{Deployment, DeploymentExtract};
use crate::error::Result;
use crate::report::render_report;

pub const CONTAINER_EXTENSION: &str = "zip";
pub const REPORT_EXTENSION: &str = "dat";
pub const MANIFEST_NAME: &str = "manifest.json";
pub const SAMPLES_NAME: &str = "samples.parquet";

/// Where one logger's data came from and how it was calibrated.
#[derive(Debug, Clone)]
pub struct SensorSource {
    pub path: PathBuf,
    pub sensor_id: SensorId,
    pub offset: Option<f64>,
    pub file_hash: String,
}

#[derive(Debug, Clone)]
pub struct SensorSources {
    pub top: SensorSource,
    pub bottom: SensorSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub container: PathBuf,
    pub report: PathBuf,
}

#[derive(Debug, Serialize)]
struct ContainerManifest<'a> {
    run_id: Uuid,
    dive_number: &'a str,
    blanket_letter: &'a str,
    deployment_label: &'a str,
    deptimev: f64,
    rectimev: f64,
    latitude: f64,
    longitude: f64,
    sample_count: usize,
    samples_path: &'static str,
    top: SensorManifest<'a>,
    bottom: SensorManifest<'a>,
}

#[derive(Debug, Serialize)]
struct SensorManifest<'a> {
    sensor_id: &'a str,
    source_path: String,
    file_hash: &'a str,
    offset: Option<f64>,
}

impl<'a> From<&'a SensorSource> for SensorManifest<'a> {
    fn from(source: &'a SensorSource) -> Self {
        Self {
            sensor_id: source.sensor_id.as_str(),
            source_path: source.path.display().to_string(),
            file_hash: &source.file_hash,
            offset: source.offset,
        }
    }
}

/// Writes the numeric container and the text report for each deployment.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    output_dir: PathBuf,
    compression: ContainerCompression,
    run_id: Uuid,
}

impl ArtifactWriter {
    pub fn new(output_dir: impl Into<PathBuf>, compression: ContainerCompression, run_id: Uuid) -> Self {
        Self {
            output_dir: output_dir.into(),
            compression,
            run_id,
        }
    }

    pub fn paths_for(&self, deployment: &Deployment) -> ArtifactPaths {
        let base = deployment.base_name();
        ArtifactPaths {
            container: self
                .output_dir
                .join(format!("{base}.{CONTAINER_EXTENSION}")),
            report: self.output_dir.join(format!("{base}.{REPORT_EXTENSION}")),
        }
    }

    /// Writes both artifacts, or neither. Each file is staged under a hidden
    /// temporary name and only renamed into place once both are on disk. The
    /// report is committed first; a file left at either path by an earlier
    /// run is replaced, not restored, when a later rename fails.
    pub fn write(
        &self,
        extract: &DeploymentExtract<'_>,
        sources: &SensorSources,
    ) -> Result<ArtifactPaths> {
        let paths = self.paths_for(&extract.deployment);
        let container = self.build_container(extract, sources)?;
        let report = render_report(extract, sources);

        fs::create_dir_all(&self.output_dir)?;
        let staged_container = StagedFile::write(&paths.container, &container)?;
        let staged_report = StagedFile::write(&paths.report, report.as_bytes())?;

        staged_report.commit()?;
        if let Err(err) = staged_container.commit() {
            if let Err(cleanup) = fs::remove_file(&paths.report) {
                warn!(
                    report = %paths.report.display(),
                    error = %cleanup,
                    "Failed to remove report after container write failed"
                );
            }
            return Err(err.into());
        }

        info!(
            deployment = %extract.deployment.row.deployment_label,
            container = %paths.container.display(),
            report = %paths.report.display(),
            samples = extract.len(),
            "Wrote deployment artifacts"
        );

        Ok(paths)
    }

    pub fn build_container(
        &self,
        extract: &DeploymentExtract<'_>,
        sources: &SensorSources,
    ) -> Result<Vec<u8>> {
        let deployment = &extract.deployment;
        let row = &deployment.row;
        let manifest = ContainerManifest {
            run_id: self.run_id,
            dive_number: &row.dive_number,
            blanket_letter: &row.blanket_letter,
            deployment_label: &row.deployment_label,
            deptimev: deployment.deploy_time.days(),
            rectimev: deployment.recover_time.days(),
            latitude: row.latitude.decimal_degrees(),
            longitude: row.longitude.decimal_degrees(),
            sample_count: extract.len(),
            samples_path: SAMPLES_NAME,
            top: SensorManifest::from(&sources.top),
            bottom: SensorManifest::from(&sources.bottom),
        };
        let manifest_bytes = serde_json::to_vec_pretty(&manifest)?;

        let mut samples = samples_frame(extract)?;
        let mut samples_bytes = Vec::new();
        ParquetWriter::new(&mut samples_bytes).finish(&mut samples)?;

        let cursor = Cursor::new(Vec::new());
        let mut zip = ZipWriter::new(cursor);
        let options = FileOptions::default().compression_method(self.compression.method());

        zip.start_file(MANIFEST_NAME, options)?;
        zip.write_all(&manifest_bytes)?;
        zip.start_file(SAMPLES_NAME, options)?;
        zip.write_all(&samples_bytes)?;

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

/// `DateTime`, `Top` and `Bot` columns of one extract.
pub fn samples_frame(extract: &DeploymentExtract<'_>) -> PolarsResult<DataFrame> {
    df![
        "DateTime" => extract.times(),
        "Top" => extract.top_corrected(),
        "Bot" => extract.bottom_corrected(),
    ]
}

/// A file written under a temporary name next to its destination. Dropping it
/// without [`StagedFile::commit`] deletes the temporary file.
struct StagedFile {
    temp_path: PathBuf,
    final_path: PathBuf,
    committed: bool,
}

impl StagedFile {
    fn write(final_path: &Path, bytes: &[u8]) -> std::io::Result<Self> {
        let file_name = final_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp_path = final_path.with_file_name(format!(".{file_name}.partial"));

        let staged = Self {
            temp_path,
            final_path: final_path.to_path_buf(),
            committed: false,
        };
        let mut file = fs::File::create(&staged.temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        Ok(staged)
    }

    fn commit(mut self) -> std::io::Result<()> {
        fs::rename(&self.temp_path, &self.final_path)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.temp_path);
        }
    }
}
