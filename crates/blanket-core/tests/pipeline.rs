use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use blanket_core::config::{EmptyWindowPolicy, MissingOffsetPolicy, PipelineConfig};
use blanket_core::outputs::SAMPLES_NAME;
use blanket_core::pipeline::{run, DeploymentStatus, PipelineInputs};
use blanket_core::PipelineError;
use blanket_parser::LoggerRecord;
use polars::prelude::*;
use tempfile::{tempdir, TempDir};

mod common;
use common::{at, fixture_path, instants, logger_stream, mean, metadata_row, record, write_metadata};

const OFFSETS: &str = "0000014,1.2345\n0000231,-0.5000\n";

struct Workspace {
    dir: TempDir,
    top: Vec<LoggerRecord>,
    bottom: Vec<LoggerRecord>,
}

impl Workspace {
    /// Two loggers sharing 100 timestamps, four seconds apart, starting at
    /// 2003-07-16 15:00:04 (day 197).
    fn new() -> Self {
        let dir = tempdir().unwrap();
        let times = instants(at(2003, 7, 16, 15, 0, 4), 4, 100);
        let top: Vec<_> = times
            .iter()
            .enumerate()
            .map(|(idx, t)| record(*t, 32114.0 + idx as f64, 16.088 - idx as f64 * 0.001))
            .collect();
        let bottom: Vec<_> = times
            .iter()
            .enumerate()
            .map(|(idx, t)| record(*t, 30500.0 + idx as f64, 15.512 + idx as f64 * 0.002))
            .collect();

        fs::write(dir.path().join("top.dat"), logger_stream("0000014", &top)).unwrap();
        fs::write(dir.path().join("bottom.dat"), logger_stream("0000231", &bottom)).unwrap();
        fs::write(dir.path().join("offsets.csv"), OFFSETS).unwrap();
        fs::create_dir(dir.path().join("out")).unwrap();

        Self { dir, top, bottom }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn inputs(&self, metadata: Option<PathBuf>) -> PipelineInputs {
        PipelineInputs {
            top_path: self.path("top.dat"),
            bottom_path: self.path("bottom.dat"),
            metadata_path: metadata,
        }
    }

    fn config(&self) -> PipelineConfig {
        PipelineConfig {
            offsets_path: self.path("offsets.csv"),
            output_dir: self.path("out"),
            ..PipelineConfig::default()
        }
    }

    fn metadata(&self, rows: &[String]) -> PathBuf {
        write_metadata(self.dir.path(), rows)
    }

    fn output_names(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.path("out"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

fn read_samples(container: &Path) -> DataFrame {
    let bytes = fs::read(container).unwrap();
    let mut archive = ::zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut samples = Vec::new();
    archive
        .by_name(SAMPLES_NAME)
        .unwrap()
        .read_to_end(&mut samples)
        .unwrap();
    ParquetReader::new(Cursor::new(samples)).finish().unwrap()
}

fn column(df: &DataFrame, name: &str) -> Vec<f64> {
    df.column(name)
        .unwrap()
        .f64()
        .unwrap()
        .into_no_null_iter()
        .collect()
}

#[test]
fn single_deployment_covers_all_samples() {
    let ws = Workspace::new();
    let metadata = ws.metadata(&[metadata_row("D1", (197, 15, 0), (197, 16, 0))]);

    let summary = run(&ws.inputs(Some(metadata)), &ws.config()).unwrap();

    assert_eq!(summary.aligned_samples, 100);
    assert_eq!(summary.outcomes.len(), 1);
    let outcome = &summary.outcomes[0];
    assert_eq!(outcome.status, DeploymentStatus::Written);
    assert_eq!(outcome.sample_count, 100);
    let artifacts = outcome.artifacts.as_ref().unwrap();
    assert_eq!(ws.output_names(), vec!["3921_A_D1.dat", "3921_A_D1.zip"]);

    let df = read_samples(&artifacts.container);
    assert_eq!(df.height(), 100);

    let raw_top: Vec<f64> = ws.top.iter().map(|r| r.temperature_c).collect();
    let raw_bottom: Vec<f64> = ws.bottom.iter().map(|r| r.temperature_c).collect();
    let top = column(&df, "Top");
    let bot = column(&df, "Bot");
    assert!((mean(&top) - (mean(&raw_top) - 1.2345)).abs() < 1e-9);
    assert!((mean(&bot) - (mean(&raw_bottom) + 0.5)).abs() < 1e-9);

    let report = fs::read_to_string(&artifacts.report).unwrap();
    assert!(report.contains(" Top Thermistor ID          : 0000014 "));
}

#[test]
fn fixtures_run_end_to_end() {
    let ws = Workspace::new();
    let metadata = ws.metadata(&[metadata_row("D1", (197, 15, 0), (197, 15, 10))]);
    let inputs = PipelineInputs {
        top_path: fixture_path("antares_top.dat"),
        bottom_path: fixture_path("antares_bottom.dat"),
        metadata_path: Some(metadata),
    };

    let summary = run(&inputs, &ws.config()).unwrap();

    assert_eq!(summary.aligned_samples, 479);
    // 15:00:04 through 15:10:00 on a 4 s grid, less the missing 15:00:24
    assert_eq!(summary.outcomes[0].sample_count, 149);
}

#[test]
fn empty_window_before_last_row_continues() {
    let ws = Workspace::new();
    let metadata = ws.metadata(&[
        metadata_row("Early", (100, 0, 0), (101, 0, 0)),
        metadata_row("D2", (197, 15, 0), (197, 16, 0)),
    ]);

    let summary = run(&ws.inputs(Some(metadata)), &ws.config()).unwrap();

    assert_eq!(summary.outcomes[0].status, DeploymentStatus::EmptyWindow);
    assert!(summary.outcomes[0].artifacts.is_none());
    assert_eq!(summary.outcomes[1].status, DeploymentStatus::Written);
    assert_eq!(summary.written(), 1);
    assert_eq!(ws.output_names(), vec!["3921_A_D2.dat", "3921_A_D2.zip"]);
}

#[test]
fn empty_last_row_aborts_but_keeps_earlier_artifacts() {
    let ws = Workspace::new();
    let metadata = ws.metadata(&[
        metadata_row("D1", (197, 15, 0), (197, 16, 0)),
        metadata_row("Late", (300, 0, 0), (301, 0, 0)),
    ]);

    let err = run(&ws.inputs(Some(metadata)), &ws.config()).unwrap_err();

    match err {
        PipelineError::EmptyDeploymentWindow { deployment, .. } => {
            assert_eq!(deployment, "3921_A_Late")
        }
        other => panic!("expected empty window error, got {other:?}"),
    }
    assert_eq!(ws.output_names(), vec!["3921_A_D1.dat", "3921_A_D1.zip"]);
}

#[test]
fn never_policy_tolerates_empty_last_row() {
    let ws = Workspace::new();
    let metadata = ws.metadata(&[
        metadata_row("D1", (197, 15, 0), (197, 16, 0)),
        metadata_row("Late", (300, 0, 0), (301, 0, 0)),
    ]);
    let config = PipelineConfig {
        empty_window_policy: EmptyWindowPolicy::Never,
        ..ws.config()
    };

    let summary = run(&ws.inputs(Some(metadata)), &config).unwrap();
    assert_eq!(summary.written(), 1);
    assert_eq!(summary.outcomes[1].status, DeploymentStatus::EmptyWindow);
}

#[test]
fn always_policy_aborts_on_first_empty_row() {
    let ws = Workspace::new();
    let metadata = ws.metadata(&[
        metadata_row("Early", (100, 0, 0), (101, 0, 0)),
        metadata_row("D2", (197, 15, 0), (197, 16, 0)),
    ]);
    let config = PipelineConfig {
        empty_window_policy: EmptyWindowPolicy::Always,
        ..ws.config()
    };

    let err = run(&ws.inputs(Some(metadata)), &config).unwrap_err();
    assert!(matches!(err, PipelineError::EmptyDeploymentWindow { .. }));
    assert!(ws.output_names().is_empty());
}

#[test]
fn missing_metadata_argument_is_reported() {
    let ws = Workspace::new();
    let err = run(&ws.inputs(None), &ws.config()).unwrap_err();
    assert!(matches!(err, PipelineError::ArgumentCountMismatch(_)));
    assert!(ws.output_names().is_empty());
}

#[test]
fn unreadable_input_aborts_before_processing() {
    let ws = Workspace::new();
    let metadata = ws.metadata(&[metadata_row("D1", (197, 15, 0), (197, 16, 0))]);
    let inputs = PipelineInputs {
        bottom_path: ws.path("missing.dat"),
        ..ws.inputs(Some(metadata))
    };

    let err = run(&inputs, &ws.config()).unwrap_err();
    match err {
        PipelineError::FileNotFound { path, .. } => assert_eq!(path, ws.path("missing.dat")),
        other => panic!("expected file-not-found error, got {other:?}"),
    }
    assert!(ws.output_names().is_empty());
}

#[test]
fn stream_without_banner_is_invalid_format() {
    let ws = Workspace::new();
    fs::write(ws.path("top.dat"), "not a logger export\n".repeat(20)).unwrap();
    let metadata = ws.metadata(&[metadata_row("D1", (197, 15, 0), (197, 16, 0))]);

    let err = run(&ws.inputs(Some(metadata)), &ws.config()).unwrap_err();
    assert!(err.is_invalid_format());
    assert!(ws.output_names().is_empty());
}

#[test]
fn missing_offset_warns_by_default_and_fails_when_configured() {
    let ws = Workspace::new();
    fs::write(ws.path("offsets.csv"), "0000014,1.2345\n").unwrap();
    let metadata = ws.metadata(&[metadata_row("D1", (197, 15, 0), (197, 16, 0))]);

    let summary = run(&ws.inputs(Some(metadata.clone())), &ws.config()).unwrap();
    let artifacts = summary.outcomes[0].artifacts.as_ref().unwrap();
    let df = read_samples(&artifacts.container);
    assert!(column(&df, "Bot").iter().all(|value| value.is_nan()));

    let config = PipelineConfig {
        missing_offset_policy: MissingOffsetPolicy::Fail,
        ..ws.config()
    };
    let err = run(&ws.inputs(Some(metadata)), &config).unwrap_err();
    match err {
        PipelineError::MissingCalibrationOffset { sensor_id } => assert_eq!(sensor_id, "0000231"),
        other => panic!("expected missing offset error, got {other:?}"),
    }
}
