// crates/blanket-core/src/error.rs

use std::path::PathBuf;

use blanket_parser::ParserError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Unable to open file {path}: {source}")]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse logger file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParserError,
    },

    #[error("Sensor identifier is empty")]
    EmptyIdentifier,

    #[error("Could not find offset for thermistor: {sensor_id}")]
    MissingCalibrationOffset { sensor_id: String },

    #[error("Calibration table line {line} invalid: {message}")]
    Calibration { line: usize, message: String },

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Deployment metadata row {row} invalid: {message}")]
    Metadata { row: usize, message: String },

    #[error("Wrong times for deployment {deployment}: no aligned samples between {deploy_time} and {recover_time}")]
    EmptyDeploymentWindow {
        deployment: String,
        deploy_time: f64,
        recover_time: f64,
    },

    #[error("Missing argument: {0}")]
    ArgumentCountMismatch(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ZIP operation failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl PipelineError {
    /// True when a logger stream failed the banner check of every known format.
    pub fn is_invalid_format(&self) -> bool {
        matches!(
            self,
            PipelineError::Parse {
                source: ParserError::InvalidFormat { .. },
                ..
            }
        )
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
