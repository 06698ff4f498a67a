pub mod alignment;
pub mod calibration;
pub mod config;
pub mod deployment;
pub mod error;
pub mod ingestion;
pub mod outputs;
pub mod pipeline;
pub mod report;
pub mod time_encoding;

pub use error::{PipelineError, Result};
