use std::path::{Path, PathBuf};

use blake3::Hasher;
use blanket_parser::{parse_logger_file, ParsedLoggerFile, ParserAttempt, ParserError};
use tracing::info;

use crate::error::{PipelineError, Result};

/// A logger stream that has been read, fingerprinted and parsed.
#[derive(Debug, Clone)]
pub struct LoggerInput {
    pub path: PathBuf,
    pub file_hash: String,
    pub parsed: ParsedLoggerFile,
}

pub fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| PipelineError::FileNotFound {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_logger_file(path: &Path) -> Result<LoggerInput> {
    let contents = read_input(path)?;
    parse_logger_bytes(path, &contents)
}

pub fn parse_logger_bytes(path: &Path, contents: &[u8]) -> Result<LoggerInput> {
    let file_hash = compute_hash(contents);

    let content_str = std::str::from_utf8(contents).map_err(|_| PipelineError::Parse {
        path: path.to_path_buf(),
        source: ParserError::InvalidFormat {
            attempts: vec![ParserAttempt::new(
                "utf8",
                "file contents were not valid UTF-8",
            )],
        },
    })?;

    let parsed = parse_logger_file(content_str).map_err(|source| PipelineError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    info!(
        path = %path.display(),
        parser = parsed.parser,
        sensor_id = %parsed.sensor_id,
        records = parsed.records.len(),
        hash = %file_hash,
        "Parsed logger file"
    );

    Ok(LoggerInput {
        path: path.to_path_buf(),
        file_hash,
        parsed,
    })
}

pub fn compute_hash(contents: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(contents);
    let hash = hasher.finalize();
    hash.to_hex().to_string()
}
