use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Environment variable naming a TOML configuration file.
pub const CONFIG_ENV_VAR: &str = "BLANKET_CONFIG";

/// What to do when a deployment window selects no aligned samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyWindowPolicy {
    /// Log the failure and move on to the next row.
    Never,
    /// Abort only when the empty row is the last one in the metadata table.
    #[default]
    LastOnly,
    /// Abort on the first empty window.
    Always,
}

impl EmptyWindowPolicy {
    pub fn should_abort(&self, is_last_row: bool) -> bool {
        match self {
            EmptyWindowPolicy::Never => false,
            EmptyWindowPolicy::LastOnly => is_last_row,
            EmptyWindowPolicy::Always => true,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EmptyWindowPolicy::Never => "never",
            EmptyWindowPolicy::LastOnly => "last_only",
            EmptyWindowPolicy::Always => "always",
        }
    }
}

impl fmt::Display for EmptyWindowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmptyWindowPolicy {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "never" => Ok(EmptyWindowPolicy::Never),
            "last_only" | "last" => Ok(EmptyWindowPolicy::LastOnly),
            "always" => Ok(EmptyWindowPolicy::Always),
            other => Err(format!(
                "unknown empty-window policy '{other}' (expected never, last_only or always)"
            )),
        }
    }
}

/// What to do when a sensor id has no entry in the calibration table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingOffsetPolicy {
    /// Warn and carry NaN corrected temperatures for that sensor.
    #[default]
    Warn,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerCompression {
    #[default]
    Deflated,
    Stored,
}

impl ContainerCompression {
    pub fn method(&self) -> zip::CompressionMethod {
        match self {
            ContainerCompression::Deflated => zip::CompressionMethod::Deflated,
            ContainerCompression::Stored => zip::CompressionMethod::Stored,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub offsets_path: PathBuf,
    pub output_dir: PathBuf,
    pub empty_window_policy: EmptyWindowPolicy,
    pub missing_offset_policy: MissingOffsetPolicy,
    pub container_compression: ContainerCompression,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            offsets_path: PathBuf::from("offsets.csv"),
            output_dir: PathBuf::from("."),
            empty_window_policy: EmptyWindowPolicy::default(),
            missing_offset_policy: MissingOffsetPolicy::default(),
            container_compression: ContainerCompression::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| PipelineError::FileNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|err| {
            PipelineError::Config(format!("failed to load {}: {err}", path.display()))
        })
    }

    /// Explicit path first, then `BLANKET_CONFIG`, then built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => Self::load(Path::new(path.trim())),
            _ => Ok(Self::default()),
        }
    }
}
