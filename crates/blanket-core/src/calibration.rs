use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use blanket_parser::SensorId;
use tracing::{info, warn};

use crate::error::{PipelineError, Result};

/// Per-logger temperature offsets (degrees C), keyed by the seven-character
/// sensor id. Loaded once per run and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct CalibrationTable {
    offsets: HashMap<String, f64>,
}

impl CalibrationTable {
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|source| PipelineError::FileNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_reader(file)?;
        info!(path = %path.display(), entries = table.len(), "Loaded calibration offsets");
        Ok(table)
    }

    /// Reads `sensorId,offset` rows; there is no header row. A repeated id
    /// keeps the last offset seen.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut offsets = HashMap::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record?;
            let line = record.position().map(|p| p.line() as usize).unwrap_or(idx + 1);

            let (Some(id), Some(value)) = (record.get(0), record.get(1)) else {
                return Err(PipelineError::Calibration {
                    line,
                    message: format!("expected 'sensorId,offset', found {} column(s)", record.len()),
                });
            };
            if id.is_empty() {
                return Err(PipelineError::Calibration {
                    line,
                    message: "sensor id is empty".to_string(),
                });
            }
            let offset = value.parse::<f64>().map_err(|err| PipelineError::Calibration {
                line,
                message: format!("offset '{value}' for sensor {id} is not a number: {err}"),
            })?;
            offsets.insert(id.to_string(), offset);
        }

        Ok(Self { offsets })
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            offsets: entries
                .into_iter()
                .map(|(id, offset)| (id.into(), offset))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Offset for `sensor_id`, matched on its first seven characters.
    ///
    /// An unknown id is not an error here: it is logged and `Ok(None)` is
    /// returned, leaving the caller to decide whether the run can go on.
    pub fn resolve(&self, sensor_id: &SensorId) -> Result<Option<f64>> {
        if sensor_id.is_empty() {
            return Err(PipelineError::EmptyIdentifier);
        }

        let key = sensor_id.normalized();
        match self.offsets.get(key) {
            Some(offset) => {
                info!(sensor_id = key, offset = *offset, "Found offset for thermistor");
                Ok(Some(*offset))
            }
            None => {
                warn!(sensor_id = key, "Could not find offset for thermistor");
                Ok(None)
            }
        }
    }
}
