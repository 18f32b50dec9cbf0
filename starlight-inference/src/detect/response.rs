use crate::detect::DetectResult;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// What comes back from the detector, either a prediction list or an error
/// message. `sequence` echoes the request when the detector supports it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectorResponse {
    #[serde(default)]
    pub sequence: Option<u64>,
    #[serde(default)]
    pub predictions: Vec<DetectResult>,
    #[serde(default)]
    pub error: Option<String>,
}

impl DetectorResponse {
    pub fn success(sequence: u64, predictions: Vec<DetectResult>) -> Self {
        Self {
            sequence: Some(sequence),
            predictions,
            error: None,
        }
    }

    pub fn failure(sequence: Option<u64>, error: impl Into<String>) -> Self {
        Self {
            sequence,
            predictions: vec![],
            error: Some(error.into()),
        }
    }

    pub fn into_result(self) -> Result<Vec<DetectResult>> {
        match self.error {
            Some(error) => Err(anyhow!("Detector error: {}", error)),
            None => Ok(self.predictions),
        }
    }
}
