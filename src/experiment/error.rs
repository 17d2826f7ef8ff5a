use crate::probe::ProbeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Result file error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Measurement error: {0}")]
    Measurement(String),

    #[error("Experiment `{id}` failed: {source}")]
    Probe {
        id: String,
        #[source]
        source: ProbeError,
    },

    #[error("Worker error: {0}")]
    Worker(String),
}

impl ExperimentError {
    /// Identifier of the experiment whose probe aborted the batch
    pub fn failed_experiment(&self) -> Option<&str> {
        match self {
            ExperimentError::Probe { id, .. } => Some(id),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExperimentError>;
