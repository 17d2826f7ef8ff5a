//! Per-probe configuration

use serde::{Deserialize, Serialize};

/// Everything needed to launch one probe against one target under one
/// ToS marking. Fields are private so a config cannot change after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    experiment_id: String,
    host: String,
    tos: u8,
    interval_secs: f64,
    count: u32,
    flood: bool,
}

impl ProbeConfig {
    pub fn new(
        experiment_id: impl Into<String>,
        host: impl Into<String>,
        tos: u8,
        interval_secs: f64,
        count: u32,
        flood: bool,
    ) -> Self {
        Self {
            experiment_id: experiment_id.into(),
            host: host.into(),
            tos,
            interval_secs,
            count,
            flood,
        }
    }

    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Type-of-service byte placed in outgoing packets
    pub fn tos(&self) -> u8 {
        self.tos
    }

    /// Seconds between requests
    pub fn interval_secs(&self) -> f64 {
        self.interval_secs
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn flood(&self) -> bool {
        self.flood
    }
}
