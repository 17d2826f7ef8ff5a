//! Typed records extracted from probe output

use serde::{Deserialize, Serialize};

/// One observed echo reply
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbeResponse {
    pub sequence: u32,
    pub ttl: u8,
    pub rtt_ms: f64,
}

/// The "packets transmitted" line printed when the probe finishes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbeSummary {
    pub transmitted: u32,
    pub received: u32,
    pub errors: Option<u32>,
    pub packet_loss: f64,
    pub elapsed_ms: f64,
}

/// The min/avg/max/mdev round-trip line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RttSummary {
    pub min_ms: f64,
    pub avg_ms: f64,
    pub max_ms: f64,
    pub mdev_ms: f64,
}

impl RttSummary {
    /// Statistics for a probe that received no replies at all.
    ///
    /// This is a real measurement (nothing came back) and is distinct from
    /// `None`, which means no statistics line was ever seen.
    pub fn zeroed() -> Self {
        Self {
            min_ms: 0.0,
            avg_ms: 0.0,
            max_ms: 0.0,
            mdev_ms: 0.0,
        }
    }
}

/// How a probe that produced a result finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeOutcome {
    /// Exit status 0, at least one reply
    Replied,
    /// Exit status 1, the command ran but nothing answered
    NoReplies,
}

/// Everything the parser recovered from one probe's output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeReport {
    pub responses: Vec<ProbeResponse>,
    pub summary: Option<ProbeSummary>,
    pub rtt: Option<RttSummary>,
}

impl ProbeReport {
    /// Sequence numbers of the observed replies, in arrival order
    pub fn sequences(&self) -> Vec<u32> {
        self.responses.iter().map(|r| r.sequence).collect()
    }
}
