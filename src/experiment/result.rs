//! Aggregate results of one experiment batch and their persistence

use crate::experiment::error::Result;
use crate::experiment::loss::lost_sequence_numbers;
use crate::probe::{ProbeConfig, ProbeOutcome, ProbeResponse, ProbeRun, ProbeSummary, RttSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Everything measured for one experiment identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRecord {
    pub config: ProbeConfig,
    pub outcome: ProbeOutcome,
    /// Replies in arrival order
    pub responses: Vec<ProbeResponse>,
    pub summary: Option<ProbeSummary>,
    pub rtt: Option<RttSummary>,
    /// Sequence numbers in `1..=transmitted` that never got a reply.
    ///
    /// `None` when the output cannot support a reconstruction: no summary
    /// line, or fewer reply lines than the summary counts as received
    /// (flood mode prints dots instead of replies).
    pub lost: Option<Vec<u32>>,
}

impl ExperimentRecord {
    /// Combine a finished probe with its configuration and reconstruct the
    /// lost sequence numbers
    pub fn from_run(config: ProbeConfig, run: ProbeRun) -> Self {
        let ProbeRun { outcome, report } = run;
        let lost = match &report.summary {
            Some(summary) if report.responses.len() as u64 == u64::from(summary.received) => {
                Some(lost_sequence_numbers(&report.sequences(), summary.transmitted))
            }
            Some(summary) => {
                warn!(
                    experiment = config.experiment_id(),
                    replies = report.responses.len(),
                    received = summary.received,
                    "Reply lines do not match the summary, lost sequence numbers unknown"
                );
                None
            }
            None => None,
        };
        Self {
            config,
            outcome,
            responses: report.responses,
            summary: report.summary,
            rtt: report.rtt,
            lost,
        }
    }

    /// Round-trip times of all replies in milliseconds
    pub fn rtts_ms(&self) -> Vec<f64> {
        self.responses.iter().map(|r| r.rtt_ms).collect()
    }
}

/// Result of a complete batch, keyed by experiment identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentResult {
    pub experiments: BTreeMap<String, ExperimentRecord>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub probe_count: u32,
    pub probe_interval_secs: f64,
}

impl ExperimentResult {
    pub fn get(&self, id: &str) -> Option<&ExperimentRecord> {
        self.experiments.get(id)
    }

    pub fn len(&self) -> usize {
        self.experiments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
    }

    /// Wall-clock duration of the batch
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the result to `path` as JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        info!(path = %path.display(), experiments = self.len(), "Results written");
        Ok(())
    }

    /// Read a result previously written with [`ExperimentResult::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading results");
        let content = fs::read_to_string(path)?;
        let result = Self::from_json(&content)?;
        info!(path = %path.display(), experiments = result.len(), "Results loaded");
        Ok(result)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::probe::{parse_output, ProbeReport};
    use chrono::TimeZone;

    pub(crate) fn sample_result() -> ExperimentResult {
        let replied = ExperimentRecord::from_run(
            ProbeConfig::new("High priority", "192.0.2.1", 16, 0.2, 4, false),
            ProbeRun {
                outcome: ProbeOutcome::Replied,
                report: ProbeReport {
                    responses: vec![
                        ProbeResponse { sequence: 1, ttl: 57, rtt_ms: 11.8 },
                        ProbeResponse { sequence: 2, ttl: 57, rtt_ms: 12.0 },
                        ProbeResponse { sequence: 4, ttl: 57, rtt_ms: 12.352 },
                    ],
                    summary: Some(ProbeSummary {
                        transmitted: 4,
                        received: 3,
                        errors: None,
                        packet_loss: 25.0,
                        elapsed_ms: 603.0,
                    }),
                    rtt: Some(RttSummary {
                        min_ms: 11.8,
                        avg_ms: 12.05,
                        max_ms: 12.352,
                        mdev_ms: 0.228,
                    }),
                },
            },
        );
        let silent = ExperimentRecord::from_run(
            ProbeConfig::new("Low priority", "192.0.2.1", 8, 0.2, 4, false),
            ProbeRun {
                outcome: ProbeOutcome::NoReplies,
                report: ProbeReport {
                    responses: Vec::new(),
                    summary: Some(ProbeSummary {
                        transmitted: 4,
                        received: 0,
                        errors: Some(4),
                        packet_loss: 100.0,
                        elapsed_ms: 3059.0,
                    }),
                    rtt: Some(RttSummary::zeroed()),
                },
            },
        );

        let mut experiments = BTreeMap::new();
        experiments.insert("High priority".to_string(), replied);
        experiments.insert("Low priority".to_string(), silent);

        ExperimentResult {
            experiments,
            started_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            finished_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 1, 21).unwrap()
                + chrono::Duration::nanoseconds(123_456_789),
            probe_count: 4,
            probe_interval_secs: 0.2,
        }
    }

    #[test]
    fn test_record_reconstructs_loss() {
        let result = sample_result();
        assert_eq!(result.get("High priority").unwrap().lost, Some(vec![3]));
        assert_eq!(result.get("Low priority").unwrap().lost, Some(vec![1, 2, 3, 4]));
    }

    #[test]
    fn test_record_without_summary_has_no_loss_list() {
        let record = ExperimentRecord::from_run(
            ProbeConfig::new("Default", "h", 0, 1.0, 5, false),
            ProbeRun {
                outcome: ProbeOutcome::Replied,
                report: ProbeReport {
                    responses: vec![ProbeResponse { sequence: 2, ttl: 64, rtt_ms: 1.0 }],
                    summary: None,
                    rtt: None,
                },
            },
        );
        assert_eq!(record.lost, None);
        assert!(record.rtt.is_none());
        assert_eq!(record.rtts_ms(), vec![1.0]);
    }

    #[test]
    fn test_flood_output_leaves_loss_unknown() {
        let report = parse_output(
            "PING 192.0.2.1 (192.0.2.1) 56(84) bytes of data.\n\
             .....\n\
             --- 192.0.2.1 ping statistics ---\n\
             5 packets transmitted, 5 received, 0% packet loss, time 4ms\n\
             rtt min/avg/max/mdev = 0.031/0.040/0.052/0.007 ms, ipg/ewma 1.012/0.043 ms\n",
        );
        let record = ExperimentRecord::from_run(
            ProbeConfig::new("Flood", "192.0.2.1", 0, 0.01, 5, true),
            ProbeRun {
                outcome: ProbeOutcome::Replied,
                report,
            },
        );

        assert_eq!(record.summary.map(|s| s.received), Some(5));
        assert!(record.responses.is_empty());
        assert_eq!(record.lost, None);
    }

    #[test]
    fn test_partial_reply_lines_leave_loss_unknown() {
        let record = ExperimentRecord::from_run(
            ProbeConfig::new("Default", "h", 0, 1.0, 3, false),
            ProbeRun {
                outcome: ProbeOutcome::Replied,
                report: ProbeReport {
                    responses: vec![ProbeResponse { sequence: 1, ttl: 64, rtt_ms: 1.0 }],
                    summary: Some(ProbeSummary {
                        transmitted: 3,
                        received: 2,
                        errors: None,
                        packet_loss: 33.3333,
                        elapsed_ms: 2002.0,
                    }),
                    rtt: None,
                },
            },
        );
        assert_eq!(record.lost, None);
    }

    #[test]
    fn test_json_round_trip() -> Result<()> {
        let result = sample_result();
        let restored = ExperimentResult::from_json(&result.to_json()?)?;
        assert_eq!(restored, result);
        Ok(())
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let result = sample_result();
        let path = std::env::temp_dir().join(format!(
            "qosping-result-{}-{}.json",
            std::process::id(),
            line!()
        ));

        result.save(&path)?;
        let loaded = ExperimentResult::load(&path);
        let _ = fs::remove_file(&path);

        assert_eq!(loaded?, result);
        Ok(())
    }

    #[test]
    fn test_load_missing_file() {
        assert!(ExperimentResult::load("/nonexistent/qosping/results.json").is_err());
    }

    #[test]
    fn test_duration() {
        let result = sample_result();
        assert_eq!(result.duration().num_seconds(), 81);
    }
}
