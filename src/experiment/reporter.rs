use crate::experiment::constants::{
    ACCEPTABLE_LOSS_PERCENT, LOST_SEQUENCE_DISPLAY_LIMIT, TIMELINE_BUCKETS,
};
use crate::experiment::error::Result;
use crate::experiment::result::{ExperimentRecord, ExperimentResult};
use crate::experiment::statistics::Statistics;
use crate::probe::{ProbeOutcome, ProbeResponse};
use colored::*;
use std::fmt::Write as _;
use tracing::{debug, info};

/// Reporter for printing experiment results
pub struct Reporter;

// Width of the loss comparison bars
const LOSS_BAR_WIDTH: usize = 20;

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

impl Reporter {
    /// Collapses ascending sequence numbers into ranges, e.g. `1-3, 7, 10-12`.
    ///
    /// At most `limit` ranges are listed; the rest is summarized as a count
    /// of the sequence numbers left out.
    pub fn format_sequence_ranges(lost: &[u32], limit: usize) -> String {
        if lost.is_empty() {
            return "none".to_string();
        }

        let mut ranges: Vec<(u32, u32)> = Vec::new();
        for &seq in lost {
            match ranges.last_mut() {
                Some((_, end)) if seq == *end + 1 => *end = seq,
                _ => ranges.push((seq, seq)),
            }
        }

        let shown: Vec<String> = ranges
            .iter()
            .take(limit)
            .map(|&(start, end)| {
                if start == end {
                    start.to_string()
                } else {
                    format!("{}-{}", start, end)
                }
            })
            .collect();
        let mut text = shown.join(", ");

        if ranges.len() > limit {
            let hidden: u32 = ranges[limit..].iter().map(|&(s, e)| e - s + 1).sum();
            let _ = write!(text, ", ... ({} more)", hidden);
        }
        text
    }

    /// Renders a loss bar scaled so that 100% fills `width` characters
    fn render_loss_bar(loss_percent: f64, width: usize) -> String {
        if loss_percent <= 0.0 {
            return String::new();
        }
        let length = ((loss_percent / 100.0) * width as f64).ceil() as usize;
        "█".repeat(length.min(width))
    }

    /// Average RTT per interval of the sequence range `1..=span`.
    ///
    /// The range is split into at most `buckets` equal intervals; an
    /// interval without any reply is `None`.
    pub fn latency_timeline(
        responses: &[ProbeResponse],
        span: u32,
        buckets: usize,
    ) -> Vec<Option<f64>> {
        let buckets = buckets.min(span as usize);
        if buckets == 0 {
            return Vec::new();
        }

        let mut sums = vec![(0.0, 0u32); buckets];
        for response in responses.iter().filter(|r| (1..=span).contains(&r.sequence)) {
            let index = (u64::from(response.sequence - 1) * buckets as u64 / u64::from(span)) as usize;
            sums[index].0 += response.rtt_ms;
            sums[index].1 += 1;
        }
        sums.into_iter()
            .map(|(sum, n)| (n > 0).then(|| sum / f64::from(n)))
            .collect()
    }

    /// One character per interval, scaled between the lowest and highest
    /// average; `·` marks an interval with no replies
    fn render_timeline(timeline: &[Option<f64>]) -> String {
        let values = timeline.iter().flatten();
        let low = values.clone().copied().fold(f64::INFINITY, f64::min);
        let high = values.copied().fold(f64::NEG_INFINITY, f64::max);
        let top = (SPARK_LEVELS.len() - 1) as f64;

        timeline
            .iter()
            .map(|value| match value {
                Some(v) if high > low => {
                    SPARK_LEVELS[(((v - low) / (high - low)) * top).round() as usize]
                }
                Some(_) => SPARK_LEVELS[0],
                None => '·',
            })
            .collect()
    }

    fn loss_percent(record: &ExperimentRecord) -> Option<f64> {
        record.summary.map(|s| s.packet_loss)
    }

    fn colorize_loss(loss: Option<f64>) -> String {
        match loss {
            Some(loss) => {
                let text = format!("{:.1}%", loss);
                if loss <= ACCEPTABLE_LOSS_PERCENT {
                    text.green().to_string()
                } else if loss < 100.0 {
                    text.yellow().to_string()
                } else {
                    text.red().bold().to_string()
                }
            }
            None => "n/a".dimmed().to_string(),
        }
    }

    fn render_experiment(out: &mut String, id: &str, record: &ExperimentRecord) -> Result<()> {
        let _ = writeln!(
            out,
            "{}  → {} (ToS {})",
            id.bold(),
            record.config.host(),
            record.config.tos()
        );

        match record.summary {
            Some(summary) => {
                let _ = write!(
                    out,
                    "  Packets:  {} sent, {} received, {} loss",
                    summary.transmitted,
                    summary.received,
                    Self::colorize_loss(Some(summary.packet_loss))
                );
                if let Some(errors) = summary.errors {
                    let _ = write!(out, ", {} errors", errors);
                }
                let _ = writeln!(out, " in {:.0} ms", summary.elapsed_ms);
                let lost = match &record.lost {
                    Some(lost) => Self::format_sequence_ranges(lost, LOST_SEQUENCE_DISPLAY_LIMIT),
                    None => "unknown (reply lines do not match the summary)"
                        .dimmed()
                        .to_string(),
                };
                let _ = writeln!(out, "  Lost:     {}", lost);
            }
            None => {
                let _ = writeln!(out, "  Packets:  {} replies, no summary line", record.responses.len());
            }
        }

        if record.outcome == ProbeOutcome::NoReplies {
            let _ = writeln!(out, "  {}", "No replies received".red());
            return Ok(());
        }

        let stats = Statistics::new(&record.rtts_ms())?;
        match record.rtt {
            Some(rtt) => {
                let _ = writeln!(
                    out,
                    "  RTT:      min {:.3} / avg {:.3} / max {:.3} ms",
                    rtt.min_ms, rtt.avg_ms, rtt.max_ms
                );
                let _ = writeln!(out, "  Jitter:   {:.3} ms (mdev)", rtt.mdev_ms);
            }
            None if stats.count() > 0 => {
                let _ = writeln!(
                    out,
                    "  RTT:      mean {:.3} ms over {} replies, no rtt line",
                    stats.mean_ms(),
                    stats.count()
                );
            }
            None => {}
        }

        if stats.count() > 0 {
            let _ = write!(
                out,
                "  P50: {:.3} ms  P90: {:.3} ms  P99: {:.3} ms",
                stats.percentile_ms(0.5),
                stats.percentile_ms(0.9),
                stats.percentile_ms(0.99)
            );
            if stats.clamped_count() > 0 {
                let _ = write!(out, " ({} clamped)", stats.clamped_count());
            }
            let _ = writeln!(out);

            let span = record
                .summary
                .map(|s| s.transmitted)
                .or_else(|| record.responses.iter().map(|r| r.sequence).max())
                .unwrap_or(0);
            let timeline = Self::latency_timeline(&record.responses, span, TIMELINE_BUCKETS);
            let _ = writeln!(
                out,
                "  Timeline: {}",
                Self::render_timeline(&timeline).cyan()
            );
        }
        Ok(())
    }

    /// Render the complete results summary
    pub fn render(&self, result: &ExperimentResult) -> Result<String> {
        debug!(experiments = result.len(), "Rendering experiment results");
        let mut out = String::new();

        let _ = writeln!(out, "{}", "┌─────────────────────────────┐".cyan());
        let _ = writeln!(out, "{}", "│  qosping Results            │".cyan());
        let _ = writeln!(out, "{}", "└─────────────────────────────┘".cyan());
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Started:  {}",
            result.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        let _ = writeln!(
            out,
            "Finished: {} ({:.1}s)",
            result.finished_at.format("%Y-%m-%d %H:%M:%S UTC"),
            result.duration().num_milliseconds() as f64 / 1000.0
        );
        let _ = writeln!(
            out,
            "Probes:   {} per experiment, every {:.3}s",
            result.probe_count, result.probe_interval_secs
        );
        let _ = writeln!(out);

        if result.is_empty() {
            let _ = writeln!(out, "{}", "No experiments recorded.".red());
            return Ok(out);
        }

        for (id, record) in &result.experiments {
            Self::render_experiment(&mut out, id, record)?;
            let _ = writeln!(out);
        }

        let id_width = result
            .experiments
            .keys()
            .map(|id| id.chars().count())
            .max()
            .unwrap_or(0)
            .max("Class".len());
        let _ = writeln!(
            out,
            "{:<id_width$}  {:>8}  {:>10}  {:>10}",
            "Class", "Loss", "Avg (ms)", "Mdev (ms)",
            id_width = id_width
        );
        for (id, record) in &result.experiments {
            let loss = Self::loss_percent(record);
            let (avg, mdev) = record
                .rtt
                .map(|r| (format!("{:.3}", r.avg_ms), format!("{:.3}", r.mdev_ms)))
                .unwrap_or_else(|| ("n/a".to_string(), "n/a".to_string()));
            let loss_text = loss
                .map(|l| format!("{:.1}%", l))
                .unwrap_or_else(|| "n/a".to_string());
            let _ = writeln!(
                out,
                "{:<id_width$}  {:>8}  {:>10}  {:>10}  {}",
                id,
                loss_text,
                avg,
                mdev,
                Self::render_loss_bar(loss.unwrap_or(0.0), LOSS_BAR_WIDTH).red(),
                id_width = id_width
            );
        }

        Ok(out)
    }

    /// Print the complete results summary to stdout
    pub fn print_results(&self, result: &ExperimentResult) -> Result<()> {
        print!("{}", self.render(result)?);
        info!(experiments = result.len(), "Results reported");
        Ok(())
    }
}
