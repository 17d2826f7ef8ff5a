use crate::experiment::constants::*;
use crate::experiment::error::{ExperimentError, Result};
use hdrhistogram::Histogram;
use tracing::{debug, warn};

/// Latency distribution of one experiment, recorded in microseconds
pub struct Statistics {
    hist: Histogram<u64>,
    clamped_count: usize,
}

impl Statistics {
    /// Create a new Statistics instance from round-trip times in milliseconds
    pub fn new(rtts_ms: &[f64]) -> Result<Self> {
        debug!(
            sample_count = rtts_ms.len(),
            "Creating statistics from round-trip times"
        );
        let mut hist = Histogram::<u64>::new_with_bounds(
            HISTOGRAM_LOW_BOUND_US,
            HISTOGRAM_HIGH_BOUND_US,
            HISTOGRAM_SIGNIFICANT_DIGITS,
        )
        .map_err(|e| ExperimentError::Measurement(format!("Failed to create histogram: {}", e)))?;

        let mut clamped_count = 0;
        for &rtt_ms in rtts_ms {
            let micros = (rtt_ms * 1000.0).round() as u64;
            let clamped = micros.clamp(HISTOGRAM_LOW_BOUND_US, HISTOGRAM_HIGH_BOUND_US);
            if micros != clamped {
                clamped_count += 1;
            }

            hist.record(clamped).map_err(|e| {
                warn!(rtt_ms = rtt_ms, error = %e, "Failed to record round-trip time");
                ExperimentError::Measurement(format!("Failed to record round-trip time: {}", e))
            })?;
        }

        if clamped_count > 0 {
            debug!(
                clamped_count = clamped_count,
                total_count = rtts_ms.len(),
                "Some round-trip times were clamped to histogram bounds"
            );
        }

        Ok(Self {
            hist,
            clamped_count,
        })
    }

    /// Round-trip time in milliseconds at `quantile` (0.0..=1.0)
    pub fn percentile_ms(&self, quantile: f64) -> f64 {
        self.hist.value_at_quantile(quantile) as f64 / 1000.0
    }

    pub fn mean_ms(&self) -> f64 {
        self.hist.mean() / 1000.0
    }

    /// Get the number of values that were clamped
    pub fn clamped_count(&self) -> usize {
        self.clamped_count
    }

    pub fn count(&self) -> u64 {
        self.hist.len()
    }
}
