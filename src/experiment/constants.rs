//! Constants used throughout the experiment front end

/// Probe executable used when none is configured
pub const DEFAULT_PROBE_PROGRAM: &str = "ping";

/// Requests sent per probe when none is configured
pub const DEFAULT_PROBE_COUNT: u32 = 400;

/// Seconds between requests when none is configured
pub const DEFAULT_PROBE_INTERVAL_SECS: f64 = 0.2;

/// Progress bar tick interval in milliseconds
pub const PROGRESS_TICK_INTERVAL_MS: u64 = 100;

/// Histogram lower bound in microseconds
pub const HISTOGRAM_LOW_BOUND_US: u64 = 1;

/// Histogram upper bound in microseconds (one minute)
pub const HISTOGRAM_HIGH_BOUND_US: u64 = 60_000_000;

/// Histogram significant digits for precision
pub const HISTOGRAM_SIGNIFICANT_DIGITS: u8 = 3;

/// Lost sequence numbers listed in full before the report abbreviates
pub const LOST_SEQUENCE_DISPLAY_LIMIT: usize = 20;

/// Loss percentage at or below which a class is reported as healthy
pub const ACCEPTABLE_LOSS_PERCENT: f64 = 1.0;

/// Maximum number of intervals in the latency-over-time line
pub const TIMELINE_BUCKETS: usize = 40;
