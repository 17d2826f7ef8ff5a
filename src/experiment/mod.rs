//! Experiment orchestration, persistence and reporting

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod loss;
pub mod orchestrator;
pub mod progress;
pub mod reporter;
pub mod result;
pub mod statistics;

pub use config::{validate_targets, Config, ExperimentSettings, Target};
pub use constants::*;
pub use error::{ExperimentError, Result};
pub use logging::{init_logging, init_logging_with_config};
pub use loss::lost_sequence_numbers;
pub use orchestrator::{BatchState, Orchestrator};
pub use progress::ProgressTracker;
pub use reporter::Reporter;
pub use result::{ExperimentRecord, ExperimentResult};
pub use statistics::Statistics;
