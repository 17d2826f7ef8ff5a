use crate::experiment::constants::*;
use crate::experiment::error::{ExperimentError, Result};
use clap::Parser;
use std::collections::HashSet;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

/// One experiment: an identifier, the host to probe and the ToS marking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub id: String,
    pub host: String,
    pub tos: u8,
}

impl Target {
    pub fn new(id: impl Into<String>, host: impl Into<String>, tos: u8) -> Self {
        Self {
            id: id.into(),
            host: host.into(),
            tos,
        }
    }
}

impl FromStr for Target {
    type Err = String;

    /// Parses `ID,HOST,TOS`, trimming whitespace around each field
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(',').map(str::trim).collect();
        let [id, host, tos] = fields.as_slice() else {
            return Err(format!(
                "expected ID,HOST,TOS but got {} field(s)",
                fields.len()
            ));
        };
        if id.is_empty() {
            return Err("experiment identifier must not be empty".into());
        }
        if host.is_empty() {
            return Err("host must not be empty".into());
        }
        let tos = tos
            .parse::<u8>()
            .map_err(|e| format!("invalid TOS value `{}`: {}", tos, e))?;
        Ok(Target::new(*id, *host, tos))
    }
}

/// Batch-wide settings handed to the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentSettings {
    /// Probe executable, looked up on `PATH` when not absolute
    pub program: String,
    pub count: u32,
    pub interval_secs: f64,
    pub flood: bool,
}

impl Default for ExperimentSettings {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROBE_PROGRAM.to_string(),
            count: DEFAULT_PROBE_COUNT,
            interval_secs: DEFAULT_PROBE_INTERVAL_SECS,
            flood: false,
        }
    }
}

impl ExperimentSettings {
    pub fn validate(&self) -> Result<()> {
        if self.program.is_empty() {
            return Err(ExperimentError::Config("probe program must not be empty".into()));
        }
        if self.count == 0 {
            return Err(ExperimentError::Config("count must be > 0".into()));
        }
        if !(self.interval_secs.is_finite() && self.interval_secs > 0.0) {
            return Err(ExperimentError::Config("interval must be > 0".into()));
        }
        Ok(())
    }
}

/// Checks that a batch has at least one target and no duplicate identifiers
pub fn validate_targets(targets: &[Target]) -> Result<()> {
    if targets.is_empty() {
        return Err(ExperimentError::Config("at least one target is required".into()));
    }
    let mut seen = HashSet::new();
    for target in targets {
        if !seen.insert(target.id.as_str()) {
            return Err(ExperimentError::Config(format!(
                "duplicate experiment identifier `{}`",
                target.id
            )));
        }
    }
    Ok(())
}

#[derive(Parser, Debug, Clone)]
#[command(name = "qosping")]
#[command(about = "Measure latency and packet loss per ToS marking by running ping concurrently")]
pub struct Config {
    /// Experiment as ID,HOST,TOS (repeat for each traffic class)
    #[arg(short = 't', long = "target", value_name = "ID,HOST,TOS",
          required_unless_present = "read", conflicts_with = "read")]
    pub targets: Vec<Target>,

    /// Write the results to FILE
    #[arg(short = 'w', long, value_name = "FILE")]
    pub write: Option<PathBuf>,

    /// Read previously written results from FILE instead of probing
    #[arg(short = 'r', long, value_name = "FILE", conflicts_with = "write")]
    pub read: Option<PathBuf>,

    /// Seconds between pings
    #[arg(short = 'i', long, default_value_t = DEFAULT_PROBE_INTERVAL_SECS)]
    pub interval: f64,

    /// Number of pings to transmit per experiment
    #[arg(short = 'c', long, default_value_t = DEFAULT_PROBE_COUNT)]
    pub count: u32,

    /// Flood ping (requires privileges for small intervals)
    #[arg(long)]
    pub flood: bool,

    /// Probe executable
    #[arg(long = "ping", value_name = "PATH", default_value = DEFAULT_PROBE_PROGRAM)]
    pub program: String,

    /// Disable the progress bar
    #[arg(long)]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log format (text or json)
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub log_format: String,
}

impl Config {
    /// Settings for the orchestrator
    pub fn settings(&self) -> ExperimentSettings {
        ExperimentSettings {
            program: self.program.clone(),
            count: self.count,
            interval_secs: self.interval,
            flood: self.flood,
        }
    }

    /// Returns true if JSON format logging is enabled
    pub fn is_json_format(&self) -> bool {
        self.log_format.to_lowercase() == "json"
    }

    /// Validates the configuration values
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ExperimentError::Config(format!(
                "log_level must be one of: {}",
                valid_levels.join(", ")
            )));
        }

        if self.read.is_none() {
            self.settings().validate()?;
            validate_targets(&self.targets)?;
        }

        debug!("Configuration validated successfully");
        Ok(())
    }
}
