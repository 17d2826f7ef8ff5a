//! Running `ping` and turning its output into typed records

pub mod config;
pub mod error;
pub mod parser;
pub mod record;
pub mod runner;

pub use config::ProbeConfig;
pub use error::{ProbeError, Result as ProbeResult};
pub use parser::{parse_line, parse_output, ParsedLine};
pub use record::{ProbeOutcome, ProbeReport, ProbeResponse, ProbeSummary, RttSummary};
pub use runner::{build_args, ProbeExecutor, ProbeRun, ProbeRunner, ProcessOutput, SystemExecutor};
