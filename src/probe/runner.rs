use crate::probe::config::ProbeConfig;
use crate::probe::error::{ProbeError, Result};
use crate::probe::parser::parse_output;
use crate::probe::record::{ProbeOutcome, ProbeReport, RttSummary};
use std::io;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Raw result of running an external program to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Trait for launching the probe executable
pub trait ProbeExecutor: Send + Sync {
    /// Run `program` with `args` and wait for it to exit
    fn execute(&self, program: &str, args: &[String]) -> io::Result<ProcessOutput>;
}

/// Runs the probe as a real child process.
///
/// The child runs under the `C` locale: the output grammar only matches the
/// untranslated iputils messages.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl ProbeExecutor for SystemExecutor {
    fn execute(&self, program: &str, args: &[String]) -> io::Result<ProcessOutput> {
        let output = Command::new(program)
            .args(args)
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .output()?;

        Ok(ProcessOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Argument vector for one probe: interval, ToS, count, optional flood, host
pub fn build_args(config: &ProbeConfig) -> Vec<String> {
    let mut args = vec![
        "-i".to_string(),
        format!("{:.3}", config.interval_secs()),
        "-Q".to_string(),
        config.tos().to_string(),
        "-c".to_string(),
        config.count().to_string(),
    ];
    if config.flood() {
        args.push("-f".to_string());
    }
    args.push(config.host().to_string());
    args
}

/// A probe that finished with a usable result
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeRun {
    pub outcome: ProbeOutcome,
    pub report: ProbeReport,
}

/// Launches one probe per call and classifies how it ended
#[derive(Debug)]
pub struct ProbeRunner<E> {
    program: String,
    executor: E,
}

impl<E: ProbeExecutor> ProbeRunner<E> {
    pub fn new(program: impl Into<String>, executor: E) -> Self {
        Self {
            program: program.into(),
            executor,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run the probe described by `config` and wait for it to exit.
    ///
    /// Blocks the calling thread for the whole lifetime of the child
    /// process; there is no timeout.
    pub fn run(&self, config: &ProbeConfig) -> Result<ProbeRun> {
        let args = build_args(config);
        debug!(
            experiment = config.experiment_id(),
            program = %self.program,
            args = ?args,
            "Launching probe"
        );

        let output = self
            .executor
            .execute(&self.program, &args)
            .map_err(|e| {
                warn!(experiment = config.experiment_id(), error = %e, "Failed to launch probe");
                ProbeError::Launch {
                    program: self.program.clone(),
                    source: e,
                }
            })?;

        debug!(
            experiment = config.experiment_id(),
            status = ?output.status,
            "Probe exited"
        );

        match output.status {
            Some(0) => Ok(ProbeRun {
                outcome: ProbeOutcome::Replied,
                report: parse_output(&output.stdout),
            }),
            Some(1) => {
                let mut report = parse_output(&output.stdout);
                if !report.responses.is_empty() {
                    warn!(
                        experiment = config.experiment_id(),
                        discarded = report.responses.len(),
                        "Probe reported no replies but printed reply lines"
                    );
                    report.responses.clear();
                }
                report.rtt = Some(RttSummary::zeroed());
                Ok(ProbeRun {
                    outcome: ProbeOutcome::NoReplies,
                    report,
                })
            }
            status => {
                warn!(
                    experiment = config.experiment_id(),
                    status = ?status,
                    stderr = %output.stderr.trim_end(),
                    "Probe failed"
                );
                Err(ProbeError::Failure {
                    status,
                    diagnostic: output.stderr,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use std::io::ErrorKind;

    mock! {
        pub ProbeExecutor {}

        impl ProbeExecutor for ProbeExecutor {
            fn execute(&self, program: &str, args: &[String]) -> io::Result<ProcessOutput>;
        }
    }

    fn config() -> ProbeConfig {
        ProbeConfig::new("Default", "192.0.2.1", 16, 0.2, 4, false)
    }

    fn exited(status: i32, stdout: &str, stderr: &str) -> ProcessOutput {
        ProcessOutput {
            status: Some(status),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn test_build_args() {
        let args = build_args(&config());
        assert_eq!(
            args,
            vec!["-i", "0.200", "-Q", "16", "-c", "4", "192.0.2.1"]
        );

        let flood = ProbeConfig::new("Flood", "example.net", 0, 0.01, 100, true);
        let args = build_args(&flood);
        assert_eq!(
            args,
            vec!["-i", "0.010", "-Q", "0", "-c", "100", "-f", "example.net"]
        );
    }

    #[test]
    fn test_run_success() -> Result<()> {
        let mut executor = MockProbeExecutor::new();
        executor
            .expect_execute()
            .withf(|program, _| program == "ping")
            .times(1)
            .returning(|_, _| {
                Ok(exited(
                    0,
                    "64 bytes from h: icmp_seq=1 ttl=64 time=1.5 ms\n\
                     1 packets transmitted, 1 received, 0% packet loss, time 0ms\n\
                     rtt min/avg/max/mdev = 1.5/1.5/1.5/0.0 ms\n",
                    "",
                ))
            });

        let runner = ProbeRunner::new("ping", executor);
        let run = runner.run(&config())?;

        assert_eq!(run.outcome, ProbeOutcome::Replied);
        assert_eq!(run.report.responses.len(), 1);
        assert_eq!(run.report.summary.map(|s| s.transmitted), Some(1));
        assert_eq!(run.report.rtt.map(|r| r.avg_ms), Some(1.5));
        Ok(())
    }

    #[test]
    fn test_run_no_replies_zeroes_rtt() -> Result<()> {
        let mut executor = MockProbeExecutor::new();
        executor.expect_execute().times(1).returning(|_, _| {
            Ok(exited(
                1,
                "4 packets transmitted, 0 received, 100% packet loss, time 3059ms\n",
                "",
            ))
        });

        let runner = ProbeRunner::new("ping", executor);
        let run = runner.run(&config())?;

        assert_eq!(run.outcome, ProbeOutcome::NoReplies);
        assert!(run.report.responses.is_empty());
        assert_eq!(run.report.rtt, Some(RttSummary::zeroed()));
        assert_eq!(run.report.summary.map(|s| s.received), Some(0));
        Ok(())
    }

    #[test]
    fn test_run_hard_failure_keeps_diagnostic() {
        let mut executor = MockProbeExecutor::new();
        executor.expect_execute().times(1).returning(|_, _| {
            Ok(exited(2, "", "ping: nowhere.invalid: Name or service not known\n"))
        });

        let runner = ProbeRunner::new("ping", executor);
        match runner.run(&config()) {
            Err(ProbeError::Failure { status, diagnostic }) => {
                assert_eq!(status, Some(2));
                assert_eq!(diagnostic, "ping: nowhere.invalid: Name or service not known\n");
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_run_signal_is_failure() {
        let mut executor = MockProbeExecutor::new();
        executor.expect_execute().times(1).returning(|_, _| {
            Ok(ProcessOutput {
                status: None,
                stdout: String::new(),
                stderr: String::new(),
            })
        });

        let runner = ProbeRunner::new("ping", executor);
        assert!(matches!(
            runner.run(&config()),
            Err(ProbeError::Failure { status: None, .. })
        ));
    }

    #[test]
    fn test_run_launch_error() {
        let mut executor = MockProbeExecutor::new();
        executor
            .expect_execute()
            .times(1)
            .returning(|_, _| Err(io::Error::from(ErrorKind::NotFound)));

        let runner = ProbeRunner::new("/nonexistent/ping", executor);
        match runner.run(&config()) {
            Err(ProbeError::Launch { program, .. }) => assert_eq!(program, "/nonexistent/ping"),
            other => panic!("expected launch error, got {:?}", other),
        }
    }

    #[test]
    fn test_system_executor_missing_program() {
        let result = SystemExecutor.execute("/nonexistent/qosping-probe", &[]);
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_system_executor_pins_locale() -> io::Result<()> {
        let script = vec!["-c".to_string(), "printf '%s' \"$LC_ALL\"".to_string()];
        let output = SystemExecutor.execute("sh", &script)?;
        assert_eq!(output.status, Some(0));
        assert_eq!(output.stdout, "C");
        Ok(())
    }
}
