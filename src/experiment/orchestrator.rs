//! Concurrent fan-out of probes and fail-fast fan-in of their results

use crate::experiment::config::{validate_targets, ExperimentSettings, Target};
use crate::experiment::error::{ExperimentError, Result};
use crate::experiment::progress::ProgressTracker;
use crate::experiment::result::{ExperimentRecord, ExperimentResult};
use crate::probe::{ProbeConfig, ProbeExecutor, ProbeRunner};
use chrono::Utc;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info};

/// Message every worker posts exactly once
type WorkerMessage = (String, Result<ExperimentRecord>);

/// Lifecycle of a batch. `Running` is entered once and exactly one terminal
/// state is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Pending,
    Running { in_flight: usize },
    Aborted,
    Completed,
}

impl BatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchState::Aborted | BatchState::Completed)
    }
}

/// Runs one probe per target concurrently and assembles the batch result.
///
/// The first probe that fails aborts the whole batch: results that already
/// arrived are discarded and no [`ExperimentResult`] is produced. Sibling
/// probes still running are not killed; they run to completion and their
/// results are dropped.
pub struct Orchestrator<E> {
    settings: ExperimentSettings,
    runner: Arc<ProbeRunner<E>>,
    state: BatchState,
    quiet: bool,
}

impl<E: ProbeExecutor + 'static> Orchestrator<E> {
    pub fn new(settings: ExperimentSettings, executor: E) -> Self {
        let runner = ProbeRunner::new(settings.program.clone(), executor);
        Self {
            settings,
            runner: Arc::new(runner),
            state: BatchState::Pending,
            quiet: true,
        }
    }

    /// Show or hide the progress bar (hidden by default)
    pub fn with_progress(mut self, show: bool) -> Self {
        self.quiet = !show;
        self
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    /// One probe configuration per target, in target order
    pub fn probe_configs(&self, targets: &[Target]) -> Vec<ProbeConfig> {
        targets
            .iter()
            .map(|t| {
                ProbeConfig::new(
                    t.id.clone(),
                    t.host.clone(),
                    t.tos,
                    self.settings.interval_secs,
                    self.settings.count,
                    self.settings.flood,
                )
            })
            .collect()
    }

    /// Run the batch. Can only be called once per orchestrator.
    pub fn run(&mut self, targets: &[Target]) -> Result<ExperimentResult> {
        if self.state != BatchState::Pending {
            return Err(ExperimentError::Config(format!(
                "batch cannot be started from state {:?}",
                self.state
            )));
        }
        self.settings.validate()?;
        validate_targets(targets)?;

        let configs = self.probe_configs(targets);
        let probe_count = configs.len();
        let progress = ProgressTracker::new(probe_count, self.quiet)?;

        let started_at = Utc::now();
        let (tx, rx) = mpsc::channel::<WorkerMessage>();

        self.state = BatchState::Running {
            in_flight: probe_count,
        };
        info!(
            probes = probe_count,
            program = self.runner.program(),
            count = self.settings.count,
            interval_secs = self.settings.interval_secs,
            "Starting experiment batch"
        );

        for config in configs {
            let id = config.experiment_id().to_string();
            if let Err(e) = self.spawn_worker(config, tx.clone()) {
                error!(experiment = %id, error = %e, "Failed to spawn probe worker");
                self.state = BatchState::Aborted;
                progress.failed(&id);
                return Err(ExperimentError::Worker(format!(
                    "failed to spawn worker for `{}`: {}",
                    id, e
                )));
            }
        }
        // Only the workers hold senders now, so a vanished worker shows up
        // as a receive error instead of a hang.
        drop(tx);

        let mut experiments = BTreeMap::new();
        for _ in 0..probe_count {
            let (id, outcome) = match rx.recv() {
                Ok(message) => message,
                Err(_) => {
                    error!("Probe worker exited without reporting");
                    self.state = BatchState::Aborted;
                    return Err(ExperimentError::Worker(
                        "a probe worker exited without reporting a result".into(),
                    ));
                }
            };

            match outcome {
                Ok(record) => {
                    debug!(experiment = %id, responses = record.responses.len(), "Got results");
                    progress.completed(&id);
                    experiments.insert(id, record);
                    if let BatchState::Running { in_flight } = &mut self.state {
                        *in_flight -= 1;
                    }
                }
                Err(e) => {
                    error!(
                        experiment = %id,
                        error = %e,
                        discarded = experiments.len(),
                        "Probe failed, aborting batch"
                    );
                    progress.failed(&id);
                    self.state = BatchState::Aborted;
                    return Err(e);
                }
            }
        }

        let finished_at = Utc::now();
        self.state = BatchState::Completed;
        progress.finish();
        info!(
            experiments = experiments.len(),
            elapsed_ms = (finished_at - started_at).num_milliseconds(),
            "Experiment batch completed"
        );

        Ok(ExperimentResult {
            experiments,
            started_at,
            finished_at,
            probe_count: self.settings.count,
            probe_interval_secs: self.settings.interval_secs,
        })
    }

    fn spawn_worker(&self, config: ProbeConfig, tx: Sender<WorkerMessage>) -> std::io::Result<()> {
        let runner = Arc::clone(&self.runner);
        thread::Builder::new()
            .name(format!("probe-{}", config.experiment_id()))
            .spawn(move || {
                let id = config.experiment_id().to_string();
                let outcome = match panic::catch_unwind(AssertUnwindSafe(|| runner.run(&config))) {
                    Ok(Ok(run)) => Ok(ExperimentRecord::from_run(config, run)),
                    Ok(Err(source)) => Err(ExperimentError::Probe {
                        id: id.clone(),
                        source,
                    }),
                    Err(payload) => Err(ExperimentError::Worker(format!(
                        "probe worker for `{}` panicked: {}",
                        id,
                        panic_message(payload.as_ref())
                    ))),
                };
                // The receiver is gone once the batch has aborted
                let _ = tx.send((id, outcome));
            })?;
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
