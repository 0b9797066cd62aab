//! Sequential batch runner.
//!
//! Videos are processed one at a time on a single worker task. Each job runs
//! on its own tokio task so a panic inside one job becomes a failure for that
//! file instead of tearing down the batch.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

use crate::cancel::CancelToken;
use crate::error::VidsubError;
use crate::events::{BatchOutcome, EventSender, Progress, channels};
use crate::workflow::{Workflow, display_name};

/// Why one file of a batch did not produce output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct BatchResult {
    /// Files the runner started on
    pub attempted: usize,
    pub succeeded: usize,
    /// Files handed to the batch
    pub total: usize,
    pub failures: Vec<FileFailure>,
    /// Stopped early on request
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchResult {
    fn start(total: usize) -> Self {
        let now = Utc::now();
        Self {
            attempted: 0,
            succeeded: 0,
            total,
            failures: Vec::new(),
            cancelled: false,
            started_at: now,
            finished_at: now,
        }
    }

    pub fn summary(&self) -> String {
        format!("Completed: {}/{} video(s) successful", self.succeeded, self.total)
    }

    pub fn all_succeeded(&self) -> bool {
        !self.cancelled && self.succeeded == self.total
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Caller's side of a spawned batch
pub struct BatchHandle {
    pub progress: mpsc::UnboundedReceiver<Progress>,
    pub log: mpsc::UnboundedReceiver<String>,
    /// Resolves exactly once with the terminal event
    pub outcome: oneshot::Receiver<BatchOutcome>,
    pub cancel: CancelToken,
}

pub struct BatchRunner {
    workflow: Arc<Workflow>,
}

impl BatchRunner {
    pub fn new(workflow: Arc<Workflow>) -> Self {
        Self { workflow }
    }

    /// Run the batch on a background task and hand back its channels.
    pub fn spawn(self, inputs: Vec<PathBuf>) -> BatchHandle {
        let (events, receivers) = channels();
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();

        tokio::spawn(async move {
            let outcome = self.run(&inputs, &events, &worker_cancel).await;
            // The caller may have dropped the handle.
            let _ = outcome_tx.send(outcome);
        });

        BatchHandle {
            progress: receivers.progress,
            log: receivers.log,
            outcome: outcome_rx,
            cancel,
        }
    }

    /// Process `inputs` in order.
    ///
    /// A preflight failure (missing tool, model that will not load) ends the
    /// batch with [`BatchOutcome::Error`] before any file runs. Per-file
    /// failures are recorded and the batch moves on.
    pub async fn run(&self, inputs: &[PathBuf], events: &EventSender, cancel: &CancelToken) -> BatchOutcome {
        let total = inputs.len();
        info!("Starting batch of {} video(s)", total);

        events.progress(0, "Loading model...");
        if let Err(e) = self.workflow.prepare().await {
            error!("Batch aborted: {}", e);
            events.log(format!("Error: {}", e));
            return BatchOutcome::Error(e.to_string());
        }

        let mut result = BatchResult::start(total);

        for (i, input) in inputs.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!("Batch cancelled before {}", input.display());
                result.cancelled = true;
                break;
            }

            let name = display_name(input);
            events.progress(
                (i * 100 / total) as u8,
                format!("Processing ({}/{}): {}", i + 1, total, name),
            );
            result.attempted += 1;

            match self.run_job(input, events, cancel).await {
                Ok(()) => {
                    result.succeeded += 1;
                    info!("Successfully processed: {}", input.display());
                }
                Err(reason) => {
                    warn!("Failed to process {}: {}", input.display(), reason);
                    events.log(format!("Failed: {}\nError: {}", input.display(), reason));
                    result.failures.push(FileFailure {
                        path: input.clone(),
                        reason,
                    });
                }
            }
        }

        if cancel.is_cancelled() {
            result.cancelled = true;
        }
        result.finished_at = Utc::now();

        events.progress(100, "Done");
        events.log(result.summary());
        info!("{}", result.summary());

        BatchOutcome::Finished(result)
    }

    async fn run_job(&self, input: &PathBuf, events: &EventSender, cancel: &CancelToken) -> Result<(), String> {
        let workflow = Arc::clone(&self.workflow);
        let input = input.clone();
        let events = events.clone();
        let cancel = cancel.clone();

        let job = tokio::spawn(async move { workflow.process_video(&input, &events, &cancel).await });

        match job.await {
            Ok(Ok(_report)) => Ok(()),
            Ok(Err(VidsubError::Cancelled)) => Err("Cancelled".to_string()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(join_error) if join_error.is_panic() => {
                let panic = join_error.into_panic();
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(format!("Unexpected error: {}", message))
            }
            Err(join_error) => Err(format!("Unexpected error: {}", join_error)),
        }
    }
}
