//! Channels a running batch uses to talk to its caller.
//!
//! Progress and log lines are streamed on unbounded mpsc channels. The
//! terminal outcome travels separately on a oneshot, so a batch reports
//! exactly one of finished or error.

use tokio::sync::mpsc;
use tracing::debug;

use crate::batch::BatchResult;

/// Overall batch progress for a status display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub percent: u8,
    pub status: String,
}

/// Terminal event of a batch run
#[derive(Debug)]
pub enum BatchOutcome {
    /// Every file was attempted (or the batch was cancelled between files)
    Finished(BatchResult),
    /// An environment failure stopped the batch before any file ran
    Error(String),
}

impl BatchOutcome {
    pub fn result(&self) -> Option<&BatchResult> {
        match self {
            Self::Finished(result) => Some(result),
            Self::Error(_) => None,
        }
    }
}

/// Sending half, cloned into every stage that reports
#[derive(Debug, Clone)]
pub struct EventSender {
    progress: mpsc::UnboundedSender<Progress>,
    log: mpsc::UnboundedSender<String>,
}

/// Receiving half, owned by the caller
#[derive(Debug)]
pub struct EventReceivers {
    pub progress: mpsc::UnboundedReceiver<Progress>,
    pub log: mpsc::UnboundedReceiver<String>,
}

pub fn channels() -> (EventSender, EventReceivers) {
    let (progress_tx, progress_rx) = mpsc::unbounded_channel();
    let (log_tx, log_rx) = mpsc::unbounded_channel();

    (
        EventSender {
            progress: progress_tx,
            log: log_tx,
        },
        EventReceivers {
            progress: progress_rx,
            log: log_rx,
        },
    )
}

impl EventSender {
    /// A sender nobody listens to.
    pub fn detached() -> Self {
        channels().0
    }

    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        debug!(target: "vidsub::events", "{}", message);
        // A caller that stopped listening must not fail the job.
        let _ = self.log.send(message);
    }

    pub fn progress(&self, percent: u8, status: impl Into<String>) {
        let _ = self.progress.send(Progress {
            percent: percent.min(100),
            status: status.into(),
        });
    }
}

impl EventReceivers {
    /// Drain everything currently buffered on the log channel.
    pub fn drain_log(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(line) = self.log.try_recv() {
            lines.push(line);
        }
        lines
    }

    /// Drain everything currently buffered on the progress channel.
    pub fn drain_progress(&mut self) -> Vec<Progress> {
        let mut updates = Vec::new();
        while let Ok(update) = self.progress.try_recv() {
            updates.push(update);
        }
        updates
    }
}
