//! Single-slot recompute job with explicit state transitions.
//!
//! A [`RecomputeJob`] guards against overlapping recomputation of the same
//! artifact set: `Idle -> Running -> Succeeded | Failed`, and back to
//! `Running` only once the previous run has finished. The work itself runs
//! outside the lock and can be cancelled between pipeline stages through a
//! [`CancelToken`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Shared flag checked by the pipeline between stages.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] naming `stage` once cancellation was requested.
    pub fn check(&self, stage: &'static str) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled(stage))
        } else {
            Ok(())
        }
    }
}

/// Lifecycle state of the recompute job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
}

/// Point-in-time view of the job, suitable for a status endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct JobStatus {
    pub state: JobState,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
struct Inner {
    status: JobStatus,
    cancel: Option<CancelToken>,
}

/// Process-wide recompute job tracker.
#[derive(Debug, Default)]
pub struct RecomputeJob {
    inner: Mutex<Inner>,
}

impl RecomputeJob {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> JobStatus {
        self.inner.lock().status.clone()
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock().status.state == JobState::Running
    }

    /// Transitions to `Running` and hands out a fresh cancel token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::JobInProgress`] if a run is already in flight.
    pub fn start(&self) -> Result<CancelToken> {
        let mut inner = self.inner.lock();
        if inner.status.state == JobState::Running {
            let since = inner.status.started_at.unwrap_or_else(Utc::now);
            return Err(Error::JobInProgress(since));
        }
        let token = CancelToken::new();
        inner.status = JobStatus {
            state: JobState::Running,
            started_at: Some(Utc::now()),
            finished_at: None,
            last_error: inner.status.last_error.take(),
        };
        inner.cancel = Some(token.clone());
        info!("recompute job started");
        Ok(token)
    }

    /// Requests cancellation of the running job.
    ///
    /// Returns `false` if nothing is running.
    pub fn cancel(&self) -> bool {
        let inner = self.inner.lock();
        match (&inner.status.state, &inner.cancel) {
            (JobState::Running, Some(token)) => {
                token.cancel();
                info!("recompute job cancellation requested");
                true
            }
            _ => false,
        }
    }

    fn finish(&self, error: Option<String>) {
        let mut inner = self.inner.lock();
        if inner.status.state != JobState::Running {
            return;
        }
        inner.status.finished_at = Some(Utc::now());
        inner.cancel = None;
        match error {
            None => {
                inner.status.state = JobState::Succeeded;
                inner.status.last_error = None;
                info!("recompute job succeeded");
            }
            Some(message) => {
                warn!(error = %message, "recompute job failed");
                inner.status.state = JobState::Failed;
                inner.status.last_error = Some(message);
            }
        }
    }

    /// Runs `work` as one blocking job.
    ///
    /// The job is marked `Succeeded` or `Failed` (with the error message)
    /// when `work` returns. A panic in `work` marks the job `Failed` with the
    /// panic message and is then resumed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::JobInProgress`] without running `work` if a job is
    /// already running, otherwise whatever `work` returns.
    pub fn run<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&CancelToken) -> Result<T>,
    {
        let token = self.start()?;
        match panic::catch_unwind(AssertUnwindSafe(|| work(&token))) {
            Ok(outcome) => {
                self.finish(outcome.as_ref().err().map(ToString::to_string));
                outcome
            }
            Err(payload) => {
                self.finish(Some(format!("panicked: {}", panic_message(payload.as_ref()))));
                panic::resume_unwind(payload)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
