use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use super::{SuggestStatus, SuggestionProvider};
use crate::editor::tools::Annotation;
use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestionDelays {
    pub queued: Duration,
    pub running: Duration,
}

impl Default for SuggestionDelays {
    fn default() -> Self {
        Self {
            queued: Duration::from_millis(1000),
            running: Duration::from_millis(2000),
        }
    }
}

impl SuggestionDelays {
    pub const fn immediate() -> Self {
        Self {
            queued: Duration::ZERO,
            running: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SuggestUpdate {
    Queued,
    Running,
    Ready(Vec<Annotation>),
}

/// Suggestion generation running on a worker thread.
///
/// Dropping the job cancels it: the worker checks the shared flag before each
/// send, so no result is delivered to a session that has gone away.
#[derive(Debug)]
pub struct SuggestionJob {
    rx: mpsc::Receiver<SuggestUpdate>,
    cancel: Arc<AtomicBool>,
    status: SuggestStatus,
}

impl SuggestionJob {
    pub fn spawn(
        provider: Arc<dyn SuggestionProvider>,
        task: Task,
        delays: SuggestionDelays,
    ) -> Self {
        let (tx, rx) = mpsc::channel::<SuggestUpdate>();
        let cancel = Arc::new(AtomicBool::new(false));
        let worker_cancel = Arc::clone(&cancel);
        tracing::debug!(task_id = %task.id, ?delays, "spawn suggestion job");

        std::thread::spawn(move || {
            let send = |update: SuggestUpdate| {
                if worker_cancel.load(Ordering::Acquire) {
                    return false;
                }
                tx.send(update).is_ok()
            };

            if !send(SuggestUpdate::Queued) {
                return;
            }
            std::thread::sleep(delays.queued);
            if !send(SuggestUpdate::Running) {
                return;
            }
            std::thread::sleep(delays.running);
            let suggestions = provider.suggest(&task);
            let _ = send(SuggestUpdate::Ready(suggestions));
        });

        Self {
            rx,
            cancel,
            status: SuggestStatus::Queued,
        }
    }

    pub fn status(&self) -> SuggestStatus {
        self.status
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    fn apply(&mut self, update: SuggestUpdate) -> Option<Vec<Annotation>> {
        match update {
            SuggestUpdate::Queued => {
                self.status = SuggestStatus::Queued;
                None
            }
            SuggestUpdate::Running => {
                self.status = SuggestStatus::Running;
                None
            }
            SuggestUpdate::Ready(suggestions) => {
                self.status = SuggestStatus::Ready;
                Some(suggestions)
            }
        }
    }

    /// Drains pending updates without blocking; returns the batch once it is ready.
    pub fn poll(&mut self) -> Option<Vec<Annotation>> {
        if self.is_cancelled() {
            return None;
        }
        loop {
            match self.rx.try_recv() {
                Ok(update) => {
                    if let Some(ready) = self.apply(update) {
                        return Some(ready);
                    }
                }
                Err(mpsc::TryRecvError::Empty) => return None,
                Err(mpsc::TryRecvError::Disconnected) => {
                    self.worker_lost();
                    return None;
                }
            }
        }
    }

    /// Blocks until the batch arrives, the worker exits, or `timeout` passes.
    pub fn wait_ready(&mut self, timeout: Duration) -> Option<Vec<Annotation>> {
        let deadline = std::time::Instant::now() + timeout;
        while !self.is_cancelled() {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(update) => {
                    if let Some(ready) = self.apply(update) {
                        return Some(ready);
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => return None,
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    self.worker_lost();
                    return None;
                }
            }
        }
        None
    }

    /// The worker hung up without a batch (the provider panicked).
    fn worker_lost(&mut self) {
        if self.status.is_busy() {
            tracing::warn!(status = ?self.status, "suggestion worker exited without a result");
            self.status = SuggestStatus::Idle;
        }
    }
}

impl Drop for SuggestionJob {
    fn drop(&mut self) {
        self.cancel();
    }
}
