//! Cancellable background timers.
//!
//! Every interval or timeout in the proctor is a spawned task wrapped in a
//! [`TimerHandle`]. The state that owns a timer keeps the handle directly and
//! cancels it on every transition out of that state. Dropping a handle also
//! cancels it, so a torn-down owner can never leave a task behind.

use std::future::Future;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum TimerKind {
    ProbeInterval,
    ProbeTimeout,
    CountdownInterval,
    PollInterval,
}

pub struct TimerHandle {
    kind: TimerKind,
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl TimerHandle {
    /// Spawn `work` on the runtime. The task stops at its next await point
    /// once the handle is cancelled.
    pub fn spawn<F>(kind: TimerKind, work: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let child = token.clone();

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = child.cancelled() => {}
                _ = work => {}
            }
        });

        Self {
            kind,
            token,
            handle: Some(handle),
        }
    }

    pub fn kind(&self) -> TimerKind {
        self.kind
    }

    pub fn is_finished(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| handle.is_finished())
            .unwrap_or(true)
    }

    pub fn cancel(mut self) {
        self.cancel_in_place();
    }

    fn cancel_in_place(&mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel_in_place();
    }
}

/// Cancel the timer stored in `slot`, if any.
pub fn cancel_slot(slot: &mut Option<TimerHandle>) {
    if let Some(timer) = slot.take() {
        log::debug!("[timers] cancelling {:?}", timer.kind());
        timer.cancel();
    }
}
