//! Connection lifecycle for the screen-capture service.
//!
//! `Retrying` owns the probe interval and the connect deadline,
//! `Initializing` owns the countdown. Each transition cancels the timers of
//! the state it leaves before arming the timers of the state it enters.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use chrono::Utc;
use log::{debug, error, info, warn};
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::MonitorTiming;
use crate::models::{ConnectionStatus, OcrResult};
use crate::timers::{cancel_slot, TimerHandle, TimerKind};

use super::source::{OcrQuery, ProbeError, ScreenCaptureSource};

const COUNTDOWN_TICK: Duration = Duration::from_secs(1);
const MAX_HISTORY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub status: ConnectionStatus,
    pub at: Instant,
}

struct MonitorState {
    status: ConnectionStatus,
    countdown_remaining: u32,
    history: Vec<StatusChange>,
    probe_interval: Option<TimerHandle>,
    probe_timeout: Option<TimerHandle>,
    countdown: Option<TimerHandle>,
}

impl MonitorState {
    fn new() -> Self {
        Self {
            status: ConnectionStatus::Retrying,
            countdown_remaining: 0,
            history: Vec::new(),
            probe_interval: None,
            probe_timeout: None,
            countdown: None,
        }
    }

    fn active_timers(&self) -> Vec<TimerKind> {
        [&self.probe_interval, &self.probe_timeout, &self.countdown]
            .into_iter()
            .flatten()
            .filter(|timer| !timer.is_finished())
            .map(|timer| timer.kind())
            .collect()
    }

    fn cancel_all(&mut self) {
        cancel_slot(&mut self.probe_interval);
        cancel_slot(&mut self.probe_timeout);
        cancel_slot(&mut self.countdown);
    }
}

struct MonitorShared {
    source: Arc<dyn ScreenCaptureSource>,
    timing: MonitorTiming,
    state: Mutex<MonitorState>,
    status_tx: watch::Sender<ConnectionStatus>,
}

/// Cloneable handle to the screen-monitor state machine.
#[derive(Clone)]
pub struct ScreenMonitor {
    shared: Arc<MonitorShared>,
}

impl ScreenMonitor {
    pub fn new(source: Arc<dyn ScreenCaptureSource>, timing: MonitorTiming) -> Self {
        let (status_tx, _) = watch::channel(ConnectionStatus::Retrying);
        Self {
            shared: Arc::new(MonitorShared {
                source,
                timing,
                state: Mutex::new(MonitorState::new()),
                status_tx,
            }),
        }
    }

    /// Begin connecting: probe now, then on every probe interval until the
    /// first success or until the connect budget runs out.
    pub fn start(&self) {
        let mut state = self.shared.lock_state();
        if state.status != ConnectionStatus::Retrying || state.probe_interval.is_some() {
            warn!(
                "[monitor] start ignored, status is {}",
                state.status.as_str()
            );
            return;
        }
        self.shared.enter_retrying(&mut state, &Arc::downgrade(&self.shared));
    }

    /// A steady-state poll failed. Drops `Ready` back to `Retrying` and re-arms
    /// the probe loop with a fresh budget.
    pub fn report_poll_failure(&self, err: &ProbeError) {
        let mut state = self.shared.lock_state();
        if state.status != ConnectionStatus::Ready {
            return;
        }
        warn!("[monitor] poll failed while ready ({err}), reconnecting");
        self.shared.enter_retrying(&mut state, &Arc::downgrade(&self.shared));
    }

    /// Cancel every timer the monitor owns. The status is left as is.
    pub fn shutdown(&self) {
        let mut state = self.shared.lock_state();
        state.cancel_all();
        info!("[monitor] shut down in state {}", state.status.as_str());
    }

    /// Query the trailing OCR window once.
    pub async fn probe_once(&self) -> Result<OcrResult, ProbeError> {
        self.shared.probe_once().await
    }

    pub fn status(&self) -> ConnectionStatus {
        self.shared.lock_state().status
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.status_tx.subscribe()
    }

    pub fn countdown_remaining(&self) -> u32 {
        self.shared.lock_state().countdown_remaining
    }

    pub fn history(&self) -> Vec<StatusChange> {
        self.shared.lock_state().history.clone()
    }

    pub fn active_timers(&self) -> Vec<TimerKind> {
        self.shared.lock_state().active_timers()
    }
}

impl MonitorShared {
    fn lock_state(&self) -> MutexGuard<'_, MonitorState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    async fn probe_once(&self) -> Result<OcrResult, ProbeError> {
        let query = OcrQuery::trailing(
            Utc::now(),
            self.timing.ocr_window(),
            self.timing.ocr_limit,
        );
        self.source.query(&query).await
    }

    fn set_status(&self, state: &mut MonitorState, status: ConnectionStatus) {
        state.status = status;
        state.history.push(StatusChange {
            status,
            at: Instant::now(),
        });
        if state.history.len() > MAX_HISTORY {
            state.history.remove(0);
        }
        self.status_tx.send_replace(status);
    }

    fn enter_retrying(&self, state: &mut MonitorState, weak: &Weak<MonitorShared>) {
        state.cancel_all();
        state.countdown_remaining = 0;
        self.set_status(state, ConnectionStatus::Retrying);

        let deadline = Instant::now() + self.timing.connect_timeout();
        state.probe_interval = Some(TimerHandle::spawn(
            TimerKind::ProbeInterval,
            probe_loop(weak.clone(), self.timing.probe_interval()),
        ));
        state.probe_timeout = Some(TimerHandle::spawn(
            TimerKind::ProbeTimeout,
            connect_deadline(weak.clone(), deadline),
        ));

        info!(
            "[monitor] connecting, budget {}ms",
            self.timing.connect_timeout_ms
        );
    }

    /// Returns true once the probe loop has nothing left to do.
    fn handle_probe_result(
        &self,
        result: Result<OcrResult, ProbeError>,
        weak: &Weak<MonitorShared>,
    ) -> bool {
        let mut state = self.lock_state();
        if state.status != ConnectionStatus::Retrying {
            return true;
        }

        match result {
            Ok(_) => {}
            Err(err) if err.counts_as_reachable() => {
                debug!("[monitor] service reachable with no content yet");
            }
            Err(err) => {
                debug!("[monitor] probe failed: {err}");
                return false;
            }
        }

        cancel_slot(&mut state.probe_interval);
        cancel_slot(&mut state.probe_timeout);
        self.enter_initializing(&mut state, weak);
        true
    }

    fn enter_initializing(&self, state: &mut MonitorState, weak: &Weak<MonitorShared>) {
        state.countdown_remaining = self.timing.init_countdown_secs;
        self.set_status(state, ConnectionStatus::Initializing);
        info!(
            "[monitor] connected, ready in {}s",
            state.countdown_remaining
        );

        if state.countdown_remaining == 0 {
            self.set_status(state, ConnectionStatus::Ready);
            return;
        }

        state.countdown = Some(TimerHandle::spawn(
            TimerKind::CountdownInterval,
            countdown(weak.clone()),
        ));
    }

    /// Returns true when the countdown is over.
    fn countdown_tick(&self) -> bool {
        let mut state = self.lock_state();
        if state.status != ConnectionStatus::Initializing {
            return true;
        }

        state.countdown_remaining = state.countdown_remaining.saturating_sub(1);
        if state.countdown_remaining > 0 {
            return false;
        }

        cancel_slot(&mut state.countdown);
        self.set_status(&mut state, ConnectionStatus::Ready);
        info!("[monitor] screen monitoring ready");
        true
    }

    fn expire_connect_budget(&self) {
        let mut state = self.lock_state();
        if state.status != ConnectionStatus::Retrying {
            return;
        }

        cancel_slot(&mut state.probe_interval);
        cancel_slot(&mut state.probe_timeout);
        self.set_status(&mut state, ConnectionStatus::Error);
        error!(
            "[monitor] no response from screen capture service within {}ms",
            self.timing.connect_timeout_ms
        );
    }
}

async fn probe_loop(monitor: Weak<MonitorShared>, every: Duration) {
    let mut ticker = time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let Some(shared) = monitor.upgrade() else {
            break;
        };
        let result = shared.probe_once().await;
        if shared.handle_probe_result(result, &monitor) {
            break;
        }
    }
}

async fn connect_deadline(monitor: Weak<MonitorShared>, deadline: Instant) {
    time::sleep_until(deadline).await;
    if let Some(shared) = monitor.upgrade() {
        shared.expire_connect_budget();
    }
}

async fn countdown(monitor: Weak<MonitorShared>) {
    let mut ticker = time::interval_at(Instant::now() + COUNTDOWN_TICK, COUNTDOWN_TICK);

    loop {
        ticker.tick().await;
        let Some(shared) = monitor.upgrade() else {
            break;
        };
        if shared.countdown_tick() {
            break;
        }
    }
}
