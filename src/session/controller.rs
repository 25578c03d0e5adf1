use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard,
};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::analysis::ViolationAnalyzer;
use crate::backend::{AnalysisService, ChatReply, DiagnosticsSink, InterviewStore};
use crate::config::{MonitorTiming, ProctorConfig};
use crate::diagnostics::{DiagnosticsReporter, PoseFaceSource, ReporterContext};
use crate::models::{ConnectionStatus, InterviewConfig, Violation};
use crate::monitor::{ScreenCaptureSource, ScreenMonitor};
use crate::timers::TimerKind;

use super::state::{InterviewPhase, ReadinessGates, SessionState, StartError};

/// The external services one interview session is wired to.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn InterviewStore>,
    pub sink: Arc<dyn DiagnosticsSink>,
    pub analysis: Arc<dyn AnalysisService>,
    pub screen: Arc<dyn ScreenCaptureSource>,
    pub webcam: Arc<dyn PoseFaceSource>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub interview_id: String,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub ticks: u64,
    pub violation_count: usize,
    pub violations: Vec<Violation>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub interview_id: String,
    pub phase: InterviewPhase,
    pub readiness: ReadinessGates,
    pub monitor_status: ConnectionStatus,
    pub countdown_remaining: u32,
    pub violation_count: usize,
    pub suspicious: bool,
    pub active_timers: Vec<TimerKind>,
}

/// Drives one interview: readiness gating, the diagnostics loop while
/// active, and teardown of every timer on end or unmount.
#[derive(Clone)]
pub struct InterviewController {
    interview: Arc<InterviewConfig>,
    state: Arc<Mutex<SessionState>>,
    monitor: ScreenMonitor,
    reporter: Arc<Mutex<DiagnosticsReporter>>,
    analysis_task: Arc<Mutex<Option<JoinHandle<()>>>>,
    mounted: Arc<AtomicBool>,
    collaborators: Collaborators,
    analyzer: ViolationAnalyzer,
    timing: MonitorTiming,
}

impl InterviewController {
    /// Fetch the interview record and build a controller for it.
    pub async fn load(
        interview_id: &str,
        collaborators: Collaborators,
        config: &ProctorConfig,
    ) -> Result<Self> {
        let interview = collaborators
            .store
            .get_interview(interview_id)
            .await
            .with_context(|| format!("failed to load interview {interview_id}"))?;

        if interview.ended_at.is_some() {
            warn!("[session] interview {} already has an end timestamp", interview.id);
        }

        Ok(Self::new(interview, collaborators, config))
    }

    pub fn new(
        interview: InterviewConfig,
        collaborators: Collaborators,
        config: &ProctorConfig,
    ) -> Self {
        let monitor = ScreenMonitor::new(collaborators.screen.clone(), config.timing.clone());

        Self {
            interview: Arc::new(interview),
            state: Arc::new(Mutex::new(SessionState::new())),
            monitor,
            reporter: Arc::new(Mutex::new(DiagnosticsReporter::new())),
            analysis_task: Arc::new(Mutex::new(None)),
            mounted: Arc::new(AtomicBool::new(false)),
            collaborators,
            analyzer: ViolationAnalyzer::new(&config.analyzer),
            timing: config.timing.clone(),
        }
    }

    pub fn monitor(&self) -> &ScreenMonitor {
        &self.monitor
    }

    /// Bring the session up. Connects the screen monitor when the interview
    /// requires it.
    pub fn mount(&self) {
        if self.mounted.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(
            "[session] mounted interview {} (monitoring {})",
            self.interview.id,
            if self.interview.requires_monitoring {
                "required"
            } else {
                "off"
            }
        );
        if self.interview.requires_monitoring {
            self.monitor.start();
        }
    }

    pub fn set_camera_ready(&self, granted: bool) {
        self.lock_state().camera_ready = granted;
    }

    pub fn set_avatar_ready(&self, loaded: bool) {
        self.lock_state().avatar_ready = loaded;
    }

    pub fn readiness(&self) -> ReadinessGates {
        self.lock_state()
            .gates(self.interview.requires_monitoring, self.monitor.status())
    }

    /// `NotStarted -> Active`, guarded by the readiness gates.
    pub async fn start(&self) -> Result<DateTime<Utc>, StartError> {
        let started_at = Utc::now();
        {
            let mut state = self.lock_state();
            if state.phase != InterviewPhase::NotStarted {
                return Err(StartError::AlreadyStarted);
            }

            let gates = state.gates(self.interview.requires_monitoring, self.monitor.status());
            if let Err(err) = gates.check() {
                warn!("[session] start blocked: {err}");
                return Err(err);
            }

            state.begin(started_at);
        }

        self.lock_reporter()
            .start(self.reporter_context(), self.timing.poll_interval());
        info!("[session] interview {} started", self.interview.id);

        if let Err(err) = self
            .collaborators
            .store
            .record_start(&self.interview.id, started_at)
            .await
        {
            error!("[session] failed to record start time: {err:#}");
        }

        Ok(started_at)
    }

    /// Ends the interview when the conversational AI says it is over.
    pub async fn handle_chat_reply(&self, reply: &ChatReply) -> Result<Option<SessionSummary>> {
        if !reply.signals_completion() || self.phase() != InterviewPhase::Active {
            return Ok(None);
        }
        info!("[session] conversation signalled completion");
        self.end().await.map(Some)
    }

    /// `Active -> Over`: stop the diagnostics loop, record the end time and
    /// fire the one-time analysis request.
    pub async fn end(&self) -> Result<SessionSummary> {
        let ended_at = Utc::now();
        let summary = {
            let mut state = self.lock_state();
            if state.phase != InterviewPhase::Active {
                return Err(anyhow!("no active interview to end"));
            }
            state.finish(ended_at);

            SessionSummary {
                interview_id: self.interview.id.clone(),
                started_at: state.started_at,
                ended_at: state.ended_at,
                ticks: state.ticks,
                violation_count: state.violations.len(),
                violations: state.violations.clone(),
            }
        };

        self.lock_reporter().stop();
        self.monitor.shutdown();

        if let Err(err) = self
            .collaborators
            .store
            .record_end(&self.interview.id, ended_at)
            .await
        {
            error!("[session] failed to record end time: {err:#}");
        }

        self.spawn_analysis();

        info!(
            "[session] interview {} over with {} violation(s)",
            summary.interview_id, summary.violation_count
        );
        Ok(summary)
    }

    /// Tear down: cancel the probe interval, probe timeout, countdown and poll
    /// timers. Nothing fires after this returns.
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
        self.lock_reporter().stop();
        self.monitor.shutdown();

        if self.phase() == InterviewPhase::Active {
            warn!(
                "[session] unmounted interview {} while it was still active",
                self.interview.id
            );
        }
    }

    /// Wait for the end-of-interview analysis request, if one was fired.
    pub async fn wait_for_analysis(&self) {
        let task = match self.analysis_task.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(task) = task {
            if let Err(err) = task.await {
                error!("[session] analysis task failed to join: {err}");
            }
        }
    }

    pub fn phase(&self) -> InterviewPhase {
        self.lock_state().phase
    }

    pub fn violations(&self) -> Vec<Violation> {
        self.lock_state().violations.clone()
    }

    pub fn is_suspicious(&self) -> bool {
        self.lock_state().suspicious
    }

    pub fn active_timers(&self) -> Vec<TimerKind> {
        let mut timers = self.monitor.active_timers();
        if self.lock_reporter().is_running() {
            timers.push(TimerKind::PollInterval);
        }
        timers.sort();
        timers
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let monitor_status = self.monitor.status();
        let countdown_remaining = self.monitor.countdown_remaining();
        let active_timers = self.active_timers();

        let state = self.lock_state();
        SessionSnapshot {
            interview_id: self.interview.id.clone(),
            phase: state.phase,
            readiness: state.gates(self.interview.requires_monitoring, monitor_status),
            monitor_status,
            countdown_remaining,
            violation_count: state.violations.len(),
            suspicious: state.suspicious,
            active_timers,
        }
    }

    fn spawn_analysis(&self) {
        let analysis = self.collaborators.analysis.clone();
        let interview_id = self.interview.id.clone();

        let task = tokio::spawn(async move {
            match analysis.request_analysis(&interview_id).await {
                Ok(_) => info!("[session] analysis requested for {interview_id}"),
                Err(err) => error!("[session] analysis request for {interview_id} failed: {err:#}"),
            }
        });

        let mut slot = match self.analysis_task.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = Some(task);
    }

    fn reporter_context(&self) -> ReporterContext {
        ReporterContext {
            interview_id: self.interview.id.clone(),
            monitor: self.monitor.clone(),
            monitoring_required: self.interview.requires_monitoring,
            analyzer: self.analyzer.clone(),
            webcam: self.collaborators.webcam.clone(),
            sink: self.collaborators.sink.clone(),
            session: self.state.clone(),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock_reporter(&self) -> MutexGuard<'_, DiagnosticsReporter> {
        match self.reporter.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
