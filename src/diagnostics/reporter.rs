use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use log::{debug, info, warn};
use tokio::time::{self, MissedTickBehavior};

use crate::analysis::ViolationAnalyzer;
use crate::backend::DiagnosticsSink;
use crate::models::{ConnectionStatus, DiagnosticSnapshot};
use crate::monitor::ScreenMonitor;
use crate::session::state::{InterviewPhase, SessionState};
use crate::timers::{cancel_slot, TimerHandle, TimerKind};

use super::webcam::PoseFaceSource;

/// Everything one diagnostics tick reads from or writes to.
#[derive(Clone)]
pub struct ReporterContext {
    pub interview_id: String,
    pub monitor: ScreenMonitor,
    pub monitoring_required: bool,
    pub analyzer: ViolationAnalyzer,
    pub webcam: Arc<dyn PoseFaceSource>,
    pub sink: Arc<dyn DiagnosticsSink>,
    pub session: Arc<Mutex<SessionState>>,
}

/// Owns the poll interval of an active interview.
pub struct DiagnosticsReporter {
    poll: Option<TimerHandle>,
}

impl DiagnosticsReporter {
    pub fn new() -> Self {
        Self { poll: None }
    }

    /// Tick immediately, then every `every`, until stopped.
    pub fn start(&mut self, ctx: ReporterContext, every: Duration) {
        cancel_slot(&mut self.poll);
        info!(
            "[reporter] reporting diagnostics for {} every {}ms",
            ctx.interview_id,
            every.as_millis()
        );
        self.poll = Some(TimerHandle::spawn(
            TimerKind::PollInterval,
            poll_loop(ctx, every),
        ));
    }

    pub fn stop(&mut self) {
        if self.poll.is_some() {
            info!("[reporter] stopped");
        }
        cancel_slot(&mut self.poll);
    }

    pub fn is_running(&self) -> bool {
        self.poll
            .as_ref()
            .map(|timer| !timer.is_finished())
            .unwrap_or(false)
    }
}

impl Default for DiagnosticsReporter {
    fn default() -> Self {
        Self::new()
    }
}

async fn poll_loop(ctx: ReporterContext, every: Duration) {
    let mut ticker = time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Some(snapshot) = collect_tick(&ctx).await else {
            continue;
        };

        // At most once per tick: a failed send is logged and dropped.
        let sink = ctx.sink.clone();
        tokio::spawn(async move {
            if let Err(err) = sink.send(&snapshot).await {
                warn!(
                    "[reporter] failed to send diagnostics for {}: {err:#}",
                    snapshot.interview_id
                );
            }
        });
    }
}

/// Run one tick: probe, analyze, merge, and assemble the snapshot. Returns
/// `None` when the interview is no longer active.
///
/// Ticks keep going while the monitor is not `Ready`; those snapshots carry
/// webcam data only and `screenpipeData` stays null.
pub async fn collect_tick(ctx: &ReporterContext) -> Option<DiagnosticSnapshot> {
    let screen_data =
        if ctx.monitoring_required && ctx.monitor.status() == ConnectionStatus::Ready {
            match ctx.monitor.probe_once().await {
                Ok(result) => Some(result),
                Err(err) if err.counts_as_reachable() => None,
                Err(err) => {
                    ctx.monitor.report_poll_failure(&err);
                    None
                }
            }
        } else {
            None
        };

    let captured_at = Utc::now();
    let (violations, suspicious) = {
        let mut session = match ctx.session.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if session.phase != InterviewPhase::Active {
            return None;
        }

        let found = screen_data
            .as_ref()
            .map(|data| ctx.analyzer.analyze(data, captured_at))
            .unwrap_or_default();
        if !found.is_empty() {
            debug!("[reporter] {} new violation(s)", found.len());
        }
        session.record_tick(found);
        (session.violations.clone(), session.suspicious)
    };

    let webcam = ctx.webcam.read();

    Some(DiagnosticSnapshot {
        id: None,
        interview_id: ctx.interview_id.clone(),
        pose_status: webcam.pose_status,
        face_status: webcam.face_status,
        camera_image: webcam.camera_image,
        screen_data,
        violations,
        suspicious,
        captured_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorTiming;
    use crate::diagnostics::WebcamSignals;
    use crate::models::{ContentItem, OcrResult};
    use crate::monitor::{OcrQuery, ProbeError, ScreenCaptureSource};
    use anyhow::Result;
    use async_trait::async_trait;

    struct FixedSource(Vec<&'static str>);

    #[async_trait]
    impl ScreenCaptureSource for FixedSource {
        async fn query(&self, _query: &OcrQuery) -> Result<OcrResult, ProbeError> {
            Ok(OcrResult {
                data: self.0.iter().map(|w| ContentItem::ocr(w)).collect(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<DiagnosticSnapshot>>,
        fail: bool,
    }

    #[async_trait]
    impl DiagnosticsSink for RecordingSink {
        async fn send(&self, snapshot: &DiagnosticSnapshot) -> Result<()> {
            self.sent.lock().unwrap().push(snapshot.clone());
            if self.fail {
                anyhow::bail!("endpoint unavailable");
            }
            Ok(())
        }
    }

    async fn ready_monitor(windows: Vec<&'static str>) -> ScreenMonitor {
        let monitor = ScreenMonitor::new(Arc::new(FixedSource(windows)), MonitorTiming::default());
        monitor.start();
        time::sleep(Duration::from_millis(5100)).await;
        assert_eq!(monitor.status(), ConnectionStatus::Ready);
        monitor
    }

    fn context(monitor: ScreenMonitor, sink: Arc<RecordingSink>) -> ReporterContext {
        let signals = WebcamSignals::new();
        signals.set_pose(Some("Good Pose".into()));
        signals.set_face(Some("Forward".into()));

        let mut state = SessionState::new();
        state.begin(Utc::now());

        ReporterContext {
            interview_id: "iv-1".into(),
            monitor,
            monitoring_required: true,
            analyzer: ViolationAnalyzer::default(),
            webcam: Arc::new(signals),
            sink,
            session: Arc::new(Mutex::new(state)),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn tick_merges_violations_and_reads_webcam() {
        let monitor = ready_monitor(vec!["Google Search"]).await;
        let ctx = context(monitor, Arc::new(RecordingSink::default()));

        let first = collect_tick(&ctx).await.unwrap();
        assert_eq!(first.violations.len(), 2);
        assert!(first.suspicious);
        assert_eq!(first.pose_status.as_deref(), Some("Good Pose"));
        assert_eq!(first.face_status.as_deref(), Some("Forward"));
        assert!(first.screen_data.is_some());

        let second = collect_tick(&ctx).await.unwrap();
        assert_eq!(second.violations.len(), 4);
        assert_eq!(ctx.session.lock().unwrap().violations.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn inactive_session_produces_nothing() {
        let monitor = ready_monitor(vec!["Google Search"]).await;
        let ctx = context(monitor, Arc::new(RecordingSink::default()));
        ctx.session.lock().unwrap().finish(Utc::now());

        assert!(collect_tick(&ctx).await.is_none());
        assert!(ctx.session.lock().unwrap().violations.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn polls_immediately_then_on_interval() {
        let monitor = ready_monitor(vec!["connecting talent with opportunities"]).await;
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..RecordingSink::default()
        });
        let ctx = context(monitor, sink.clone());

        let mut reporter = DiagnosticsReporter::new();
        reporter.start(ctx.clone(), Duration::from_secs(10));
        assert!(reporter.is_running());

        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(sink.sent.lock().unwrap().len(), 1);

        // Failed sends do not stop the loop.
        time::sleep(Duration::from_secs(20)).await;
        assert_eq!(sink.sent.lock().unwrap().len(), 3);
        assert!(sink.sent.lock().unwrap().iter().all(|s| !s.suspicious));

        reporter.stop();
        assert!(!reporter.is_running());
        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(sink.sent.lock().unwrap().len(), 3);
    }
}
