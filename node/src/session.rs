//! The attendance session: one task that owns every piece of engine state.
//!
//! Motion samples, advertisements, timer deadlines, and the completions of
//! background proof and record work are all handled on this task, one at a
//! time. Components are synchronous state machines driven with the session's
//! monotonic `now_ms`; the task sleeps until the earliest deadline any of
//! them reports. Proof round trips and record writes run on spawned tasks and
//! report back through an internal channel before they touch session state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn, Instrument};

use proxima_attendance::{
    AttendanceError, AttendanceRecord, AttendanceRecorder, AttendanceSampler, RecordOutcome,
    SamplerEvent,
};
use proxima_beacon::{Advertisement, NonceScanner, RangeMonitor, ScanOutcome};
use proxima_presence::{PresenceClassifier, PresenceModel, WindowOutcome};
use proxima_proof::{
    run_round_trip, ProofDecision, ProofOrchestrator, ProofOutcome, ProofReport, ProofVerifier,
    Prover,
};
use proxima_types::{AttendanceVerdict, EngineParams, MotionSample, PresenceStatus, WallClock};
use proxima_utils::format_millis;

use crate::config::BucketSource;
use crate::event::{EngineNotice, EngineSnapshot, RecordNotice, SessionCommand};
use crate::metrics::EngineMetrics;
use crate::shutdown::ShutdownSignal;
use crate::tracing_spans;
use crate::NodeError;

/// Capacity of the notice channel; slow subscribers lag past this.
const NOTICE_CAPACITY: usize = 1024;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// External collaborators a session talks to.
pub struct SessionDeps {
    pub model: Box<dyn PresenceModel>,
    pub prover: Arc<dyn Prover>,
    pub verifier: Arc<dyn ProofVerifier>,
    pub recorder: Arc<dyn AttendanceRecorder>,
    pub clock: Arc<dyn WallClock>,
}

impl SessionDeps {
    /// Use one service for both proof steps.
    pub fn with_proof_service<S>(
        model: Box<dyn PresenceModel>,
        proof_service: Arc<S>,
        recorder: Arc<dyn AttendanceRecorder>,
        clock: Arc<dyn WallClock>,
    ) -> Self
    where
        S: Prover + ProofVerifier + 'static,
    {
        Self {
            model,
            prover: proof_service.clone(),
            verifier: proof_service,
            recorder,
            clock,
        }
    }
}

/// Background work finishing off the session task.
enum Completion {
    Proof(ProofReport),
    Record(Result<RecordOutcome, AttendanceError>),
}

pub struct AttendanceSession {
    bucket_source: BucketSource,
    scanner: NonceScanner,
    range: RangeMonitor,
    classifier: PresenceClassifier<Box<dyn PresenceModel>>,
    sampler: AttendanceSampler,
    orchestrator: ProofOrchestrator,
    prover: Arc<dyn Prover>,
    verifier: Arc<dyn ProofVerifier>,
    recorder: Arc<dyn AttendanceRecorder>,
    metrics: Arc<EngineMetrics>,
    epoch: Instant,
    running: bool,
    radio_unavailable: Option<String>,
    last_verdict: Option<AttendanceVerdict>,
    last_proof_message: Option<String>,
    completions: mpsc::UnboundedSender<Completion>,
    snapshot: watch::Sender<EngineSnapshot>,
    notices: broadcast::Sender<EngineNotice>,
}

/// Control surface of a spawned session.
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    snapshot: watch::Receiver<EngineSnapshot>,
    notices: broadcast::Sender<EngineNotice>,
    task: JoinHandle<()>,
}

impl AttendanceSession {
    /// Spawn the session task. It runs until [`SessionHandle::shutdown`],
    /// the shutdown signal, or every handle is dropped.
    pub fn spawn(
        params: &EngineParams,
        bucket_source: BucketSource,
        deps: SessionDeps,
        metrics: Arc<EngineMetrics>,
        shutdown: ShutdownSignal,
    ) -> SessionHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(EngineSnapshot::default());
        let (notice_tx, _) = broadcast::channel(NOTICE_CAPACITY);

        let session = Self {
            bucket_source,
            scanner: NonceScanner::new(),
            range: RangeMonitor::new(params.range_timeout_ms, params.range_tick_ms),
            classifier: PresenceClassifier::new(deps.model, params),
            sampler: AttendanceSampler::new(params, deps.clock),
            orchestrator: ProofOrchestrator::new(),
            prover: deps.prover,
            verifier: deps.verifier,
            recorder: deps.recorder,
            metrics,
            epoch: Instant::now(),
            running: false,
            radio_unavailable: None,
            last_verdict: None,
            last_proof_message: None,
            completions: completion_tx,
            snapshot: snapshot_tx,
            notices: notice_tx.clone(),
        };

        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        let task = tokio::spawn(
            session
                .run(command_rx, completion_rx, shutdown)
                .instrument(tracing_spans::session_span(id)),
        );

        SessionHandle {
            commands: command_tx,
            snapshot: snapshot_rx,
            notices: notice_tx,
            task,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<SessionCommand>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
        mut shutdown: ShutdownSignal,
    ) {
        info!("attendance session ready");
        loop {
            let deadline = self.next_deadline().map(|ms| self.instant_at(ms));
            tokio::select! {
                biased;
                _ = shutdown.wait() => break,
                command = commands.recv() => match command {
                    None | Some(SessionCommand::Shutdown) => break,
                    Some(command) => self.handle(command),
                },
                Some(done) = completions.recv() => self.complete(done),
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {}
            }
            self.poll_timers();
            self.publish();
        }
        self.stop();
        self.publish();
        info!("attendance session ended");
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn instant_at(&self, ms: u64) -> Instant {
        self.epoch + Duration::from_millis(ms)
    }

    fn next_deadline(&self) -> Option<u64> {
        [self.range.next_deadline(), self.sampler.next_deadline()]
            .into_iter()
            .flatten()
            .min()
    }

    fn notify(&self, notice: EngineNotice) {
        // No subscribers is fine.
        let _ = self.notices.send(notice);
    }

    fn handle(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Start => self.start(),
            SessionCommand::Stop => self.stop(),
            SessionCommand::Motion(sample) => self.on_motion(sample),
            SessionCommand::Advertisement(adv) => self.on_advertisement(&adv),
            SessionCommand::MotionUnavailable(reason) => {
                let first = !matches!(self.classifier.status(), PresenceStatus::Disabled(_));
                self.classifier.mark_unavailable(reason.clone());
                self.metrics.presence_with_user.set(0);
                if first {
                    self.notify(EngineNotice::MotionUnavailable { reason });
                }
            }
            SessionCommand::RadioUnavailable(reason) => {
                // The range monitor keeps ticking; with no observations it
                // times out like any other silence.
                if self.radio_unavailable.is_none() {
                    error!(%reason, "radio unavailable; scanning disabled for this session");
                    self.notify(EngineNotice::RadioUnavailable {
                        reason: reason.clone(),
                    });
                }
                self.radio_unavailable = Some(reason);
            }
            SessionCommand::Shutdown => {}
        }
    }

    fn start(&mut self) {
        let now = self.now_ms();
        if !self.running {
            self.running = true;
            self.range.start(now);
            self.metrics.in_range.set(1);
            self.classifier.start();
            info!("capture started");
        }
        let span = tracing_spans::attendance_window_span(now);
        let _entered = span.enter();
        self.sampler.start(now);
    }

    /// Stop every timer and discard the pending window. Idempotent.
    fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        let opened_at = self.sampler.started_at_ms();
        if self.sampler.stop() {
            let elapsed = self.now_ms().saturating_sub(opened_at.unwrap_or_default());
            info!(
                after = %format_millis(elapsed),
                "attendance window discarded without a verdict"
            );
        }
        self.range.stop();
        self.classifier.stop();
        self.scanner.reset();
        self.metrics.presence_with_user.set(0);
        info!("capture stopped");
    }

    fn on_motion(&mut self, sample: MotionSample) {
        let Some(outcome) = self.classifier.ingest(sample) else {
            return;
        };
        match outcome {
            WindowOutcome::Classified(c) => {
                self.metrics.windows_classified.inc();
                if c.gated {
                    self.metrics.windows_gated.inc();
                }
                let label = match self.bucket_source {
                    BucketSource::Raw => c.label,
                    BucketSource::Smoothed => c.smoothed.is_with_user(),
                };
                self.sampler.record_label(label);
                self.metrics
                    .presence_with_user
                    .set(i64::from(c.smoothed.is_with_user()));
                if c.changed {
                    self.notify(EngineNotice::PresenceChanged { state: c.smoothed });
                }
            }
            WindowOutcome::Failed(e) => {
                self.metrics.classifier_failures.inc();
                self.metrics.presence_with_user.set(0);
                self.notify(EngineNotice::ClassifierFailed {
                    reason: e.to_string(),
                });
            }
        }
    }

    fn on_advertisement(&mut self, adv: &Advertisement) {
        if !self.running || self.radio_unavailable.is_some() {
            return;
        }
        self.metrics.advertisements_observed.inc();
        let now = self.now_ms();
        let ScanOutcome::Observed(observed) = self.scanner.observe(adv, now) else {
            return;
        };
        self.metrics.nonces_observed.inc();
        self.notify(EngineNotice::NonceObserved {
            nonce: observed.nonce.to_hex(),
            at_ms: observed.observed_at_ms,
        });

        let with_user = self.classifier.is_with_user();
        if let ProofDecision::Request(nonce) = self.orchestrator.on_nonce(observed.nonce, with_user)
        {
            self.metrics.proofs_requested.inc();
            self.metrics
                .proofs_in_flight
                .set(self.orchestrator.in_flight() as i64);
            self.notify(EngineNotice::ProofRequested {
                nonce: nonce.to_hex(),
            });

            let prover = self.prover.clone();
            let verifier = self.verifier.clone();
            let done = self.completions.clone();
            tokio::spawn(
                async move {
                    let report = run_round_trip(prover.as_ref(), verifier.as_ref(), nonce).await;
                    let _ = done.send(Completion::Proof(report));
                }
                .instrument(tracing_spans::proof_task_span(&nonce)),
            );
        }
    }

    fn complete(&mut self, done: Completion) {
        match done {
            Completion::Proof(report) => self.on_proof_report(report),
            Completion::Record(result) => {
                if let Err(e) = &result {
                    self.metrics.record_failures.inc();
                    warn!(error = %e, "attendance record failed");
                }
                self.notify(EngineNotice::Record {
                    record: RecordNotice::from(result),
                });
            }
        }
    }

    fn on_proof_report(&mut self, report: ProofReport) {
        let Some(report) = self.orchestrator.complete(report) else {
            return;
        };
        self.metrics
            .proofs_in_flight
            .set(self.orchestrator.in_flight() as i64);
        self.metrics.proof_latency_ms.observe(report.latency_ms as f64);
        match &report.outcome {
            ProofOutcome::Confirmed => self.metrics.proofs_confirmed.inc(),
            ProofOutcome::InvalidProof => self.metrics.proofs_invalid.inc(),
            ProofOutcome::Failed(_) => self.metrics.proofs_failed.inc(),
        }
        let message = report.outcome.message();
        self.last_proof_message = Some(message.clone());
        self.notify(EngineNotice::ProofReported {
            nonce: report.nonce.to_hex(),
            message,
            confirmed: report.outcome.is_confirmed(),
            latency_ms: report.latency_ms,
        });
    }

    fn poll_timers(&mut self) {
        let now = self.now_ms();

        if let Some(state) = self.range.poll(now, self.scanner.last_beacon_ms()) {
            self.metrics.in_range.set(i64::from(state.is_in_range()));
            self.notify(EngineNotice::RangeChanged { state });
        }

        for event in self.sampler.poll(now) {
            match event {
                SamplerEvent::Sampled(sample) => self.notify(EngineNotice::SampleTaken {
                    index: sample.index,
                    present: sample.present,
                }),
                SamplerEvent::Verdict(verdict) => self.on_verdict(verdict),
            }
        }
    }

    fn on_verdict(&mut self, verdict: AttendanceVerdict) {
        self.metrics.verdicts.inc();
        self.last_verdict = Some(verdict.clone());
        self.notify(EngineNotice::Verdict {
            verdict: verdict.clone(),
        });

        let record = AttendanceRecord::from(&verdict);
        let span = tracing_spans::record_span(verdict.status.as_str());
        let recorder = self.recorder.clone();
        let done = self.completions.clone();
        debug!(status = %verdict.status, "handing verdict to the recorder");
        tokio::spawn(
            async move {
                let result = recorder.record(&record).await;
                let _ = done.send(Completion::Record(result));
            }
            .instrument(span),
        );
    }

    fn publish(&self) {
        let snapshot = EngineSnapshot {
            running: self.running,
            presence: self.classifier.status().clone(),
            range: self.range.state(),
            last_nonce: self.scanner.last_seen().map(|n| n.to_hex()),
            last_beacon_ms: self.scanner.last_beacon_ms(),
            window_open: self.sampler.is_running(),
            samples: self.sampler.samples().to_vec(),
            last_verdict: self.last_verdict.clone(),
            proofs_in_flight: self.orchestrator.in_flight(),
            last_proof_message: self.last_proof_message.clone(),
        };
        self.snapshot.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

impl SessionHandle {
    pub fn send(&self, command: SessionCommand) -> Result<(), NodeError> {
        self.commands
            .send(command)
            .map_err(|_| NodeError::SessionClosed)
    }

    pub fn start(&self) -> Result<(), NodeError> {
        self.send(SessionCommand::Start)
    }

    pub fn stop(&self) -> Result<(), NodeError> {
        self.send(SessionCommand::Stop)
    }

    pub fn motion(&self, sample: MotionSample) -> Result<(), NodeError> {
        self.send(SessionCommand::Motion(sample))
    }

    pub fn advertisement(&self, adv: Advertisement) -> Result<(), NodeError> {
        self.send(SessionCommand::Advertisement(adv))
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> EngineSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<EngineSnapshot> {
        self.snapshot.clone()
    }

    /// Receive notices published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineNotice> {
        self.notices.subscribe()
    }

    /// Stop the session and wait for its task to finish.
    pub async fn shutdown(self) -> Result<(), NodeError> {
        // The task may already be gone; joining still reports how it ended.
        let _ = self.commands.send(SessionCommand::Shutdown);
        self.task.await.map_err(|e| NodeError::Task(e.to_string()))
    }
}
