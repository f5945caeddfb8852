//! Integration tests exercising a full attendance session:
//! motion → presence → sampling → verdict → record, and
//! beacon → scanner → proof round trip.
//!
//! Real components are wired to nullable collaborators and driven on a
//! paused tokio clock, so every timing assertion is exact.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::Instant;

use proxima_attendance::HttpAttendanceRecorder;
use proxima_beacon::{Advertisement, AdvertisementPayload, NonceBroadcastEmitter, RangeState};
use proxima_node::{
    AttendanceSession, BucketSource, EngineMetrics, EngineNotice, RecordNotice, SessionCommand,
    SessionDeps, SessionHandle, ShutdownController,
};
use proxima_nullables::{
    NullAdvertiser, NullClock, NullNonceSource, NullPresenceModel, NullProofService, NullRecorder,
};
use proxima_presence::PresenceModel;
use proxima_proof::ProofError;
use proxima_types::{
    AdvertisedIdentifier, AttendanceStatus, EngineParams, MotionSample, Nonce, PresenceStatus,
    BEACON_MARKER, BEACON_PREFIX,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Rig {
    handle: SessionHandle,
    notices: broadcast::Receiver<EngineNotice>,
    metrics: Arc<EngineMetrics>,
    proofs: NullProofService,
    _shutdown: ShutdownController,
}

fn rig_with(
    model: impl PresenceModel + 'static,
    recorder: Arc<dyn proxima_attendance::AttendanceRecorder>,
    bucket_source: BucketSource,
) -> Rig {
    let shutdown = ShutdownController::new();
    let metrics = Arc::new(EngineMetrics::new());
    let proofs = NullProofService::new();
    let deps = SessionDeps::with_proof_service(
        Box::new(model),
        Arc::new(proofs.clone()),
        recorder,
        Arc::new(NullClock::new(1_700_000_000)),
    );
    let handle = AttendanceSession::spawn(
        &EngineParams::default(),
        bucket_source,
        deps,
        metrics.clone(),
        shutdown.subscribe(),
    );
    let notices = handle.subscribe();
    Rig {
        handle,
        notices,
        metrics,
        proofs,
        _shutdown: shutdown,
    }
}

fn rig(model: NullPresenceModel) -> Rig {
    rig_with(model, Arc::new(NullRecorder::new()), BucketSource::Raw)
}

/// Handheld: rotation noise with a still accelerometer passes the gate.
fn handheld(i: u64) -> MotionSample {
    let g = if i % 2 == 0 { 0.8 } else { -0.8 };
    MotionSample::new([0.0, 0.0, 1.0], [g, g, -g], i * 20)
}

/// Lying on a desk: no rotation at all.
fn on_desk(i: u64) -> MotionSample {
    MotionSample::new([0.02, 0.0, 1.0], [0.0, 0.0, 0.0], i * 20)
}

fn feed(handle: &SessionHandle, samples: impl Iterator<Item = MotionSample>) {
    for sample in samples {
        handle.motion(sample).unwrap();
    }
}

fn beacon_for(nonce: Nonce) -> Advertisement {
    Advertisement::from_payload(&AdvertisementPayload {
        local_name: BEACON_MARKER.to_string(),
        identifier: AdvertisedIdentifier::compose(BEACON_PREFIX, &nonce),
    })
}

async fn wait_for(
    notices: &mut broadcast::Receiver<EngineNotice>,
    pred: impl Fn(&EngineNotice) -> bool,
) -> EngineNotice {
    loop {
        let notice = notices.recv().await.expect("session closed");
        if pred(&notice) {
            return notice;
        }
    }
}

fn drain(notices: &mut broadcast::Receiver<EngineNotice>) -> Vec<EngineNotice> {
    let mut out = Vec::new();
    while let Ok(notice) = notices.try_recv() {
        out.push(notice);
    }
    out
}

fn is_verdict(n: &EngineNotice) -> bool {
    matches!(n, EngineNotice::Verdict { .. })
}

fn is_proof_report(n: &EngineNotice) -> bool {
    matches!(n, EngineNotice::ProofReported { .. })
}

// ---------------------------------------------------------------------------
// Beacon → scanner → proof
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn two_rotations_trigger_exactly_two_proofs() {
    let mut rig = rig(NullPresenceModel::constant(true));
    let advertiser = NullAdvertiser::new();
    let mut emitter =
        NonceBroadcastEmitter::with_default(advertiser.clone(), NullNonceSource::sequential());

    rig.handle.start().unwrap();
    feed(&rig.handle, (0..100).map(handheld));

    let n1 = emitter.start(0).unwrap();
    let on_air = || Advertisement::from_payload(&advertiser.active().unwrap());
    rig.handle.advertisement(on_air()).unwrap();
    for _ in 0..2 {
        tokio::time::sleep(Duration::from_secs(10)).await;
        rig.handle.advertisement(on_air()).unwrap();
    }

    tokio::time::sleep(Duration::from_secs(10)).await;
    let n2 = emitter.poll(30_000).unwrap().expect("rotation due at 30 s");
    assert_ne!(n1, n2);
    for _ in 0..3 {
        rig.handle.advertisement(on_air()).unwrap();
    }

    let first = wait_for(&mut rig.notices, is_proof_report).await;
    let second = wait_for(&mut rig.notices, is_proof_report).await;
    for (notice, nonce) in [(first, n1), (second, n2)] {
        assert_eq!(
            notice,
            EngineNotice::ProofReported {
                nonce: nonce.to_hex(),
                message: "Attendance confirmed".into(),
                confirmed: true,
                latency_ms: 0,
            }
        );
    }

    assert_eq!(rig.proofs.proved(), vec![n1, n2]);
    assert_eq!(rig.metrics.proofs_requested.get(), 2);
    assert_eq!(rig.metrics.nonces_observed.get(), 2);
    assert_eq!(rig.metrics.advertisements_observed.get(), 6);
    assert_eq!(rig.metrics.proofs_confirmed.get(), 2);
    let snapshot = rig.handle.snapshot();
    assert_eq!(snapshot.last_nonce, Some(n2.to_hex()));
    assert_eq!(snapshot.proofs_in_flight, 0);
    rig.handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn left_behind_device_requests_no_proof() {
    let mut rig = rig(NullPresenceModel::constant(true));
    rig.handle.start().unwrap();
    feed(&rig.handle, (0..150).map(on_desk));
    rig.handle.advertisement(beacon_for(Nonce::new([7; 8]))).unwrap();

    wait_for(&mut rig.notices, |n| {
        matches!(n, EngineNotice::NonceObserved { .. })
    })
    .await;
    assert_eq!(rig.metrics.proofs_requested.get(), 0);
    assert!(rig.proofs.proved().is_empty());
    rig.handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn transport_failure_is_reported_and_next_nonce_still_proves() {
    let mut rig = rig(NullPresenceModel::constant(true));
    rig.proofs
        .fail_prove(ProofError::ProveTransport("connection refused".into()));
    rig.handle.start().unwrap();
    feed(&rig.handle, (0..100).map(handheld));
    rig.handle.advertisement(beacon_for(Nonce::new([1; 8]))).unwrap();

    let failed = wait_for(&mut rig.notices, is_proof_report).await;
    let EngineNotice::ProofReported {
        message, confirmed, ..
    } = failed
    else {
        unreachable!()
    };
    assert_eq!(message, "Prove HTTP error: connection refused");
    assert!(!confirmed);
    assert_eq!(rig.metrics.proofs_failed.get(), 1);

    rig.handle.advertisement(beacon_for(Nonce::new([2; 8]))).unwrap();
    wait_for(&mut rig.notices, |n| {
        matches!(n, EngineNotice::ProofRequested { nonce } if nonce == &Nonce::new([2; 8]).to_hex())
    })
    .await;
    assert_eq!(rig.metrics.proofs_requested.get(), 2);
    rig.handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn presence_flip_does_not_cancel_proof_in_flight() {
    let shutdown = ShutdownController::new();
    let proofs = NullProofService::new().with_delay(Duration::from_secs(5));
    let model = NullPresenceModel::constant(true);
    let deps = SessionDeps::with_proof_service(
        Box::new(model),
        Arc::new(proofs.clone()),
        Arc::new(NullRecorder::new()),
        Arc::new(NullClock::new(0)),
    );
    let handle = AttendanceSession::spawn(
        &EngineParams::default(),
        BucketSource::Raw,
        deps,
        Arc::new(EngineMetrics::new()),
        shutdown.subscribe(),
    );
    let mut notices = handle.subscribe();
    handle.start().unwrap();
    feed(&handle, (0..100).map(handheld));
    handle.advertisement(beacon_for(Nonce::new([3; 8]))).unwrap();
    // Two stationary windows flip presence while the prover is still busy.
    feed(&handle, (100..250).map(on_desk));

    wait_for(&mut notices, |n| {
        matches!(n, EngineNotice::PresenceChanged { .. })
    })
    .await;
    let report = wait_for(&mut notices, is_proof_report).await;
    assert!(matches!(
        report,
        EngineNotice::ProofReported {
            confirmed: true,
            latency_ms: 10_000,
            ..
        }
    ));
    handle.shutdown().await.unwrap();
}

// ---------------------------------------------------------------------------
// Range
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn silence_past_timeout_goes_out_of_range() {
    let mut rig = rig(NullPresenceModel::constant(true));
    let started = Instant::now();
    rig.handle.start().unwrap();
    rig.handle.advertisement(beacon_for(Nonce::new([4; 8]))).unwrap();

    let out = wait_for(&mut rig.notices, |n| {
        matches!(n, EngineNotice::RangeChanged { .. })
    })
    .await;
    assert_eq!(
        out,
        EngineNotice::RangeChanged {
            state: RangeState::OutOfRange
        }
    );
    // The first tick strictly past 35 s of silence.
    assert_eq!(started.elapsed(), Duration::from_secs(36));

    rig.handle.advertisement(beacon_for(Nonce::new([4; 8]))).unwrap();
    let back = wait_for(&mut rig.notices, |n| {
        matches!(n, EngineNotice::RangeChanged { .. })
    })
    .await;
    assert_eq!(
        back,
        EngineNotice::RangeChanged {
            state: RangeState::InRange
        }
    );
    assert_eq!(rig.metrics.in_range.get(), 1);
    rig.handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn radio_unavailable_disables_scanning() {
    let mut rig = rig(NullPresenceModel::constant(true));
    rig.handle
        .send(SessionCommand::RadioUnavailable("unauthorized".into()))
        .unwrap();
    rig.handle.start().unwrap();
    feed(&rig.handle, (0..100).map(handheld));
    rig.handle.advertisement(beacon_for(Nonce::new([5; 8]))).unwrap();

    wait_for(&mut rig.notices, |n| {
        matches!(n, EngineNotice::RadioUnavailable { .. })
    })
    .await;
    tokio::time::sleep(Duration::from_secs(60)).await;
    let later = drain(&mut rig.notices);
    assert!(!later
        .iter()
        .any(|n| matches!(n, EngineNotice::NonceObserved { .. })));
    // Nothing can be heard, so the start baseline times out.
    let range_changes: Vec<_> = later
        .iter()
        .filter_map(|n| match n {
            EngineNotice::RangeChanged { state } => Some(*state),
            _ => None,
        })
        .collect();
    assert_eq!(range_changes, vec![RangeState::OutOfRange]);
    assert_eq!(rig.handle.snapshot().range, RangeState::OutOfRange);
    assert_eq!(rig.metrics.in_range.get(), 0);
    assert_eq!(rig.metrics.advertisements_observed.get(), 0);
    rig.handle.shutdown().await.unwrap();
}

// ---------------------------------------------------------------------------
// Presence
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn classifier_failure_is_local_to_the_window() {
    let model = NullPresenceModel::scripted(
        vec![Err(proxima_presence::ClassifierError::Model("nan".into()))],
        true,
    );
    let mut rig = rig(model);
    rig.handle.start().unwrap();
    feed(&rig.handle, (0..100).map(handheld));

    let failed = wait_for(&mut rig.notices, |n| {
        matches!(n, EngineNotice::ClassifierFailed { .. })
    })
    .await;
    assert_eq!(
        failed,
        EngineNotice::ClassifierFailed {
            reason: "model error: nan".into()
        }
    );
    let mut watch = rig.handle.watch();
    watch
        .wait_for(|s| matches!(s.presence, PresenceStatus::Error(_)))
        .await
        .unwrap();

    // The next hop classifies normally.
    feed(&rig.handle, (100..150).map(handheld));
    watch
        .wait_for(|s| s.presence.is_with_user())
        .await
        .unwrap();
    assert_eq!(rig.metrics.classifier_failures.get(), 1);
    assert_eq!(rig.metrics.windows_classified.get(), 1);
    rig.handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn motion_unavailable_keeps_proof_gate_closed() {
    let mut rig = rig(NullPresenceModel::constant(true));
    rig.handle
        .send(SessionCommand::MotionUnavailable("no accelerometer".into()))
        .unwrap();
    rig.handle.start().unwrap();
    rig.handle
        .send(SessionCommand::MotionUnavailable("no accelerometer".into()))
        .unwrap();
    feed(&rig.handle, (0..100).map(handheld));
    rig.handle.advertisement(beacon_for(Nonce::new([6; 8]))).unwrap();

    tokio::time::sleep(Duration::from_secs(1)).await;
    let notices = drain(&mut rig.notices);
    assert!(notices
        .iter()
        .any(|n| matches!(n, EngineNotice::NonceObserved { .. })));
    let reported = notices
        .iter()
        .filter(|n| matches!(n, EngineNotice::MotionUnavailable { .. }))
        .count();
    assert_eq!(reported, 1);
    let snapshot = rig.handle.snapshot();
    assert_eq!(
        snapshot.presence,
        PresenceStatus::Disabled("no accelerometer".into())
    );
    assert_eq!(rig.metrics.proofs_requested.get(), 0);
    assert_eq!(rig.metrics.windows_classified.get(), 0);
    rig.handle.shutdown().await.unwrap();
}

// ---------------------------------------------------------------------------
// Sampling and verdicts
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn restarting_yields_one_verdict_after_the_second_start() {
    let mut rig = rig(NullPresenceModel::constant(true));
    rig.handle.start().unwrap();
    tokio::time::sleep(Duration::from_secs(60)).await;

    let second_start = Instant::now();
    rig.handle.start().unwrap();
    wait_for(&mut rig.notices, is_verdict).await;
    assert_eq!(second_start.elapsed(), Duration::from_secs(180));

    tokio::time::sleep(Duration::from_secs(400)).await;
    assert!(!drain(&mut rig.notices).iter().any(is_verdict));
    assert_eq!(rig.metrics.verdicts.get(), 1);
    rig.handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn handheld_window_is_recorded_present() {
    let recorder = NullRecorder::new();
    let mut rig = rig_with(
        NullPresenceModel::constant(true),
        Arc::new(recorder.clone()),
        BucketSource::Raw,
    );
    rig.handle.start().unwrap();

    // One second of motion per second of wall time keeps every bucket positive.
    let mut i = 0;
    while i < 180 * 50 {
        feed(&rig.handle, (i..i + 50).map(handheld));
        i += 50;
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    let verdict = wait_for(&mut rig.notices, is_verdict).await;
    let EngineNotice::Verdict { verdict } = verdict else {
        unreachable!()
    };
    assert_eq!(verdict.status, AttendanceStatus::Present);
    assert_eq!(verdict.present_samples, 9);
    assert_eq!(verdict.absent_samples, 0);

    let record = wait_for(&mut rig.notices, |n| matches!(n, EngineNotice::Record { .. })).await;
    assert_eq!(
        record,
        EngineNotice::Record {
            record: RecordNotice::Recorded
        }
    );
    let records = recorder.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, AttendanceStatus::Present);
    assert_eq!(records[0].timestamp, 1_700_000_000);
    rig.handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn stop_discards_the_window_without_a_verdict() {
    let recorder = NullRecorder::new();
    let mut rig = rig_with(
        NullPresenceModel::constant(true),
        Arc::new(recorder.clone()),
        BucketSource::Raw,
    );
    rig.handle.start().unwrap();
    feed(&rig.handle, (0..100).map(handheld));
    tokio::time::sleep(Duration::from_secs(30)).await;
    rig.handle.stop().unwrap();
    rig.handle.stop().unwrap();

    tokio::time::sleep(Duration::from_secs(300)).await;
    assert!(!drain(&mut rig.notices).iter().any(is_verdict));
    assert!(recorder.records().is_empty());
    let snapshot = rig.handle.snapshot();
    assert!(!snapshot.running);
    assert!(!snapshot.window_open);
    assert!(snapshot.samples.is_empty());
    rig.handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn missing_credential_skips_the_record() {
    let recorder = HttpAttendanceRecorder::new("http://127.0.0.1:9", None);
    let mut rig = rig_with(
        NullPresenceModel::constant(true),
        Arc::new(recorder),
        BucketSource::Raw,
    );
    rig.handle.start().unwrap();
    wait_for(&mut rig.notices, is_verdict).await;
    let record = wait_for(&mut rig.notices, |n| matches!(n, EngineNotice::Record { .. })).await;
    assert_eq!(
        record,
        EngineNotice::Record {
            record: RecordNotice::SkippedNoCredential
        }
    );
    assert_eq!(rig.metrics.record_failures.get(), 0);
    rig.handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn record_failure_is_surfaced() {
    let recorder = NullRecorder::failing(proxima_attendance::AttendanceError::Rejected { status: 503 });
    let mut rig = rig_with(
        NullPresenceModel::constant(true),
        Arc::new(recorder),
        BucketSource::Raw,
    );
    rig.handle.start().unwrap();
    let record = wait_for(&mut rig.notices, |n| matches!(n, EngineNotice::Record { .. })).await;
    assert!(matches!(
        record,
        EngineNotice::Record {
            record: RecordNotice::Failed(ref msg)
        } if msg.contains("503")
    ));
    assert_eq!(rig.metrics.record_failures.get(), 1);
    rig.handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn bucket_source_selects_raw_or_smoothed_labels() {
    for (source, expected) in [(BucketSource::Raw, false), (BucketSource::Smoothed, true)] {
        let mut rig = rig_with(
            NullPresenceModel::constant(false),
            Arc::new(NullRecorder::new()),
            source,
        );
        rig.handle.start().unwrap();
        // One negative window: the raw label is false, the smoothed state is
        // still "with user".
        feed(&rig.handle, (0..100).map(handheld));
        let sample = wait_for(&mut rig.notices, |n| {
            matches!(n, EngineNotice::SampleTaken { .. })
        })
        .await;
        assert_eq!(
            sample,
            EngineNotice::SampleTaken {
                index: 0,
                present: expected
            },
            "bucket source {source:?}"
        );
        rig.handle.shutdown().await.unwrap();
    }
}
