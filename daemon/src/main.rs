//! Proxima daemon: entry point for the beacon, session replay, and dataset tooling.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;

use proxima_attendance::HttpAttendanceRecorder;
use proxima_beacon::{NonceBroadcastEmitter, OsNonceSource};
use proxima_node::{
    init_logging, parse_replay, replay, AttendanceSession, BeaconService, BucketSource,
    EngineConfig, EngineMetrics, LoggingAdvertiser, SessionDeps, ShutdownController, StatusServer,
    StatusState,
};
use proxima_presence::dataset::{extract_windows, read_log, write_feature_csv};
use proxima_presence::{ForestModel, GateOnlyModel, PresenceModel};
use proxima_proof::HttpProofService;
use proxima_types::SystemClock;

#[derive(Parser)]
#[command(name = "proxima-daemon", about = "Proximity-gated attendance engine")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "PROXIMA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "PROXIMA_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "PROXIMA_LOG_FORMAT")]
    log_format: Option<String>,

    /// Base URL of the proof service (`/prove`, `/verify`).
    #[arg(long, env = "PROXIMA_PROOF_SERVICE_URL")]
    proof_service_url: Option<String>,

    /// Base URL of the attendance service (`/attendance`).
    #[arg(long, env = "PROXIMA_ATTENDANCE_SERVICE_URL")]
    attendance_service_url: Option<String>,

    /// Bearer token for attendance writes.
    #[arg(long, env = "PROXIMA_AUTH_TOKEN", hide_env_values = true)]
    auth_token: Option<String>,

    /// JSON decision forest used as the presence model.
    #[arg(long, env = "PROXIMA_MODEL_PATH")]
    model_path: Option<PathBuf>,

    /// Which label feeds the sampling bucket: "raw" or "smoothed".
    #[arg(long, env = "PROXIMA_BUCKET_SOURCE")]
    bucket_source: Option<String>,

    /// Serve `/metrics` and `/snapshot` on this port.
    #[arg(long, env = "PROXIMA_STATUS_PORT")]
    status_port: Option<u16>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Broadcast rotating nonces.
    #[command(name = "beacon")]
    Beacon {
        #[command(subcommand)]
        action: BeaconAction,
    },
    /// Attendance sessions.
    #[command(name = "session")]
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// Offline tooling for labelled motion logs.
    #[command(name = "dataset")]
    Dataset {
        #[command(subcommand)]
        action: DatasetAction,
    },
    /// Inspect the effective configuration.
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand)]
enum BeaconAction {
    /// Rotate and advertise nonces until interrupted.
    Run,
}

#[derive(clap::Subcommand)]
enum SessionAction {
    /// Drive a session from a JSON-lines recording.
    Replay {
        file: PathBuf,
        /// Keep the session alive this long after the last event so that
        /// in-flight proofs and records can finish.
        #[arg(long, default_value_t = 5)]
        linger_secs: u64,
    },
}

#[derive(clap::Subcommand)]
enum DatasetAction {
    /// Extract per-window features from a labelled log into CSV.
    Features {
        log: PathBuf,
        /// Output file; stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(clap::Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML.
    Show,
}

impl Cli {
    /// Load the file config (or defaults) and apply flag/env overrides.
    fn engine_config(&self) -> anyhow::Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_toml_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => EngineConfig::default(),
        };
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.log_format = format.clone();
        }
        if let Some(url) = &self.proof_service_url {
            config.proof_service_url = url.clone();
        }
        if let Some(url) = &self.attendance_service_url {
            config.attendance_service_url = url.clone();
        }
        if self.auth_token.is_some() {
            config.auth_token = self.auth_token.clone();
        }
        if self.model_path.is_some() {
            config.model_path = self.model_path.clone();
        }
        if let Some(source) = &self.bucket_source {
            config.bucket_source = source.parse::<BucketSource>()?;
        }
        if self.status_port.is_some() {
            config.status_port = self.status_port;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.engine_config()?;

    match cli.command {
        Command::Beacon { action } => match action {
            BeaconAction::Run => {
                init_logging(config.log_format()?, &config.log_level)?;
                run_beacon(&config).await
            }
        },
        Command::Session { action } => match action {
            SessionAction::Replay { file, linger_secs } => {
                init_logging(config.log_format()?, &config.log_level)?;
                replay_session(&config, file, Duration::from_secs(linger_secs)).await
            }
        },
        Command::Dataset { action } => match action {
            DatasetAction::Features { log, out } => {
                proxima_utils::init_tracing("warn");
                dataset_features(&config, log, out)
            }
        },
        Command::Config { action } => match action {
            ConfigAction::Show => {
                print!("{}", config.to_toml_string()?);
                Ok(())
            }
        },
    }
}

/// Spawn the status server if a port is configured.
fn spawn_status_server(
    config: &EngineConfig,
    state: StatusState,
    shutdown: &ShutdownController,
) -> Option<tokio::task::JoinHandle<()>> {
    let port = config.status_port?;
    let server = StatusServer::new(port, state);
    let signal = shutdown.subscribe();
    Some(tokio::spawn(async move {
        if let Err(e) = server.start(signal).await {
            tracing::error!(error = %e, "status server failed");
        }
    }))
}

fn spawn_signal_listener(shutdown: &Arc<ShutdownController>) {
    let shutdown = shutdown.clone();
    tokio::spawn(async move { shutdown.wait_for_signal().await });
}

async fn run_beacon(config: &EngineConfig) -> anyhow::Result<()> {
    let metrics = Arc::new(EngineMetrics::new());
    let shutdown = Arc::new(ShutdownController::new());
    spawn_signal_listener(&shutdown);

    let (_snapshot_tx, snapshot_rx) = tokio::sync::watch::channel(Default::default());
    let status = spawn_status_server(
        config,
        StatusState {
            metrics: metrics.clone(),
            snapshot: snapshot_rx,
        },
        &shutdown,
    );

    tracing::info!(
        rotation_interval_ms = config.timing.rotation_interval_ms,
        "starting beacon"
    );
    let emitter = NonceBroadcastEmitter::new(
        LoggingAdvertiser::new(),
        OsNonceSource,
        config.timing.rotation_interval_ms,
    );
    let result = BeaconService::new(emitter, metrics)
        .run(shutdown.subscribe())
        .await;

    shutdown.shutdown();
    if let Some(task) = status {
        let _ = task.await;
    }
    let rotations = result?;
    tracing::info!(rotations, "beacon stopped");
    Ok(())
}

fn load_model(config: &EngineConfig) -> anyhow::Result<Box<dyn PresenceModel>> {
    match &config.model_path {
        Some(path) => {
            let forest = ForestModel::from_json_file(path)
                .with_context(|| format!("loading model {}", path.display()))?;
            tracing::info!(trees = forest.tree_count(), path = %path.display(), "presence model loaded");
            Ok(Box::new(forest))
        }
        None => {
            tracing::warn!("no model_path configured; only the variance gate decides presence");
            Ok(Box::new(GateOnlyModel))
        }
    }
}

async fn replay_session(
    config: &EngineConfig,
    file: PathBuf,
    linger: Duration,
) -> anyhow::Result<()> {
    let reader = BufReader::new(
        File::open(&file).with_context(|| format!("opening {}", file.display()))?,
    );
    let events = parse_replay(reader)?;

    let metrics = Arc::new(EngineMetrics::new());
    let shutdown = Arc::new(ShutdownController::new());
    spawn_signal_listener(&shutdown);

    let deps = SessionDeps::with_proof_service(
        load_model(config)?,
        Arc::new(HttpProofService::with_timeout(
            config.proof_service_url.clone(),
            config.request_timeout(),
        )),
        Arc::new(HttpAttendanceRecorder::with_timeout(
            config.attendance_service_url.clone(),
            config.auth_token.clone(),
            config.request_timeout(),
        )),
        Arc::new(SystemClock),
    );
    let handle = AttendanceSession::spawn(
        &config.timing,
        config.bucket_source,
        deps,
        metrics.clone(),
        shutdown.subscribe(),
    );

    let status = spawn_status_server(
        config,
        StatusState {
            metrics,
            snapshot: handle.watch(),
        },
        &shutdown,
    );

    let mut notices = handle.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match notices.recv().await {
                Ok(notice) => match serde_json::to_string(&notice) {
                    Ok(json) => tracing::info!(notice = %json, "session notice"),
                    Err(e) => tracing::warn!(error = %e, "unprintable notice"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "notice printer lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    tracing::info!(events = events.len(), file = %file.display(), "replaying session");
    let mut signal = shutdown.subscribe();
    tokio::select! {
        delivered = replay(&handle, events) => {
            tracing::info!(delivered = delivered?, "replay finished");
            tokio::select! {
                _ = tokio::time::sleep(linger) => {}
                _ = signal.wait() => {}
            }
        }
        _ = signal.wait() => tracing::info!("replay interrupted"),
    }

    let snapshot = handle.snapshot();
    handle.shutdown().await?;
    shutdown.shutdown();
    if let Some(task) = status {
        let _ = task.await;
    }
    printer.abort();

    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

fn dataset_features(
    config: &EngineConfig,
    log: PathBuf,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let reader =
        BufReader::new(File::open(&log).with_context(|| format!("opening {}", log.display()))?);
    let samples = read_log(reader)?;
    let windows = extract_windows(&samples, config.timing.window_size, config.timing.hop_size);

    let rows = match out {
        Some(path) => {
            let file =
                File::create(&path).with_context(|| format!("creating {}", path.display()))?;
            write_feature_csv(BufWriter::new(file), &windows)?
        }
        None => write_feature_csv(std::io::stdout().lock(), &windows)?,
    };
    eprintln!(
        "{} samples, {} windows written (window {}, hop {})",
        samples.len(),
        rows,
        config.timing.window_size,
        config.timing.hop_size
    );
    Ok(())
}
