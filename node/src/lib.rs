//! Proxima engine runtime: wires the protocol components into running tasks.
//!
//! The runtime provides:
//! - [`AttendanceSession`]: the single coordinating task that owns the
//!   scanner, range monitor, presence classifier, attendance sampler, and
//!   proof orchestrator
//! - [`BeaconService`]: the broadcasting side, rotating nonces on a timer
//! - configuration, structured logging, Prometheus metrics, and a read-only
//!   status server
//! - session replay from recorded JSON-lines files

pub mod beacon_service;
pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod metrics;
pub mod replay;
pub mod session;
pub mod shutdown;
pub mod status_server;
pub mod tracing_spans;

pub use beacon_service::{BeaconService, LoggingAdvertiser};
pub use config::{BucketSource, EngineConfig};
pub use error::NodeError;
pub use event::{EngineNotice, EngineSnapshot, RecordNotice, SessionCommand};
pub use logging::{init_logging, LogFormat};
pub use metrics::EngineMetrics;
pub use replay::{parse_replay, replay, ReplayAction, ReplayEvent};
pub use session::{AttendanceSession, SessionDeps, SessionHandle};
pub use shutdown::{ShutdownController, ShutdownSignal};
pub use status_server::{StatusServer, StatusState};
