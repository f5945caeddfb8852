//! Drive a session from a recorded JSON-lines file.
//!
//! Each line is one timestamped event, relative to the start of the replay:
//!
//! ```text
//! {"at_ms": 0, "event": "start"}
//! {"at_ms": 20, "event": "motion", "accel": [0.0, 0.1, 9.8], "gyro": [0.4, 0.0, 0.1]}
//! {"at_ms": 900, "event": "advertisement", "local_name": "ZK-Attendance", "service_ids": ["D4F56A24-9CDE-4B12-0102-030405060708"]}
//! {"at_ms": 200000, "event": "stop"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use std::io::BufRead;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use proxima_beacon::Advertisement;
use proxima_types::MotionSample;

use crate::event::SessionCommand;
use crate::session::SessionHandle;
use crate::NodeError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReplayAction {
    Start,
    Stop,
    Motion { accel: [f64; 3], gyro: [f64; 3] },
    Advertisement(Advertisement),
    MotionUnavailable { reason: String },
    RadioUnavailable { reason: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplayEvent {
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: ReplayAction,
}

impl ReplayEvent {
    pub fn into_command(self) -> SessionCommand {
        match self.action {
            ReplayAction::Start => SessionCommand::Start,
            ReplayAction::Stop => SessionCommand::Stop,
            ReplayAction::Motion { accel, gyro } => {
                SessionCommand::Motion(MotionSample::new(accel, gyro, self.at_ms))
            }
            ReplayAction::Advertisement(adv) => SessionCommand::Advertisement(adv),
            ReplayAction::MotionUnavailable { reason } => SessionCommand::MotionUnavailable(reason),
            ReplayAction::RadioUnavailable { reason } => SessionCommand::RadioUnavailable(reason),
        }
    }
}

/// Parse a replay file. Timestamps must not go backwards.
pub fn parse_replay<R: BufRead>(reader: R) -> Result<Vec<ReplayEvent>, NodeError> {
    let mut events: Vec<ReplayEvent> = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let event: ReplayEvent = serde_json::from_str(trimmed).map_err(|e| NodeError::Replay {
            line: line_no,
            reason: e.to_string(),
        })?;
        if let Some(previous) = events.last() {
            if event.at_ms < previous.at_ms {
                return Err(NodeError::Replay {
                    line: line_no,
                    reason: format!(
                        "at_ms {} is earlier than the previous event ({})",
                        event.at_ms, previous.at_ms
                    ),
                });
            }
        }
        events.push(event);
    }
    Ok(events)
}

/// Feed `events` into the session at their recorded offsets. Returns the
/// number of events delivered.
pub async fn replay(handle: &SessionHandle, events: Vec<ReplayEvent>) -> Result<usize, NodeError> {
    let epoch = Instant::now();
    let mut delivered = 0;
    for event in events {
        sleep_until(epoch + Duration::from_millis(event.at_ms)).await;
        debug!(at_ms = event.at_ms, "replaying event");
        handle.send(event.into_command())?;
        delivered += 1;
    }
    Ok(delivered)
}
