//! Beacon side and scanner side of the nonce-rotation protocol.
//!
//! - [`NonceBroadcastEmitter`] rotates a random nonce and advertises
//!   `prefix ‖ nonce` next to a fixed marker.
//! - [`NonceScanner`] filters advertisements by marker and prefix, extracts
//!   the nonce, and emits it once per change.
//! - [`RangeMonitor`] derives in-range / out-of-range from the time of the
//!   last matching observation.
//!
//! All three are synchronous state machines driven by the coordinator with
//! an explicit `now_ms`; none of them spawns tasks or sleeps.

pub mod advertisement;
pub mod emitter;
pub mod error;
pub mod radio;
pub mod random;
pub mod range;
pub mod scanner;

pub use advertisement::{Advertisement, AdvertisementPayload, ServiceId};
pub use emitter::NonceBroadcastEmitter;
pub use error::BeaconError;
pub use radio::{Advertiser, RadioState};
pub use random::{NonceSource, OsNonceSource};
pub use range::{RangeMonitor, RangeState};
pub use scanner::{NonceObserved, NonceScanner, RejectReason, ScanOutcome, ScanStats};
