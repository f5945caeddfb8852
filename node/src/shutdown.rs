//! Graceful shutdown controller for the engine.
//!
//! Listens for SIGINT/SIGTERM and flips a `tokio::sync::watch` flag that the
//! beacon service and every attendance session wait on.

use tokio::signal;
use tokio::sync::watch;

/// Coordinates graceful shutdown across the engine's tasks.
///
/// Tasks call [`subscribe`](Self::subscribe) to get a [`ShutdownSignal`],
/// then `select!` on [`ShutdownSignal::wait`] alongside their main loop.
/// A signal taken after shutdown was triggered resolves immediately.
pub struct ShutdownController {
    tx: watch::Sender<bool>,
}

/// Receiving half handed to each task.
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Resolve once shutdown has been triggered (or the controller dropped).
    pub async fn wait(&mut self) {
        // An error means the controller is gone, which also ends the task.
        let _ = self.rx.wait_for(|stop| *stop).await;
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Trigger shutdown programmatically. Idempotent.
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait for SIGTERM or SIGINT, then trigger shutdown.
    pub async fn wait_for_signal(&self) {
        let ctrl_c = signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "SIGTERM handler unavailable");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => { tracing::info!("received SIGINT, shutting down"); }
            _ = terminate => { tracing::info!("received SIGTERM, shutting down"); }
        }

        self.shutdown();
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}
