use std::time::Duration;

use tokio::signal;
use tokio::sync::watch;

/// Triggers the run-wide cancellation signal.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

/// Read side of the run-wide cancellation signal, cloned into every workflow.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

/// Create a connected cancellation pair.
pub fn cancellation() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

impl CancelHandle {
    pub fn cancel(&self) {
        // send_replace stores the value even with no receiver left
        self.tx.send_replace(true);
    }

    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            rx: self.tx.subscribe(),
        }
    }
}

impl CancelSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        // Dropping the sender freezes the value at false
        drop(tx);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
pub async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, no new repositories will be started");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, no new repositories will be started");
        }
    }
}

/// Cancel the run on Ctrl+C / SIGTERM, or once `timeout` elapses.
///
/// Workflows already cloning or running their action are left to finish.
pub fn cancel_on_shutdown(handle: CancelHandle, timeout: Option<Duration>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let deadline = async {
            match timeout {
                Some(timeout) => {
                    tokio::time::sleep(timeout).await;
                    tracing::info!(
                        timeout_secs = timeout.as_secs(),
                        "Run deadline reached, no new repositories will be started"
                    );
                }
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = wait_for_shutdown() => {}
            _ = deadline => {}
        }

        handle.cancel();
    })
}
