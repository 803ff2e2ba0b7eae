use std::sync::Arc;
use std::time::Duration;

use tokio::select;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::Recorder;

/// Drives a recorder's periodic tick from a background task. All timing
/// state lives in the recorder; this loop only decides how long to sleep.
pub struct RecorderRuntime {
    task: Option<JoinHandle<()>>,
    shutdown: CancellationToken,
}

impl RecorderRuntime {
    pub fn spawn(recorder: Arc<Recorder>) -> Self {
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();
        let task = tokio::spawn(async move {
            debug!(target: "recorder-runtime", "driver started");
            loop {
                let wait = recorder.idle_wait_ms().await;
                select! {
                    _ = token.cancelled() => {
                        debug!(target: "recorder-runtime", "driver shutting down");
                        break;
                    }
                    _ = tokio::time::sleep(Duration::from_millis(wait)) => {
                        if let Err(err) = recorder.tick().await {
                            warn!(target: "recorder-runtime", %err, "tick failed");
                        }
                    }
                }
            }
            debug!(target: "recorder-runtime", "driver exited");
        });
        Self {
            task: Some(task),
            shutdown,
        }
    }

    /// Stops the driver loop. The recorder itself is stopped separately so
    /// the final drain happens on the caller's terms.
    pub async fn stop(mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for RecorderRuntime {
    fn drop(&mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
