//! Shutdown coordination.

use crate::error::Result;
use crate::types::Event;

use super::VideoDownloader;

/// How long shutdown waits for running workers
const SHUTDOWN_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

impl VideoDownloader {
    /// Gracefully shut down the downloader
    ///
    /// This method performs a graceful shutdown sequence:
    /// 1. Stops accepting new downloads
    /// 2. Stops background services (retention sweeper)
    /// 3. Waits for active workers to finish with a timeout (30 seconds)
    /// 4. Emits `Event::Shutdown`
    ///
    /// Running downloads are not cancelled; workers still waiting for a slot end
    /// their task in `error` as soon as they get one.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        // 1. Stop accepting new downloads
        self.queue_state
            .accepting_new
            .store(false, std::sync::atomic::Ordering::SeqCst);
        tracing::info!("Stopped accepting new downloads");

        // 2. Stop background services
        self.shutdown_token.cancel();

        // 3. Wait for active workers with timeout
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.wait_for_active_downloads()).await {
            Ok(()) => {
                tracing::info!("All active downloads completed gracefully");
            }
            Err(_) => {
                let remaining = self.queue_state.active_downloads.lock().await.len();
                tracing::warn!(
                    remaining,
                    "Timeout waiting for downloads to complete, proceeding with shutdown"
                );
            }
        }

        // 4. Emit shutdown event
        self.emit_event(Event::Shutdown);

        tracing::info!("Graceful shutdown complete");
        Ok(())
    }

    /// Wait until every spawned worker has finished
    async fn wait_for_active_downloads(&self) {
        loop {
            let active_count = self.queue_state.active_downloads.lock().await.len();
            if active_count == 0 {
                return;
            }

            tracing::debug!(active_count, "Waiting for active downloads to complete");
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
    }
}
