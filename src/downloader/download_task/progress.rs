//! Progress reporter: extractor byte counters → registry percentages and events.

use crate::extractor::{ProgressPhase, ProgressUpdate};
use crate::registry::TaskRegistry;
use crate::types::{Event, TaskId};
use crate::utils::percent_of;
use tokio::sync::{broadcast, mpsc};

/// Buffer size for the extractor progress channel
pub(crate) const PROGRESS_CHANNEL_BUFFER: usize = 64;

/// Spawn a task that drains `rx` until every sender is gone
///
/// Only `downloading` updates with a known total move the stored progress; the
/// registry ignores values that would not advance it, so a second stream (audio
/// after video) restarting from zero never pulls the percentage back.
pub(crate) fn spawn_progress_reporter(
    id: TaskId,
    mut rx: mpsc::Receiver<ProgressUpdate>,
    registry: TaskRegistry,
    event_tx: broadcast::Sender<Event>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(update) = rx.recv().await {
            if update.phase != ProgressPhase::Downloading {
                continue;
            }
            let Some(percent) = percent_of(update.downloaded_bytes, update.total_bytes) else {
                continue;
            };

            match registry.set_progress(&id, percent).await {
                Ok(true) => {
                    let _ = event_tx.send(Event::Progress {
                        id: id.clone(),
                        percent,
                    });
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(task_id = %id, error = %e, "failed to record progress");
                }
            }
        }
    })
}
