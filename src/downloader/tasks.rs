//! Download submission and status lookup.

use crate::error::{Error, Result};
use crate::types::{DownloadRequest, Event, Task, TaskId};
use crate::utils::validate_url;

use super::VideoDownloader;
use super::download_task::DownloadJob;

impl VideoDownloader {
    /// Accept a download request and start its worker
    ///
    /// Returns as soon as the task is registered; the worker waits for a free slot
    /// in the pool while the task stays `pending`. An omitted or blank quality falls
    /// back to `download.default_quality`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] for an empty or malformed URL
    /// - [`Error::ShuttingDown`] once shutdown has begun
    pub async fn submit(&self, request: DownloadRequest) -> Result<TaskId> {
        let url = validate_url(&request.url)?;

        if !self.is_accepting() {
            return Err(Error::ShuttingDown);
        }

        let quality = request
            .quality
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .unwrap_or_else(|| self.config.download.default_quality.clone());
        let title = request
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let id = self.registry.allocate().await;
        tracing::info!(task_id = %id, url = %url, quality = %quality, "download queued");

        self.emit_event(Event::Queued {
            id: id.clone(),
            url: url.clone(),
            quality: quality.clone(),
        });

        self.spawn_download_task(id.clone(), DownloadJob {
            url,
            quality,
            title,
        })
        .await;

        Ok(id)
    }

    /// Current state of a task
    ///
    /// # Errors
    ///
    /// [`Error::TaskNotFound`] for an unknown identifier.
    pub async fn get_task(&self, id: &TaskId) -> Result<Task> {
        self.registry
            .get(id)
            .await
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))
    }
}
