//! In-process task registry
//!
//! The registry exclusively owns every [`Task`] record. Exactly one worker writes to a
//! given task while any number of request handlers read snapshots of it. All writes go
//! through [`TaskRegistry::update`], which rejects changes that would break the
//! lifecycle (backward or skipped transitions, decreasing progress).

use crate::error::{Error, Result};
use crate::types::{Task, TaskCounts, TaskId, TaskStatus};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Concurrent map from task identifier to task state (cloneable, shared)
#[derive(Clone, Default)]
pub struct TaskRegistry {
    tasks: Arc<RwLock<HashMap<TaskId, Task>>>,
}

impl TaskRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pending task under `id`
    ///
    /// Fails if the identifier is already taken.
    pub async fn create(&self, id: TaskId) -> Result<Task> {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&id) {
            return Err(Error::InvalidInput(format!("task {} already exists", id)));
        }
        let task = Task::pending();
        tasks.insert(id, task.clone());
        Ok(task)
    }

    /// Generate an unused identifier and register a pending task under it
    pub async fn allocate(&self) -> TaskId {
        let mut tasks = self.tasks.write().await;
        let id = loop {
            let candidate = TaskId::generate();
            if !tasks.contains_key(&candidate) {
                break candidate;
            }
        };
        tasks.insert(id.clone(), Task::pending());
        id
    }

    /// Snapshot of a task
    pub async fn get(&self, id: &TaskId) -> Option<Task> {
        self.tasks.read().await.get(id).cloned()
    }

    /// Apply `apply` to the task in place and return the new snapshot
    ///
    /// The change is computed on a copy and committed only if it is a legal
    /// step of the lifecycle; otherwise the stored record is left untouched.
    pub async fn update<F>(&self, id: &TaskId, apply: F) -> Result<Task>
    where
        F: FnOnce(&mut Task),
    {
        let mut tasks = self.tasks.write().await;
        let current = tasks
            .get_mut(id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;

        let mut next = current.clone();
        apply(&mut next);
        check_update(id, current, &next)?;

        *current = next.clone();
        Ok(next)
    }

    /// pending → downloading
    pub async fn mark_downloading(&self, id: &TaskId) -> Result<Task> {
        self.update(id, |task| task.status = TaskStatus::Downloading).await
    }

    /// Record a progress percentage
    ///
    /// Values are clamped to [0, 100]. Returns `Ok(false)` without writing when the
    /// task is not downloading or the value would not advance the stored progress.
    pub async fn set_progress(&self, id: &TaskId, percent: f64) -> Result<bool> {
        let percent = percent.clamp(0.0, 100.0);
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;

        if task.status != TaskStatus::Downloading || percent <= task.progress {
            return Ok(false);
        }
        task.progress = percent;
        Ok(true)
    }

    /// downloading → completed, recording the stored filename
    pub async fn mark_completed(&self, id: &TaskId, filename: String) -> Result<Task> {
        self.update(id, |task| {
            task.status = TaskStatus::Completed;
            task.progress = 100.0;
            task.filename = Some(filename);
        })
        .await
    }

    /// downloading → error, recording the failure description
    pub async fn mark_failed(&self, id: &TaskId, error: String) -> Result<Task> {
        self.update(id, |task| {
            task.status = TaskStatus::Error;
            task.error = Some(error);
        })
        .await
    }

    /// Number of registered tasks
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Whether no task has been registered
    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }

    /// Per-status counts
    pub async fn counts(&self) -> TaskCounts {
        let tasks = self.tasks.read().await;
        let mut counts = TaskCounts::default();
        for task in tasks.values() {
            match task.status {
                TaskStatus::Pending => counts.pending += 1,
                TaskStatus::Downloading => counts.downloading += 1,
                TaskStatus::Completed => counts.completed += 1,
                TaskStatus::Error => counts.error += 1,
            }
        }
        counts
    }

    /// Tasks that have not reached a terminal state
    pub async fn active_count(&self) -> usize {
        self.tasks
            .read()
            .await
            .values()
            .filter(|task| !task.status.is_terminal())
            .count()
    }
}

fn check_update(id: &TaskId, before: &Task, after: &Task) -> Result<()> {
    if before.status != after.status && !before.status.can_transition_to(after.status) {
        return Err(Error::InvalidState {
            id: id.to_string(),
            from: before.status.to_string(),
            to: after.status.to_string(),
        });
    }
    if before.status.is_terminal() && before != after {
        return Err(Error::InvalidState {
            id: id.to_string(),
            from: before.status.to_string(),
            to: after.status.to_string(),
        });
    }
    if !(0.0..=100.0).contains(&after.progress) || after.progress < before.progress {
        return Err(Error::InvalidInput(format!(
            "progress for task {} cannot move from {} to {}",
            id, before.progress, after.progress
        )));
    }
    if after.filename.is_some() && after.status != TaskStatus::Completed {
        return Err(Error::InvalidInput(format!(
            "filename for task {} is only set on completion",
            id
        )));
    }
    if after.error.is_some() && after.status != TaskStatus::Error {
        return Err(Error::InvalidInput(format!(
            "error for task {} is only set on failure",
            id
        )));
    }
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    async fn downloading_task(registry: &TaskRegistry) -> TaskId {
        let id = registry.allocate().await;
        registry.mark_downloading(&id).await.unwrap();
        id
    }

    #[tokio::test]
    async fn create_registers_pending_task() {
        let registry = TaskRegistry::new();
        let id = TaskId::from("1a2b3c4d");
        let task = registry.create(id.clone()).await.unwrap();

        assert_eq!(task, Task::pending());
        assert_eq!(registry.get(&id).await, Some(Task::pending()));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn create_rejects_duplicate_id() {
        let registry = TaskRegistry::new();
        let id = TaskId::from("1a2b3c4d");
        registry.create(id.clone()).await.unwrap();
        assert!(registry.create(id).await.is_err());
    }

    #[tokio::test]
    async fn get_unknown_task_is_none() {
        let registry = TaskRegistry::new();
        assert!(registry.is_empty().await);
        assert!(registry.get(&TaskId::from("ffffffff")).await.is_none());
    }

    #[tokio::test]
    async fn allocate_returns_distinct_ids() {
        let registry = TaskRegistry::new();
        let mut ids = std::collections::HashSet::new();
        for _ in 0..200 {
            assert!(ids.insert(registry.allocate().await));
        }
        assert_eq!(registry.len().await, 200);
    }

    #[tokio::test]
    async fn happy_path_reaches_completed() {
        let registry = TaskRegistry::new();
        let id = downloading_task(&registry).await;

        assert!(registry.set_progress(&id, 12.5).await.unwrap());
        let task = registry
            .mark_completed(&id, "My_Clip_1a2b3c4d.mp4".into())
            .await
            .unwrap();

        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.progress, 100.0);
        assert_eq!(task.filename.as_deref(), Some("My_Clip_1a2b3c4d.mp4"));
        assert!(task.error.is_none());
    }

    #[tokio::test]
    async fn pending_cannot_complete_directly() {
        let registry = TaskRegistry::new();
        let id = registry.allocate().await;

        let err = registry.mark_completed(&id, "x.mp4".into()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidState { .. }));
        assert_eq!(registry.get(&id).await, Some(Task::pending()));

        assert!(registry.mark_failed(&id, "boom".into()).await.is_err());
    }

    #[tokio::test]
    async fn terminal_states_are_final() {
        let registry = TaskRegistry::new();
        let id = downloading_task(&registry).await;
        registry.mark_failed(&id, "HTTP Error 403".into()).await.unwrap();

        assert!(registry.mark_downloading(&id).await.is_err());
        assert!(registry.mark_completed(&id, "x.mp4".into()).await.is_err());
        assert!(!registry.set_progress(&id, 50.0).await.unwrap());

        let task = registry.get(&id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Error);
        assert_eq!(task.error.as_deref(), Some("HTTP Error 403"));
        assert!(task.filename.is_none());
    }

    #[tokio::test]
    async fn terminal_record_cannot_be_edited_in_place() {
        let registry = TaskRegistry::new();
        let id = downloading_task(&registry).await;
        registry.mark_failed(&id, "first".into()).await.unwrap();

        let result = registry
            .update(&id, |task| task.error = Some("second".into()))
            .await;
        assert!(result.is_err());
        assert_eq!(
            registry.get(&id).await.unwrap().error.as_deref(),
            Some("first")
        );
    }

    #[tokio::test]
    async fn progress_is_monotonic_and_bounded() {
        let registry = TaskRegistry::new();
        let id = downloading_task(&registry).await;

        assert!(registry.set_progress(&id, 40.0).await.unwrap());
        assert!(!registry.set_progress(&id, 39.9).await.unwrap());
        assert!(!registry.set_progress(&id, 40.0).await.unwrap());
        assert!(registry.set_progress(&id, 250.0).await.unwrap());

        assert_eq!(registry.get(&id).await.unwrap().progress, 100.0);
    }

    #[tokio::test]
    async fn progress_ignored_while_pending() {
        let registry = TaskRegistry::new();
        let id = registry.allocate().await;
        assert!(!registry.set_progress(&id, 10.0).await.unwrap());
        assert_eq!(registry.get(&id).await.unwrap().progress, 0.0);
    }

    #[tokio::test]
    async fn update_rejects_decreasing_progress() {
        let registry = TaskRegistry::new();
        let id = downloading_task(&registry).await;
        registry.set_progress(&id, 50.0).await.unwrap();

        assert!(registry.update(&id, |t| t.progress = 10.0).await.is_err());
        assert_eq!(registry.get(&id).await.unwrap().progress, 50.0);
    }

    #[tokio::test]
    async fn filename_only_on_completion() {
        let registry = TaskRegistry::new();
        let id = downloading_task(&registry).await;
        let result = registry
            .update(&id, |t| t.filename = Some("early.mp4".into()))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn update_unknown_task_is_not_found() {
        let registry = TaskRegistry::new();
        let err = registry
            .mark_downloading(&TaskId::from("ffffffff"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TaskNotFound(_)));
        assert!(
            registry
                .set_progress(&TaskId::from("ffffffff"), 1.0)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn counts_by_status() {
        let registry = TaskRegistry::new();
        registry.allocate().await;
        let _downloading = downloading_task(&registry).await;
        let done = downloading_task(&registry).await;
        registry.mark_completed(&done, "a.mp4".into()).await.unwrap();
        let failed = downloading_task(&registry).await;
        registry.mark_failed(&failed, "x".into()).await.unwrap();

        let counts = registry.counts().await;
        assert_eq!(
            counts,
            TaskCounts {
                pending: 1,
                downloading: 1,
                completed: 1,
                error: 1,
            }
        );
        assert_eq!(registry.active_count().await, 2);
        assert_eq!(registry.len().await, 4);
    }

    #[tokio::test]
    async fn concurrent_readers_see_consistent_snapshots() {
        let registry = TaskRegistry::new();
        let id = downloading_task(&registry).await;

        let writer = {
            let registry = registry.clone();
            let id = id.clone();
            tokio::spawn(async move {
                for step in 1..=100 {
                    registry.set_progress(&id, step as f64).await.unwrap();
                    tokio::task::yield_now().await;
                }
            })
        };

        let mut last = 0.0;
        for _ in 0..200 {
            let progress = registry.get(&id).await.unwrap().progress;
            assert!(progress >= last, "progress went backwards");
            last = progress;
            tokio::task::yield_now().await;
        }
        writer.await.unwrap();
        assert_eq!(registry.get(&id).await.unwrap().progress, 100.0);
    }
}
