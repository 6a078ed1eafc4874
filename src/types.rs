//! Core types for vidgrab

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Unique identifier for a download task
///
/// Eight lowercase hex characters, short enough to sit in a filename suffix.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(format!("{:08x}", rand::random::<u32>()))
    }

    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Task status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Accepted, waiting for a worker slot
    Pending,
    /// Worker is running the extractor
    Downloading,
    /// File is on disk
    Completed,
    /// Terminal failure; see `Task::error`
    Error,
}

impl TaskStatus {
    /// Whether the lifecycle allows moving from `self` to `next`
    ///
    /// pending → downloading → {completed | error}. Terminal states have no successors.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Downloading)
                | (TaskStatus::Downloading, TaskStatus::Completed)
                | (TaskStatus::Downloading, TaskStatus::Error)
        )
    }

    /// Completed or error
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Error)
    }

    /// Lowercase name as it appears on the wire
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Downloading => "downloading",
            TaskStatus::Completed => "completed",
            TaskStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status record returned by `GET /api/status/{task_id}`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Task {
    /// Lifecycle state
    pub status: TaskStatus,
    /// Percent complete, 0-100, one decimal
    pub progress: f64,
    /// Stored filename (set only once completed)
    pub filename: Option<String>,
    /// Failure description (set only on error)
    pub error: Option<String>,
}

impl Task {
    /// A freshly submitted task
    pub fn pending() -> Self {
        Self {
            status: TaskStatus::Pending,
            progress: 0.0,
            filename: None,
            error: None,
        }
    }
}

/// Request body for `POST /api/download`
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DownloadRequest {
    /// Source page URL
    #[serde(default)]
    pub url: String,
    /// Quality label such as "1080p" (default comes from config)
    #[serde(default)]
    pub quality: Option<String>,
    /// Display title used to derive the stored filename
    #[serde(default)]
    pub title: Option<String>,
}

/// Response body for `POST /api/download`
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitResponse {
    /// Identifier to poll with
    pub task_id: TaskId,
}

/// Metadata returned by `POST /api/info`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VideoInfo {
    /// Video title
    pub title: String,
    /// Thumbnail URL (empty when unknown)
    pub thumbnail: String,
    /// Duration in seconds
    pub duration: f64,
    /// Selectable qualities, highest first
    pub formats: Vec<FormatOption>,
}

/// One selectable quality
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FormatOption {
    /// Quality label ("1080p")
    pub quality: String,
    /// Height in pixels
    pub height: u32,
    /// Output container extension
    pub ext: String,
    /// Approximate size in bytes of video plus audio (None when unknown)
    pub size: Option<u64>,
}

/// A file in the storage directory, as listed by `GET /api/videos`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StoredFile {
    /// File name (no directory)
    pub filename: String,
    /// Size in bytes
    pub size: u64,
    /// Size in MiB rounded to one decimal
    pub size_mb: f64,
    /// Modification time, used as creation time
    pub created: DateTime<Utc>,
    /// Whole days left before the retention sweep removes the file
    pub days_left: i64,
}

/// Per-status task counts
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TaskCounts {
    /// Tasks waiting for a worker
    pub pending: usize,
    /// Tasks currently downloading
    pub downloading: usize,
    /// Completed tasks
    pub completed: usize,
    /// Failed tasks
    pub error: usize,
}

/// Events broadcast to subscribers (and streamed over `/api/events`)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Task accepted
    Queued {
        /// Task identifier
        id: TaskId,
        /// Source URL
        url: String,
        /// Requested quality label
        quality: String,
    },
    /// Worker picked the task up
    Started {
        /// Task identifier
        id: TaskId,
    },
    /// Progress advanced
    Progress {
        /// Task identifier
        id: TaskId,
        /// Percent complete (one decimal)
        percent: f64,
    },
    /// Download finished and the file is stored
    Completed {
        /// Task identifier
        id: TaskId,
        /// Stored filename
        filename: String,
    },
    /// Download failed
    Failed {
        /// Task identifier
        id: TaskId,
        /// Failure description
        error: String,
    },
    /// A stored file was deleted through the API
    FileDeleted {
        /// Deleted filename
        filename: String,
    },
    /// The retention sweeper removed an expired file
    FileExpired {
        /// Deleted filename
        filename: String,
    },
    /// Service is shutting down
    Shutdown,
}
