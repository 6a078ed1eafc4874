//! Configuration types for vidgrab

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Download behavior configuration (storage directory, concurrency, defaults)
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DownloadConfig {
    /// Storage directory for finished media files (default: "./downloads")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Maximum concurrent downloads (default: 3)
    ///
    /// Downloads beyond this limit stay `pending` until a worker slot frees up.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_downloads: usize,

    /// Quality used when a request does not name one (default: "720p")
    #[serde(default = "default_quality")]
    pub default_quality: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            max_concurrent_downloads: default_max_concurrent(),
            default_quality: default_quality(),
        }
    }
}

/// yt-dlp invocation settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ExtractorConfig {
    /// Path to the yt-dlp executable (auto-detected if None)
    #[serde(default)]
    pub ytdlp_path: Option<PathBuf>,

    /// Passed to yt-dlp as --ffmpeg-location when set
    #[serde(default)]
    pub ffmpeg_location: Option<PathBuf>,

    /// Whether to search PATH for yt-dlp if no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// Container that audio and video are merged into (default: "mp4")
    #[serde(default = "default_merge_format")]
    pub merge_output_format: String,

    /// Network socket timeout handed to yt-dlp (default: 30 seconds)
    #[serde(default = "default_socket_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub socket_timeout: Duration,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            ffmpeg_location: None,
            search_path: true,
            merge_output_format: default_merge_format(),
            socket_timeout: default_socket_timeout(),
        }
    }
}

/// Automatic deletion of old files in the storage directory
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RetentionConfig {
    /// Run the retention sweeper (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Files older than this are deleted (default: 30 days)
    #[serde(default = "default_max_age", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub max_age: Duration,

    /// Time between sweeps (default: 24 hours)
    #[serde(default = "default_sweep_interval", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub sweep_interval: Duration,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_age: default_max_age(),
            sweep_interval: default_sweep_interval(),
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 0.0.0.0:54321)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// API and external server integration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ServerIntegrationConfig {
    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,
}

/// Main configuration for VideoDownloader
///
/// Every field has a default, so an empty JSON object `{}` is a valid
/// configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Download behavior settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// yt-dlp settings
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// File retention settings
    #[serde(default)]
    pub retention: RetentionConfig,

    /// API server settings
    #[serde(default)]
    pub server: ServerIntegrationConfig,
}

impl Config {
    /// Storage directory
    pub fn download_dir(&self) -> &PathBuf {
        &self.download.download_dir
    }

    /// Load configuration from a JSON file
    pub fn from_json_file(path: &std::path::Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read config file '{}': {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot reject on its own
    pub fn validate(&self) -> Result<()> {
        if self.download.max_concurrent_downloads == 0 {
            return Err(Error::Config {
                message: "max_concurrent_downloads must be at least 1".to_string(),
                key: Some("max_concurrent_downloads".to_string()),
            });
        }
        if crate::utils::parse_quality(&self.download.default_quality).is_none() {
            return Err(Error::Config {
                message: format!(
                    "default_quality '{}' is not a height label like \"720p\"",
                    self.download.default_quality
                ),
                key: Some("default_quality".to_string()),
            });
        }
        if self.extractor.merge_output_format.trim().is_empty() {
            return Err(Error::Config {
                message: "merge_output_format must not be empty".to_string(),
                key: Some("merge_output_format".to_string()),
            });
        }
        if self.retention.enabled && self.retention.sweep_interval.is_zero() {
            return Err(Error::Config {
                message: "sweep_interval must be greater than zero".to_string(),
                key: Some("sweep_interval".to_string()),
            });
        }
        Ok(())
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_max_concurrent() -> usize {
    3
}

fn default_quality() -> String {
    "720p".to_string()
}

fn default_merge_format() -> String {
    "mp4".to_string()
}

fn default_socket_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_age() -> Duration {
    Duration::from_secs(30 * 24 * 60 * 60)
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 54321))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
