//! Chunk upload configuration.
//!
//! Stored as TOML at `--config` / `$CHUNK_UPLOAD_CONFIG`, or else:
//! - Linux: `~/.config/chunk-upload/chunk-upload.toml`
//! - Windows: `%APPDATA%/chunk-upload/chunk-upload.toml`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use chunk_upload_protocol::HandlerRegistry;
use chunk_upload_storage::{ChunkStorage, RetentionWindow};
use chunk_upload_transfer::NamingPolicy;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "CHUNK_UPLOAD_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub clear: ClearConfig,

    #[serde(default)]
    pub chunk: ChunkConfig,

    #[serde(default)]
    pub handlers: HandlersConfig,
}

/// Where fragments live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root of the local disk backend.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Chunk sub-directory under `root`.
    #[serde(default = "default_chunks")]
    pub chunks: String,
}

fn default_root() -> PathBuf {
    PathBuf::from("./storage/app")
}

fn default_chunks() -> String {
    "chunks".into()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            chunks: default_chunks(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClearConfig {
    /// Fragments older than this are removed.
    #[serde(default)]
    pub timestamp: RetentionWindow,

    #[serde(default)]
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds between sweeps.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_interval() -> u64 {
    3600
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            interval_secs: default_interval(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkConfig {
    #[serde(default)]
    pub name: NamingPolicy,
}

/// Protocol list adjustments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HandlersConfig {
    /// Appended to the default protocols.
    #[serde(default)]
    pub custom: Vec<String>,

    /// Replaces the default protocols when non-empty.
    #[serde(default, rename = "override")]
    pub overrides: Vec<String>,
}

impl Config {
    /// Loads configuration from `path`, or the platform default location.
    /// A missing file is created with defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => Self::load_from(&default_path()),
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            let config = Config::default();
            config.save_to(path)?;
            config
        };
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.clear.schedule.enabled && self.clear.schedule.interval_secs == 0 {
            anyhow::bail!("clear.schedule.interval_secs must be greater than zero");
        }
        self.upload_registry()?;
        Ok(())
    }

    /// Chunk storage on the configured local disk.
    pub fn chunk_storage(&self) -> anyhow::Result<ChunkStorage> {
        Ok(ChunkStorage::local(
            &self.storage.root,
            &self.storage.chunks,
            self.clear.timestamp,
        )?)
    }

    /// Upload protocol registry with the configured adjustments.
    pub fn upload_registry(&self) -> anyhow::Result<HandlerRegistry> {
        let mut registry = HandlerRegistry::uploads();
        registry.configure(&self.handlers.custom, &self.handlers.overrides)?;
        Ok(registry)
    }
}

/// Platform configuration file path.
pub fn default_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("chunk-upload")
            .join("chunk-upload.toml")
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata)
            .join("chunk-upload")
            .join("chunk-upload.toml")
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        PathBuf::from("/tmp/chunk-upload/chunk-upload.toml")
    }
}
