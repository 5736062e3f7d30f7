//! Runtime configuration from environment variables.

use kg_graph::{JsonlGraphStorage, KnowledgeGraphManager, KnowledgeGraphService};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_FILE_NAME: &str = "memory.jsonl";
#[cfg(feature = "sqlite")]
pub const DEFAULT_SQLITE_FILE_NAME: &str = "memory.db";
/// File name used before the store switched to line-delimited records.
pub const LEGACY_FILE_NAME: &str = "memory.json";
pub const DEFAULT_LISTEN: &str = "127.0.0.1:8002";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid KG_LISTEN address {value:?}: {source}")]
    Listen {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("unknown KG_STORAGE backend {0:?}")]
    UnknownStorage(String),
    #[error("cannot determine working directory: {0}")]
    WorkingDir(std::io::Error),
    #[error("failed to migrate legacy graph file: {0}")]
    Migration(std::io::Error),
    #[error("failed to open storage: {0}")]
    Storage(#[from] kg_graph::KgError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Jsonl,
    #[cfg(feature = "sqlite")]
    Sqlite,
}

impl StorageKind {
    /// File name used when `MEMORY_FILE_PATH` is unset.
    pub fn default_file_name(self) -> &'static str {
        match self {
            StorageKind::Jsonl => DEFAULT_FILE_NAME,
            #[cfg(feature = "sqlite")]
            StorageKind::Sqlite => DEFAULT_SQLITE_FILE_NAME,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub memory_file: PathBuf,
    /// True when `memory_file` came from the default rather than `MEMORY_FILE_PATH`.
    pub default_location: bool,
    pub listen: SocketAddr,
    pub storage: StorageKind,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(ConfigError::WorkingDir)?;
        Self::from_lookup(|key| std::env::var(key).ok(), &cwd)
    }

    /// Build from an arbitrary variable source. Relative paths resolve against `cwd`.
    pub fn from_lookup<F>(lookup: F, cwd: &Path) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage = match lookup("KG_STORAGE").as_deref() {
            None | Some("") | Some("jsonl") => StorageKind::Jsonl,
            #[cfg(feature = "sqlite")]
            Some("sqlite") => StorageKind::Sqlite,
            Some(other) => return Err(ConfigError::UnknownStorage(other.to_string())),
        };

        let (memory_file, default_location) = match lookup("MEMORY_FILE_PATH") {
            Some(p) if !p.trim().is_empty() => (resolve_path(Path::new(p.trim()), cwd), false),
            _ => (cwd.join(storage.default_file_name()), true),
        };

        let listen_raw = lookup("KG_LISTEN").unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let listen = listen_raw.parse::<SocketAddr>().map_err(|source| ConfigError::Listen {
            value: listen_raw.clone(),
            source,
        })?;

        Ok(Self {
            memory_file,
            default_location,
            listen,
            storage,
        })
    }

    /// Rename a legacy `memory.json` to `memory.jsonl` when the default
    /// location is in use and only the legacy file exists.
    /// Returns whether a migration happened.
    pub async fn migrate_legacy_file(&self) -> Result<bool, ConfigError> {
        if !self.default_location || self.storage != StorageKind::Jsonl {
            return Ok(false);
        }
        let legacy = self.memory_file.with_file_name(LEGACY_FILE_NAME);
        let target_exists = tokio::fs::try_exists(&self.memory_file)
            .await
            .map_err(ConfigError::Migration)?;
        let legacy_exists = tokio::fs::try_exists(&legacy)
            .await
            .map_err(ConfigError::Migration)?;
        if target_exists || !legacy_exists {
            return Ok(false);
        }
        tokio::fs::rename(&legacy, &self.memory_file)
            .await
            .map_err(ConfigError::Migration)?;
        tracing::info!(
            from = %legacy.display(),
            to = %self.memory_file.display(),
            "migrated legacy graph file"
        );
        Ok(true)
    }

    /// Open the configured backend behind the service trait.
    pub fn open_service(&self) -> Result<Arc<dyn KnowledgeGraphService>, ConfigError> {
        let service: Arc<dyn KnowledgeGraphService> = match self.storage {
            StorageKind::Jsonl => Arc::new(KnowledgeGraphManager::new(JsonlGraphStorage::new(
                &self.memory_file,
            ))),
            #[cfg(feature = "sqlite")]
            StorageKind::Sqlite => Arc::new(KnowledgeGraphManager::new(
                kg_graph::SqliteGraphStorage::new(&self.memory_file)?,
            )),
        };
        Ok(service)
    }
}

fn resolve_path(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
