use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::rank;
use crate::domain::{ports::VectorStore, DomainError, Embedding, IndexEntry, SearchResult};

pub const INDEX_FILE: &str = "index.json";
const TMP_SUFFIX: &str = ".tmp";
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct PersistedIndex {
    version: u32,
    embedding_model: String,
    dimension: usize,
    created_at: DateTime<Utc>,
    entries: Vec<IndexEntry>,
}

/// Index kept as one JSON file inside a directory.
///
/// Writes go to a temp file that is renamed into place, and only one writer
/// at a time may hold the lock file next to the directory.
pub struct LocalVectorStore {
    dir: PathBuf,
    embedding_model: String,
    cached: RwLock<Option<Arc<PersistedIndex>>>,
}

impl LocalVectorStore {
    pub fn new(dir: impl Into<PathBuf>, embedding_model: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            embedding_model: embedding_model.into(),
            cached: RwLock::new(None),
        }
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    /// `<dir>.lock`, a sibling so it never makes the directory look populated.
    pub fn lock_path(&self) -> PathBuf {
        let normalized: PathBuf = self.dir.components().collect();
        let mut name = normalized.into_os_string();
        name.push(".lock");
        PathBuf::from(name)
    }

    async fn load(&self) -> Result<Arc<PersistedIndex>, DomainError> {
        if let Some(index) = self.cached.read().await.as_ref() {
            return Ok(index.clone());
        }

        let path = self.index_path();
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(DomainError::not_found(format!(
                    "no index at {}",
                    path.display()
                )))
            }
            Err(e) => return Err(e.into()),
        };

        let index: PersistedIndex = serde_json::from_str(&raw)?;
        if index.version != FORMAT_VERSION {
            return Err(DomainError::internal(format!(
                "unsupported index format version {} in {}",
                index.version,
                path.display()
            )));
        }
        if index.embedding_model != self.embedding_model {
            tracing::warn!(
                stored = %index.embedding_model,
                configured = %self.embedding_model,
                "index was built with a different embedding model"
            );
        }
        tracing::debug!(
            entries = index.entries.len(),
            dimension = index.dimension,
            path = %path.display(),
            "index loaded"
        );

        let index = Arc::new(index);
        *self.cached.write().await = Some(index.clone());
        Ok(index)
    }
}

#[async_trait]
impl VectorStore for LocalVectorStore {
    async fn exists(&self) -> Result<bool, DomainError> {
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_name().to_string_lossy().ends_with(TMP_SUFFIX) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn persist(&self, entries: &[IndexEntry]) -> Result<(), DomainError> {
        let _lock = BuildLock::acquire(&self.lock_path())?;

        if self.exists().await? {
            return Err(DomainError::conflict(format!(
                "an index already exists in {}",
                self.dir.display()
            )));
        }

        let index = PersistedIndex {
            version: FORMAT_VERSION,
            embedding_model: self.embedding_model.clone(),
            dimension: entries
                .iter()
                .map(|e| e.embedding.dimension())
                .max()
                .unwrap_or(0),
            created_at: Utc::now(),
            entries: entries.to_vec(),
        };
        let json = serde_json::to_string(&index)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let final_path = self.index_path();
        let tmp_path = self.dir.join(format!("{INDEX_FILE}{TMP_SUFFIX}"));
        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, &final_path).await?;

        tracing::info!(
            entries = entries.len(),
            path = %final_path.display(),
            "index persisted"
        );
        *self.cached.write().await = Some(Arc::new(index));
        Ok(())
    }

    async fn search(
        &self,
        query: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let index = self.load().await?;
        if index.dimension != 0 && query.dimension() != index.dimension {
            tracing::warn!(
                query = query.dimension(),
                stored = index.dimension,
                "query dimension differs from the index, every entry will score 0"
            );
        }
        Ok(rank(index.entries.iter(), query, top_k))
    }
}

/// Exclusive marker file held for the duration of a build. It records the
/// holder's PID so a lock left behind by a dead process can be reclaimed.
struct BuildLock {
    path: PathBuf,
}

impl BuildLock {
    fn acquire(path: &Path) -> Result<Self, DomainError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        match Self::create(path) {
            Err(e) if e.kind() == ErrorKind::AlreadyExists && Self::is_stale(path) => {
                tracing::warn!(path = %path.display(), "reclaiming build lock of a dead process");
                match std::fs::remove_file(path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
                Self::create(path).map_err(|e| Self::error(path, e))
            }
            result => result.map_err(|e| Self::error(path, e)),
        }
    }

    fn create(path: &Path) -> std::io::Result<Self> {
        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        // Held from here on, so a failed write still releases the file.
        let lock = Self {
            path: path.to_path_buf(),
        };
        writeln!(file, "{}", std::process::id())?;
        Ok(lock)
    }

    fn error(path: &Path, e: std::io::Error) -> DomainError {
        if e.kind() == ErrorKind::AlreadyExists {
            DomainError::conflict(format!(
                "index build already in progress; remove {} if no build is running",
                path.display()
            ))
        } else {
            e.into()
        }
    }

    /// Only a lock naming a PID that is no longer running counts as stale.
    /// An unreadable or half-written lock is left alone.
    fn is_stale(path: &Path) -> bool {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .is_some_and(|pid| !process_alive(pid))
    }
}

#[cfg(target_os = "linux")]
fn process_alive(pid: u32) -> bool {
    Path::new("/proc").join(pid.to_string()).exists()
}

#[cfg(not(target_os = "linux"))]
fn process_alive(_pid: u32) -> bool {
    true
}

impl Drop for BuildLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to release build lock");
        }
    }
}
