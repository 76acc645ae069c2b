//! Saved-video library backed by a single JSON file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use vwatch_models::{VideoId, VideoRecord};

use crate::error::{StorageError, StorageResult};

/// Configuration for the library store.
#[derive(Debug, Clone)]
pub struct LibraryConfig {
    /// Path of the JSON file holding all records
    pub path: PathBuf,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/saved_videos.json"),
        }
    }
}

impl LibraryConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            path: std::env::var("LIBRARY_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| Self::default().path),
        }
    }
}

/// Keyed store of saved video records.
///
/// Records are kept in memory in insertion order and the whole file is
/// rewritten on every change. Clones share the same state.
#[derive(Debug, Clone)]
pub struct LibraryStore {
    path: PathBuf,
    records: Arc<RwLock<Vec<VideoRecord>>>,
}

impl LibraryStore {
    /// Open the library, loading existing records if the file exists.
    pub async fn open(config: LibraryConfig) -> StorageResult<Self> {
        let records = match tokio::fs::read(&config.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Vec::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        info!(
            path = %config.path.display(),
            videos = records.len(),
            "Opened video library"
        );

        Ok(Self {
            path: config.path,
            records: Arc::new(RwLock::new(records)),
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> StorageResult<Self> {
        Self::open(LibraryConfig::from_env()).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save a new record.
    pub async fn create(&self, record: VideoRecord) -> StorageResult<VideoRecord> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id == record.id) {
            return Err(StorageError::AlreadyExists(record.id.to_string()));
        }

        records.push(record.clone());
        if let Err(e) = persist(&self.path, &records).await {
            records.pop();
            return Err(e);
        }

        info!(id = %record.id, name = %record.name, "Saved video to library");
        Ok(record)
    }

    /// All records, oldest first.
    pub async fn list(&self) -> Vec<VideoRecord> {
        self.records.read().await.clone()
    }

    /// Records whose name or event descriptions contain `query`.
    pub async fn search(&self, query: &str) -> Vec<VideoRecord> {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| r.matches_query(query))
            .cloned()
            .collect()
    }

    pub async fn get(&self, id: &VideoId) -> StorageResult<VideoRecord> {
        self.records
            .read()
            .await
            .iter()
            .find(|r| &r.id == id)
            .cloned()
            .ok_or_else(|| StorageError::not_found(id.as_str()))
    }

    /// Delete a record by ID.
    pub async fn delete(&self, id: &VideoId) -> StorageResult<()> {
        let mut records = self.records.write().await;
        let index = records
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| StorageError::not_found(id.as_str()))?;

        let removed = records.remove(index);
        if let Err(e) = persist(&self.path, &records).await {
            records.insert(index, removed);
            return Err(e);
        }

        info!(id = %id, "Deleted video from library");
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

/// Write all records to a temp file next to `path`, then rename over it.
async fn persist(path: &Path, records: &[VideoRecord]) -> StorageResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_vec_pretty(records)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &json)
        .await
        .map_err(|e| StorageError::write_failed(format!("{}: {}", tmp.display(), e)))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| StorageError::write_failed(format!("{}: {}", path.display(), e)))?;

    debug!(path = %path.display(), videos = records.len(), "Persisted library");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vwatch_models::{DetectionEvent, SampleOffset, TimestampedEvent};

    fn record(name: &str, description: &str) -> VideoRecord {
        VideoRecord::new(
            name,
            format!("/videos/{}.mp4", name),
            vec![TimestampedEvent::at(
                SampleOffset::new(3.0),
                DetectionEvent::new(description, true),
            )],
        )
    }

    async fn store(dir: &tempfile::TempDir) -> LibraryStore {
        LibraryStore::open(LibraryConfig {
            path: dir.path().join("nested").join("saved_videos.json"),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_open_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        assert!(store.is_empty().await);
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_create_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;

        let saved = store.create(record("Lobby", "Person detected")).await.unwrap();
        store.create(record("Dock", "Forklift moving")).await.unwrap();

        let reopened = LibraryStore::open(LibraryConfig {
            path: store.path().to_path_buf(),
        })
        .await
        .unwrap();
        let names: Vec<String> = reopened.list().await.into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Lobby", "Dock"]);
        assert_eq!(reopened.get(&saved.id).await.unwrap(), saved);
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        let saved = store.create(record("Lobby", "x")).await.unwrap();
        let err = store.create(saved).await.unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        let saved = store.create(record("Lobby", "x")).await.unwrap();

        store.delete(&saved.id).await.unwrap();
        assert!(store.is_empty().await);
        assert!(matches!(
            store.get(&saved.id).await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            store.delete(&saved.id).await,
            Err(StorageError::NotFound(_))
        ));

        let reopened = LibraryStore::open(LibraryConfig {
            path: store.path().to_path_buf(),
        })
        .await
        .unwrap();
        assert!(reopened.is_empty().await);
    }

    #[tokio::test]
    async fn test_search() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        store.create(record("Parking Lot", "Vehicle break-in")).await.unwrap();
        store.create(record("Lobby", "Aggressive behavior")).await.unwrap();

        assert_eq!(store.search("VEHICLE").await.len(), 1);
        assert_eq!(store.search("lobby").await[0].name, "Lobby");
        assert_eq!(store.search("").await.len(), 2);
        assert!(store.search("warehouse").await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved_videos.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();
        let err = LibraryStore::open(LibraryConfig { path }).await.unwrap_err();
        assert!(matches!(err, StorageError::Json(_)));
    }
}
