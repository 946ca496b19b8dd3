//! JSON file store: the durable home of the memory bank.
//!
//! The whole bank is one pretty-printed JSON document. Every save writes a
//! complete snapshot to a temporary sibling file, syncs it, then renames it
//! over the target, so a crash mid-write leaves the previous snapshot intact.
//!
//! Storage location: `~/.souschef/memory_bank.json`

use async_trait::async_trait;
use souschef_core::error::StoreError;
use souschef_core::memory::{MemoryBank, SCHEMA_VERSION, StateStore};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// A file-backed state store holding one JSON snapshot.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "memory_bank.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_err(&self, e: impl std::fmt::Display) -> StoreError {
        StoreError::Write {
            path: self.path.clone(),
            reason: e.to_string(),
        }
    }

    /// Decode a snapshot, refusing versions newer than this build understands.
    fn decode(&self, content: &str) -> Result<MemoryBank, StoreError> {
        let corrupt = |e: serde_json::Error| StoreError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        };
        let value: serde_json::Value = serde_json::from_str(content).map_err(corrupt)?;

        let found = value
            .get("version")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(u64::from(SCHEMA_VERSION));
        if found > u64::from(SCHEMA_VERSION) {
            return Err(StoreError::UnsupportedVersion {
                found: u32::try_from(found).unwrap_or(u32::MAX),
                supported: SCHEMA_VERSION,
            });
        }

        serde_json::from_value(value).map_err(corrupt)
    }
}

/// Write `data` to a fresh file at `path` and flush it to disk.
async fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(data).await?;
    file.sync_all().await
}

#[async_trait]
impl StateStore for JsonFileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn load(&self) -> Result<MemoryBank, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No memory bank yet, starting empty");
                return Ok(MemoryBank::new());
            }
            Err(e) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    reason: e.to_string(),
                });
            }
        };

        let bank = self.decode(&content)?;
        debug!(
            path = %self.path.display(),
            pantry = bank.pantry.len(),
            feedback = bank.feedback.len(),
            "Memory bank loaded"
        );
        Ok(bank)
    }

    async fn save(&self, bank: &MemoryBank) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(bank).map_err(|e| self.write_err(e))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.write_err(format!("create directory: {e}")))?;
        }

        let tmp = self.tmp_path();
        let written = match write_synced(&tmp, &data).await {
            Ok(()) => tokio::fs::rename(&tmp, &self.path)
                .await
                .map_err(|e| format!("rename into place: {e}")),
            Err(e) => Err(format!("write {}: {e}", tmp.display())),
        };
        if let Err(reason) = written {
            if let Err(e) = tokio::fs::remove_file(&tmp).await
                && e.kind() != std::io::ErrorKind::NotFound
            {
                warn!(path = %tmp.display(), error = %e, "Could not remove temporary snapshot");
            }
            return Err(self.write_err(reason));
        }

        debug!(path = %self.path.display(), bytes = data.len(), "Memory bank saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use souschef_core::memory::{Sentiment, StateDelta};

    fn sample_bank() -> MemoryBank {
        let mut bank = MemoryBank::new();
        bank.apply(&StateDelta::AddIngredients {
            names: vec!["Leeks".into(), "potatoes".into()],
        });
        bank.apply(&StateDelta::UpsertFeedback {
            recipe: "Leek and Potato Soup".into(),
            sentiment: Sentiment::Liked,
            note: Some("make it again".into()),
        });
        bank
    }

    #[tokio::test]
    async fn missing_file_loads_empty_bank() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("memory_bank.json"));
        let bank = store.load().await.unwrap();
        assert_eq!(bank, MemoryBank::new());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("memory_bank.json");
        let store = JsonFileStore::new(&path);

        let bank = sample_bank();
        store.save(&bank).await.unwrap();

        // Reload through a fresh store
        let loaded = JsonFileStore::new(&path).load().await.unwrap();
        assert_eq!(loaded, bank);

        // save(load()) leaves content unchanged
        let before = std::fs::read_to_string(&path).unwrap();
        store.save(&loaded).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
        assert!(!store.tmp_path().exists());
    }

    #[tokio::test]
    async fn snapshot_is_pretty_json_with_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory_bank.json");
        JsonFileStore::new(&path).save(&sample_bank()).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\n  \"version\": 1"));
        assert!(content.contains("leek and potato soup"));
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory_bank.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = JsonFileStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
        // The file is left for the user to inspect
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[tokio::test]
    async fn newer_version_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory_bank.json");
        std::fs::write(&path, r#"{"version": 7, "pantry": ["rice"]}"#).unwrap();

        let err = JsonFileStore::new(&path).load().await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::UnsupportedVersion { found: 7, supported: 1 }
        ));
    }

    #[tokio::test]
    async fn failed_write_keeps_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory_bank.json");
        let store = JsonFileStore::new(&path);
        store.save(&sample_bank()).await.unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        // A directory squatting on the temp path makes the write fail.
        std::fs::create_dir(store.tmp_path()).unwrap();

        let mut changed = sample_bank();
        changed.apply(&StateDelta::AddIngredients { names: vec!["thyme".into()] });
        let err = store.save(&changed).await.unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn failed_write_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory_bank.json");
        let store = JsonFileStore::new(&path);
        store.save(&sample_bank()).await.unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        // Writes through /dev/full fail with ENOSPC after the file is opened.
        std::os::unix::fs::symlink("/dev/full", store.tmp_path()).unwrap();

        let err = store.save(&MemoryBank::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
        assert!(std::fs::symlink_metadata(store.tmp_path()).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }
}
