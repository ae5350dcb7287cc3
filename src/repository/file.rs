//! Directory-backed key-value store: one UTF-8 file per key

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::KeyValueStore;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) the data directory
    pub async fn open(root: impl AsRef<Path>) -> AppResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::Storage(format!("Failed to create {}: {}", root.display(), e))
        })?;
        tracing::info!("Using file storage at {}", root.display());
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> AppResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(AppError::Storage(format!("Invalid storage key {:?}", key)));
        }
        Ok(self.root.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn save(&self, key: &str, value: &str) -> AppResult<()> {
        let path = self.path_for(key)?;
        // Write beside the target and rename so readers never see half a file
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;
        tracing::debug!("Saved {} ({} bytes)", key, value.len());
        Ok(())
    }

    async fn load(&self, key: &str) -> AppResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("nested")).await.unwrap();

        assert_eq!(store.load("lib_books").await.unwrap(), None);
        store.save("lib_books", "[]").await.unwrap();
        store.save("lib_books", "[1]").await.unwrap();
        assert_eq!(store.load("lib_books").await.unwrap().as_deref(), Some("[1]"));
        assert!(dir.path().join("nested/lib_books.json").exists());
        assert!(!dir.path().join("nested/lib_books.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        assert!(store.save("../escape", "x").await.is_err());
        assert!(store.load("").await.is_err());
    }
}
