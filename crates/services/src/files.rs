//! Local-disk [`FileStore`].
//!
//! Objects live at `{root}/{bucket}/{key}`. Keys may contain `/` to form
//! sub-directories but never `..`, empty segments or a leading `/`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use backstage_core::collaborators::{FileStore, FileStoreError};

#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, FileStoreError> {
        validate_segment(bucket)?;
        let mut path = self.root.join(bucket);
        for segment in key.split('/') {
            validate_segment(segment).map_err(|_| FileStoreError::InvalidKey(key.to_string()))?;
            path.push(segment);
        }
        Ok(path)
    }
}

fn validate_segment(segment: &str) -> Result<(), FileStoreError> {
    let bad = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains('\\')
        || segment.contains('\0');
    if bad {
        Err(FileStoreError::InvalidKey(segment.to_string()))
    } else {
        Ok(())
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<(), FileStoreError> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, FileStoreError> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), FileStoreError> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn store(name: &str) -> LocalFileStore {
        let root = std::env::temp_dir().join(format!(
            "backstage-files-{}-{name}",
            std::process::id()
        ));
        LocalFileStore::new(root)
    }

    #[tokio::test]
    async fn put_get_delete() {
        let store = store("roundtrip");
        store
            .put("presskits", "12/epk.pdf", b"%PDF".to_vec())
            .await
            .unwrap();
        assert_eq!(
            store.get("presskits", "12/epk.pdf").await.unwrap(),
            Some(b"%PDF".to_vec())
        );

        store.delete("presskits", "12/epk.pdf").await.unwrap();
        assert_eq!(store.get("presskits", "12/epk.pdf").await.unwrap(), None);
        // Deleting a missing object is not an error.
        store.delete("presskits", "12/epk.pdf").await.unwrap();

        let _ = tokio::fs::remove_dir_all(store.root()).await;
    }

    #[tokio::test]
    async fn traversal_keys_are_rejected() {
        let store = store("traversal");
        assert_matches!(
            store.get("presskits", "../secrets").await,
            Err(FileStoreError::InvalidKey(_))
        );
        assert_matches!(
            store.get("presskits", "/etc/passwd").await,
            Err(FileStoreError::InvalidKey(_))
        );
        assert_matches!(
            store.put("..", "a", Vec::new()).await,
            Err(FileStoreError::InvalidKey(_))
        );
    }
}
