//! Blob store on a local directory tree. Each blob is a file at
//! `root/<key>`; its content type sits next to it in `<key>.meta`.

use async_trait::async_trait;
use axum::body::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use super::{validate_key, Blob, BlobError, BlobStore};

const META_SUFFIX: &str = ".meta";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, BlobError> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn paths(&self, key: &str) -> Result<(PathBuf, PathBuf), BlobError> {
        validate_key(key)?;
        let data = self.root.join(key);
        let meta = self.root.join(format!("{key}{META_SUFFIX}"));
        Ok((data, meta))
    }
}

async fn remove_if_present(path: &Path) -> Result<(), BlobError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), BlobError> {
        let (data, meta) = self.paths(key)?;
        if let Some(parent) = data.parent() {
            fs::create_dir_all(parent).await?;
        }

        fs::write(&meta, content_type.as_bytes()).await?;
        fs::write(&data, &bytes).await?;
        debug!("Stored blob {} ({} bytes)", key, bytes.len());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Blob>, BlobError> {
        let (data, meta) = self.paths(key)?;

        let bytes = match fs::read(&data).await {
            Ok(bytes) => Bytes::from(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let content_type = match fs::read_to_string(&meta).await {
            Ok(content_type) => content_type,
            Err(e) if e.kind() == ErrorKind::NotFound => DEFAULT_CONTENT_TYPE.to_string(),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(Blob { bytes, content_type }))
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        let (data, meta) = self.paths(key)?;
        remove_if_present(&data).await?;
        remove_if_present(&meta).await?;
        debug!("Deleted blob {}", key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, BlobError> {
        let mut keys = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                    continue;
                }

                let Ok(relative) = path.strip_prefix(&self.root) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if !key.ends_with(META_SUFFIX) && key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_reads_back_with_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::open(dir.path()).await.unwrap();

        store
            .put("users/u1/babies/b1/documents/f1", Bytes::from_static(b"%PDF-1.7"), "application/pdf")
            .await
            .unwrap();

        let blob = store.get("users/u1/babies/b1/documents/f1").await.unwrap().unwrap();
        assert_eq!(blob.bytes, Bytes::from_static(b"%PDF-1.7"));
        assert_eq!(blob.content_type, "application/pdf");
    }

    #[tokio::test]
    async fn missing_blob_reads_as_none_and_deletes_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::open(dir.path()).await.unwrap();

        assert!(store.get("users/u1/nothing").await.unwrap().is_none());
        store.delete("users/u1/nothing").await.unwrap();
    }

    #[tokio::test]
    async fn delete_removes_data_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::open(dir.path()).await.unwrap();
        let key = "users/u1/babies/b1/documents/f1";

        store.put(key, Bytes::from_static(b"x"), "text/plain").await.unwrap();
        store.delete(key).await.unwrap();

        assert!(store.get(key).await.unwrap().is_none());
        assert!(store.list("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lists_keys_by_prefix_without_metadata_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::open(dir.path()).await.unwrap();

        for key in ["users/a/babies/1/documents/x", "users/a/babies/1/documents/y", "users/b/babies/2/documents/z"] {
            store.put(key, Bytes::from_static(b"data"), "text/plain").await.unwrap();
        }

        let keys = store.list("users/a/").await.unwrap();
        assert_eq!(keys, vec!["users/a/babies/1/documents/x", "users/a/babies/1/documents/y"]);
        assert_eq!(store.list("users/").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn refuses_keys_outside_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::open(dir.path()).await.unwrap();

        let err = store
            .put("../escape", Bytes::from_static(b"x"), "text/plain")
            .await
            .unwrap_err();
        assert!(matches!(err, BlobError::InvalidKey(_)));
    }
}
