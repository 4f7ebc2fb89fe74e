//! LocalObjectStore - ファイルシステム上のオブジェクトストレージ
//!
//! `{root}/{bucket}/{key}` に保存します。last_modified はファイルの mtime です。

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{ObjectSummary, ServiceError, StorageKey};
use crate::ports::ObjectStore;

pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf, ServiceError> {
        let dir = self.root.join(bucket);
        ensure_relative(Path::new(bucket))?;
        Ok(dir)
    }

    fn object_path(&self, bucket: &str, key: &StorageKey) -> Result<PathBuf, ServiceError> {
        let relative = Path::new(key.as_str());
        ensure_relative(relative)?;
        Ok(self.bucket_dir(bucket)?.join(relative))
    }
}

/// `..` や絶対パスで root の外に出るキーを拒否する
fn ensure_relative(path: &Path) -> Result<(), ServiceError> {
    if path
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        Ok(())
    } else {
        Err(ServiceError::Rejected(format!(
            "invalid object path: {}",
            path.display()
        )))
    }
}

fn io_error(context: &str, e: std::io::Error) -> ServiceError {
    match e.kind() {
        std::io::ErrorKind::NotFound => ServiceError::NotFound(context.to_string()),
        _ => ServiceError::Unavailable(format!("{context}: {e}")),
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectSummary>, ServiceError> {
        let bucket_dir = self.bucket_dir(bucket)?;
        let mut found = Vec::new();
        let mut pending = vec![bucket_dir.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(io_error(&dir.display().to_string(), e)),
            };
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| io_error(&dir.display().to_string(), e))?
            {
                let path = entry.path();
                let metadata = entry
                    .metadata()
                    .await
                    .map_err(|e| io_error(&path.display().to_string(), e))?;
                if metadata.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Ok(relative) = path.strip_prefix(&bucket_dir) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if !key.starts_with(prefix) {
                    continue;
                }
                let last_modified: DateTime<Utc> = metadata
                    .modified()
                    .map_err(|e| io_error(&path.display().to_string(), e))?
                    .into();
                found.push(ObjectSummary {
                    key: StorageKey::new(key),
                    last_modified,
                });
            }
        }
        found.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(found)
    }

    async fn put(
        &self,
        bucket: &str,
        key: &StorageKey,
        bytes: Vec<u8>,
    ) -> Result<(), ServiceError> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(&parent.display().to_string(), e))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| io_error(&path.display().to_string(), e))
    }

    async fn get(&self, bucket: &str, key: &StorageKey) -> Result<Vec<u8>, ServiceError> {
        let path = self.object_path(bucket, key)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| io_error(&format!("{bucket}/{key}"), e))
    }
}
