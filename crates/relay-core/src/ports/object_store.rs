//! ObjectStore port - 永続ストレージ（S3 / ローカル / InMemory）
//!
//! 永続状態はすべてここにあります。プロセス内には何も保持しません。

use async_trait::async_trait;

use crate::domain::{ObjectSummary, ServiceError, StorageKey};

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// prefix で始まるキーを列挙
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectSummary>, ServiceError>;

    async fn put(&self, bucket: &str, key: &StorageKey, bytes: Vec<u8>)
    -> Result<(), ServiceError>;

    async fn get(&self, bucket: &str, key: &StorageKey) -> Result<Vec<u8>, ServiceError>;
}
