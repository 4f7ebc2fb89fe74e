//! InMemoryObjectStore - 開発・テスト用のオブジェクトストレージ
//!
//! bucket ごとに key → (bytes, last_modified) を保持します。

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::{ObjectSummary, ServiceError, StorageKey};
use crate::ports::{Clock, ObjectStore, SystemClock};

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    last_modified: DateTime<Utc>,
}

pub struct InMemoryObjectStore {
    buckets: Mutex<HashMap<String, BTreeMap<StorageKey, StoredObject>>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// put 時の last_modified を clock から取る
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// テスト用: last_modified を指定して置く
    pub async fn insert_at(
        &self,
        bucket: &str,
        key: StorageKey,
        bytes: Vec<u8>,
        last_modified: DateTime<Utc>,
    ) {
        let mut buckets = self.buckets.lock().await;
        buckets.entry(bucket.to_string()).or_default().insert(
            key,
            StoredObject {
                bytes,
                last_modified,
            },
        );
    }

    /// bucket 内の全キー（昇順）
    pub async fn keys(&self, bucket: &str) -> Vec<StorageKey> {
        let buckets = self.buckets.lock().await;
        buckets
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectSummary>, ServiceError> {
        let buckets = self.buckets.lock().await;
        Ok(buckets
            .get(bucket)
            .map(|objects| {
                objects
                    .iter()
                    .filter(|(key, _)| key.as_str().starts_with(prefix))
                    .map(|(key, obj)| ObjectSummary {
                        key: key.clone(),
                        last_modified: obj.last_modified,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn put(
        &self,
        bucket: &str,
        key: &StorageKey,
        bytes: Vec<u8>,
    ) -> Result<(), ServiceError> {
        let last_modified = self.clock.now();
        self.insert_at(bucket, key.clone(), bytes, last_modified)
            .await;
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &StorageKey) -> Result<Vec<u8>, ServiceError> {
        let buckets = self.buckets.lock().await;
        buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .map(|obj| obj.bytes.clone())
            .ok_or_else(|| ServiceError::NotFound(format!("{bucket}/{key}")))
    }
}
