//! ComputeControl port - リモート操作対象のインスタンス

use async_trait::async_trait;

use crate::domain::ServiceError;

#[async_trait]
pub trait ComputeControl: Send + Sync {
    async fn begin(&self, instance_id: &str) -> Result<(), ServiceError>;

    async fn end(&self, instance_id: &str) -> Result<(), ServiceError>;

    /// 現在のライフサイクル状態（"running", "stopped", ...）
    async fn describe(&self, instance_id: &str) -> Result<String, ServiceError>;
}
