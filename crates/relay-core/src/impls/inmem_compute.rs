//! InMemoryCompute - 開発・テスト用のインスタンス操作

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::ServiceError;
use crate::ports::ComputeControl;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComputeCall {
    Begin(String),
    End(String),
    Describe(String),
}

/// 既知のインスタンスだけを操作できる
#[derive(Default)]
pub struct InMemoryCompute {
    states: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<ComputeCall>>,
}

impl InMemoryCompute {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instance(instance_id: impl Into<String>, state: impl Into<String>) -> Self {
        let mut states = HashMap::new();
        states.insert(instance_id.into(), state.into());
        Self {
            states: Mutex::new(states),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub async fn calls(&self) -> Vec<ComputeCall> {
        self.calls.lock().await.clone()
    }

    async fn set_state(&self, instance_id: &str, state: &str) -> Result<(), ServiceError> {
        let mut states = self.states.lock().await;
        match states.get_mut(instance_id) {
            Some(current) => {
                *current = state.to_string();
                Ok(())
            }
            None => Err(ServiceError::NotFound(format!("instance {instance_id}"))),
        }
    }
}

#[async_trait]
impl ComputeControl for InMemoryCompute {
    async fn begin(&self, instance_id: &str) -> Result<(), ServiceError> {
        self.calls
            .lock()
            .await
            .push(ComputeCall::Begin(instance_id.to_string()));
        self.set_state(instance_id, "pending").await
    }

    async fn end(&self, instance_id: &str) -> Result<(), ServiceError> {
        self.calls
            .lock()
            .await
            .push(ComputeCall::End(instance_id.to_string()));
        self.set_state(instance_id, "stopping").await
    }

    async fn describe(&self, instance_id: &str) -> Result<String, ServiceError> {
        self.calls
            .lock()
            .await
            .push(ComputeCall::Describe(instance_id.to_string()));
        self.states
            .lock()
            .await
            .get(instance_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("instance {instance_id}")))
    }
}
