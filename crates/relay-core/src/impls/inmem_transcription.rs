//! InMemoryTranscriptionService - 開発・テスト用のジョブ登録簿
//!
//! start されたジョブを IN_PROGRESS で記録し、complete / fail で終端状態に進めます。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{JobDescription, JobName, JobStatus, ServiceError, TranscriptionJob};
use crate::ports::TranscriptionService;

#[derive(Default)]
struct Registry {
    jobs: HashMap<JobName, (TranscriptionJob, JobDescription)>,
    started: Vec<JobName>,
}

#[derive(Default)]
pub struct InMemoryTranscriptionService {
    registry: Mutex<Registry>,
    reject_starts: Option<String>,
}

impl InMemoryTranscriptionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// テスト用: すべての start を拒否する
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
            reject_starts: Some(reason.into()),
        }
    }

    /// 起動されたジョブ（起動順）
    pub async fn started_jobs(&self) -> Vec<TranscriptionJob> {
        let registry = self.registry.lock().await;
        registry
            .started
            .iter()
            .filter_map(|name| registry.jobs.get(name).map(|(job, _)| job.clone()))
            .collect()
    }

    /// ジョブを COMPLETED にする。結果 URI は出力先を指す
    pub async fn complete(&self, name: &JobName, transcript_uri: impl Into<String>) -> bool {
        self.transition(name, JobStatus::Completed, Some(transcript_uri.into()))
            .await
    }

    pub async fn fail(&self, name: &JobName) -> bool {
        self.transition(name, JobStatus::Failed, None).await
    }

    async fn transition(&self, name: &JobName, status: JobStatus, uri: Option<String>) -> bool {
        let mut registry = self.registry.lock().await;
        match registry.jobs.get_mut(name) {
            Some((_, description)) => {
                description.status = status;
                description.transcript_uri = uri;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl TranscriptionService for InMemoryTranscriptionService {
    async fn start(&self, job: &TranscriptionJob) -> Result<(), ServiceError> {
        if let Some(reason) = &self.reject_starts {
            return Err(ServiceError::Rejected(reason.clone()));
        }
        let mut registry = self.registry.lock().await;
        if registry.jobs.contains_key(&job.name) {
            return Err(ServiceError::Rejected(format!(
                "job already exists: {}",
                job.name
            )));
        }
        let description = JobDescription {
            name: job.name.clone(),
            status: JobStatus::InProgress,
            transcript_uri: None,
        };
        registry
            .jobs
            .insert(job.name.clone(), (job.clone(), description));
        registry.started.push(job.name.clone());
        Ok(())
    }

    async fn describe(&self, name: &JobName) -> Result<JobDescription, ServiceError> {
        let registry = self.registry.lock().await;
        registry
            .jobs
            .get(name)
            .map(|(_, description)| description.clone())
            .ok_or_else(|| ServiceError::NotFound(format!("job {name}")))
    }
}
