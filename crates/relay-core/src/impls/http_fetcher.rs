//! HttpAttachmentFetcher - 添付ファイルを HTTP(S) で取得する

use async_trait::async_trait;

use crate::domain::ServiceError;
use crate::ports::AttachmentFetcher;

pub struct HttpAttachmentFetcher {
    client: reqwest::Client,
}

impl HttpAttachmentFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AttachmentFetcher for HttpAttachmentFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ServiceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ServiceError::Unavailable(format!("download {url}: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ServiceError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(ServiceError::Rejected(format!(
                "download {url}: status {status}"
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ServiceError::Unavailable(format!("download {url}: {e}")))?;
        Ok(bytes.to_vec())
    }
}
