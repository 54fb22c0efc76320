use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::protocol::*;
use super::service::MetadataService;
use super::types::{ChunkHolders, FileRecord};
use crate::error::{DfsError, DfsResult};
use crate::naming::ChunkToken;
use crate::node::NodeName;

const RETRY_ATTEMPTS: usize = 3;

/// HTTP client for a metadata service hosted by another process.
///
/// Every metadata call is idempotent, so transport failures are retried with a
/// short jittered backoff before surfacing as `ConnectionFailure`.
pub struct RemoteMetadata {
    http_client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl RemoteMetadata {
    pub fn new(host: &str, port: u16, timeout: Duration) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: format!("http://{}:{}", host, port),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn post_with_retry<T: Serialize>(
        &self,
        url: String,
        payload: &T,
        attempts: usize,
    ) -> DfsResult<reqwest::Response> {
        let mut delay_ms = 150u64;

        for attempt in 0..attempts {
            let response = self
                .http_client
                .post(url.clone())
                .json(payload)
                .timeout(self.timeout)
                .send()
                .await;

            match response {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    if attempt + 1 == attempts {
                        return Err(e.into());
                    }
                    tracing::debug!("POST {} failed (attempt {}): {}", url, attempt + 1, e);
                    let jitter = rand::random::<u64>() % 50;
                    tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                    delay_ms = (delay_ms * 2).min(1200);
                }
            }
        }

        Err(DfsError::ConnectionFailure(format!(
            "retry attempts exhausted for {}",
            url
        )))
    }

    async fn get_with_retry(&self, url: String, attempts: usize) -> DfsResult<reqwest::Response> {
        let mut delay_ms = 150u64;

        for attempt in 0..attempts {
            let response = self
                .http_client
                .get(url.clone())
                .timeout(self.timeout)
                .send()
                .await;

            match response {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    if attempt + 1 == attempts {
                        return Err(e.into());
                    }
                    tracing::debug!("GET {} failed (attempt {}): {}", url, attempt + 1, e);
                    let jitter = rand::random::<u64>() % 50;
                    tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                    delay_ms = (delay_ms * 2).min(1200);
                }
            }
        }

        Err(DfsError::ConnectionFailure(format!(
            "retry attempts exhausted for {}",
            url
        )))
    }

    async fn fetch_json<R: DeserializeOwned>(&self, endpoint: &str) -> DfsResult<R> {
        let response = self.get_with_retry(self.url(endpoint), RETRY_ATTEMPTS).await?;
        if !response.status().is_success() {
            return Err(DfsError::Rejected(format!(
                "GET {} failed {}",
                endpoint,
                response.status()
            )));
        }
        Ok(response.json().await?)
    }

    async fn expect_ack(&self, endpoint: &str, response: reqwest::Response) -> DfsResult<()> {
        let status = response.status();
        let ack: MetaAckResponse = response.json().await?;

        if ack.success {
            return Ok(());
        }

        let reason = ack
            .error
            .unwrap_or_else(|| format!("{} failed {}", endpoint, status));
        if status == reqwest::StatusCode::NOT_FOUND {
            Err(DfsError::FileNotFound(reason))
        } else {
            Err(DfsError::Rejected(reason))
        }
    }
}

#[async_trait]
impl MetadataService for RemoteMetadata {
    async fn publish(
        &self,
        dfs_path: &str,
        node: &NodeName,
        total_size: u64,
        chunk_count: u64,
    ) -> DfsResult<()> {
        let payload = PublishRequest {
            dfs_path: dfs_path.to_string(),
            node: node.clone(),
            total_size,
            chunk_count,
        };
        let response = self
            .post_with_retry(self.url(ENDPOINT_META_PUBLISH), &payload, RETRY_ATTEMPTS)
            .await?;
        self.expect_ack(ENDPOINT_META_PUBLISH, response).await
    }

    async fn get_file_record(&self, dfs_path: &str) -> DfsResult<Option<FileRecord>> {
        let payload = RecordRequest {
            dfs_path: dfs_path.to_string(),
        };
        let response = self
            .post_with_retry(self.url(ENDPOINT_META_RECORD), &payload, RETRY_ATTEMPTS)
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(DfsError::Rejected(format!(
                "record lookup failed {}",
                response.status()
            )));
        }

        let body: RecordResponse = response.json().await?;
        Ok(body.record)
    }

    async fn resolve_holders(&self, token: &ChunkToken) -> DfsResult<Vec<NodeName>> {
        let payload = ResolveRequest {
            token: token.clone(),
        };
        let response = self
            .post_with_retry(self.url(ENDPOINT_META_RESOLVE), &payload, RETRY_ATTEMPTS)
            .await?;

        if !response.status().is_success() {
            return Err(DfsError::Rejected(format!(
                "resolve failed {}",
                response.status()
            )));
        }

        let body: ResolveResponse = response.json().await?;
        Ok(body.holders)
    }

    async fn add_holder(&self, dfs_path: &str, index: u64, node: &NodeName) -> DfsResult<()> {
        let payload = AddHolderRequest {
            dfs_path: dfs_path.to_string(),
            index,
            node: node.clone(),
        };
        let response = self
            .post_with_retry(self.url(ENDPOINT_META_ADD_HOLDER), &payload, RETRY_ATTEMPTS)
            .await?;
        self.expect_ack(ENDPOINT_META_ADD_HOLDER, response).await
    }

    async fn list_files(&self) -> DfsResult<Vec<String>> {
        let body: FilesResponse = self.fetch_json(ENDPOINT_META_FILES).await?;
        Ok(body.files)
    }

    async fn list_all_chunks(&self) -> DfsResult<Vec<ChunkHolders>> {
        let body: ChunksResponse = self.fetch_json(ENDPOINT_META_CHUNKS).await?;
        Ok(body.chunks)
    }

    async fn list_nodes(&self) -> DfsResult<Vec<NodeName>> {
        let body: NodesResponse = self.fetch_json(ENDPOINT_META_NODES).await?;
        Ok(body.nodes)
    }

    async fn started(&self) -> DfsResult<bool> {
        // Single attempt: this is the liveness check run before switching backends.
        let started: bool = {
            let response = self.get_with_retry(self.url(ENDPOINT_META_STARTED), 1).await?;
            response.json().await?
        };
        Ok(started)
    }
}
