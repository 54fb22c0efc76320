//! HTTP client for a node's control API.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::chunk::protocol::{
    AckResponse, ENDPOINT_LOCAL_CHUNKS, ENDPOINT_STOP, LocalChunksResponse,
};
use crate::error::{DfsError, DfsResult};
use crate::metadata::protocol::{ChunksResponse, FilesResponse, NodesResponse};
use crate::metadata::types::ChunkHolders;
use crate::naming::ChunkToken;
use crate::node::NodeName;
use crate::node::config::DEFAULT_CHUNK_PORT;
use crate::node::protocol::*;
use crate::transfer::PutReport;

pub struct NodeClient {
    http_client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl NodeClient {
    /// `node` is a node name (`host` or `host:port`) as given to `serve`.
    pub fn new(node: &NodeName, timeout: Duration) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: node.base_url(DEFAULT_CHUNK_PORT),
            timeout,
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn get_json<R: DeserializeOwned>(&self, endpoint: &str) -> DfsResult<R> {
        let response = self
            .http_client
            .get(self.url(endpoint))
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DfsError::Rejected(format!(
                "{} failed {}",
                endpoint,
                response.status()
            )));
        }
        Ok(response.json().await?)
    }

    /// Posts without a timeout: puts and gets last as long as the transfer does.
    async fn post_untimed<T: Serialize>(
        &self,
        endpoint: &str,
        payload: &T,
    ) -> DfsResult<reqwest::Response> {
        Ok(self
            .http_client
            .post(self.url(endpoint))
            .json(payload)
            .send()
            .await?)
    }

    async fn post_ack<T: Serialize>(&self, endpoint: &str, payload: &T) -> DfsResult<bool> {
        let response = self
            .http_client
            .post(self.url(endpoint))
            .json(payload)
            .timeout(self.timeout)
            .send()
            .await?;
        let ack: AckResponse = response.json().await?;
        Ok(ack.success)
    }

    pub async fn put(&self, source: &str, dfs_path: Option<&str>) -> DfsResult<PutReport> {
        let payload = PutRequest {
            source: source.to_string(),
            dfs_path: dfs_path.map(str::to_string),
        };
        let response = self.post_untimed(ENDPOINT_CONTROL_PUT, &payload).await?;
        let status = response.status();
        let body: PutResponse = response.json().await?;

        match body.report {
            Some(report) if body.success => Ok(report),
            _ => Err(DfsError::Rejected(
                body.error
                    .unwrap_or_else(|| format!("put failed {}", status)),
            )),
        }
    }

    pub async fn get(&self, dfs_path: &str, output: &str, append: bool) -> DfsResult<bool> {
        let payload = GetRequest {
            dfs_path: dfs_path.to_string(),
            output: Some(output.to_string()),
            append,
        };
        let response = self.post_untimed(ENDPOINT_CONTROL_GET, &payload).await?;
        let ack: AckResponse = response.json().await?;
        Ok(ack.success)
    }

    /// `None` when the file is unknown or could not be assembled.
    pub async fn cat(&self, dfs_path: &str) -> DfsResult<Option<Vec<u8>>> {
        let payload = CatRequest {
            dfs_path: dfs_path.to_string(),
        };
        let response = self.post_untimed(ENDPOINT_CONTROL_CAT, &payload).await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(DfsError::Rejected(format!(
                "cat failed {}",
                response.status()
            )));
        }
        Ok(Some(response.bytes().await?.to_vec()))
    }

    pub async fn list_files(&self) -> DfsResult<Vec<String>> {
        let body: FilesResponse = self.get_json(ENDPOINT_CONTROL_FILES).await?;
        Ok(body.files)
    }

    pub async fn list_all_chunks(&self) -> DfsResult<Vec<ChunkHolders>> {
        let body: ChunksResponse = self.get_json(ENDPOINT_CONTROL_CHUNKS).await?;
        Ok(body.chunks)
    }

    pub async fn list_local_chunks(&self) -> DfsResult<Vec<ChunkToken>> {
        let body: LocalChunksResponse = self.get_json(ENDPOINT_LOCAL_CHUNKS).await?;
        Ok(body.chunks)
    }

    pub async fn list_nodes(&self) -> DfsResult<Vec<NodeName>> {
        let body: NodesResponse = self.get_json(ENDPOINT_CONTROL_NODES).await?;
        Ok(body.nodes)
    }

    pub async fn use_remote_metadata(&self, host: &str, port: Option<u16>) -> DfsResult<bool> {
        let payload = RemoteMetadataRequest {
            host: host.to_string(),
            port,
        };
        self.post_ack(ENDPOINT_CONTROL_REMOTE_METADATA, &payload)
            .await
    }

    pub async fn use_local_metadata(&self) -> DfsResult<bool> {
        self.post_ack(ENDPOINT_CONTROL_LOCAL_METADATA, &()).await
    }

    pub async fn stop(&self) -> DfsResult<()> {
        self.post_ack(ENDPOINT_STOP, &()).await.map(|_| ())
    }
}
