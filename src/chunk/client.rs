//! Outbound side of the chunk protocol.
//!
//! Downloaders talk to remote chunk servers only through [`PeerConnector`]; the
//! HTTP implementation maps each outcome onto a status code and turns every
//! transport problem (refused connection, timeout, broken body) into
//! `ConnectionFailure`.

use async_trait::async_trait;
use std::time::Duration;

use super::protocol::{
    ENDPOINT_RELEASE_TRANSFER, ENDPOINT_SERVE_CHUNK, ReleaseTransferRequest, STATUS_BUSY,
    STATUS_FOUND, STATUS_NOT_FOUND, ServeChunkRequest, ServeOutcome, TransferId,
};
use crate::error::{DfsError, DfsResult};
use crate::naming::ChunkToken;
use crate::node::NodeName;

/// Serve/release calls on a named node.
///
/// An error from `serve_chunk` does not prove the holder kept its slot free: the
/// request may have been served while the answer was lost. Callers release
/// `transfer` after every outcome except `Busy`, errors included.
#[async_trait]
pub trait PeerConnector: Send + Sync {
    async fn serve_chunk(
        &self,
        node: &NodeName,
        token: &ChunkToken,
        transfer: TransferId,
    ) -> DfsResult<ServeOutcome>;

    async fn release_transfer(&self, node: &NodeName, transfer: TransferId) -> DfsResult<()>;
}

pub struct HttpPeerConnector {
    http_client: reqwest::Client,
    default_port: u16,
    timeout: Duration,
}

impl HttpPeerConnector {
    pub fn new(default_port: u16, timeout: Duration) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            default_port,
            timeout,
        }
    }

    fn url(&self, node: &NodeName, endpoint: &str) -> String {
        format!("{}{}", node.base_url(self.default_port), endpoint)
    }
}

#[async_trait]
impl PeerConnector for HttpPeerConnector {
    async fn serve_chunk(
        &self,
        node: &NodeName,
        token: &ChunkToken,
        transfer: TransferId,
    ) -> DfsResult<ServeOutcome> {
        let response = self
            .http_client
            .post(self.url(node, ENDPOINT_SERVE_CHUNK))
            .json(&ServeChunkRequest {
                token: token.clone(),
                transfer,
            })
            .timeout(self.timeout)
            .send()
            .await?;

        match response.status() {
            status if status == STATUS_BUSY => Ok(ServeOutcome::Busy),
            status if status == STATUS_NOT_FOUND => Ok(ServeOutcome::NotFound),
            status if status == STATUS_FOUND => {
                let bytes = response.bytes().await?;
                Ok(ServeOutcome::Found(bytes.to_vec()))
            }
            status => Err(DfsError::ConnectionFailure(format!(
                "{} answered serve_chunk with {}",
                node, status
            ))),
        }
    }

    async fn release_transfer(&self, node: &NodeName, transfer: TransferId) -> DfsResult<()> {
        let response = self
            .http_client
            .post(self.url(node, ENDPOINT_RELEASE_TRANSFER))
            .json(&ReleaseTransferRequest { transfer })
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DfsError::ConnectionFailure(format!(
                "{} answered release_transfer with {}",
                node,
                response.status()
            )));
        }
        Ok(())
    }
}
