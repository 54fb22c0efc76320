use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use super::config::NodeConfig;
use super::identity::NodeName;
use crate::archive::Archive;
use crate::chunk::client::PeerConnector;
use crate::chunk::server::ChunkServer;
use crate::error::DfsResult;
use crate::metadata::client::RemoteMetadata;
use crate::metadata::service::{MetadataHandle, MetadataService};
use crate::metadata::types::ChunkHolders;
use crate::naming::ChunkToken;
use crate::transfer::{Fetcher, PutReport, Publisher};

/// Everything one node runs: its archive, the chunk server exposing it, and the
/// put/get machinery wired to the selected metadata service.
pub struct DataManager {
    config: NodeConfig,
    metadata: Arc<MetadataHandle>,
    server: Arc<ChunkServer>,
    publisher: Publisher,
    fetcher: Fetcher,
}

impl DataManager {
    /// Creates a fresh archive at `config.storage_path`, or re-indexes the existing
    /// one when `reuse_archive` is set.
    pub fn open(
        config: NodeConfig,
        metadata: Arc<MetadataHandle>,
        peers: Arc<dyn PeerConnector>,
    ) -> DfsResult<Arc<Self>> {
        let archive = if config.reuse_archive {
            Archive::recover(&config.storage_path)?
        } else {
            Archive::create(&config.storage_path)?
        };
        let archive = Arc::new(archive);

        tracing::info!(
            "Node {} using archive {} ({} chunks)",
            config.node,
            archive.path().display(),
            archive.len()
        );

        let server = ChunkServer::new(archive.clone(), config.transfer_lease);
        let service: Arc<dyn MetadataService> = metadata.clone();
        let publisher = Publisher::new(
            archive.clone(),
            service.clone(),
            config.node.clone(),
            config.chunk_size,
        );
        let fetcher = Fetcher::new(archive, service, peers, config.node.clone());

        Ok(Arc::new(Self {
            config,
            metadata,
            server,
            publisher,
            fetcher,
        }))
    }

    pub fn node(&self) -> &NodeName {
        &self.config.node
    }

    pub fn chunk_server(&self) -> Arc<ChunkServer> {
        self.server.clone()
    }

    pub async fn put(&self, source: &Path, dfs_path: Option<&str>) -> DfsResult<PutReport> {
        self.publisher.put(source, dfs_path).await
    }

    pub async fn get(&self, dfs_path: &str, output: Option<&Path>, append: bool) -> bool {
        self.fetcher.get(dfs_path, output, append).await
    }

    pub async fn read_file(&self, dfs_path: &str) -> Option<Vec<u8>> {
        self.fetcher.read_file(dfs_path).await
    }

    pub async fn list_files(&self) -> DfsResult<Vec<String>> {
        self.metadata.list_files().await
    }

    pub async fn list_all_chunks(&self) -> DfsResult<Vec<ChunkHolders>> {
        self.metadata.list_all_chunks().await
    }

    pub fn list_local_chunks(&self) -> DfsResult<BTreeSet<ChunkToken>> {
        self.server.list_local_chunks()
    }

    pub async fn list_nodes(&self) -> DfsResult<Vec<NodeName>> {
        self.metadata.list_nodes().await
    }

    /// Switches to the metadata service at `host:port` if it is running.
    pub async fn use_remote_metadata(&self, host: &str, port: u16) -> bool {
        let remote = RemoteMetadata::new(host, port, self.config.rpc_timeout);
        let address = remote.base_url().to_string();

        let switched = self.metadata.use_remote(Arc::new(remote)).await;
        if switched {
            tracing::info!("Now using metadata service at {}", address);
        }
        switched
    }

    pub async fn use_local_metadata(&self) -> bool {
        let switched = self.metadata.use_local().await;
        if switched {
            tracing::info!("Now using the local metadata service");
        }
        switched
    }

    pub fn stop(&self) {
        self.server.stop();
    }
}
