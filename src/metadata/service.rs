use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use super::types::{ChunkHolders, FileRecord};
use crate::error::DfsResult;
use crate::naming::ChunkToken;
use crate::node::NodeName;

/// Interface of the naming/metadata service as seen by a node.
///
/// Transport problems surface as `DfsError::ConnectionFailure`.
#[async_trait]
pub trait MetadataService: Send + Sync {
    /// Registers (or replaces) `dfs_path` with `node` as holder of every chunk.
    async fn publish(
        &self,
        dfs_path: &str,
        node: &NodeName,
        total_size: u64,
        chunk_count: u64,
    ) -> DfsResult<()>;

    async fn get_file_record(&self, dfs_path: &str) -> DfsResult<Option<FileRecord>>;

    async fn resolve_holders(&self, token: &ChunkToken) -> DfsResult<Vec<NodeName>>;

    /// Records that `node` now also stores chunk `index` of `dfs_path`.
    async fn add_holder(&self, dfs_path: &str, index: u64, node: &NodeName) -> DfsResult<()>;

    async fn list_files(&self) -> DfsResult<Vec<String>>;

    async fn list_all_chunks(&self) -> DfsResult<Vec<ChunkHolders>>;

    async fn list_nodes(&self) -> DfsResult<Vec<NodeName>>;

    async fn started(&self) -> DfsResult<bool>;
}

/// The metadata backend currently in use by a node.
///
/// Delegates every call to the selected backend, which can be swapped while the
/// node runs (`rmdm` / `lmdm`).
pub struct MetadataHandle {
    current: RwLock<Arc<dyn MetadataService>>,
    local: Arc<dyn MetadataService>,
}

impl MetadataHandle {
    /// `local` is the backend `use_local` returns to; it starts out selected.
    pub fn new(local: Arc<dyn MetadataService>) -> Arc<Self> {
        Arc::new(Self {
            current: RwLock::new(local.clone()),
            local,
        })
    }

    pub fn current(&self) -> Arc<dyn MetadataService> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn select(&self, backend: Arc<dyn MetadataService>) {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = backend;
    }

    /// Switches to `backend` if it answers `started()`; otherwise keeps the current one.
    pub async fn use_remote(&self, backend: Arc<dyn MetadataService>) -> bool {
        match backend.started().await {
            Ok(true) => {
                self.select(backend);
                true
            }
            Ok(false) => false,
            Err(e) => {
                tracing::error!("Metadata service not running: {}", e);
                false
            }
        }
    }

    pub async fn use_local(&self) -> bool {
        let ok = self.use_remote(self.local.clone()).await;
        if !ok {
            tracing::error!("Local metadata service not running");
        }
        ok
    }
}

#[async_trait]
impl MetadataService for MetadataHandle {
    async fn publish(
        &self,
        dfs_path: &str,
        node: &NodeName,
        total_size: u64,
        chunk_count: u64,
    ) -> DfsResult<()> {
        self.current()
            .publish(dfs_path, node, total_size, chunk_count)
            .await
    }

    async fn get_file_record(&self, dfs_path: &str) -> DfsResult<Option<FileRecord>> {
        self.current().get_file_record(dfs_path).await
    }

    async fn resolve_holders(&self, token: &ChunkToken) -> DfsResult<Vec<NodeName>> {
        self.current().resolve_holders(token).await
    }

    async fn add_holder(&self, dfs_path: &str, index: u64, node: &NodeName) -> DfsResult<()> {
        self.current().add_holder(dfs_path, index, node).await
    }

    async fn list_files(&self) -> DfsResult<Vec<String>> {
        self.current().list_files().await
    }

    async fn list_all_chunks(&self) -> DfsResult<Vec<ChunkHolders>> {
        self.current().list_all_chunks().await
    }

    async fn list_nodes(&self) -> DfsResult<Vec<NodeName>> {
        self.current().list_nodes().await
    }

    async fn started(&self) -> DfsResult<bool> {
        self.current().started().await
    }
}
