use async_trait::async_trait;
use dashmap::{DashMap, DashSet};

use super::service::MetadataService;
use super::types::{ChunkHolders, FileRecord};
use crate::error::{DfsError, DfsResult};
use crate::naming::{ChunkToken, strip_leading_separator};
use crate::node::NodeName;

/// In-memory metadata service, keyed by normalized DFS path.
#[derive(Debug, Default)]
pub struct LocalMetadata {
    files: DashMap<String, FileRecord>,
    nodes: DashSet<NodeName>,
}

impl LocalMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

#[async_trait]
impl MetadataService for LocalMetadata {
    async fn publish(
        &self,
        dfs_path: &str,
        node: &NodeName,
        total_size: u64,
        chunk_count: u64,
    ) -> DfsResult<()> {
        let record = FileRecord::new(dfs_path, node, total_size, chunk_count);
        tracing::info!(
            "Published {} from {} ({} bytes, {} chunks)",
            record.dfs_path,
            node,
            total_size,
            chunk_count
        );

        self.nodes.insert(node.clone());
        self.files.insert(record.dfs_path.clone(), record);
        Ok(())
    }

    async fn get_file_record(&self, dfs_path: &str) -> DfsResult<Option<FileRecord>> {
        Ok(self
            .files
            .get(strip_leading_separator(dfs_path))
            .map(|entry| entry.value().clone()))
    }

    async fn resolve_holders(&self, token: &ChunkToken) -> DfsResult<Vec<NodeName>> {
        Ok(self
            .files
            .get(token.dfs_path())
            .map(|entry| entry.value().holders_of(token.index()))
            .unwrap_or_default())
    }

    async fn add_holder(&self, dfs_path: &str, index: u64, node: &NodeName) -> DfsResult<()> {
        let path = strip_leading_separator(dfs_path);
        let mut record = self
            .files
            .get_mut(path)
            .ok_or_else(|| DfsError::FileNotFound(path.to_string()))?;

        let slot = usize::try_from(index)
            .ok()
            .filter(|&i| i < record.holders.len());
        let Some(slot) = slot else {
            return Err(DfsError::Rejected(format!(
                "chunk {} out of range for {} ({} chunks)",
                index, path, record.chunk_count
            )));
        };

        let holders = &mut record.holders[slot];
        if holders.insert(node.clone()) {
            tracing::debug!("{} now also holds chunk {} of {}", node, index, path);
        }
        drop(record);

        self.nodes.insert(node.clone());
        Ok(())
    }

    async fn list_files(&self) -> DfsResult<Vec<String>> {
        let mut files: Vec<String> = self.files.iter().map(|entry| entry.key().clone()).collect();
        files.sort();
        Ok(files)
    }

    async fn list_all_chunks(&self) -> DfsResult<Vec<ChunkHolders>> {
        let mut chunks: Vec<ChunkHolders> = self
            .files
            .iter()
            .flat_map(|entry| {
                let record = entry.value();
                record
                    .chunk_tokens()
                    .into_iter()
                    .map(|token| ChunkHolders {
                        holders: record.holders_of(token.index()),
                        token,
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        chunks.sort_by(|a, b| {
            a.token
                .dfs_path()
                .cmp(b.token.dfs_path())
                .then(a.token.index().cmp(&b.token.index()))
        });
        Ok(chunks)
    }

    async fn list_nodes(&self) -> DfsResult<Vec<NodeName>> {
        let mut nodes: Vec<NodeName> = self.nodes.iter().map(|node| node.key().clone()).collect();
        nodes.sort();
        Ok(nodes)
    }

    async fn started(&self) -> DfsResult<bool> {
        Ok(true)
    }
}
