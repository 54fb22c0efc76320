use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

use crate::archive::Archive;
use crate::error::{DfsError, DfsResult};
use crate::metadata::service::MetadataService;
use crate::naming::{ChunkToken, strip_leading_separator};
use crate::node::NodeName;

/// Summary of a successful `put`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutReport {
    pub dfs_path: String,
    pub total_size: u64,
    pub chunk_count: u64,
}

pub struct Publisher {
    archive: Arc<Archive>,
    metadata: Arc<dyn MetadataService>,
    node: NodeName,
    chunk_size: usize,
}

impl Publisher {
    pub fn new(
        archive: Arc<Archive>,
        metadata: Arc<dyn MetadataService>,
        node: NodeName,
        chunk_size: usize,
    ) -> Self {
        Self {
            archive,
            metadata,
            node,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Archives `source` chunk by chunk under `dfs_path` (default: the source path
    /// itself) and publishes it.
    ///
    /// Only one chunk is held in memory at a time. If reading or archiving fails
    /// midway, the file is not published; chunks already written stay in the
    /// archive unreferenced.
    pub async fn put(&self, source: &Path, dfs_path: Option<&str>) -> DfsResult<PutReport> {
        let is_file = tokio::fs::metadata(source)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(DfsError::SourceNotFound(source.to_path_buf()));
        }

        let source_name = source.to_string_lossy();
        let dfs_path = strip_leading_separator(dfs_path.unwrap_or(&source_name)).to_string();

        let (total_size, chunk_count) = match self.archive_chunks(source, &dfs_path).await {
            Ok(counts) => counts,
            Err(e) => {
                tracing::error!(
                    "Failed to store {} as {}, not publishing: {}",
                    source.display(),
                    dfs_path,
                    e
                );
                return Err(e);
            }
        };

        self.metadata
            .publish(&dfs_path, &self.node, total_size, chunk_count)
            .await?;

        tracing::info!(
            "Put {} as {} ({} bytes in {} chunks)",
            source.display(),
            dfs_path,
            total_size,
            chunk_count
        );

        Ok(PutReport {
            dfs_path,
            total_size,
            chunk_count,
        })
    }

    async fn archive_chunks(&self, source: &Path, dfs_path: &str) -> DfsResult<(u64, u64)> {
        let mut file = tokio::fs::File::open(source).await?;
        let mut buffer = Vec::with_capacity(self.chunk_size);
        let mut total_size = 0u64;
        let mut index = 0u64;

        loop {
            buffer.clear();
            let filled = (&mut file)
                .take(self.chunk_size as u64)
                .read_to_end(&mut buffer)
                .await?;
            if filled == 0 {
                break;
            }

            let token = ChunkToken::new(index, dfs_path);
            buffer = self.archive.clone().append_owned(token, buffer).await?;
            total_size += filled as u64;
            index += 1;

            if filled < self.chunk_size {
                break;
            }
        }

        Ok((total_size, index))
    }
}
