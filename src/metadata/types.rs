use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::naming::{ChunkToken, strip_leading_separator};
use crate::node::NodeName;

/// Everything the metadata service knows about one published file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Normalized path (no leading separator).
    pub dfs_path: String,
    pub total_size: u64,
    pub chunk_count: u64,
    /// `holders[i]` is the set of nodes known to store chunk `i`.
    pub holders: Vec<BTreeSet<NodeName>>,
}

impl FileRecord {
    /// A freshly published file: the publisher holds every chunk.
    pub fn new(dfs_path: &str, node: &NodeName, total_size: u64, chunk_count: u64) -> Self {
        let holders = (0..chunk_count)
            .map(|_| BTreeSet::from([node.clone()]))
            .collect();

        Self {
            dfs_path: strip_leading_separator(dfs_path).to_string(),
            total_size,
            chunk_count,
            holders,
        }
    }

    /// All chunk tokens of the file, in ascending index order.
    pub fn chunk_tokens(&self) -> Vec<ChunkToken> {
        (0..self.chunk_count)
            .map(|index| ChunkToken::new(index, &self.dfs_path))
            .collect()
    }

    pub fn holders_of(&self, index: u64) -> Vec<NodeName> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.holders.get(i))
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// One chunk of the cluster and the nodes holding it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkHolders {
    pub token: ChunkToken,
    pub holders: Vec<NodeName>,
}
