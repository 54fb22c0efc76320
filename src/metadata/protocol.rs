//! Metadata Service Network Protocol
//!
//! JSON DTOs exchanged between nodes and a hosted metadata service.

use serde::{Deserialize, Serialize};

use super::types::{ChunkHolders, FileRecord};
use crate::naming::ChunkToken;
use crate::node::NodeName;

// --- API Endpoints ---

pub const ENDPOINT_META_PUBLISH: &str = "/meta/publish";
pub const ENDPOINT_META_RECORD: &str = "/meta/record";
pub const ENDPOINT_META_RESOLVE: &str = "/meta/resolve";
pub const ENDPOINT_META_ADD_HOLDER: &str = "/meta/add_holder";
pub const ENDPOINT_META_FILES: &str = "/meta/files";
pub const ENDPOINT_META_CHUNKS: &str = "/meta/chunks";
pub const ENDPOINT_META_NODES: &str = "/meta/nodes";
pub const ENDPOINT_META_STARTED: &str = "/started";

// --- Data Transfer Objects ---

#[derive(Debug, Serialize, Deserialize)]
pub struct PublishRequest {
    pub dfs_path: String,
    pub node: NodeName,
    pub total_size: u64,
    pub chunk_count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecordRequest {
    pub dfs_path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecordResponse {
    /// `None` when no file is published under the path.
    pub record: Option<FileRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResolveRequest {
    pub token: ChunkToken,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub holders: Vec<NodeName>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddHolderRequest {
    pub dfs_path: String,
    pub index: u64,
    pub node: NodeName,
}

/// Acknowledgment for metadata writes; `error` explains a refusal.
#[derive(Debug, Serialize, Deserialize)]
pub struct MetaAckResponse {
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilesResponse {
    pub files: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChunksResponse {
    pub chunks: Vec<ChunkHolders>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NodesResponse {
    pub nodes: Vec<NodeName>,
}
