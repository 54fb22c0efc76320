//! Control API Protocol
//!
//! Requests the shell sends to the node it drives. Listings reuse the metadata
//! and chunk service DTOs. Local paths in requests are resolved by the node, so
//! the shell sends them absolute.

use serde::{Deserialize, Serialize};

use crate::transfer::PutReport;

// --- API Endpoints ---

pub const ENDPOINT_CONTROL_PUT: &str = "/control/put";
pub const ENDPOINT_CONTROL_GET: &str = "/control/get";
/// Returns the file's bytes (`404` when it cannot be assembled).
pub const ENDPOINT_CONTROL_CAT: &str = "/control/cat";
pub const ENDPOINT_CONTROL_FILES: &str = "/control/files";
pub const ENDPOINT_CONTROL_CHUNKS: &str = "/control/chunks";
pub const ENDPOINT_CONTROL_NODES: &str = "/control/nodes";
pub const ENDPOINT_CONTROL_REMOTE_METADATA: &str = "/control/metadata/remote";
pub const ENDPOINT_CONTROL_LOCAL_METADATA: &str = "/control/metadata/local";

// --- Data Transfer Objects ---

#[derive(Debug, Serialize, Deserialize)]
pub struct PutRequest {
    pub source: String,
    pub dfs_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PutResponse {
    pub success: bool,
    pub report: Option<PutReport>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetRequest {
    pub dfs_path: String,
    pub output: Option<String>,
    #[serde(default)]
    pub append: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CatRequest {
    pub dfs_path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RemoteMetadataRequest {
    pub host: String,
    pub port: Option<u16>,
}
