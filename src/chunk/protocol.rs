//! Chunk Service Network Protocol
//!
//! Requests are JSON; chunk payloads travel as raw `application/octet-stream`
//! bodies. The outcome of `serve_chunk` is carried by the status code.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::naming::ChunkToken;

// --- API Endpoints ---

/// Request one chunk; takes the transfer slot unless the node is busy.
pub const ENDPOINT_SERVE_CHUNK: &str = "/chunk/serve";
/// Give the transfer slot back after a non-busy (or broken) `serve_chunk`.
pub const ENDPOINT_RELEASE_TRANSFER: &str = "/chunk/release";
/// Tokens present in the node's archive.
pub const ENDPOINT_LOCAL_CHUNKS: &str = "/chunk/local";
/// Liveness check, shared with the metadata service.
pub const ENDPOINT_STARTED: &str = "/started";
/// Ask the node process to shut down.
pub const ENDPOINT_STOP: &str = "/stop";

pub const STATUS_FOUND: StatusCode = StatusCode::OK;
pub const STATUS_NOT_FOUND: StatusCode = StatusCode::NOT_FOUND;
pub const STATUS_BUSY: StatusCode = StatusCode::SERVICE_UNAVAILABLE;

// --- Data Transfer Objects ---

/// Caller-chosen identifier of one serve/release exchange.
///
/// The server remembers the id of the transfer holding its slot and only lets a
/// release carrying that id free it. A caller can therefore always release after
/// an exchange that broke midway: if its request never took the slot, the
/// release is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferId(pub u64);

impl TransferId {
    pub fn random() -> Self {
        Self(rand::random())
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServeChunkRequest {
    pub token: ChunkToken,
    pub transfer: TransferId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReleaseTransferRequest {
    pub transfer: TransferId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LocalChunksResponse {
    pub chunks: Vec<ChunkToken>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
}

/// Answer to one `serve_chunk` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServeOutcome {
    /// Another transfer holds the slot; nothing was read.
    Busy,
    /// Slot taken, but the chunk is not in this node's archive.
    NotFound,
    /// Slot taken and the chunk's bytes.
    Found(Vec<u8>),
}

impl ServeOutcome {
    /// Whether the caller now owes a `release_transfer`.
    pub fn holds_slot(&self) -> bool {
        !matches!(self, ServeOutcome::Busy)
    }
}
