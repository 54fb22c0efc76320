//! Error taxonomy shared by every subsystem.
//!
//! Library code returns [`DfsResult`]; the binary wraps it in `anyhow` at the edges.
//! Per-holder failures (`TransferBusy`, `ConnectionFailure`, `ChunkMissing`) are
//! expected during downloads and are absorbed by the fetcher, which just tries the
//! next holder.

use std::path::PathBuf;
use thiserror::Error;

pub type DfsResult<T> = std::result::Result<T, DfsError>;

#[derive(Debug, Error)]
pub enum DfsError {
    #[error("no such file: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("malformed chunk token: {0:?}")]
    MalformedToken(String),

    #[error("storage corruption: {0}")]
    StorageCorruption(String),

    #[error("busy source: {0}")]
    TransferBusy(String),

    #[error("chunk {token} not there: {node}")]
    ChunkMissing { token: String, node: String },

    #[error("connection failure: {0}")]
    ConnectionFailure(String),

    #[error("no such file in DFS: {0}")]
    FileNotFound(String),

    #[error("could not get complete file: {0}")]
    IncompleteFile(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("lock poisoned: {0}")]
    Lock(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for DfsError {
    fn from(e: reqwest::Error) -> Self {
        DfsError::ConnectionFailure(e.to_string())
    }
}

impl From<tokio::task::JoinError> for DfsError {
    fn from(e: tokio::task::JoinError) -> Self {
        DfsError::Io(std::io::Error::other(e))
    }
}
