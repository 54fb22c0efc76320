//! Node configuration.
//!
//! Every setting can be given as a command-line flag or through the matching
//! `DFS_*` environment variable; unset values fall back to the defaults below.

use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

use super::identity::{NodeName, default_storage_path};
use crate::error::{DfsError, DfsResult};

pub const DEFAULT_CHUNK_PORT: u16 = 7767;
pub const DEFAULT_METADATA_PORT: u16 = 7768;
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub node: NodeName,
    pub storage_path: PathBuf,
    pub bind_host: String,
    pub chunk_port: u16,
    pub metadata_port: u16,
    pub chunk_size: usize,
    /// Hold limit for the transfer slot; `None` keeps a slot until released.
    pub transfer_lease: Option<Duration>,
    pub rpc_timeout: Duration,
    pub reuse_archive: bool,
    /// Serve the in-memory metadata service from this process.
    pub host_metadata: bool,
    /// `host[:port]` of the metadata service to use at startup.
    pub metadata_remote: Option<String>,
}

impl NodeConfig {
    pub fn new(node: NodeName, storage_path: PathBuf) -> Self {
        Self {
            node,
            storage_path,
            bind_host: "0.0.0.0".to_string(),
            chunk_port: DEFAULT_CHUNK_PORT,
            metadata_port: DEFAULT_METADATA_PORT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            transfer_lease: None,
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
            reuse_archive: false,
            host_metadata: false,
            metadata_remote: None,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Name advertised to peers (defaults to the hostname).
    #[arg(long, env = "DFS_NODE_NAME")]
    pub node_name: Option<String>,

    /// Archive file (defaults to <tmp>/dfs_<user>_at_<host>).
    #[arg(long, env = "DFS_STORAGE_PATH")]
    pub storage_path: Option<PathBuf>,

    #[arg(long, env = "DFS_BIND_HOST", default_value = "0.0.0.0")]
    pub bind_host: String,

    #[arg(long, env = "DFS_CHUNK_PORT", default_value_t = DEFAULT_CHUNK_PORT)]
    pub chunk_port: u16,

    #[arg(long, env = "DFS_METADATA_PORT", default_value_t = DEFAULT_METADATA_PORT)]
    pub metadata_port: u16,

    /// Chunk size in bytes.
    #[arg(long, env = "DFS_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Reclaim a transfer slot held longer than this many seconds.
    #[arg(long, env = "DFS_TRANSFER_LEASE_SECS")]
    pub transfer_lease_secs: Option<u64>,

    #[arg(long, env = "DFS_RPC_TIMEOUT_SECS", default_value_t = DEFAULT_RPC_TIMEOUT.as_secs())]
    pub rpc_timeout_secs: u64,

    /// Keep and re-index an existing archive instead of starting empty.
    #[arg(long, env = "DFS_REUSE_ARCHIVE")]
    pub reuse_archive: bool,

    /// Also run the in-memory metadata service on the metadata port.
    #[arg(long, env = "DFS_HOST_METADATA")]
    pub host_metadata: bool,

    /// Use the metadata service at host[:port] instead of the local one.
    #[arg(long, env = "DFS_METADATA")]
    pub metadata: Option<String>,

    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    pub fn into_config(self) -> NodeConfig {
        let node = match self.node_name {
            Some(name) => NodeName::new(name),
            None => NodeName::local(self.chunk_port),
        };
        let storage_path = self
            .storage_path
            .unwrap_or_else(|| default_storage_path(&node));

        NodeConfig {
            node,
            storage_path,
            bind_host: self.bind_host,
            chunk_port: self.chunk_port,
            metadata_port: self.metadata_port,
            chunk_size: self.chunk_size.max(1),
            transfer_lease: self.transfer_lease_secs.map(Duration::from_secs),
            rpc_timeout: Duration::from_secs(self.rpc_timeout_secs),
            reuse_archive: self.reuse_archive,
            host_metadata: self.host_metadata,
            metadata_remote: self.metadata,
        }
    }
}

/// Splits `host[:port]`, using `default_port` when no port is given.
pub fn split_host_port(address: &str, default_port: u16) -> DfsResult<(String, u16)> {
    match address.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && !host.contains(':') => {
            let port = port
                .parse()
                .map_err(|_| DfsError::Rejected(format!("invalid port in {:?}", address)))?;
            Ok((host.to_string(), port))
        }
        _ if address.is_empty() => Err(DfsError::Rejected("empty address".to_string())),
        _ => Ok((address.to_string(), default_port)),
    }
}
