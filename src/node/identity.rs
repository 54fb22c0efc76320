use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use super::config::DEFAULT_CHUNK_PORT;

/// Name under which a node is known to the metadata service and its peers.
///
/// Either a plain resolvable hostname, in which case the chunk service is expected
/// on the default port, or `host:port`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeName(pub String);

impl NodeName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// This host's name, suffixed with the chunk port when it is not the default.
    pub fn local(chunk_port: u16) -> Self {
        let host = gethostname::gethostname().to_string_lossy().into_owned();
        if chunk_port == DEFAULT_CHUNK_PORT {
            Self(host)
        } else {
            Self(format!("{}:{}", host, chunk_port))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn explicit_port(&self) -> Option<u16> {
        if let Ok(addr) = self.0.parse::<SocketAddr>() {
            return Some(addr.port());
        }
        let (host, port) = self.0.rsplit_once(':')?;
        if host.is_empty() || host.contains(':') {
            return None;
        }
        port.parse().ok()
    }

    /// Base URL of the chunk service running on this node.
    pub fn base_url(&self, default_port: u16) -> String {
        match self.explicit_port() {
            Some(_) => format!("http://{}", self.0),
            None => format!("http://{}:{}", self.0, default_port),
        }
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// `<tmp>/dfs_<user>_at_<host>`: one archive per user and node.
pub fn default_storage_path(node: &NodeName) -> PathBuf {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("LOGNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host: String = node
        .as_str()
        .chars()
        .map(|c| if c == ':' || c == '/' { '_' } else { c })
        .collect();

    std::env::temp_dir().join(format!("dfs_{}_at_{}", user, host))
}
