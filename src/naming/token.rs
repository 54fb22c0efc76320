use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{DfsError, DfsResult};

pub const SEPARATOR: char = '/';

/// Removes a single leading separator: `/a/b` becomes `a/b`, `//a` becomes `/a`.
pub fn strip_leading_separator(path: &str) -> &str {
    path.strip_prefix(SEPARATOR).unwrap_or(path)
}

pub fn encode(index: u64, path: &str) -> String {
    format!("{}{}{}", index, SEPARATOR, strip_leading_separator(path))
}

pub fn decode(token: &str) -> DfsResult<(u64, String)> {
    let (prefix, path) = token
        .split_once(SEPARATOR)
        .ok_or_else(|| DfsError::MalformedToken(token.to_string()))?;

    // u64::from_str accepts a leading '+', which would make two spellings decode
    // to the same token.
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DfsError::MalformedToken(token.to_string()));
    }

    let index = prefix
        .parse::<u64>()
        .map_err(|_| DfsError::MalformedToken(token.to_string()))?;

    Ok((index, path.to_string()))
}

/// Identifier of one chunk: its position within a file plus the file's DFS path.
///
/// The path is stored without its leading separator. Ordering is by index first,
/// so a sorted set of one file's tokens is in reassembly order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChunkToken {
    index: u64,
    dfs_path: String,
}

impl ChunkToken {
    pub fn new(index: u64, dfs_path: &str) -> Self {
        Self {
            index,
            dfs_path: strip_leading_separator(dfs_path).to_string(),
        }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn dfs_path(&self) -> &str {
        &self.dfs_path
    }

    pub fn encode(&self) -> String {
        encode(self.index, &self.dfs_path)
    }
}

impl fmt::Display for ChunkToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.index, SEPARATOR, self.dfs_path)
    }
}

impl FromStr for ChunkToken {
    type Err = DfsError;

    fn from_str(s: &str) -> DfsResult<Self> {
        let (index, dfs_path) = decode(s)?;
        // Not `ChunkToken::new`: the path after the first separator is kept verbatim.
        Ok(Self { index, dfs_path })
    }
}

impl TryFrom<String> for ChunkToken {
    type Error = DfsError;

    fn try_from(value: String) -> DfsResult<Self> {
        value.parse()
    }
}

impl From<ChunkToken> for String {
    fn from(token: ChunkToken) -> Self {
        token.to_string()
    }
}
