use rand::seq::SliceRandom;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::archive::Archive;
use crate::chunk::client::PeerConnector;
use crate::chunk::protocol::{ServeOutcome, TransferId};
use crate::error::{DfsError, DfsResult};
use crate::metadata::service::MetadataService;
use crate::metadata::types::FileRecord;
use crate::naming::ChunkToken;
use crate::node::NodeName;

/// Download rounds attempted before a file is declared incomplete.
pub const MAX_TRIALS: usize = 3;

/// Pulls chunks from their holders into the local archive and reassembles files.
pub struct Fetcher {
    archive: Arc<Archive>,
    metadata: Arc<dyn MetadataService>,
    peers: Arc<dyn PeerConnector>,
    node: NodeName,
}

impl Fetcher {
    pub fn new(
        archive: Arc<Archive>,
        metadata: Arc<dyn MetadataService>,
        peers: Arc<dyn PeerConnector>,
        node: NodeName,
    ) -> Self {
        Self {
            archive,
            metadata,
            peers,
            node,
        }
    }

    /// Tokens of `record` that are not in the local archive yet, ascending.
    pub fn resolve_missing(&self, record: &FileRecord) -> Vec<ChunkToken> {
        record
            .chunk_tokens()
            .into_iter()
            .filter(|token| !self.archive.contains(token))
            .collect()
    }

    /// Downloads every token independently. `true` iff all of them arrived.
    pub async fn download_all(&self, tokens: Vec<ChunkToken>) -> bool {
        let mut complete = true;
        for token in &tokens {
            if !self.download_one(token).await {
                complete = false;
            }
        }
        complete
    }

    async fn download_one(&self, token: &ChunkToken) -> bool {
        let mut holders = match self.metadata.resolve_holders(token).await {
            Ok(holders) => holders,
            Err(e) => {
                tracing::error!("Could not resolve holders of {}: {}", token, e);
                return false;
            }
        };
        holders.shuffle(&mut rand::thread_rng());

        for holder in &holders {
            let bytes = match self.fetch_from(holder, token).await {
                Ok(bytes) => bytes,
                Err(DfsError::TransferBusy(node)) => {
                    tracing::debug!("{} is busy, trying next holder of {}", node, token);
                    continue;
                }
                Err(e @ DfsError::ConnectionFailure(_)) => {
                    tracing::warn!("Could not reach {} for {}: {}", holder, token, e);
                    continue;
                }
                Err(e) => {
                    tracing::error!("{}", e);
                    continue;
                }
            };

            let size = bytes.len();
            if let Err(e) = self.archive.clone().append_owned(token.clone(), bytes).await {
                tracing::error!("Failed to archive downloaded chunk {}: {}", token, e);
                return false;
            }

            if let Err(e) = self
                .metadata
                .add_holder(token.dfs_path(), token.index(), &self.node)
                .await
            {
                tracing::warn!("Could not announce replica of {}: {}", token, e);
            }

            tracing::debug!("Downloaded {} ({} bytes) from {}", token, size, holder);
            return true;
        }

        tracing::warn!(
            "None of the {} holders of {} delivered it",
            holders.len(),
            token
        );
        false
    }

    /// One serve/release exchange with `holder`.
    ///
    /// The slot is released after every answer but `Busy`, and also when the
    /// exchange fails, since the holder may have served the request anyway.
    async fn fetch_from(&self, holder: &NodeName, token: &ChunkToken) -> DfsResult<Vec<u8>> {
        let transfer = TransferId::random();

        let outcome = match self.peers.serve_chunk(holder, token, transfer).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.release(holder, transfer).await;
                return Err(e);
            }
        };

        match outcome {
            ServeOutcome::Busy => Err(DfsError::TransferBusy(holder.to_string())),
            ServeOutcome::NotFound => {
                self.release(holder, transfer).await;
                Err(DfsError::ChunkMissing {
                    token: token.to_string(),
                    node: holder.to_string(),
                })
            }
            ServeOutcome::Found(bytes) => {
                self.release(holder, transfer).await;
                Ok(bytes)
            }
        }
    }

    async fn release(&self, holder: &NodeName, transfer: TransferId) {
        if let Err(e) = self.peers.release_transfer(holder, transfer).await {
            tracing::warn!("Failed to release transfer slot on {}: {}", holder, e);
        }
    }

    /// Looks the file up and runs download trials until no chunk is missing.
    async fn fetch_complete(&self, dfs_path: &str) -> DfsResult<FileRecord> {
        let record = self
            .metadata
            .get_file_record(dfs_path)
            .await?
            .ok_or_else(|| DfsError::FileNotFound(dfs_path.to_string()))?;

        for trial in 1..=MAX_TRIALS {
            let mut missing = self.resolve_missing(&record);
            if missing.is_empty() {
                return Ok(record);
            }
            missing.shuffle(&mut rand::thread_rng());

            tracing::debug!(
                "Trial {}/{} for {}: {} chunks missing",
                trial,
                MAX_TRIALS,
                record.dfs_path,
                missing.len()
            );
            if self.download_all(missing).await {
                return Ok(record);
            }
        }

        Err(DfsError::IncompleteFile(record.dfs_path))
    }

    /// Copies `dfs_path` into `output` (default: a local file named like the DFS
    /// path), appending instead of truncating when `append` is set.
    ///
    /// The output is only opened once every chunk is local.
    pub async fn get(&self, dfs_path: &str, output: Option<&Path>, append: bool) -> bool {
        let record = match self.fetch_complete(dfs_path).await {
            Ok(record) => record,
            Err(e) => {
                tracing::error!("{}", e);
                return false;
            }
        };

        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(dfs_path));
        let archive = self.archive.clone();
        let tokens = record.chunk_tokens();
        let target = output.clone();

        let written = tokio::task::spawn_blocking(move || {
            write_to_file(&archive, &tokens, &target, append)
        })
        .await;

        match written {
            Ok(Ok(bytes)) => {
                tracing::info!(
                    "Got {} into {} ({} bytes)",
                    record.dfs_path,
                    output.display(),
                    bytes
                );
                true
            }
            Ok(Err(e)) => {
                tracing::error!("Failed to write {}: {}", output.display(), e);
                false
            }
            Err(e) => {
                tracing::error!("Reassembly of {} panicked: {}", record.dfs_path, e);
                false
            }
        }
    }

    /// Like [`Fetcher::get`], but returns the file contents.
    pub async fn read_file(&self, dfs_path: &str) -> Option<Vec<u8>> {
        let record = match self.fetch_complete(dfs_path).await {
            Ok(record) => record,
            Err(e) => {
                tracing::error!("{}", e);
                return None;
            }
        };

        let archive = self.archive.clone();
        let tokens = record.chunk_tokens();
        let assembled = tokio::task::spawn_blocking(move || {
            let mut contents = Vec::new();
            write_in_order(&archive, &tokens, &mut contents).map(|_| contents)
        })
        .await;

        match assembled {
            Ok(Ok(contents)) => Some(contents),
            Ok(Err(e)) => {
                tracing::error!("Failed to assemble {}: {}", record.dfs_path, e);
                None
            }
            Err(e) => {
                tracing::error!("Reassembly of {} panicked: {}", record.dfs_path, e);
                None
            }
        }
    }
}

fn write_to_file(
    archive: &Archive,
    tokens: &[ChunkToken],
    output: &Path,
    append: bool,
) -> DfsResult<u64> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(output)?;

    let mut writer = BufWriter::new(file);
    let written = write_in_order(archive, tokens, &mut writer)?;
    writer.flush()?;
    Ok(written)
}

/// Writes the payload of each token, in the given (ascending) order.
fn write_in_order(archive: &Archive, tokens: &[ChunkToken], out: &mut impl Write) -> DfsResult<u64> {
    let mut written = 0u64;
    for token in tokens {
        let bytes = archive.read_checked(token)?.ok_or_else(|| {
            DfsError::StorageCorruption(format!("{} vanished from the archive", token))
        })?;
        out.write_all(&bytes)?;
        written += bytes.len() as u64;
    }
    Ok(written)
}
