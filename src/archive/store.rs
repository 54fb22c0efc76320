use std::collections::{BTreeSet, HashMap};
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::record::{HEADER_LEN, RecordHeader};
use crate::error::{DfsError, DfsResult};
use crate::naming::ChunkToken;

/// Path of the format marker written as the first record of every archive.
pub const BOOTSTRAP_PATH: &str = "STORAGE_INITIALIZED";
pub const BOOTSTRAP_PAYLOAD: &[u8] = b"DFS_STORAGE_v00\n";

#[derive(Debug, Clone, Copy)]
struct Location {
    offset: u64,
    token_len: u32,
    payload_len: u64,
}

#[derive(Debug)]
struct ArchiveState {
    writer: File,
    end: u64,
    index: HashMap<ChunkToken, Location>,
}

/// Append-only chunk container backed by a single file.
#[derive(Debug)]
pub struct Archive {
    path: PathBuf,
    state: Mutex<ArchiveState>,
}

impl Archive {
    /// Creates (or truncates) the archive file and writes the bootstrap record.
    pub fn create(path: impl AsRef<Path>) -> DfsResult<Self> {
        let path = path.as_ref().to_path_buf();
        let writer = open_options(true).open(&path)?;
        restrict_permissions(&path)?;

        let archive = Self {
            path,
            state: Mutex::new(ArchiveState {
                writer,
                end: 0,
                index: HashMap::new(),
            }),
        };
        archive.append(&Self::bootstrap_token(), BOOTSTRAP_PAYLOAD)?;

        tracing::info!("Created archive at {}", archive.path.display());
        Ok(archive)
    }

    /// Reopens an existing archive, rebuilding the index from its records.
    ///
    /// Scanning stops at the first record that does not verify; everything from
    /// there on is truncated. A fresh bootstrap record is appended afterwards.
    pub fn recover(path: impl AsRef<Path>) -> DfsResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Self::create(path);
        }

        let mut writer = open_options(false).open(&path)?;
        let file_len = writer.metadata()?.len();
        let (index, end) = scan_records(&path, file_len)?;

        if end < file_len {
            tracing::warn!(
                "Truncating {} bytes of torn or corrupt records from {}",
                file_len - end,
                path.display()
            );
            writer.set_len(end)?;
        }
        writer.seek(SeekFrom::Start(end))?;

        let recovered = index.len();
        let archive = Self {
            path,
            state: Mutex::new(ArchiveState { writer, end, index }),
        };
        archive.append(&Self::bootstrap_token(), BOOTSTRAP_PAYLOAD)?;

        tracing::info!(
            "Recovered archive at {} ({} chunks)",
            archive.path.display(),
            recovered
        );
        Ok(archive)
    }

    pub fn bootstrap_token() -> ChunkToken {
        ChunkToken::new(0, BOOTSTRAP_PATH)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> DfsResult<MutexGuard<'_, ArchiveState>> {
        self.state
            .lock()
            .map_err(|e| DfsError::Lock(format!("archive {}: {}", self.path.display(), e)))
    }

    /// Appends one record and syncs it; only then is the token indexed.
    pub fn append(&self, token: &ChunkToken, bytes: &[u8]) -> DfsResult<()> {
        let key = token.to_string();
        let header = RecordHeader::for_entry(key.as_bytes(), bytes)?;
        let encoded = header.encode()?;

        let mut state = self.lock()?;
        let offset = state.end;
        let end = header
            .record_len()
            .and_then(|len| offset.checked_add(len))
            .ok_or_else(|| DfsError::StorageCorruption(format!("record for {} too large", key)))?;

        if let Err(e) = write_record(&mut state.writer, &encoded, key.as_bytes(), bytes) {
            tracing::error!("Failed to append {} to {}: {}", key, self.path.display(), e);
            rollback(&mut state.writer, offset);
            return Err(e.into());
        }

        state.end = end;
        state.index.insert(
            token.clone(),
            Location {
                offset,
                token_len: header.token_len,
                payload_len: header.payload_len,
            },
        );

        tracing::debug!("Archived {} ({} bytes)", key, bytes.len());
        Ok(())
    }

    /// Runs [`Archive::append`] on the blocking pool and hands the buffer back.
    pub async fn append_owned(
        self: Arc<Self>,
        token: ChunkToken,
        bytes: Vec<u8>,
    ) -> DfsResult<Vec<u8>> {
        tokio::task::spawn_blocking(move || self.append(&token, &bytes).map(|_| bytes)).await?
    }

    /// Returns `Ok(None)` for unknown tokens and `StorageCorruption` when the
    /// index points at a record that cannot be read back intact.
    pub fn read_checked(&self, token: &ChunkToken) -> DfsResult<Option<Vec<u8>>> {
        let state = self.lock()?;
        let Some(location) = state.index.get(token).copied() else {
            return Ok(None);
        };

        // The writer is append-only, so a separate read-only handle is safe.
        read_record(&self.path, location, token).map(Some)
    }

    pub fn read(&self, token: &ChunkToken) -> Option<Vec<u8>> {
        match self.read_checked(token) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(
                    "Could not extract {} from local store despite it being indexed: {}",
                    token,
                    e
                );
                None
            }
        }
    }

    pub fn list(&self) -> DfsResult<BTreeSet<ChunkToken>> {
        let state = self.lock()?;
        Ok(state.index.keys().cloned().collect())
    }

    pub fn contains(&self, token: &ChunkToken) -> bool {
        self.lock()
            .map(|state| state.index.contains_key(token))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.lock().map(|state| state.index.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn open_options(truncate: bool) -> OpenOptions {
    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true).truncate(truncate);
    options
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

fn write_record(writer: &mut File, header: &[u8], token: &[u8], payload: &[u8]) -> io::Result<()> {
    writer.write_all(header)?;
    writer.write_all(token)?;
    writer.write_all(payload)?;
    writer.flush()?;
    writer.sync_data()
}

fn rollback(writer: &mut File, offset: u64) {
    if let Err(e) = writer
        .set_len(offset)
        .and_then(|_| writer.seek(SeekFrom::Start(offset)).map(|_| ()))
    {
        tracing::error!("Failed to roll back partial record at offset {}: {}", offset, e);
    }
}

fn read_record(path: &Path, location: Location, token: &ChunkToken) -> DfsResult<Vec<u8>> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(location.offset))?;

    let mut header_buf = [0u8; HEADER_LEN];
    file.read_exact(&mut header_buf)?;
    let header = RecordHeader::decode(&header_buf)?;

    if header.token_len != location.token_len || header.payload_len != location.payload_len {
        return Err(DfsError::StorageCorruption(format!(
            "record header for {} does not match the index",
            token
        )));
    }

    let mut key = vec![0u8; header.token_len as usize];
    file.read_exact(&mut key)?;
    if key != token.to_string().as_bytes() {
        return Err(DfsError::StorageCorruption(format!(
            "record at offset {} does not hold {}",
            location.offset, token
        )));
    }

    let mut payload = vec![0u8; header.payload_len as usize];
    file.read_exact(&mut payload)?;
    if !header.verify(&key, &payload) {
        return Err(DfsError::StorageCorruption(format!("checksum mismatch for {}", token)));
    }

    Ok(payload)
}

fn scan_records(path: &Path, file_len: u64) -> DfsResult<(HashMap<ChunkToken, Location>, u64)> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut index = HashMap::new();
    let mut offset = 0u64;

    while file_len - offset >= HEADER_LEN as u64 {
        let mut header_buf = [0u8; HEADER_LEN];
        if reader.read_exact(&mut header_buf).is_err() {
            break;
        }

        let header = match RecordHeader::decode(&header_buf) {
            Ok(header) => header,
            Err(e) => {
                tracing::warn!("Stopping archive scan at offset {}: {}", offset, e);
                break;
            }
        };

        let record_end = header
            .record_len()
            .and_then(|len| offset.checked_add(len));
        let Some(record_end) = record_end.filter(|&end| end <= file_len) else {
            tracing::warn!("Torn record at offset {}", offset);
            break;
        };

        let mut key = vec![0u8; header.token_len as usize];
        let mut payload = vec![0u8; header.payload_len as usize];
        if reader.read_exact(&mut key).is_err() || reader.read_exact(&mut payload).is_err() {
            break;
        }

        if !header.verify(&key, &payload) {
            tracing::warn!("Checksum mismatch at offset {}", offset);
            break;
        }

        let token = match String::from_utf8(key)
            .ok()
            .and_then(|key| key.parse::<ChunkToken>().ok())
        {
            Some(token) => token,
            None => {
                tracing::warn!("Unreadable token at offset {}", offset);
                break;
            }
        };

        index.insert(
            token,
            Location {
                offset,
                token_len: header.token_len,
                payload_len: header.payload_len,
            },
        );
        offset = record_end;
    }

    Ok((index, offset))
}
