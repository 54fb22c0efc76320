//! On-disk record framing.
//!
//! ```text
//! +-------+-----------+-------------+-------+-------------+---------------+
//! | magic | token_len | payload_len | crc32 | token bytes | payload bytes |
//! |  4 B  |   u32 LE  |   u64 LE    | u32 LE|             |               |
//! +-------+-----------+-------------+-------+-------------+---------------+
//! ```
//!
//! The header is encoded with bincode's default (fixed-width, little-endian)
//! configuration, so it always occupies [`HEADER_LEN`] bytes.

use serde::{Deserialize, Serialize};

use crate::error::{DfsError, DfsResult};

pub const RECORD_MAGIC: [u8; 4] = *b"DFSC";
pub const HEADER_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordHeader {
    pub magic: [u8; 4],
    pub token_len: u32,
    pub payload_len: u64,
    pub crc32: u32,
}

impl RecordHeader {
    pub fn for_entry(token: &[u8], payload: &[u8]) -> DfsResult<Self> {
        let token_len = u32::try_from(token.len())
            .map_err(|_| DfsError::MalformedToken(String::from_utf8_lossy(token).into_owned()))?;

        Ok(Self {
            magic: RECORD_MAGIC,
            token_len,
            payload_len: payload.len() as u64,
            crc32: checksum(token, payload),
        })
    }

    pub fn encode(&self) -> DfsResult<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| DfsError::StorageCorruption(format!("cannot encode record header: {}", e)))
    }

    pub fn decode(buf: &[u8]) -> DfsResult<Self> {
        let header: RecordHeader = bincode::deserialize(buf)
            .map_err(|e| DfsError::StorageCorruption(format!("bad record header: {}", e)))?;

        if header.magic != RECORD_MAGIC {
            return Err(DfsError::StorageCorruption(format!(
                "bad record magic {:?}",
                header.magic
            )));
        }
        Ok(header)
    }

    /// Total size of the record on disk, header included. `None` when the
    /// lengths cannot describe a real record.
    pub fn record_len(&self) -> Option<u64> {
        (HEADER_LEN as u64 + self.token_len as u64).checked_add(self.payload_len)
    }

    pub fn verify(&self, token: &[u8], payload: &[u8]) -> bool {
        token.len() as u64 == self.token_len as u64
            && payload.len() as u64 == self.payload_len
            && checksum(token, payload) == self.crc32
    }
}

pub fn checksum(token: &[u8], payload: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(token);
    hasher.update(payload);
    hasher.finalize()
}
