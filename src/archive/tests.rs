//! Archive Module Tests
//!
//! Validates durability and lookup semantics of the local chunk archive.
//!
//! ## Test Scopes
//! - **Bootstrap**: a fresh archive starts with the format marker record.
//! - **Append/Read**: bytes read back are exactly the bytes appended, across interleaved writers.
//! - **Duplicates**: the latest append of a token wins.
//! - **Recovery**: reopening rebuilds the index and drops torn records.
//! - **Corruption**: damaged records surface as `StorageCorruption` / not found.

#[cfg(test)]
mod tests {
    use crate::archive::record::{HEADER_LEN, RecordHeader};
    use crate::archive::{Archive, BOOTSTRAP_PATH, BOOTSTRAP_PAYLOAD};
    use crate::error::DfsError;
    use crate::naming::ChunkToken;
    use std::fs::OpenOptions;
    use std::io::{Seek, SeekFrom, Write};
    use std::sync::Arc;

    fn new_archive() -> (tempfile::TempDir, Archive) {
        let dir = tempfile::tempdir().unwrap();
        let archive = Archive::create(dir.path().join("dfs_store")).unwrap();
        (dir, archive)
    }

    // ============================================================
    // RECORD HEADER
    // ============================================================

    #[test]
    fn test_record_header_has_fixed_size() {
        let header = RecordHeader::for_entry(b"0/f", b"payload").unwrap();
        let encoded = header.encode().unwrap();

        assert_eq!(encoded.len(), HEADER_LEN);
        assert_eq!(RecordHeader::decode(&encoded).unwrap(), header);
        assert!(header.verify(b"0/f", b"payload"));
        assert!(!header.verify(b"0/f", b"PAYLOAD"));
    }

    #[test]
    fn test_record_header_rejects_bad_magic() {
        let mut encoded = RecordHeader::for_entry(b"0/f", b"x").unwrap().encode().unwrap();
        encoded[0] = b'X';

        assert!(matches!(
            RecordHeader::decode(&encoded),
            Err(DfsError::StorageCorruption(_))
        ));
    }

    // ============================================================
    // BOOTSTRAP
    // ============================================================

    #[test]
    fn test_fresh_archive_contains_bootstrap_record() {
        let (_dir, archive) = new_archive();

        let token = ChunkToken::new(0, BOOTSTRAP_PATH);
        assert_eq!(archive.len(), 1);
        assert!(archive.contains(&token));
        assert_eq!(archive.read(&token).unwrap(), b"DFS_STORAGE_v00\n");
        assert_eq!(BOOTSTRAP_PAYLOAD, b"DFS_STORAGE_v00\n");
    }

    #[test]
    fn test_create_truncates_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dfs_store");

        let first = Archive::create(&path).unwrap();
        first.append(&ChunkToken::new(0, "old"), b"old bytes").unwrap();
        drop(first);

        let second = Archive::create(&path).unwrap();
        assert!(!second.contains(&ChunkToken::new(0, "old")));
        assert_eq!(second.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_archive_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, archive) = new_archive();
        let mode = std::fs::metadata(archive.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    // ============================================================
    // APPEND / READ
    // ============================================================

    #[test]
    fn test_append_then_read_returns_exact_bytes() {
        let (_dir, archive) = new_archive();
        let token = ChunkToken::new(0, "notes.txt");

        archive.append(&token, b"hello world").unwrap();

        assert!(archive.contains(&token));
        assert_eq!(archive.read(&token).unwrap(), b"hello world");
    }

    #[test]
    fn test_read_unknown_token_is_none() {
        let (_dir, archive) = new_archive();
        let token = ChunkToken::new(4, "missing");

        assert!(archive.read(&token).is_none());
        assert!(archive.read_checked(&token).unwrap().is_none());
    }

    #[test]
    fn test_empty_payload_is_stored() {
        let (_dir, archive) = new_archive();
        let token = ChunkToken::new(0, "empty");

        archive.append(&token, b"").unwrap();
        assert_eq!(archive.read(&token).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_bytes_survive_unrelated_appends() {
        let (_dir, archive) = new_archive();
        let token = ChunkToken::new(0, "stable");
        archive.append(&token, b"stable payload").unwrap();

        for i in 0..50u64 {
            let other = ChunkToken::new(i, "noise");
            archive.append(&other, &vec![i as u8; 1000]).unwrap();
            assert_eq!(archive.read(&token).unwrap(), b"stable payload");
        }
    }

    #[test]
    fn test_list_is_snapshot_of_index() {
        let (_dir, archive) = new_archive();
        archive.append(&ChunkToken::new(1, "f"), b"b").unwrap();
        archive.append(&ChunkToken::new(0, "f"), b"a").unwrap();

        let listed = archive.list().unwrap();
        assert_eq!(listed.len(), 3);
        assert!(listed.contains(&ChunkToken::new(0, "f")));
        assert!(listed.contains(&ChunkToken::new(1, "f")));
        assert!(listed.contains(&Archive::bootstrap_token()));
    }

    #[test]
    fn test_duplicate_append_last_write_wins() {
        let (_dir, archive) = new_archive();
        let token = ChunkToken::new(0, "dup");

        archive.append(&token, b"first").unwrap();
        archive.append(&token, b"second").unwrap();

        assert_eq!(archive.read(&token).unwrap(), b"second");
        assert_eq!(archive.len(), 2);
    }

    #[test]
    fn test_concurrent_appends_are_serialized() {
        let (_dir, archive) = new_archive();
        let archive = Arc::new(archive);

        let handles: Vec<_> = (0..8u64)
            .map(|writer| {
                let archive = archive.clone();
                std::thread::spawn(move || {
                    for i in 0..20u64 {
                        let token = ChunkToken::new(i, &format!("writer-{}", writer));
                        let payload = vec![(writer * 20 + i) as u8; 4096];
                        archive.append(&token, &payload).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(archive.len(), 1 + 8 * 20);
        for writer in 0..8u64 {
            for i in 0..20u64 {
                let token = ChunkToken::new(i, &format!("writer-{}", writer));
                assert_eq!(
                    archive.read(&token).unwrap(),
                    vec![(writer * 20 + i) as u8; 4096]
                );
            }
        }
    }

    #[tokio::test]
    async fn test_append_owned_returns_buffer() {
        let (_dir, archive) = new_archive();
        let archive = Arc::new(archive);
        let token = ChunkToken::new(2, "async");

        let buffer = archive
            .clone()
            .append_owned(token.clone(), b"async bytes".to_vec())
            .await
            .unwrap();

        assert_eq!(buffer, b"async bytes");
        assert_eq!(archive.read(&token).unwrap(), b"async bytes");
    }

    // ============================================================
    // CORRUPTION
    // ============================================================

    #[test]
    fn test_damaged_payload_reports_corruption() {
        let (_dir, archive) = new_archive();
        let token = ChunkToken::new(0, "fragile");
        archive.append(&token, b"intact payload").unwrap();

        // Flip the last byte of the file, which belongs to this record's payload.
        let mut file = OpenOptions::new().write(true).open(archive.path()).unwrap();
        let len = file.metadata().unwrap().len();
        file.seek(SeekFrom::Start(len - 1)).unwrap();
        file.write_all(b"X").unwrap();
        file.sync_all().unwrap();

        assert!(matches!(
            archive.read_checked(&token),
            Err(DfsError::StorageCorruption(_))
        ));
        assert!(archive.read(&token).is_none());
    }

    // ============================================================
    // RECOVERY
    // ============================================================

    #[test]
    fn test_recover_rebuilds_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dfs_store");

        let archive = Archive::create(&path).unwrap();
        archive.append(&ChunkToken::new(0, "kept"), b"zero").unwrap();
        archive.append(&ChunkToken::new(1, "kept"), b"one").unwrap();
        archive.append(&ChunkToken::new(1, "kept"), b"one again").unwrap();
        drop(archive);

        let recovered = Archive::recover(&path).unwrap();
        assert_eq!(recovered.read(&ChunkToken::new(0, "kept")).unwrap(), b"zero");
        assert_eq!(recovered.read(&ChunkToken::new(1, "kept")).unwrap(), b"one again");
        assert_eq!(
            recovered.read(&Archive::bootstrap_token()).unwrap(),
            BOOTSTRAP_PAYLOAD
        );
    }

    #[test]
    fn test_recover_truncates_torn_tail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dfs_store");

        let archive = Archive::create(&path).unwrap();
        archive.append(&ChunkToken::new(0, "whole"), b"complete").unwrap();
        drop(archive);

        // Half a header, as left behind by a crash mid-append.
        let clean_len = std::fs::metadata(&path).unwrap().len();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&[0xAB; HEADER_LEN / 2]).unwrap();
        drop(file);

        let recovered = Archive::recover(&path).unwrap();
        assert_eq!(recovered.read(&ChunkToken::new(0, "whole")).unwrap(), b"complete");

        recovered.append(&ChunkToken::new(1, "whole"), b"after").unwrap();
        assert_eq!(recovered.read(&ChunkToken::new(1, "whole")).unwrap(), b"after");
        assert!(std::fs::metadata(&path).unwrap().len() > clean_len);
    }

    #[test]
    fn test_record_len_overflow_is_not_a_record() {
        let header = RecordHeader {
            magic: crate::archive::record::RECORD_MAGIC,
            token_len: u32::MAX,
            payload_len: u64::MAX - 8,
            crc32: 0,
        };

        assert_eq!(header.record_len(), None);
    }

    #[test]
    fn test_recover_stops_at_header_with_impossible_lengths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dfs_store");

        let archive = Archive::create(&path).unwrap();
        archive.append(&ChunkToken::new(0, "whole"), b"complete").unwrap();
        drop(archive);

        // ARRANGE: a well-formed magic followed by garbage lengths
        let clean_len = std::fs::metadata(&path).unwrap().len();
        let garbage = RecordHeader {
            magic: crate::archive::record::RECORD_MAGIC,
            token_len: u32::MAX,
            payload_len: u64::MAX - 8,
            crc32: 0,
        };
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&garbage.encode().unwrap()).unwrap();
        file.write_all(b"trailing junk").unwrap();
        drop(file);

        // ACT
        let recovered = Archive::recover(&path).unwrap();

        // ASSERT: the bogus record is cut off, earlier records survive
        assert_eq!(recovered.read(&ChunkToken::new(0, "whole")).unwrap(), b"complete");
        assert_eq!(recovered.len(), 2);
        let recovered_len = std::fs::metadata(&path).unwrap().len();
        let bootstrap_len = (HEADER_LEN + Archive::bootstrap_token().to_string().len()
            + BOOTSTRAP_PAYLOAD.len()) as u64;
        assert_eq!(recovered_len, clean_len + bootstrap_len);
    }

    #[test]
    fn test_recover_missing_file_creates_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh_store");

        let archive = Archive::recover(&path).unwrap();
        assert!(path.exists());
        assert_eq!(archive.len(), 1);
    }
}
