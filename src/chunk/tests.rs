//! Chunk Service Tests
//!
//! Exercises the transfer slot state machine (`Idle -> Serving -> Idle`) directly on
//! a `ChunkServer`. HTTP round-trips are covered by the integration tests.

#[cfg(test)]
mod tests {
    use crate::archive::Archive;
    use crate::chunk::protocol::{ServeOutcome, TransferId};
    use crate::chunk::server::ChunkServer;
    use crate::naming::ChunkToken;
    use std::sync::Arc;
    use std::time::Duration;

    fn server_with(
        chunks: &[(ChunkToken, &str)],
        lease: Option<Duration>,
    ) -> (tempfile::TempDir, Arc<ChunkServer>) {
        let dir = tempfile::tempdir().unwrap();
        let archive = Archive::create(dir.path().join("store")).unwrap();
        for (token, bytes) in chunks {
            archive.append(token, bytes.as_bytes()).unwrap();
        }
        (dir, ChunkServer::new(Arc::new(archive), lease))
    }

    const FIRST: TransferId = TransferId(1);
    const SECOND: TransferId = TransferId(2);
    const THIRD: TransferId = TransferId(3);

    // ============================================================
    // SERVE / RELEASE
    // ============================================================

    #[test]
    fn test_serve_found_chunk() {
        let token = ChunkToken::new(0, "f");
        let (_dir, server) = server_with(&[(token.clone(), "chunk bytes")], None);

        let outcome = server.serve_chunk(&token, FIRST);

        assert_eq!(outcome, ServeOutcome::Found(b"chunk bytes".to_vec()));
        assert!(outcome.holds_slot());
        assert!(server.is_serving());
    }

    #[test]
    fn test_serve_missing_chunk_still_takes_slot() {
        let (_dir, server) = server_with(&[], None);

        let outcome = server.serve_chunk(&ChunkToken::new(9, "absent"), FIRST);

        assert_eq!(outcome, ServeOutcome::NotFound);
        assert!(outcome.holds_slot());
        assert!(server.is_serving());
    }

    #[test]
    fn test_second_request_is_busy_until_release() {
        let token = ChunkToken::new(0, "f");
        let (_dir, server) = server_with(&[(token.clone(), "x")], None);

        // ARRANGE: first caller takes the slot
        assert!(matches!(server.serve_chunk(&token, FIRST), ServeOutcome::Found(_)));

        // ACT + ASSERT: everyone else is refused, even for chunks that do not exist
        assert_eq!(server.serve_chunk(&token, SECOND), ServeOutcome::Busy);
        assert_eq!(
            server.serve_chunk(&ChunkToken::new(1, "nope"), THIRD),
            ServeOutcome::Busy
        );
        assert!(!ServeOutcome::Busy.holds_slot());

        // Busy answers do not change state; one release frees the slot
        assert!(server.release_transfer(FIRST));
        assert!(!server.is_serving());
        assert!(matches!(server.serve_chunk(&token, SECOND), ServeOutcome::Found(_)));
    }

    #[test]
    fn test_release_after_not_found_frees_slot() {
        let (_dir, server) = server_with(&[], None);

        assert_eq!(server.serve_chunk(&ChunkToken::new(0, "a"), FIRST), ServeOutcome::NotFound);
        assert!(server.release_transfer(FIRST));

        assert_eq!(server.serve_chunk(&ChunkToken::new(0, "a"), SECOND), ServeOutcome::NotFound);
    }

    #[test]
    fn test_release_without_transfer_is_noop() {
        let (_dir, server) = server_with(&[], None);

        assert!(!server.release_transfer(FIRST));
        assert!(!server.release_transfer(FIRST));

        assert!(!server.is_serving());
        assert_eq!(server.serve_chunk(&ChunkToken::new(0, "a"), SECOND), ServeOutcome::NotFound);
        assert_eq!(server.serve_chunk(&ChunkToken::new(0, "a"), THIRD), ServeOutcome::Busy);
    }

    #[test]
    fn test_release_with_foreign_id_keeps_slot() {
        let token = ChunkToken::new(0, "f");
        let (_dir, server) = server_with(&[(token.clone(), "x")], None);
        assert!(server.serve_chunk(&token, FIRST).holds_slot());

        // ACT: a caller whose request was refused (or never arrived) releases anyway
        let released = server.release_transfer(SECOND);

        // ASSERT
        assert!(!released);
        assert!(server.is_serving());
        assert_eq!(server.serve_chunk(&token, THIRD), ServeOutcome::Busy);
        assert!(server.release_transfer(FIRST));
    }

    #[test]
    fn test_double_release_frees_slot_once() {
        let token = ChunkToken::new(0, "f");
        let (_dir, server) = server_with(&[(token.clone(), "x")], None);
        assert!(server.serve_chunk(&token, FIRST).holds_slot());
        assert!(server.release_transfer(FIRST));
        assert!(server.serve_chunk(&token, SECOND).holds_slot());

        // A repeated release of the finished transfer must not free the new one.
        assert!(!server.release_transfer(FIRST));

        assert_eq!(server.serve_chunk(&token, THIRD), ServeOutcome::Busy);
    }

    #[test]
    fn test_busy_is_immediate_under_concurrency() {
        let token = ChunkToken::new(0, "f");
        let (_dir, server) = server_with(&[(token.clone(), "x")], None);
        assert!(server.serve_chunk(&token, TransferId(0)).holds_slot());

        let handles: Vec<_> = (1..=16)
            .map(|i| {
                let server = server.clone();
                let token = token.clone();
                std::thread::spawn(move || server.serve_chunk(&token, TransferId(i)))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), ServeOutcome::Busy);
        }
    }

    #[test]
    fn test_only_one_of_many_concurrent_callers_wins() {
        let token = ChunkToken::new(0, "f");
        let (_dir, server) = server_with(&[(token.clone(), "x")], None);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let server = server.clone();
                let token = token.clone();
                std::thread::spawn(move || server.serve_chunk(&token, TransferId(i)))
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|outcome| outcome.holds_slot())
            .count();

        assert_eq!(winners, 1);
    }

    // ============================================================
    // LEASE
    // ============================================================

    #[test]
    fn test_without_lease_slot_is_never_reclaimed() {
        let (_dir, server) = server_with(&[], None);
        server.serve_chunk(&ChunkToken::new(0, "a"), FIRST);

        std::thread::sleep(Duration::from_millis(30));

        assert_eq!(server.serve_chunk(&ChunkToken::new(0, "a"), SECOND), ServeOutcome::Busy);
    }

    #[test]
    fn test_expired_lease_is_reclaimed() {
        let token = ChunkToken::new(0, "f");
        let (_dir, server) = server_with(&[(token.clone(), "x")], Some(Duration::from_millis(20)));

        assert!(server.serve_chunk(&token, FIRST).holds_slot());
        assert_eq!(server.serve_chunk(&token, SECOND), ServeOutcome::Busy);

        std::thread::sleep(Duration::from_millis(40));

        assert_eq!(server.serve_chunk(&token, SECOND), ServeOutcome::Found(b"x".to_vec()));
        assert!(server.is_serving());
    }

    #[test]
    fn test_late_release_after_reclaim_keeps_new_transfer_exclusive() {
        let token = ChunkToken::new(0, "f");
        let (_dir, server) = server_with(&[(token.clone(), "x")], Some(Duration::from_millis(20)));

        // ARRANGE: the first transfer overstays its lease and the second reclaims the slot
        assert!(server.serve_chunk(&token, FIRST).holds_slot());
        std::thread::sleep(Duration::from_millis(40));
        assert!(server.serve_chunk(&token, SECOND).holds_slot());

        // ACT: the stale transfer finally releases
        let released = server.release_transfer(FIRST);

        // ASSERT: the slot still belongs to the second transfer
        assert!(!released);
        assert!(server.is_serving());
        assert_eq!(server.serve_chunk(&token, THIRD), ServeOutcome::Busy);

        assert!(server.release_transfer(SECOND));
        assert!(server.serve_chunk(&token, THIRD).holds_slot());
    }

    // ============================================================
    // LISTING / LIFECYCLE
    // ============================================================

    #[test]
    fn test_list_local_chunks_includes_bootstrap() {
        let token = ChunkToken::new(3, "listed");
        let (_dir, server) = server_with(&[(token.clone(), "x")], None);

        let chunks = server.list_local_chunks().unwrap();
        assert!(chunks.contains(&token));
        assert!(chunks.contains(&Archive::bootstrap_token()));
        assert!(server.started());
    }

    #[tokio::test]
    async fn test_stop_wakes_waiter() {
        let (_dir, server) = server_with(&[], None);

        server.stop();

        tokio::time::timeout(Duration::from_secs(1), server.stopped())
            .await
            .expect("stop should resolve stopped()");
    }
}
