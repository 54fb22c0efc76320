use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::{Notify, OwnedSemaphorePermit, Semaphore};

use super::protocol::{ServeOutcome, TransferId};
use crate::archive::Archive;
use crate::error::DfsResult;
use crate::naming::ChunkToken;

/// A taken transfer slot. Dropping it frees the slot.
#[derive(Debug)]
struct HeldTransfer {
    _permit: OwnedSemaphorePermit,
    id: TransferId,
    since: Instant,
    token: ChunkToken,
}

/// Serves archived chunks with at most one outbound transfer at a time.
#[derive(Debug)]
pub struct ChunkServer {
    archive: Arc<Archive>,
    slot: Arc<Semaphore>,
    held: Mutex<Option<HeldTransfer>>,
    lease: Option<Duration>,
    shutdown: Notify,
}

impl ChunkServer {
    pub fn new(archive: Arc<Archive>, lease: Option<Duration>) -> Arc<Self> {
        Arc::new(Self {
            archive,
            slot: Arc::new(Semaphore::new(1)),
            held: Mutex::new(None),
            lease,
            shutdown: Notify::new(),
        })
    }

    fn held(&self) -> MutexGuard<'_, Option<HeldTransfer>> {
        // The guarded value is a plain Option; a panic elsewhere cannot leave it torn.
        self.held.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Tries to take the transfer slot for `transfer` without waiting, then looks
    /// the token up.
    pub fn serve_chunk(&self, token: &ChunkToken, transfer: TransferId) -> ServeOutcome {
        {
            let mut held = self.held();
            let permit = match self.slot.clone().try_acquire_owned() {
                Ok(permit) => permit,
                Err(_) => match self.reclaim_expired(&mut held) {
                    Some(permit) => permit,
                    None => {
                        tracing::debug!("Busy: refusing {} while serving another chunk", token);
                        return ServeOutcome::Busy;
                    }
                },
            };

            *held = Some(HeldTransfer {
                _permit: permit,
                id: transfer,
                since: Instant::now(),
                token: token.clone(),
            });
        }

        match self.archive.read(token) {
            Some(bytes) => {
                tracing::debug!("Serving {} ({} bytes)", token, bytes.len());
                ServeOutcome::Found(bytes)
            }
            None => {
                tracing::debug!("Requested chunk {} is not stored here", token);
                ServeOutcome::NotFound
            }
        }
    }

    fn reclaim_expired(&self, held: &mut Option<HeldTransfer>) -> Option<OwnedSemaphorePermit> {
        let lease = self.lease?;
        let expired = held
            .as_ref()
            .map(|transfer| transfer.since.elapsed() >= lease)
            .unwrap_or(false);

        if !expired {
            return None;
        }

        if let Some(stale) = held.take() {
            tracing::warn!(
                "Reclaiming transfer slot held by {} for {:?} (chunk {}, lease {:?})",
                stale.id,
                stale.since.elapsed(),
                stale.token,
                lease
            );
        }
        self.slot.clone().try_acquire_owned().ok()
    }

    /// Frees the transfer slot if `transfer` is the one holding it.
    ///
    /// Releases for any other id (a transfer whose slot was reclaimed, or a request
    /// that never took the slot) are ignored. Returns whether the slot was freed.
    pub fn release_transfer(&self, transfer: TransferId) -> bool {
        let mut held = self.held();
        let holder = held.as_ref().map(|current| current.id);

        match holder {
            Some(id) if id == transfer => {
                if let Some(done) = held.take() {
                    tracing::debug!(
                        "Transfer {} of {} released after {:?}",
                        transfer,
                        done.token,
                        done.since.elapsed()
                    );
                }
                true
            }
            Some(id) => {
                tracing::warn!(
                    "Ignoring release of transfer {}: the slot belongs to {}",
                    transfer,
                    id
                );
                false
            }
            None => {
                tracing::debug!("Ignoring release of transfer {}: no transfer in progress", transfer);
                false
            }
        }
    }

    pub fn is_serving(&self) -> bool {
        self.held().is_some()
    }

    pub fn list_local_chunks(&self) -> DfsResult<BTreeSet<ChunkToken>> {
        self.archive.list()
    }

    pub fn started(&self) -> bool {
        true
    }

    pub fn stop(&self) {
        tracing::info!("Chunk service stop requested");
        self.shutdown.notify_one();
    }

    /// Resolves once `stop` has been called.
    pub async fn stopped(&self) {
        self.shutdown.notified().await;
    }
}
