//! Local Archive
//!
//! Durable, append-only container holding this node's chunk bytes.
//!
//! ## Core Concepts
//! - **Records**: every `append` writes one immutable record (header, token, payload)
//!   at the end of a single file and syncs it before the token becomes visible.
//! - **Index**: an in-memory map from token to the location of its latest record.
//!   A token enters the index only after its bytes are on stable storage.
//! - **Exclusive access**: one coarse lock serializes appends, reads and listings.
//!   Outbound transfers are already throttled by the chunk server, so the lock
//!   only has to keep index updates and file appends atomic.
//! - **Duplicates**: appending an existing token adds a new record; reads return
//!   the most recent one (last write wins).

pub mod record;
pub mod store;

pub use store::{Archive, BOOTSTRAP_PATH, BOOTSTRAP_PAYLOAD};

#[cfg(test)]
mod tests;
