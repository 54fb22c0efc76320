//! Chunk Service
//!
//! Exposes this node's archived chunks to remote peers.
//!
//! ## Transfer Protocol
//! 1. A peer picks a fresh `TransferId` and calls `serve_chunk(token, transfer)`. If
//!    another transfer holds the node's single **transfer slot**, the answer is `Busy`
//!    immediately and the archive is not touched.
//! 2. Otherwise the slot is taken and the answer is `NotFound` or `Found(bytes)`.
//!    The slot stays held after the response.
//! 3. The peer must call `release_transfer(transfer)` after any non-`Busy` answer, and
//!    after a failed exchange, whose request may have taken the slot anyway. Only
//!    the id holding the slot can free it; other releases are ignored.
//!
//! Only one outbound transfer runs at a time, so a busy node never shares its link
//! between callers. A peer that never releases starves the node; an optional lease
//! reclaims such a slot.
//!
//! ## Submodules
//! - **`server`**: `ChunkServer`, the slot state machine on top of the archive.
//! - **`protocol`**: endpoints and DTOs of the HTTP binding.
//! - **`handlers`**: axum handlers exposing a `ChunkServer`.
//! - **`client`**: the `PeerConnector` seam used by downloaders, and its HTTP implementation.

pub mod client;
pub mod handlers;
pub mod protocol;
pub mod server;

#[cfg(test)]
mod tests;
