//! Minimal Distributed Chunk Store Library
//!
//! This library crate defines the modules of a small distributed file store.
//! It serves as the foundation for the binary executable (`main.rs`).
//!
//! ## Architecture Modules
//! Files are split into fixed-size chunks that live in per-node append-only archives;
//! a metadata service records which nodes hold which chunk.
//!
//! - **`naming`**: chunk tokens, the `(index, path)` identifiers of chunks.
//! - **`archive`**: the per-node append-only chunk store with an in-memory index.
//! - **`chunk`**: the chunk server and its single transfer slot, plus the
//!   `PeerConnector` used to reach other nodes' servers.
//! - **`metadata`**: the metadata service interface, its in-memory implementation,
//!   and the HTTP binding and client.
//! - **`transfer`**: `put` (publishing) and `get` (downloading with retries and
//!   ordered reassembly).
//! - **`node`**: identity, configuration, and the `DataManager` wiring a node together.
//! - **`shell`**: the command grammar and the client driving a node.

pub mod archive;
pub mod chunk;
pub mod error;
pub mod metadata;
pub mod naming;
pub mod node;
pub mod shell;
pub mod transfer;
