//! Metadata & Naming Module
//!
//! The metadata service maps a DFS path to its file record (size, chunk count,
//! holders of every chunk) and is told about every new replica. Chunk placement is
//! entirely driven by it: nodes only ever learn where a chunk lives by asking.
//!
//! ## Submodules
//! - **`service`**: the `MetadataService` trait consumed by publishers and fetchers,
//!   plus `MetadataHandle`, which lets a node switch backends at runtime.
//! - **`memory`**: `LocalMetadata`, an in-memory implementation a node can host.
//! - **`protocol`** / **`handlers`**: the HTTP binding of `LocalMetadata`.
//! - **`client`**: `RemoteMetadata`, the HTTP client for a hosted service.

pub mod client;
pub mod handlers;
pub mod memory;
pub mod protocol;
pub mod service;
pub mod types;
