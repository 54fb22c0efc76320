//! Transfer Module
//!
//! Moves file contents into and out of the cluster.
//!
//! - **`publisher`**: `put` splits a local file into chunks, archives them on this
//!   node and then registers the file with the metadata service.
//! - **`fetcher`**: `get` resolves the chunks this node lacks, downloads each from a
//!   randomly ordered list of holders (up to three trials) and reassembles the file
//!   from the local archive in ascending chunk order.
//!
//! Downloaded chunks are archived locally and announced, so every successful `get`
//! adds a replica.

pub mod fetcher;
pub mod publisher;

pub use fetcher::{Fetcher, MAX_TRIALS};
pub use publisher::{PutReport, Publisher};
