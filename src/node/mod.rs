//! Node Module
//!
//! Assembles one storage node: its identity, configuration, the `DataManager`
//! tying archive, chunk server, publisher and fetcher together, and the HTTP
//! routes served on the chunk port (peer protocol plus the shell's control API).

pub mod config;
pub mod handlers;
pub mod identity;
pub mod manager;
pub mod protocol;

pub use config::NodeConfig;
pub use identity::{NodeName, default_storage_path};
pub use manager::DataManager;
