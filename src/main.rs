use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;

use chunkfs::chunk::client::HttpPeerConnector;
use chunkfs::chunk::server::ChunkServer;
use chunkfs::metadata::client::RemoteMetadata;
use chunkfs::metadata::handlers::metadata_router;
use chunkfs::metadata::memory::LocalMetadata;
use chunkfs::metadata::service::{MetadataHandle, MetadataService};
use chunkfs::node::config::{DEFAULT_CHUNK_PORT, DEFAULT_METADATA_PORT, ServeArgs, split_host_port};
use chunkfs::node::handlers::chunk_service_router;
use chunkfs::node::{DataManager, NodeName};
use chunkfs::shell::{self, NodeClient};

#[derive(Parser)]
#[command(name = "chunkfs", about = "Minimal distributed chunk store")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a storage node (chunk service and, optionally, the metadata service).
    Serve(ServeArgs),
    /// Drive a node interactively.
    Shell {
        #[arg(long, env = "DFS_NODE", default_value = "localhost")]
        node: String,
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
    /// Run a comma-separated list of commands against a node.
    Exec {
        #[arg(long, env = "DFS_NODE", default_value = "localhost")]
        node: String,
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
        commands: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => serve(args).await,
        Commands::Shell { node, timeout_secs } => {
            init_tracing(false);
            let client = NodeClient::new(&NodeName::new(node), Duration::from_secs(timeout_secs));
            shell::run_interactive(&client).await?;
            Ok(())
        }
        Commands::Exec {
            node,
            timeout_secs,
            commands,
        } => {
            init_tracing(false);
            let client = NodeClient::new(&NodeName::new(node), Duration::from_secs(timeout_secs));
            shell::run_batch(&client, &commands).await?;
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    init_tracing(args.verbose);
    let config = args.into_config();

    tracing::info!("Starting node {}", config.node);

    // 1. Metadata service (hosted here or reached over HTTP):
    let local_metadata: Arc<dyn MetadataService> = if config.host_metadata {
        let hosted = Arc::new(LocalMetadata::new());
        let listener =
            tokio::net::TcpListener::bind((config.bind_host.as_str(), config.metadata_port))
                .await
                .context("failed to bind the metadata port")?;
        tracing::info!("Metadata service listening on {}", listener.local_addr()?);

        let app = metadata_router(hosted.clone());
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Metadata service failed: {}", e);
            }
        });
        hosted
    } else {
        Arc::new(RemoteMetadata::new(
            "localhost",
            config.metadata_port,
            config.rpc_timeout,
        ))
    };

    let metadata = MetadataHandle::new(local_metadata);
    if let Some(address) = &config.metadata_remote {
        let (host, port) = split_host_port(address, DEFAULT_METADATA_PORT)?;
        let remote = Arc::new(RemoteMetadata::new(&host, port, config.rpc_timeout));
        if !metadata.use_remote(remote).await {
            tracing::warn!("Metadata service at {} not running, keeping local", address);
        }
    }

    // 2. Archive and chunk service:
    let peers = Arc::new(HttpPeerConnector::new(
        DEFAULT_CHUNK_PORT,
        config.rpc_timeout,
    ));
    let listener = tokio::net::TcpListener::bind((config.bind_host.as_str(), config.chunk_port))
        .await
        .context("failed to bind the chunk port")?;

    let manager = match DataManager::open(config, metadata, peers) {
        Ok(manager) => manager,
        Err(e) => {
            tracing::error!("Fatal: could not open the archive: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Node {} ready", manager.node());

    // 3. HTTP server:
    let server = manager.chunk_server();
    let app = chunk_service_router(manager);

    tracing::info!("Chunk service listening on {}", listener.local_addr()?);
    tracing::info!("Press Ctrl+C to shutdown");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(server))
        .await?;

    tracing::info!("Node stopped");
    Ok(())
}

async fn shutdown_signal(server: Arc<ChunkServer>) {
    tokio::select! {
        _ = server.stopped() => {},
        _ = tokio::signal::ctrl_c() => {},
    }
}
