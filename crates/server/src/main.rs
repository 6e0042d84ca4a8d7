use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use chunkport_service::UploadService;
use chunkport_store::{ChunkStore, DEFAULT_MAX_CHUNK_SIZE};

/// Resumable chunked-upload server.
#[derive(Debug, Parser)]
#[command(name = "chunkport-server", version)]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "CHUNKPORT_LISTEN", default_value = "127.0.0.1:3000")]
    listen: SocketAddr,

    /// Storage root for chunks and finished artifacts.
    #[arg(long, env = "CHUNKPORT_ROOT", default_value = "uploads")]
    root: PathBuf,

    /// Maximum accepted chunk size in bytes.
    #[arg(long, env = "CHUNKPORT_MAX_CHUNK_SIZE", default_value_t = DEFAULT_MAX_CHUNK_SIZE)]
    max_chunk_size: usize,

    /// Bound on merge duration in seconds.
    #[arg(long, env = "CHUNKPORT_MERGE_TIMEOUT_SECS", default_value_t = 300)]
    merge_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let store = ChunkStore::new(&args.root).with_max_chunk_size(args.max_chunk_size);
    store.bootstrap()?;
    tracing::info!(root = %args.root.display(), "storage root ready");

    let service = Arc::new(
        UploadService::new(store)
            .with_merge_timeout(Duration::from_secs(args.merge_timeout_secs)),
    );

    chunkport_server::serve(args.listen, service).await?;
    Ok(())
}
