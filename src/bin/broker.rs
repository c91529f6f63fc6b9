//! QueueKV Broker Binary
//!
//! Hosts a FIFO queue over TCP for producers and consumers.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use queuekv::config::WalSyncStrategy;
use queuekv::network::Server;
use queuekv::{logging, Config, MemoryQueue};

/// QueueKV Broker
#[derive(Parser, Debug)]
#[command(name = "queuekv-broker")]
#[command(about = "FIFO queue broker for QueueKV")]
#[command(version)]
struct Args {
    /// Queue name to host
    #[arg(short, long, default_value = "queuekv.fifo")]
    queue: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7070")]
    listen: String,

    /// Journal file; queue is memory-only when omitted
    #[arg(short, long)]
    journal: Option<PathBuf>,

    /// fsync the journal after every write
    #[arg(long)]
    sync_every_write: bool,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "64")]
    max_connections: usize,
}

fn main() {
    if let Err(e) = logging::init(None, "info,queuekv=debug") {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let args = Args::parse();

    let sync_strategy = if args.sync_every_write {
        WalSyncStrategy::EveryWrite
    } else {
        WalSyncStrategy::EveryNEntries { count: 100 }
    };

    let mut builder = Config::builder()
        .queue_name(&args.queue)
        .broker_addr(&args.listen)
        .max_connections(args.max_connections)
        .journal_sync_strategy(sync_strategy);
    if let Some(journal) = &args.journal {
        builder = builder.journal_path(journal);
    }
    let config = builder.build();

    if let Err(e) = config.validate() {
        tracing::error!("{}", e);
        std::process::exit(1);
    }

    tracing::info!("QueueKV Broker v{}", queuekv::VERSION);

    let queue = match &config.journal_path {
        Some(path) => {
            tracing::info!("Journal: {}", path.display());
            MemoryQueue::open(&config.queue_name, path, config.journal_sync_strategy)
        }
        None => Ok(MemoryQueue::new(&config.queue_name)),
    };
    let queue = match queue {
        Ok(queue) => Arc::new(queue),
        Err(e) => {
            tracing::error!("Failed to open queue: {}", e);
            std::process::exit(1);
        }
    };

    let server = match Server::bind(config, queue) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to bind: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.shutdown_handle().trigger_on_signal() {
        tracing::error!("{}", e);
        std::process::exit(1);
    }

    if let Err(e) = server.run() {
        tracing::error!("Broker error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Broker stopped");
}
