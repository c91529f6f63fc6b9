//! QueueKV Server Binary
//!
//! Runs the consumer: drains the command queue into the in-memory store
//! and logs every result.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use queuekv::{logging, Config, Consumer, QueueTransport, TcpQueue};

/// QueueKV Server
#[derive(Parser, Debug)]
#[command(name = "queuekv-server")]
#[command(about = "Consumes key-value commands from a FIFO queue")]
#[command(version)]
struct Args {
    /// JSON config file (queueName, logFileName, ...)
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Broker address (host:port), overrides the config file
    #[arg(short, long)]
    broker: Option<String>,

    /// Worker threads, overrides the config file
    #[arg(short, long)]
    workers: Option<usize>,

    /// Log file, overrides the config file
    #[arg(short, long)]
    log_file: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    let mut config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(broker) = args.broker {
        config.broker_addr = broker;
    }
    if let Some(workers) = args.workers {
        config.worker_count = workers;
    }
    if let Some(log_file) = args.log_file {
        config.log_file = Some(log_file);
    }

    if let Err(e) = logging::init(config.log_file.as_deref(), "info,queuekv=info") {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    tracing::info!("QueueKV Server v{}", queuekv::VERSION);
    tracing::info!("Queue: {} via broker {}", config.queue_name, config.broker_addr);

    let transport = Arc::new(TcpQueue::new(&config.broker_addr, &config.queue_name));
    if let Err(e) = transport.probe() {
        tracing::error!("Queue {} is not reachable: {}", config.queue_name, e);
        std::process::exit(1);
    }

    let consumer = match Consumer::new(config, transport) {
        Ok(consumer) => consumer,
        Err(e) => {
            tracing::error!("Failed to start consumer: {}", e);
            std::process::exit(1);
        }
    };

    // Ctrl+C / SIGTERM stops receiving and drains in-flight messages
    if let Err(e) = consumer.shutdown_handle().trigger_on_signal() {
        tracing::error!("{}", e);
        std::process::exit(1);
    }

    if let Err(e) = consumer.run() {
        tracing::error!("Consumer error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
