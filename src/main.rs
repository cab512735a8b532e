//! pooled-http command line.
//!
//! - `serve`: run the echo server (hot-reloading the config file if one is given)
//! - `demo`: run the canned request sequence against a target

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use pooled_http::config::watcher::ConfigWatcher;
use pooled_http::config::{load_config, ClientConfig};
use pooled_http::demo::{scenario, EchoServer, Mode};
use pooled_http::lifecycle::{signals, Shutdown};
use pooled_http::observability::{logging, metrics};
use pooled_http::{Outcome, TransportManager};

#[derive(Parser)]
#[command(name = "pooled-http")]
#[command(about = "Pooled HTTP client demo and echo server", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the echo server
    Serve {
        /// Override server.bind_address
        #[arg(long)]
        bind: Option<String>,
    },
    /// Send the demo requests to a running echo server
    Demo {
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        target: String,

        #[arg(long, value_enum, default_value_t = Mode::Blocking)]
        mode: Mode,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };

    logging::init_tracing(&config.observability.log_level);
    tracing::info!("pooled-http v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Serve { bind } => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(serve(config, cli.config, bind))
        }
        Commands::Demo { target, mode } => {
            let manager = Arc::new(TransportManager::new(config.transport));
            let results = scenario::run(&manager, &target, mode);

            for result in &results {
                match &result.outcome {
                    Outcome::Completed(response) => println!("{:<12} {}", result.name, response),
                    Outcome::Failed(e) => println!("{:<12} error: {}", result.name, e),
                    Outcome::Cancelled => println!("{:<12} cancelled", result.name),
                }
            }
            Ok(())
        }
    }
}

async fn serve(
    config: ClientConfig,
    config_path: Option<PathBuf>,
    bind: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let manager = Arc::new(TransportManager::new(config.transport.clone()));
    let shutdown = Shutdown::new();
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    // Kept alive for the lifetime of the server.
    let _watcher = match config_path {
        Some(path) => {
            let (watcher, mut updates) = ConfigWatcher::new(&path, config.clone());
            let watcher = watcher.run()?;
            let manager = manager.clone();
            let mut stop = shutdown.subscribe();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        Some(transport) = updates.recv() => manager.reconfigure(transport),
                        _ = stop.recv() => break,
                        else => break,
                    }
                }
            });
            Some(watcher)
        }
        None => None,
    };

    let bind_address = bind.unwrap_or(config.server.bind_address.clone());
    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    EchoServer::new(&config.server, manager)
        .run(listener, shutdown.subscribe())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
