//! VaultWolf Bloomberg API Server
//!
//! A REST API server over the `vault-wolf-blpapi` client, serving
//! historical, reference and intraday bar data as decoded JSON. Responses
//! are played back from a replay script of provider events.

mod manager;
mod models;
mod web;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use vault_wolf_blpapi::{ClientConfig, ReplayScript, ReplaySessionProvider, SessionOptions};

/// VaultWolf Bloomberg API Server.
#[derive(Parser, Debug)]
#[command(name = "vault-wolf-bbg", version = "1.0.0")]
struct Args {
    /// Bloomberg API host
    #[arg(long = "bbg-host", default_value = "localhost")]
    bbg_host: String,

    /// Bloomberg API port
    #[arg(long = "bbg-port", default_value_t = 8194)]
    bbg_port: u16,

    /// Web server port
    #[arg(long = "web-port", default_value_t = 5000)]
    web_port: u16,

    /// JSON replay script of provider events, keyed by request kind
    #[arg(long = "replay")]
    replay: PathBuf,

    /// Overall timeout per request, in seconds
    #[arg(long = "request-timeout-secs", default_value_t = 30)]
    request_timeout_secs: u64,
}

fn print_banner() {
    println!("========================================");
    println!("   VaultWolf Bloomberg API Server");
    println!("   Version 1.0.0  (Rust)");
    println!("========================================");
    println!();
}

fn print_endpoints(port: u16) {
    println!();
    println!("========================================");
    println!("   VaultWolf Server is READY!");
    println!("========================================");
    println!();
    println!("API Endpoints:");
    println!("  Health Check:     GET  http://localhost:{port}/health");
    println!();
    println!("  Bloomberg Data:");
    println!("    Historical:     GET  http://localhost:{port}/api/bbg/historical?tickers=SPX%20Index&fields=PX_LAST&start=2024-01-02&end=2024-01-31");
    println!("    Reference:      GET  http://localhost:{port}/api/bbg/reference?tickers=AAPL%20US%20Equity&fields=PX_LAST,NAME");
    println!("    Intraday Bars:  GET  http://localhost:{port}/api/bbg/intraday?ticker=IBM%20US%20Equity&interval=5&start=2024-05-01T09:30:00&end=2024-05-01T16:00:00");
    println!();
    println!("Press Ctrl+C to stop the server...");
    println!();
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    print_banner();

    let script = match ReplayScript::from_path(&args.replay) {
        Ok(script) => script,
        Err(e) => {
            eprintln!("Failed to load replay script {}!", args.replay.display());
            eprintln!("  Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let config = ClientConfig {
        session: SessionOptions::new(args.bbg_host.clone(), args.bbg_port),
        ..ClientConfig::default()
    };
    let manager = manager::BbgManager::new(
        ReplaySessionProvider::new(script),
        config,
        Duration::from_secs(args.request_timeout_secs),
    );
    println!(
        "Serving Bloomberg data for {}:{} from {}",
        args.bbg_host,
        args.bbg_port,
        args.replay.display()
    );

    let shared_manager = Arc::new(manager);

    // Set up graceful shutdown
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let shutdown_tx = Arc::new(std::sync::Mutex::new(Some(shutdown_tx)));

    let handler = ctrlc::set_handler(move || {
        println!("\nReceived Ctrl+C, shutting down gracefully...");
        let mut guard = shutdown_tx
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(tx) = guard.take() {
            let _ = tx.send(());
        }
    });
    if let Err(e) = handler {
        eprintln!("Failed to set Ctrl+C handler: {e}");
        return ExitCode::FAILURE;
    }

    // Build router
    let app = web::create_router(shared_manager);

    print_endpoints(args.web_port);

    // Start server
    let addr = format!("0.0.0.0:{}", args.web_port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Failed to bind to {addr}: {e}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("Listening on {addr}");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .await;
    if let Err(e) = served {
        eprintln!("Server error: {e}");
        return ExitCode::FAILURE;
    }

    println!("Shutdown complete. Goodbye!");
    ExitCode::SUCCESS
}
