use clap::Parser;
use forkful::clock::SystemClock;
use forkful::config::Config;
use forkful::server::AppState;
use std::path::PathBuf;
use std::sync::Arc;

/// Forkful - recipe-discovery backend with multi-tier caching and
/// upstream quota management
#[derive(Parser, Debug)]
#[command(name = "forkful")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Test configuration and exit
    #[arg(long)]
    test: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging subsystem
    forkful::logging::init_subscriber().expect("Failed to initialize logging subsystem");

    let args = Args::parse();

    let config = Config::from_file(&args.config).unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::process::exit(1);
    });
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    if args.test {
        println!("Configuration OK");
        return Ok(());
    }

    tracing::info!(
        config_file = %args.config.display(),
        server_address = %config.server.listen_addr(),
        repository_configured = config.repository.is_configured(),
        video_search_configured = config.video_search.is_configured(),
        quota_daily_limit = config.quota.daily_limit,
        "Configuration loaded successfully"
    );

    let listen_addr = config.server.listen_addr();
    let state = AppState::new(config, Arc::new(SystemClock))?;
    state.start_sweepers();

    let app = forkful::server::router(state.clone());
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;

    tracing::info!(address = %listen_addr, "Starting Forkful server");

    let shutdown_state = state.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
            shutdown_state.shutdown();
        })
        .await?;

    Ok(())
}
