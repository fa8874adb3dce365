use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use curagenie_backend_lib::{config::Settings, router, storage::SqliteStorage, AppState};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// CuraGenie authentication service
#[derive(Parser)]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the configured bind address
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load_from(&cli.config)?;
    if let Some(bind) = cli.bind {
        settings.bind_addr = bind;
    }

    // RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.log_level.clone())),
        )
        .init();

    // Open the database and make sure the schema exists
    let storage = SqliteStorage::connect(&settings.database_url, settings.max_db_connections).await?;
    storage.init_schema().await?;

    // Create application state and start the background cleanup
    let state = AppState::new(Arc::new(storage), settings);
    state.start_sweeper();

    let app = router::create_router(state.clone());

    let addr = state.settings.bind_addr;
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on {addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
