// Change of Address - Web Server
// REST API with Axum

use anyhow::{Context, Result};
use change_of_address::api::{router, AppState};
use change_of_address::{init_tracing, AddressBook, Config, ServiceSuggester};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::load()?;

    // Open (and seed on first run) the JSON documents
    let book = AddressBook::open(&config.data_dir)?;
    tracing::info!(data_dir = %config.data_dir.display(), "data directory ready");

    let suggester = ServiceSuggester::from_config(&config.ai)?;
    if !suggester.is_configured() {
        tracing::warn!("no AI api key configured; service suggestions are disabled");
    }

    let app = router(AppState::new(book, suggester));

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server.bind_addr))?;

    tracing::info!(addr = %config.server.bind_addr, "server listening");

    axum::serve(listener, app)
        .await
        .context("Server terminated unexpectedly")?;

    Ok(())
}
