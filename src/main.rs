use anyhow::Context;
use imagesim::{create_router, init, load_provider, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init();

    let config = Config::from_env().context("loading configuration")?;

    // Loaded once, shared read-only by every request
    let provider = load_provider(&config).context("loading embedding model")?;
    log::info!(
        "Embedding provider {} ready ({} dimensions)",
        provider.name(),
        provider.dimension()
    );

    let addr = config.bind_addr;
    let app = create_router(AppState::new(config, provider));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    log::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
    }
}
