use rust_wallet_gateway::config::Config;
use rust_wallet_gateway::gateway::Gateway;
use rust_wallet_gateway::handlers::AppState;
use rust_wallet_gateway::api::server;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the gateway server.
///
/// Initializes logging, loads configuration, builds the ledger client and
/// serves the gateway with CORS, tracing and per-IP rate limiting.
///
/// # Returns
///
/// * `anyhow::Result<()>` - Ok if the server runs successfully, or an error if initialization fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_wallet_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // A missing key is not fatal here: each request answers 500 instead
    let gateway = Gateway::from_config(&config)?;
    if config.mono_api_key.is_some() {
        tracing::info!("✓ Ledger client initialized: {}", config.mono_base_url);
    }

    let app_state = Arc::new(AppState::new(config.clone(), gateway));
    let app = server::build_router(app_state, true)?;

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
