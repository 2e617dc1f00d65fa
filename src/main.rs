use anyhow::Context;
use edge_gate::{
    AppState, Upstream,
    config::{AppConfig, Env},
    create_router,
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, initialises logging, builds the gate and the upstream
/// forwarder, then serves until the process is stopped.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Configuration (fail-fast). A local .env file is honoured when present.
    dotenv::dotenv().ok();
    let config = AppConfig::load().context("invalid gate configuration")?;

    // 2. Logging. RUST_LOG wins; otherwise a sensible default for the gate.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "edge_gate=debug,tower_http=info".into());

    // 3. Pretty output locally, JSON for log aggregation in production.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Edge gate starting in {:?} mode", config.env);

    if config.gate.jwt_secret.is_none() {
        // Structural decoding trusts whoever set the cookie.
        tracing::warn!(
            "GATE_JWT_SECRET is not set: session token signatures will not be verified"
        );
    }

    // 4. Upstream page renderer.
    let upstream = Upstream::new(&config.upstream_url).context("invalid UPSTREAM_URL")?;
    tracing::info!(upstream = %upstream.base_url(), "Forwarding allowed requests");

    // 5. State and router.
    let bind_addr = config.bind_addr;
    let app = create_router(AppState::new(config), upstream.into_router());

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("Listening on {}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
