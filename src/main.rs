use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use homefix_backend::{
    app::build_router,
    backend::SupabaseClient,
    config::{Config, ConfigError},
    middleware::AppState,
    services::{live_view, NotificationService},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "homefix_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting HomeFix Backend...");
    tracing::info!("Using backend at {}", config.supabase_url);

    let backend = Arc::new(SupabaseClient::new(&config));
    let state = AppState::new(config.clone(), backend, Arc::new(NotificationService::new()));

    tokio::spawn(live_view::run(
        state.live_view.clone(),
        state.backend.clone(),
        state.events.clone(),
        live_view::RESYNC_INTERVAL,
    ));

    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// The server verifies caller tokens, so the JWT secret is mandatory here.
fn load_config() -> Result<Config, ConfigError> {
    let config = Config::from_env()?;
    config.require_jwt_secret()?;
    Ok(config)
}
