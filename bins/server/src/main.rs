//! Comptoir API Server
//!
//! Main entry point for the Comptoir billing and inventory backend.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use comptoir_api::{AppState, create_router};
use comptoir_core::auth::{AdminCredentials, hash_password};
use comptoir_db::connect;
use comptoir_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "comptoir=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect to database
    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    // Admin credential; falls back to a development password when unset
    let password_hash = if config.auth.password_hash.is_empty() {
        warn!("auth.password_hash is not set; using development password \"change-me\"");
        hash_password("change-me")?
    } else {
        config.auth.password_hash.clone()
    };
    let admin = AdminCredentials::new(config.auth.username.clone(), password_hash);

    // Session token service
    let jwt = JwtService::new(JwtConfig {
        secret: config.auth.token_secret.clone(),
        token_expires_hours: config.auth.token_expiry_hours,
    });

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        jwt: Arc::new(jwt),
        admin: Arc::new(admin),
        tax_rate: config.billing.tax_rate,
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
