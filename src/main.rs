//! Entry point: load config, wire dependencies, and run the server.

use matilda::auth::{Argon2Hasher, JwtSecret};
use matilda::config::Config;
use matilda::db::{self, PgUserStore};
use matilda::{create_app, ensure_admin, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("config: {}", e))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db_pool = db::create_pool(&config.database_url).await?;
    db::ensure_schema(&db_pool).await?;

    let tokens = JwtSecret::new(
        config.jwt_secret.clone(),
        config.access_token_ttl_secs,
        config.refresh_token_ttl_secs,
    );
    let state = AppState::new(
        Arc::new(PgUserStore::new(db_pool)),
        Arc::new(Argon2Hasher::default()),
        Arc::new(tokens),
    );

    if let Some(admin) = &config.bootstrap_admin {
        ensure_admin(&state, admin)
            .await
            .map_err(|e| anyhow::anyhow!("bootstrap admin: {}", e))?;
    }

    let app = create_app(state);

    tracing::info!(addr = %config.server_addr, "listening");
    let listener = tokio::net::TcpListener::bind(config.server_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
