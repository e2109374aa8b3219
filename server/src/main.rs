// storefront_server/src/main.rs

mod config;
mod db;
mod errors;
mod state;
mod web;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::state::AppState;

use actix_web::HttpServer;
use anyhow::Context;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // RUST_LOG override
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting storefront server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(e.into());
    }
  };
  tracing::debug!(config = ?app_config, "Configuration loaded.");

  let app_state = match app_config.database_url.as_deref() {
    Some(url) => {
      let pool = PgPool::connect(url).await.map_err(AppError::from)?;
      tracing::info!("Connected to the database.");
      sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(AppError::from)?;
      tracing::info!("Migrations applied.");
      AppState::postgres(pool, app_config.clone())
    }
    None => {
      tracing::warn!("DATABASE_URL not set; using in-memory stores. Data is lost on shutdown.");
      AppState::in_memory(app_config.clone())
    }
  };

  if app_config.seed_db {
    db::seed::seed_demo_data(&app_state).await?;
  }

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Binding server to {}...", server_address);

  HttpServer::new(move || web::build_app(app_state.clone()))
    .bind(&server_address)
    .with_context(|| format!("binding {}", server_address))?
    .run()
    .await?;
  Ok(())
}
