//! Backend entry-point: loads settings, prepares storage and serves the API.

mod server;

use std::sync::Arc;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use segments_backend::config::AppSettings;
use segments_backend::inbound::http::health::HealthState;
use segments_backend::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use segments_backend::outbound::reports::CsvReportDirectory;
use server::{PoolProbe, ServerConfig, create_server};

fn io_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(format!("{context}: {err}"))
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load().map_err(|err| io_error("load settings", err))?;
    let bind_addr = settings
        .bind_addr()
        .map_err(|err| io_error("settings", err))?;
    let expiry = settings
        .expiry_policy()
        .map_err(|err| io_error("settings", err))?;
    let reports = CsvReportDirectory::open(settings.reports_dir())
        .map_err(|err| io_error("open reports directory", err))?;
    info!(reports_dir = %reports.root().display(), "report directory ready");

    let mut config = ServerConfig::new(bind_addr, reports).with_expiry_policy(expiry);
    let mut health = HealthState::new();

    match settings.database_url() {
        Some(url) => {
            if settings.run_migrations() {
                run_migrations(url)
                    .await
                    .map_err(|err| io_error("migrations", err))?;
            }
            let pool = DbPool::new(
                PoolConfig::new(url)
                    .with_max_size(settings.pool_max_size())
                    .with_min_idle(settings.pool_min_idle()),
            )
            .await
            .map_err(|err| io_error("database pool", err))?;
            pool.ping().await.map_err(|err| io_error("database ping", err))?;
            info!(max_size = settings.pool_max_size(), "database pool ready");
            health = health.with_dependency(Arc::new(PoolProbe(pool.clone())));
            config = config.with_db_pool(pool);
        }
        None => warn!("no database url configured; using the in-memory store"),
    }

    let health_state = web::Data::new(health);
    let server = create_server(health_state.clone(), config)?;
    let result = server.await;
    health_state.mark_unhealthy();
    result
}
