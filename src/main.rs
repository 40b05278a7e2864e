use chrono::Utc;
use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use gatehouse::config::Config;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::from_env()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    // Secrets come from the environment and are never logged.
    info!(
        database_url = %cfg.database_url,
        bind_addr = %cfg.bind_addr,
        session_ttl_days = cfg.session_ttl_days,
        loglevel = %cfg.loglevel,
        "starting gatehouse"
    );

    let pool = gatehouse::db::connect(&cfg.database_url).await?;
    let state = gatehouse::AppState::new(pool, &cfg);

    spawn_session_reaper(state.sessions.clone(), cfg.session_ttl(), cfg.reaper_interval());

    let app = gatehouse::gatehouse_router(state);
    let listener = TcpListener::bind(&cfg.bind_addr).await?;
    info!("HTTP server listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Periodically drop sessions past the TTL. Reads already treat them as
/// absent; this keeps the table bounded.
fn spawn_session_reaper(
    sessions: gatehouse::db::SessionStore,
    ttl: chrono::Duration,
    interval: std::time::Duration,
) {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(interval);
        loop {
            tick.tick().await;
            match sessions.purge_expired(Utc::now() - ttl).await {
                Ok(0) => {}
                Ok(purged) => info!(purged, "reaped expired sessions"),
                Err(e) => warn!(error = %e, "session reaper pass failed"),
            }
        }
    });
}
