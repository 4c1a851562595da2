use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seat_reservation::{
    build_router,
    config::{AppConfig, Config, LogFormat},
    database::Database,
    ledger::{OrderLedger, PgOrderLedger},
    lock_store::{LockStore, RedisLockStore},
    models::Venue,
    redis_client::RedisClient,
    services::CleanupService,
    AppState,
};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn init_tracing(app: &AppConfig) {
    let registry = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&app.rust_log));

    match app.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    init_tracing(&config.app);

    info!(environment = %config.app.environment, "Starting seat reservation service");

    // Схема зала нужна до приёма запросов
    let venue = Venue::load(&config.venue.layout_path, config.venue.default_price)
        .await
        .context("Failed to load venue layout")?;
    info!(sections = venue.layout().sections.len(), "Venue layout loaded");

    // Журнал заказов
    let db = Database::connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    db.run_migrations().await.context("Failed to run migrations")?;
    db.ping().await.context("Database did not answer SELECT 1")?;
    info!("Database connected");

    // Хранилище блокировок
    let redis = RedisClient::new(&config.redis.url)
        .await
        .context("Failed to connect to Redis")?;
    redis.ping().await.context("Redis did not answer PING")?;
    info!("Redis connected");

    let locks: Arc<dyn LockStore> = Arc::new(RedisLockStore::new(redis));
    let ledger: Arc<dyn OrderLedger> = Arc::new(PgOrderLedger::new(db));

    // --- Start background tasks ---
    if config.cleanup.interval_secs > 0 {
        CleanupService::new(locks.clone(), ledger.clone())
            .spawn(Duration::from_secs(config.cleanup.interval_secs));
    }

    let state = AppState::new(&config.reservation, locks, ledger, venue);
    let app = build_router(state);

    // --- Start the web server ---
    let addr: SocketAddr = format!("{}:{}", config.app.host, config.app.port)
        .parse()
        .context("HOST/PORT do not form a socket address")?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
