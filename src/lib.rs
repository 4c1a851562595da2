pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod ledger;
pub mod lock_store;
pub mod models;
pub mod redis_client;
pub mod services;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use config::ReservationConfig;
use ledger::OrderLedger;
use lock_store::LockStore;
use models::Venue;
use services::{BroadcastHub, HubHandle, ReservationCoordinator, SeatStateAggregator};

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub venue: Arc<Venue>,
    pub coordinator: ReservationCoordinator,
    pub seats: SeatStateAggregator,
    pub hub: HubHandle,
}

impl AppState {
    /// Собирает сервисы поверх переданных хранилищ и запускает хаб рассылки.
    pub fn new(
        reservation: &ReservationConfig,
        locks: Arc<dyn LockStore>,
        ledger: Arc<dyn OrderLedger>,
        venue: Venue,
    ) -> Arc<Self> {
        let venue = Arc::new(venue);
        let hub = BroadcastHub::spawn(reservation.ws_write_timeout());
        let coordinator = ReservationCoordinator::new(
            locks.clone(),
            ledger.clone(),
            venue.clone(),
            hub.clone(),
            reservation.hold_ttl(),
        );
        let seats = SeatStateAggregator::new(locks, ledger);

        Arc::new(Self { venue, coordinator, seats, hub })
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/ws", get(controllers::ws::ws_handler))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
