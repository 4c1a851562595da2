pub mod reservations;
pub mod seats;
pub mod ws;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(reservations::routes())
        .merge(seats::routes())
}
