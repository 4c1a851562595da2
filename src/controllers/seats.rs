use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::{error::ReservationError, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/seats", get(list_seats))
        .route("/venue", get(get_venue))
}

// GET /api/seats — только удерживаемые и проданные места
async fn list_seats(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ReservationError> {
    let seats = state.seats.list_seats().await?;
    Ok((StatusCode::OK, Json(seats)))
}

// GET /api/venue — файл схемы зала как есть
async fn get_venue(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        state.venue.raw(),
    )
}
