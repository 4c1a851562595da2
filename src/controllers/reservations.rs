use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::{
    error::ReservationError,
    models::SeatId,
    services::ReleaseOutcome,
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/hold", post(hold_seat).delete(release_seat))
        .route("/purchase", post(purchase_seat))
}

/* ---------- helpers ---------- */

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct SeatRequest {
    #[validate(length(min = 1, max = 32))]
    seat_id: String,
    #[validate(length(min = 1, max = 128))]
    user_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SeatActionResponse {
    status: &'static str,
    message: &'static str,
    seat_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    amount: Option<i32>,
}

impl SeatActionResponse {
    fn success(message: &'static str, seat: &SeatId) -> Self {
        Self { status: "success", message, seat_id: seat.to_string(), order_id: None, amount: None }
    }
}

// Тело запроса -> (место, пользователь); любая ошибка разбора — 400
fn parse_request(
    payload: Result<Json<SeatRequest>, JsonRejection>,
) -> Result<(SeatId, String), ReservationError> {
    let Json(req) = payload.map_err(|e| {
        tracing::debug!("rejected request body: {}", e);
        ReservationError::Validation("Invalid body".to_string())
    })?;
    req.validate()
        .map_err(|e| ReservationError::Validation(format!("Invalid body: {}", e)))?;

    let seat = SeatId::parse(&req.seat_id)?;
    Ok((seat, req.user_id))
}

/* ---------- HOLDS ---------- */

// POST /api/hold
async fn hold_seat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SeatRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ReservationError> {
    let (seat, user_id) = parse_request(payload)?;
    state.coordinator.hold(&seat, &user_id).await?;

    Ok((StatusCode::OK, Json(SeatActionResponse::success("Seat held successfully", &seat))))
}

// DELETE /api/hold
async fn release_seat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SeatRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ReservationError> {
    let (seat, user_id) = parse_request(payload)?;
    let message = match state.coordinator.release(&seat, &user_id).await? {
        ReleaseOutcome::Released => "Seat released successfully",
        ReleaseOutcome::AlreadyReleased => "Seat already released",
    };

    Ok((StatusCode::OK, Json(SeatActionResponse::success(message, &seat))))
}

/* ---------- PURCHASE ---------- */

// POST /api/purchase
async fn purchase_seat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SeatRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ReservationError> {
    let (seat, user_id) = parse_request(payload)?;
    let receipt = state.coordinator.purchase(&seat, &user_id).await?;

    let response = SeatActionResponse {
        order_id: Some(receipt.order_id),
        amount: Some(receipt.amount),
        ..SeatActionResponse::success("Purchase successful", &seat)
    };
    Ok((StatusCode::OK, Json(response)))
}
