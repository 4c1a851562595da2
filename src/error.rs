//! Ошибки операций с местами и их отображение в HTTP-ответы.
//!
//! | Класс | Варианты | Код |
//! |---|---|---|
//! | некорректный запрос | `InvalidSeatId`, `Validation`, `NotHeld` | 400 |
//! | место занято | `AlreadyHeld`, `AlreadySold` | 409 |
//! | чужое место | `NotOwner` | 403 |
//! | инфраструктура | `Store`, `Ledger`, `Commit` | 500 |

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::ledger::LedgerError;
use crate::lock_store::StoreError;
use crate::models::SeatIdError;

#[derive(Debug, Error)]
pub enum ReservationError {
    #[error(transparent)]
    InvalidSeatId(#[from] SeatIdError),
    #[error("{0}")]
    Validation(String),
    #[error("Seat {0} is already held by another user")]
    AlreadyHeld(String),
    #[error("Seat {0} is already sold")]
    AlreadySold(String),
    /// Покупка без удержания: блокировки нет или она истекла.
    #[error("Seat not held")]
    NotHeld,
    #[error("{0}")]
    NotOwner(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Ledger(LedgerError),
    /// Заказ не записан; блокировка при этом не тронута.
    #[error("failed to record order: {0}")]
    Commit(#[source] LedgerError),
}

impl ReservationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidSeatId(_) | Self::Validation(_) | Self::NotHeld => StatusCode::BAD_REQUEST,
            Self::AlreadyHeld(_) | Self::AlreadySold(_) => StatusCode::CONFLICT,
            Self::NotOwner(_) => StatusCode::FORBIDDEN,
            Self::Store(_) | Self::Ledger(_) | Self::Commit(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct FailureBody {
    status: &'static str,
    message: String,
}

impl IntoResponse for ReservationError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Детали инфраструктурных ошибок только в лог
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            match self {
                Self::Commit(_) => "Failed to process order".to_string(),
                _ => "Internal Server Error".to_string(),
            }
        } else {
            self.to_string()
        };

        (status, Json(FailureBody { status: "fail", message })).into_response()
    }
}
