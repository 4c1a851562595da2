//! Журнал заказов: долговременная запись проданных мест.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Order, SeatId};

pub mod memory;
pub mod postgres;

pub use self::memory::InMemoryOrderLedger;
pub use self::postgres::PgOrderLedger;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("seat {0} already has an order")]
    DuplicateSeat(String),
    #[error("order ledger error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("order ledger unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait OrderLedger: Send + Sync {
    /// Записывает заказ и возвращает его id. Повторный заказ на то же место —
    /// [`LedgerError::DuplicateSeat`].
    async fn append(&self, seat: &SeatId, holder_id: &str, amount: i32) -> Result<i64, LedgerError>;

    async fn find_by_seat(&self, seat: &SeatId) -> Result<Option<Order>, LedgerError>;

    /// Все заказы, без гарантий порядка.
    async fn list_all(&self) -> Result<Vec<Order>, LedgerError>;
}
