use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{LedgerError, OrderLedger};
use crate::models::{Order, SeatId};

/// Журнал заказов в памяти, с той же уникальностью по месту, что и
/// индекс `orders_seat_id_key` в Postgres.
#[derive(Debug, Default)]
pub struct InMemoryOrderLedger {
    orders: Mutex<Vec<Order>>,
    unavailable: AtomicBool,
}

impl InMemoryOrderLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn orders(&self) -> Result<MutexGuard<'_, Vec<Order>>, LedgerError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("in-memory ledger switched off".to_string()));
        }
        Ok(self.orders.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }
}

#[async_trait]
impl OrderLedger for InMemoryOrderLedger {
    async fn append(&self, seat: &SeatId, holder_id: &str, amount: i32) -> Result<i64, LedgerError> {
        let mut orders = self.orders()?;
        if orders.iter().any(|order| order.seat_id == seat.as_str()) {
            return Err(LedgerError::DuplicateSeat(seat.to_string()));
        }

        let id = orders.len() as i64 + 1;
        orders.push(Order {
            id,
            seat_id: seat.to_string(),
            user_id: holder_id.to_string(),
            amount,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn find_by_seat(&self, seat: &SeatId) -> Result<Option<Order>, LedgerError> {
        Ok(self.orders()?.iter().find(|order| order.seat_id == seat.as_str()).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Order>, LedgerError> {
        Ok(self.orders()?.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appends_and_finds_orders() {
        let ledger = InMemoryOrderLedger::new();
        let seat = SeatId::new(5, 5);

        let id = ledger.append(&seat, "alice", 150).await.unwrap();
        let order = ledger.find_by_seat(&seat).await.unwrap().unwrap();
        assert_eq!(order.id, id);
        assert_eq!(order.user_id, "alice");
        assert_eq!(order.amount, 150);
        assert!(ledger.find_by_seat(&SeatId::new(5, 6)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn second_order_for_same_seat_is_rejected() {
        let ledger = InMemoryOrderLedger::new();
        let seat = SeatId::new(1, 1);
        ledger.append(&seat, "alice", 100).await.unwrap();

        let err = ledger.append(&seat, "bob", 100).await.unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateSeat(s) if s == "r1-c1"));
        assert_eq!(ledger.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unavailable_ledger_fails_every_call() {
        let ledger = InMemoryOrderLedger::new();
        ledger.set_unavailable(true);
        assert!(ledger.append(&SeatId::new(1, 1), "alice", 100).await.is_err());
        assert!(ledger.list_all().await.is_err());

        ledger.set_unavailable(false);
        assert!(ledger.list_all().await.unwrap().is_empty());
    }
}
