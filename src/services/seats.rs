use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

use crate::{
    ledger::OrderLedger,
    lock_store::{LockStore, StoreError},
    models::{SeatId, SeatState},
};

/// Сводное состояние мест: блокировки плюс заказы.
///
/// В ответ попадают только удерживаемые и проданные места; отсутствие места
/// в списке означает, что оно свободно.
#[derive(Clone)]
pub struct SeatStateAggregator {
    locks: Arc<dyn LockStore>,
    ledger: Arc<dyn OrderLedger>,
}

impl SeatStateAggregator {
    pub fn new(locks: Arc<dyn LockStore>, ledger: Arc<dyn OrderLedger>) -> Self {
        Self { locks, ledger }
    }

    pub async fn list_seats(&self) -> Result<Vec<SeatState>, StoreError> {
        let mut seats: BTreeMap<SeatId, SeatState> = self
            .locks
            .list_by_prefix("")
            .await?
            .into_iter()
            .map(|lock| (lock.seat_id.clone(), SeatState::held(lock.seat_id, lock.holder_id)))
            .collect();

        // Продажа важнее любой блокировки, даже свежей
        match self.ledger.list_all().await {
            Ok(orders) => {
                for order in orders {
                    let Ok(seat_id) = SeatId::parse(&order.seat_id) else {
                        warn!(order_id = order.id, seat_id = %order.seat_id, "order with malformed seat id skipped");
                        continue;
                    };
                    seats.insert(seat_id.clone(), SeatState::sold(seat_id, order.user_id));
                }
            }
            Err(e) => {
                // Отдаём хотя бы блокировки
                warn!(error = %e, "order ledger unavailable, listing holds only");
            }
        }

        Ok(seats.into_values().collect())
    }
}
