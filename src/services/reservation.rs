//! reservation.rs
//!
//! Переходы состояния места: `AVAILABLE → HELD → SOLD`.
//!
//! Координатор не держит собственных мьютексов. Единственный источник
//! истины о владельце — атомарные операции [`LockStore`]; порядок
//! «сначала заказ, потом снятие блокировки» при покупке гарантирует, что
//! место не покажется свободным, пока продажа не записана.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::{
    error::ReservationError,
    ledger::OrderLedger,
    lock_store::LockStore,
    models::{SeatId, SeatState, Venue},
    services::hub::HubHandle,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Released,
    /// Блокировки уже нет (истекла или снята раньше); ничего не изменилось.
    AlreadyReleased,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    pub order_id: i64,
    pub amount: i32,
}

#[derive(Clone)]
pub struct ReservationCoordinator {
    locks: Arc<dyn LockStore>,
    ledger: Arc<dyn OrderLedger>,
    venue: Arc<Venue>,
    hub: HubHandle,
    hold_ttl: Duration,
}

impl ReservationCoordinator {
    pub fn new(
        locks: Arc<dyn LockStore>,
        ledger: Arc<dyn OrderLedger>,
        venue: Arc<Venue>,
        hub: HubHandle,
        hold_ttl: Duration,
    ) -> Self {
        Self { locks, ledger, venue, hub, hold_ttl }
    }

    pub async fn hold(&self, seat: &SeatId, holder_id: &str) -> Result<(), ReservationError> {
        if !self.locks.acquire(seat, holder_id, self.hold_ttl).await? {
            return Err(ReservationError::AlreadyHeld(seat.to_string()));
        }

        // Покупка пишет заказ раньше, чем снимает блокировку. Раз мы её
        // получили, любая завершённая продажа уже видна в журнале.
        let sold = match self.ledger.find_by_seat(seat).await {
            Ok(order) => order.is_some(),
            Err(e) => {
                self.undo_hold(seat, holder_id).await;
                return Err(ReservationError::Ledger(e));
            }
        };
        if sold {
            self.undo_hold(seat, holder_id).await;
            return Err(ReservationError::AlreadySold(seat.to_string()));
        }

        info!(seat_id = %seat, user_id = holder_id, ttl = ?self.hold_ttl, "seat held");
        self.hub.broadcast(SeatState::held(seat.clone(), holder_id));
        Ok(())
    }

    pub async fn release(&self, seat: &SeatId, holder_id: &str) -> Result<ReleaseOutcome, ReservationError> {
        if self.locks.release_if_owner(seat, holder_id).await? {
            info!(seat_id = %seat, user_id = holder_id, "seat released");
            self.hub.broadcast(SeatState::available(seat.clone()));
            return Ok(ReleaseOutcome::Released);
        }

        // Не удалили: либо держит кто-то другой, либо блокировки нет вовсе
        if self.locks.read(seat).await?.is_some() {
            return Err(ReservationError::NotOwner("You do not own this seat".to_string()));
        }

        let sold = self
            .ledger
            .find_by_seat(seat)
            .await
            .map_err(ReservationError::Ledger)?
            .is_some();
        if sold {
            return Err(ReservationError::NotOwner("Seat is already sold".to_string()));
        }

        info!(seat_id = %seat, user_id = holder_id, "release of a seat that is not held");
        Ok(ReleaseOutcome::AlreadyReleased)
    }

    pub async fn purchase(&self, seat: &SeatId, holder_id: &str) -> Result<PurchaseReceipt, ReservationError> {
        match self.locks.read(seat).await? {
            None => return Err(ReservationError::NotHeld),
            Some(owner) if owner != holder_id => {
                return Err(ReservationError::NotOwner("You do not own this seat".to_string()));
            }
            Some(_) => {}
        }

        let amount = self.venue.price_for(seat);

        // Точка фиксации. При ошибке блокировка остаётся, место по-прежнему HELD.
        let order_id = self
            .ledger
            .append(seat, holder_id, amount)
            .await
            .map_err(ReservationError::Commit)?;

        // Заказ уже записан, поэтому ошибка здесь не отменяет покупку:
        // при чтении SOLD перекрывает HELD, а блокировку добьёт зачистка или TTL
        if let Err(e) = self.locks.remove(seat).await {
            warn!(seat_id = %seat, error = %e, "order recorded but lock was not removed");
        }

        info!(seat_id = %seat, user_id = holder_id, order_id, amount, "seat sold");
        self.hub.broadcast(SeatState::sold(seat.clone(), holder_id));
        Ok(PurchaseReceipt { order_id, amount })
    }

    async fn undo_hold(&self, seat: &SeatId, holder_id: &str) {
        if let Err(e) = self.locks.release_if_owner(seat, holder_id).await {
            warn!(seat_id = %seat, error = %e, "failed to undo hold, lock will expire by TTL");
        }
    }
}
