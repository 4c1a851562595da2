use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::{
    ledger::OrderLedger,
    lock_store::{LockStore, StoreError},
    models::SeatId,
};

/// Зачистка блокировок, оставшихся на уже проданных местах.
///
/// Такие блокировки появляются, если после записи заказа не удалось удалить
/// ключ в Redis. На чтение они не влияют (SOLD перекрывает HELD), но мешают
/// держать хранилище чистым. Событий не рассылает: наблюдатели уже видели SOLD.
#[derive(Clone)]
pub struct CleanupService {
    locks: Arc<dyn LockStore>,
    ledger: Arc<dyn OrderLedger>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanupStats {
    pub locks_scanned: usize,
    pub stale_removed: usize,
}

impl CleanupService {
    pub fn new(locks: Arc<dyn LockStore>, ledger: Arc<dyn OrderLedger>) -> Self {
        Self { locks, ledger }
    }

    /// Один проход. Без доступа к журналу ничего не удаляет.
    pub async fn run_once(&self) -> Result<CleanupStats, StoreError> {
        let locks = self.locks.list_by_prefix("").await?;
        let mut stats = CleanupStats { locks_scanned: locks.len(), ..Default::default() };
        if locks.is_empty() {
            return Ok(stats);
        }

        let sold: HashSet<SeatId> = match self.ledger.list_all().await {
            Ok(orders) => orders
                .into_iter()
                .filter_map(|order| SeatId::parse(&order.seat_id).ok())
                .collect(),
            Err(e) => {
                warn!(error = %e, "🔑 ledger unavailable, skipping stale lock sweep");
                return Ok(stats);
            }
        };

        for lock in locks.iter().filter(|lock| sold.contains(&lock.seat_id)) {
            self.locks.remove(&lock.seat_id).await?;
            stats.stale_removed += 1;
            info!(seat_id = %lock.seat_id, holder_id = %lock.holder_id, "🔑 removed lock on sold seat");
        }

        Ok(stats)
    }

    /// Периодический запуск в фоне.
    pub fn spawn(self, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match self.run_once().await {
                    Ok(stats) => debug!(?stats, "🧹 stale lock sweep finished"),
                    Err(e) => error!(error = %e, "🧹 stale lock sweep failed"),
                }
            }
        })
    }
}
