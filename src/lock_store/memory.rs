use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

use super::{LockEntry, LockStore, StoreError};
use crate::models::SeatId;

#[derive(Debug)]
struct Lock {
    holder_id: String,
    expires_at: Instant,
}

/// Блокировки в памяти процесса.
///
/// Каждая операция выполняется целиком под мьютексом, что даёт ту же
/// атомарность, что `SET NX` и Lua-скрипт в Redis. Истёкшие записи считаются
/// отсутствующими и вычищаются лениво. Время берётся из `tokio::time`, так что
/// в тестах TTL можно проматывать через `tokio::time::advance`.
#[derive(Debug, Default)]
pub struct InMemoryLockStore {
    locks: Mutex<HashMap<SeatId, Lock>>,
    unavailable: AtomicBool,
}

impl InMemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Имитация недоступного хранилища.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn locks(&self) -> Result<MutexGuard<'_, HashMap<SeatId, Lock>>, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory lock store switched off".to_string()));
        }
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = Instant::now();
        locks.retain(|_, lock| lock.expires_at > now);
        Ok(locks)
    }
}

#[async_trait]
impl LockStore for InMemoryLockStore {
    async fn acquire(&self, seat: &SeatId, holder_id: &str, ttl: Duration) -> Result<bool, StoreError> {
        let mut locks = self.locks()?;
        if locks.contains_key(seat) {
            return Ok(false);
        }
        locks.insert(
            seat.clone(),
            Lock { holder_id: holder_id.to_string(), expires_at: Instant::now() + ttl },
        );
        Ok(true)
    }

    async fn read(&self, seat: &SeatId) -> Result<Option<String>, StoreError> {
        Ok(self.locks()?.get(seat).map(|lock| lock.holder_id.clone()))
    }

    async fn release_if_owner(&self, seat: &SeatId, holder_id: &str) -> Result<bool, StoreError> {
        let mut locks = self.locks()?;
        match locks.get(seat) {
            Some(lock) if lock.holder_id == holder_id => {
                locks.remove(seat);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn remove(&self, seat: &SeatId) -> Result<(), StoreError> {
        self.locks()?.remove(seat);
        Ok(())
    }

    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<LockEntry>, StoreError> {
        Ok(self
            .locks()?
            .iter()
            .filter(|(seat, _)| seat.as_str().starts_with(prefix))
            .map(|(seat, lock)| LockEntry { seat_id: seat.clone(), holder_id: lock.holder_id.clone() })
            .collect())
    }
}
