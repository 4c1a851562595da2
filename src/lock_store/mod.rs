//! Хранилище блокировок мест.
//!
//! Блокировка — это запись `seat:<seatId>:lock` со значением-держателем и TTL.
//! Координатор видит только атомарные операции из [`LockStore`], поэтому
//! его корректность не зависит от конкретного хранилища: в продакшене это
//! Redis ([`RedisLockStore`]), в тестах — [`InMemoryLockStore`].

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::models::SeatId;

pub mod memory;
pub mod redis;

pub use self::memory::InMemoryLockStore;
pub use self::redis::RedisLockStore;

const KEY_PREFIX: &str = "seat:";
const KEY_SUFFIX: &str = ":lock";

pub fn lock_key(seat: &SeatId) -> String {
    format!("{}{}{}", KEY_PREFIX, seat, KEY_SUFFIX)
}

/// Обратное к [`lock_key`]; ключи чужого формата пропускаются.
pub fn seat_from_key(key: &str) -> Option<SeatId> {
    key.strip_prefix(KEY_PREFIX)?
        .strip_suffix(KEY_SUFFIX)
        .and_then(|raw| SeatId::parse(raw).ok())
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("lock store unavailable: {0}")]
    Redis(#[from] ::redis::RedisError),
    #[error("lock store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockEntry {
    pub seat_id: SeatId,
    pub holder_id: String,
}

#[async_trait]
pub trait LockStore: Send + Sync {
    /// Создаёт блокировку, только если её нет. Одна атомарная операция.
    async fn acquire(&self, seat: &SeatId, holder_id: &str, ttl: Duration) -> Result<bool, StoreError>;

    /// Текущий держатель; `None`, если места никто не держит.
    async fn read(&self, seat: &SeatId) -> Result<Option<String>, StoreError>;

    /// Атомарно удаляет блокировку, если её значение равно `holder_id`.
    async fn release_if_owner(&self, seat: &SeatId, holder_id: &str) -> Result<bool, StoreError>;

    /// Безусловное удаление. Только после проверки владельца и записи заказа.
    async fn remove(&self, seat: &SeatId) -> Result<(), StoreError>;

    /// Живые блокировки мест, чей идентификатор начинается с `prefix`.
    /// Префикс сравнивается буквально, без glob-шаблонов; `""` — все места.
    /// Снимок не изолирован: под нагрузкой он может быть слегка устаревшим.
    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<LockEntry>, StoreError>;
}
