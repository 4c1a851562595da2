use async_trait::async_trait;
use redis::Script;
use std::time::Duration;
use tracing::debug;

use super::{lock_key, seat_from_key, LockEntry, LockStore, StoreError, KEY_PREFIX, KEY_SUFFIX};
use crate::models::SeatId;
use crate::redis_client::RedisClient;

// GET и DEL в одном скрипте: между ними блокировку не успеет
// перехватить другой держатель
const RELEASE_IF_OWNER: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

const SCAN_BATCH: usize = 500;

/// Экранирует спецсимволы glob, чтобы `MATCH` сравнивал префикс буквально,
/// как `starts_with` в памяти.
fn escape_glob(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// TTL в миллисекундах для `PX`; Redis не принимает ноль.
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[derive(Clone)]
pub struct RedisLockStore {
    redis: RedisClient,
    release_script: Script,
}

impl RedisLockStore {
    pub fn new(redis: RedisClient) -> Self {
        Self { redis, release_script: Script::new(RELEASE_IF_OWNER) }
    }

    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.redis.conn.clone();
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;

        // SCAN вместо KEYS: не блокирует Redis на больших залах
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN может вернуть один ключ несколько раз
        keys.sort_unstable();
        keys.dedup();
        Ok(keys)
    }
}

#[async_trait]
impl LockStore for RedisLockStore {
    async fn acquire(&self, seat: &SeatId, holder_id: &str, ttl: Duration) -> Result<bool, StoreError> {
        let mut conn = self.redis.conn.clone();

        // SET NX PX: nil, если ключ уже есть
        let reply: Option<String> = redis::cmd("SET")
            .arg(lock_key(seat))
            .arg(holder_id)
            .arg("NX")
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async(&mut conn)
            .await?;

        Ok(reply.is_some())
    }

    async fn read(&self, seat: &SeatId) -> Result<Option<String>, StoreError> {
        let mut conn = self.redis.conn.clone();
        let holder: Option<String> = redis::cmd("GET")
            .arg(lock_key(seat))
            .query_async(&mut conn)
            .await?;
        Ok(holder)
    }

    async fn release_if_owner(&self, seat: &SeatId, holder_id: &str) -> Result<bool, StoreError> {
        let mut conn = self.redis.conn.clone();
        let deleted: i64 = self
            .release_script
            .key(lock_key(seat))
            .arg(holder_id)
            .invoke_async(&mut conn)
            .await?;
        Ok(deleted == 1)
    }

    async fn remove(&self, seat: &SeatId) -> Result<(), StoreError> {
        let mut conn = self.redis.conn.clone();
        let _: i64 = redis::cmd("DEL")
            .arg(lock_key(seat))
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<LockEntry>, StoreError> {
        let pattern = format!("{}{}*{}", KEY_PREFIX, escape_glob(prefix), KEY_SUFFIX);
        let keys = self.scan_keys(&pattern).await?;
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.redis.conn.clone();
        let holders: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut conn)
            .await?;

        // Ключ мог истечь между SCAN и MGET — такое место уже свободно
        let entries: Vec<LockEntry> = keys
            .iter()
            .zip(holders)
            .filter_map(|(key, holder)| {
                let seat_id = seat_from_key(key)?;
                Some(LockEntry { seat_id, holder_id: holder? })
            })
            .collect();

        debug!(pattern = %pattern, scanned = keys.len(), live = entries.len(), "listed seat locks");
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> RedisLockStore {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        RedisLockStore::new(RedisClient::new(&url).await.unwrap())
    }

    #[test]
    fn glob_characters_in_prefix_are_literal() {
        assert_eq!(escape_glob("r1-"), "r1-");
        assert_eq!(escape_glob("r*"), "r\\*");
        assert_eq!(escape_glob("r?-c[1]\\"), "r\\?-c\\[1\\]\\\\");
    }

    #[test]
    fn ttl_keeps_sub_second_precision() {
        assert_eq!(ttl_millis(Duration::from_millis(1500)), 1500);
        assert_eq!(ttl_millis(Duration::from_millis(250)), 250);
        assert_eq!(ttl_millis(Duration::ZERO), 1);
    }

    fn unique_seat() -> SeatId {
        // Большие номера, чтобы не пересечься с живыми данными
        let n = uuid::Uuid::new_v4().as_u128() as u32 | 0x4000_0000;
        SeatId::new(n, n)
    }

    #[tokio::test]
    #[ignore = "requires a running Redis (REDIS_URL)"]
    async fn acquire_is_exclusive_and_release_checks_owner() {
        let store = store().await;
        let seat = unique_seat();
        let ttl = Duration::from_secs(30);

        assert!(store.acquire(&seat, "alice", ttl).await.unwrap());
        assert!(!store.acquire(&seat, "bob", ttl).await.unwrap());
        assert_eq!(store.read(&seat).await.unwrap().as_deref(), Some("alice"));

        assert!(!store.release_if_owner(&seat, "bob").await.unwrap());
        assert_eq!(store.read(&seat).await.unwrap().as_deref(), Some("alice"));

        assert!(store.release_if_owner(&seat, "alice").await.unwrap());
        assert_eq!(store.read(&seat).await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore = "requires a running Redis (REDIS_URL)"]
    async fn lists_locks_by_seat_prefix() {
        let store = store().await;
        let seat = unique_seat();
        store.acquire(&seat, "carol", Duration::from_secs(30)).await.unwrap();

        let prefix = format!("r{}-", seat.row());
        let entries = store.list_by_prefix(&prefix).await.unwrap();
        assert_eq!(entries, vec![LockEntry { seat_id: seat.clone(), holder_id: "carol".to_string() }]);

        store.remove(&seat).await.unwrap();
        assert!(store.list_by_prefix(&prefix).await.unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore = "requires a running Redis (REDIS_URL)"]
    async fn sub_second_ttl_is_honoured() {
        let store = store().await;
        let seat = unique_seat();

        assert!(store.acquire(&seat, "dave", Duration::from_millis(300)).await.unwrap());
        assert_eq!(store.read(&seat).await.unwrap().as_deref(), Some("dave"));

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(store.read(&seat).await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore = "requires a running Redis (REDIS_URL)"]
    async fn glob_prefix_matches_nothing() {
        let store = store().await;
        let seat = unique_seat();
        store.acquire(&seat, "erin", Duration::from_secs(30)).await.unwrap();

        assert!(store.list_by_prefix("*").await.unwrap().is_empty());
        assert!(store.list_by_prefix(&format!("r{}?", seat.row())).await.unwrap().is_empty());
        store.remove(&seat).await.unwrap();
    }
}
