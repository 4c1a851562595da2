use redis::{aio::ConnectionManager, Client};

/// Соединение с Redis, где живут блокировки мест.
///
/// `ConnectionManager` мультиплексирует запросы и сам переподключается
/// после обрыва, поэтому клон дешёвый и его можно держать в каждом сервисе.
#[derive(Clone)]
pub struct RedisClient {
    pub conn: ConnectionManager,
}

impl RedisClient {
    pub async fn new(redis_url: &str) -> redis::RedisResult<Self> {
        let client = Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(RedisClient { conn })
    }

    pub async fn ping(&self) -> redis::RedisResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
