use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Строка таблицы `orders`. Записи только добавляются.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: i64,
    pub seat_id: String,
    pub user_id: String,
    pub amount: i32,
    pub created_at: DateTime<Utc>,
}
