use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Идентификатор места в формате `r<row>-c<col>`.
///
/// Строка хранится как есть: она же является ключом в хранилище блокировок,
/// в таблице заказов и в сообщениях для WebSocket-клиентов.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeatId {
    // Порядок полей задаёт сортировку: по ряду, затем по месту
    row: u32,
    col: u32,
    raw: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid seat id `{0}`, expected r<row>-c<col>")]
pub struct SeatIdError(pub String);

impl SeatId {
    pub fn parse(raw: &str) -> Result<Self, SeatIdError> {
        let err = || SeatIdError(raw.to_string());

        let rest = raw.strip_prefix('r').ok_or_else(err)?;
        let (row, col) = rest.split_once("-c").ok_or_else(err)?;

        Ok(Self {
            row: parse_index(row).ok_or_else(err)?,
            col: parse_index(col).ok_or_else(err)?,
            raw: raw.to_string(),
        })
    }

    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col, raw: format!("r{}-c{}", row, col) }
    }

    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn col(&self) -> u32 {
        self.col
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

// Только каноническая десятичная запись: иначе `r01-c1` и `r1-c1`
// получили бы разные блокировки на одно и то же место
fn parse_index(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if s.len() > 1 && s.starts_with('0') {
        return None;
    }
    s.parse().ok()
}

impl FromStr for SeatId {
    type Err = SeatIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for SeatId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for SeatId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SeatStatus {
    Available,
    Held,
    Sold,
}

/// Состояние места на момент чтения. Нигде не хранится.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatState {
    pub seat_id: SeatId,
    pub status: SeatStatus,
    /// Держатель или покупатель; пустая строка для свободного места.
    pub owner_id: String,
}

impl SeatState {
    pub fn available(seat_id: SeatId) -> Self {
        Self { seat_id, status: SeatStatus::Available, owner_id: String::new() }
    }

    pub fn held(seat_id: SeatId, holder_id: impl Into<String>) -> Self {
        Self { seat_id, status: SeatStatus::Held, owner_id: holder_id.into() }
    }

    pub fn sold(seat_id: SeatId, buyer_id: impl Into<String>) -> Self {
        Self { seat_id, status: SeatStatus::Sold, owner_id: buyer_id.into() }
    }
}
