use axum::body::Bytes;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use super::SeatId;

#[derive(Debug, Error)]
pub enum VenueError {
    #[error("failed to read venue layout {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse venue layout: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub price: f64,
    pub row_start: u32,
    pub row_end: u32,
    pub col_start: u32,
    pub col_end: u32,
}

impl Section {
    /// Границы включительно.
    pub fn contains(&self, seat: &SeatId) -> bool {
        (self.row_start..=self.row_end).contains(&seat.row())
            && (self.col_start..=self.col_end).contains(&seat.col())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Dimensions {
    pub rows: u32,
    pub cols: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageArea {
    pub row_start: u32,
    pub row_end: u32,
    pub col_start: u32,
    pub col_end: u32,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueLayout {
    #[serde(default)]
    pub venue_name: Option<String>,
    #[serde(default)]
    pub venue_location: Option<String>,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
    #[serde(default)]
    pub stage_area: Option<StageArea>,
    pub sections: Vec<Section>,
}

/// Схема зала, загруженная один раз при старте.
///
/// `raw` отдаётся клиентам как есть через `GET /api/venue`,
/// `layout` используется только для расчёта цены при покупке.
#[derive(Debug, Clone)]
pub struct Venue {
    layout: VenueLayout,
    raw: Bytes,
    default_price: i32,
}

impl Venue {
    pub fn from_bytes(raw: impl Into<Bytes>, default_price: i32) -> Result<Self, VenueError> {
        let raw = raw.into();
        let layout = serde_json::from_slice(&raw)?;
        Ok(Self { layout, raw, default_price })
    }

    pub async fn load(path: impl AsRef<Path>, default_price: i32) -> Result<Self, VenueError> {
        let path = path.as_ref();
        let raw = tokio::fs::read(path).await.map_err(|source| VenueError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_bytes(raw, default_price)
    }

    pub fn layout(&self) -> &VenueLayout {
        &self.layout
    }

    pub fn raw(&self) -> Bytes {
        self.raw.clone()
    }

    /// Цена первой секции, содержащей место; иначе цена по умолчанию.
    /// Дробная часть цены секции отбрасывается.
    pub fn price_for(&self, seat: &SeatId) -> i32 {
        self.layout
            .sections
            .iter()
            .find(|section| section.contains(seat))
            .map(|section| section.price.trunc() as i32)
            .unwrap_or(self.default_price)
    }
}
