//! API response and query types.

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;
use crate::model::Building;
use crate::report::Reading;

/// Static building record plus its current reading.
#[derive(Debug, Serialize)]
pub struct BuildingRecord {
    pub building_id: u32,
    pub name: String,
    pub footprint: i64,
    pub perimeter: i64,
    pub area: f64,
    pub centroid: Coordinate,
    pub outline: Vec<Coordinate>,
    pub site_ids: Vec<u32>,
    pub current_time: i64,
    /// `None` when a site has no reading at `current_time`.
    pub current_wattage: Option<f64>,
    /// Readings stepping back from `current_time`, newest first.
    pub history: Vec<HistoryRecord>,
}

impl BuildingRecord {
    pub fn new(building: &Building, history: Vec<HistoryRecord>) -> Self {
        Self {
            building_id: building.building_id(),
            name: building.name().to_string(),
            footprint: building.footprint(),
            perimeter: building.perimeter(),
            area: building.area(),
            centroid: building.centroid(),
            outline: building.outline().to_vec(),
            site_ids: building.sites().iter().map(|s| s.site_id()).collect(),
            current_time: building.current_time(),
            current_wattage: building.current_wattage().ok(),
            history,
        }
    }
}

/// One history point.
#[derive(Debug, Serialize)]
pub struct HistoryRecord {
    pub time: i64,
    /// `watts`, `missing` or `before_start`.
    pub status: &'static str,
    pub watts: Option<f64>,
}

impl HistoryRecord {
    pub fn new(time: i64, reading: Reading) -> Self {
        let status = match reading {
            Reading::Watts(_) => "watts",
            Reading::Missing => "missing",
            Reading::BeforeStart => "before_start",
        };
        Self {
            time,
            status,
            watts: reading.watts(),
        }
    }
}

/// Wattage of one building at a quantized time.
#[derive(Debug, Serialize)]
pub struct WattageRecord {
    pub building_id: u32,
    pub time: i64,
    pub watts: f64,
}

/// Optional `time` query parameter, in unix seconds.
#[derive(Debug, Deserialize)]
pub struct TimeQuery {
    pub time: Option<i64>,
}

/// Error response body for 4xx errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error class.
    pub kind: String,
}
