//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use super::AppState;
use super::types::{BuildingRecord, ErrorResponse, HistoryRecord, TimeQuery, WattageRecord};
use crate::error::{Error, ErrorKind};
use crate::ranking::{Ranked, rank_at};
use crate::report::{history_time, last_readings};

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Ranks every building at the requested time.
///
/// `GET /buildings` → 200 + `Vec<Ranked>` at the default time
/// `GET /buildings?time=T` → ranking at `T` quantized
/// 400 if the batch is too large, 422 if a reading is missing.
pub async fn list_buildings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TimeQuery>,
) -> Result<Json<Vec<Ranked>>, ApiError> {
    let time = query.time.unwrap_or(state.default_time);
    rank_at(&state.buildings, time)
        .map(Json)
        .map_err(error_response)
}

/// Returns one building with its current wattage and history.
///
/// `GET /buildings/{id}` → 200 + `BuildingRecord`, 404 for an unknown id.
pub async fn get_building(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<BuildingRecord>, ApiError> {
    let building = state.building(id).ok_or_else(|| not_found(id))?;
    let h = state.history;
    let readings = last_readings(building, h.floor, h.interval, h.len).map_err(error_response)?;
    let history = readings
        .into_iter()
        .enumerate()
        .map(|(i, reading)| {
            HistoryRecord::new(history_time(building.current_time(), h.interval, i), reading)
        })
        .collect();
    Ok(Json(BuildingRecord::new(building, history)))
}

/// Reads one building at the requested time.
///
/// `GET /buildings/{id}/wattage?time=T` → 200 + `WattageRecord`
/// 404 for an unknown id, 422 if a reading is missing.
pub async fn get_wattage(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
    Query(query): Query<TimeQuery>,
) -> Result<Json<WattageRecord>, ApiError> {
    let building = state.building(id).ok_or_else(|| not_found(id))?;
    let time = query.time.unwrap_or(state.default_time);
    let watts = building.wattage(time).map_err(error_response)?;
    Ok(Json(WattageRecord {
        building_id: id,
        time: building.grid().snap(time),
        watts,
    }))
}

fn not_found(id: u32) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("no building with id {id}"),
            kind: "not_found".to_string(),
        }),
    )
}

fn error_response(error: Error) -> ApiError {
    let kind = error.kind();
    let status = match kind {
        ErrorKind::Capacity | ErrorKind::Argument | ErrorKind::Range => StatusCode::BAD_REQUEST,
        ErrorKind::Lookup => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            kind: kind.as_str().to_string(),
        }),
    )
}
