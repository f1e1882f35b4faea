//! REST API over an ingested campus.
//!
//! Provides three GET endpoints:
//! - `/buildings` ranks every building at `?time=` (default: initial time)
//! - `/buildings/{id}` returns one building with its current wattage and history
//! - `/buildings/{id}/wattage` reads one building at `?time=`

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::model::Building;

pub use types::{BuildingRecord, ErrorResponse, HistoryRecord, TimeQuery, WattageRecord};

/// History settings applied to `/buildings/{id}`.
#[derive(Debug, Clone, Copy)]
pub struct HistorySettings {
    /// Earliest time a history may reach.
    pub floor: i64,
    /// Seconds between readings.
    pub interval: i64,
    /// Number of readings.
    pub len: usize,
}

/// Immutable application state shared across all request handlers.
///
/// Built once after ingestion and wrapped in `Arc`; handlers only read it.
pub struct AppState {
    /// Buildings in extract order.
    pub buildings: Vec<Building>,
    /// Time used when a request carries no `time`.
    pub default_time: i64,
    pub history: HistorySettings,
}

impl AppState {
    fn building(&self, building_id: u32) -> Option<&Building> {
        self.buildings
            .iter()
            .find(|b| b.building_id() == building_id)
    }
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/buildings", get(handlers::list_buildings))
        .route("/buildings/{id}", get(handlers::get_building))
        .route("/buildings/{id}/wattage", get(handlers::get_wattage))
        .with_state(state)
}

/// Binds to the given address and serves the API.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
