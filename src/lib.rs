//! Campus building power model: CSV ingestion, time-quantized wattage
//! lookups and ranked, shaded building reports.

#[cfg(feature = "api")]
pub mod api;
pub mod calendar;
pub mod config;
pub mod error;
pub mod geo;
/// Extract ingestion and ranking export.
pub mod io;
pub mod model;
pub mod observability;
pub mod ranking;
pub mod report;
pub mod synth;
pub mod text;

pub use error::{Error, ErrorKind, Result};
