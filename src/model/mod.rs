//! In-memory campus model: the measurement grid, meters and buildings.

pub mod building;
/// Measurement grid and timestamp quantization.
pub mod grid;
pub mod site;

pub use building::{Building, BuildingBuilder};
pub use grid::{DEFAULT_CURRENT_TIME, MeasurementGrid, quantize};
pub use site::Site;
