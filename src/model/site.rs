use std::collections::HashMap;
use std::fmt;

use super::grid::MeasurementGrid;
use crate::error::{Error, Result};

/// One electrical meter and its recorded power series.
///
/// Readings are keyed by the timestamp they were recorded under and are
/// append-only: a timestamp can be filled exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    site_id: u32,
    building_id: u32,
    readings: HashMap<i64, f64>,
}

impl Site {
    /// Creates a site with no readings.
    pub fn new(site_id: u32, building_id: u32) -> Self {
        Self {
            site_id,
            building_id,
            readings: HashMap::new(),
        }
    }

    pub fn site_id(&self) -> u32 {
        self.site_id
    }

    /// Identifier of the building that owns this meter.
    pub fn building_id(&self) -> u32 {
        self.building_id
    }

    /// Records a reading at `time` exactly as given (no quantization).
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateReading`] if `time` already has a reading;
    /// the stored value is left untouched.
    pub fn add_time_watt(&mut self, time: i64, watts: f64) -> Result<()> {
        if self.readings.contains_key(&time) {
            return Err(Error::DuplicateReading {
                site_id: self.site_id,
                time,
            });
        }
        self.readings.insert(time, watts);
        Ok(())
    }

    /// Reading at `time` after snapping it onto `grid`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingReading`] if nothing was recorded at the
    /// snapped time. Missing readings are never interpolated or defaulted.
    pub fn wattage(&self, grid: &MeasurementGrid, time: i64) -> Result<f64> {
        let snapped = grid.snap(time);
        self.readings
            .get(&snapped)
            .copied()
            .ok_or(Error::MissingReading {
                site_id: self.site_id,
                time: snapped,
            })
    }

    /// Number of recorded readings.
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Read-only view of the raw time → watts mapping.
    pub fn readings(&self) -> &HashMap<i64, f64> {
        &self.readings
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[site {} of building {}]", self.site_id, self.building_id)
    }
}
