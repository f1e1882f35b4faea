//! Latitude/longitude coordinates and their bracketed text form.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::text::split_between;

/// Shortest text that can hold a coordinate, e.g. `[1, 2]`.
const MIN_COORDINATE_LEN: usize = 6;

/// A (latitude, longitude) pair in degrees.
///
/// Values are only checked syntactically; nothing verifies that they lie on
/// the globe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    lat: f64,
    lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Parses a single `[<lat>, <lon>]` coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] when the text is shorter than six
    /// characters, is not wrapped in brackets, has no comma, or either
    /// component is not a real number.
    ///
    /// # Examples
    ///
    /// ```
    /// use campus_power::geo::Coordinate;
    ///
    /// let c = Coordinate::parse_one("[42.3394, -71.0896]").unwrap();
    /// assert_eq!(c.lat(), 42.3394);
    /// assert_eq!(c.lon(), -71.0896);
    /// ```
    pub fn parse_one(s: &str) -> Result<Self> {
        if s.chars().count() < MIN_COORDINATE_LEN {
            return Err(Error::format(format!("coordinate {s:?} is too short")));
        }
        let inner = s
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(|| Error::format(format!("coordinate {s:?} is not bracketed")))?;
        let (lat, lon) = inner
            .split_once(',')
            .ok_or_else(|| Error::format(format!("coordinate {s:?} has no comma")))?;

        Ok(Self::new(parse_component(lat, s)?, parse_component(lon, s)?))
    }

    /// Parses a comma-joined run of bracketed coordinates, e.g. the inside of
    /// a building outline. Order is preserved.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] when the text is shorter than a single
    /// coordinate or any element fails [`Coordinate::parse_one`].
    ///
    /// # Examples
    ///
    /// ```
    /// use campus_power::geo::Coordinate;
    ///
    /// let outline = Coordinate::parse_all("[1.0, 2.0], [3.0, 4.0]").unwrap();
    /// assert_eq!(outline, vec![Coordinate::new(1.0, 2.0), Coordinate::new(3.0, 4.0)]);
    /// ```
    pub fn parse_all(s: &str) -> Result<Vec<Self>> {
        if s.chars().count() < MIN_COORDINATE_LEN {
            return Err(Error::format(format!("coordinate list {s:?} is too short")));
        }
        split_between(s, '[', ']')
            .into_iter()
            .map(|part| Self::parse_one(part.strip_prefix(' ').unwrap_or(part)))
            .collect()
    }
}

fn parse_component(text: &str, whole: &str) -> Result<f64> {
    let text = text.trim();
    if text.contains(['[', ']']) {
        return Err(Error::format(format!("coordinate {whole:?} is nested")));
    }
    text.parse::<f64>()
        .map_err(|e| Error::format(format!("coordinate {whole:?}: {text:?} {e}")))
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}, {:?}]", self.lat, self.lon)
    }
}

impl FromStr for Coordinate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_one(s)
    }
}
