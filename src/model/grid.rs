//! The fixed measurement grid and timestamp quantization.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default query time given to every building at ingestion
/// (2014-05-07 08:30 UTC, a grid point of [`MeasurementGrid::CAMPUS`]).
pub const DEFAULT_CURRENT_TIME: i64 = 1_399_451_400;

/// Snaps `t` onto the closed grid `[low, high]` with spacing `step`.
///
/// Times outside the interval clamp to its bounds. Times between two grid
/// points go to the nearer one; a remainder of exactly `step / 2` (integer
/// division) rounds up.
///
/// # Errors
///
/// Returns [`Error::Range`] unless `low < high` and `0 < step < high - low`.
///
/// # Examples
///
/// ```
/// use campus_power::model::grid::quantize;
///
/// assert_eq!(quantize(0, 1000, 100, 50).unwrap(), 100);
/// assert_eq!(quantize(0, 1000, 100, 149).unwrap(), 100);
/// assert_eq!(quantize(0, 1000, 100, -5).unwrap(), 0);
/// ```
pub fn quantize(low: i64, high: i64, step: i64, t: i64) -> Result<i64> {
    check_range(low, high, step)?;
    Ok(snap_unchecked(low, high, step, t))
}

fn check_range(low: i64, high: i64, step: i64) -> Result<()> {
    if low >= high {
        return Err(Error::Range(format!("low ({low}) must be < high ({high})")));
    }
    if step <= 0 || step >= high - low {
        return Err(Error::Range(format!(
            "step ({step}) must be in (0, {})",
            high - low
        )));
    }
    Ok(())
}

fn snap_unchecked(low: i64, high: i64, step: i64, t: i64) -> i64 {
    if t <= low {
        return low;
    }
    if t >= high {
        return high;
    }
    let rem = (t - low) % step;
    if rem == 0 {
        t
    } else if rem >= step / 2 {
        // A grid whose span is not a multiple of step can round past high.
        (t + (step - rem)).min(high)
    } else {
        t - rem
    }
}

/// A validated `[low, high]` grid with a fixed step, in unix seconds.
///
/// Passed by value into every quantizing call rather than held as global
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementGrid {
    low: i64,
    high: i64,
    step: i64,
}

impl MeasurementGrid {
    /// The campus extract: 15-minute readings from 2013-12-09 to 2014-12-09.
    pub const CAMPUS: Self = Self {
        low: 1_386_547_200,
        high: 1_418_168_700,
        step: 900,
    };

    /// Creates a grid after checking the quantization preconditions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Range`] if `low >= high` or `step` is not in
    /// `(0, high - low)`.
    pub fn new(low: i64, high: i64, step: i64) -> Result<Self> {
        check_range(low, high, step)?;
        Ok(Self { low, high, step })
    }

    pub const fn low(&self) -> i64 {
        self.low
    }

    pub const fn high(&self) -> i64 {
        self.high
    }

    pub const fn step(&self) -> i64 {
        self.step
    }

    /// Quantizes `t` onto this grid. See [`quantize`].
    pub fn snap(&self, t: i64) -> i64 {
        snap_unchecked(self.low, self.high, self.step, t)
    }

    /// Whether `t` is exactly a grid point.
    pub fn contains(&self, t: i64) -> bool {
        (self.low..=self.high).contains(&t) && (t - self.low) % self.step == 0
    }

    /// Whether `high` itself lies on the step lattice starting at `low`.
    pub fn is_aligned(&self) -> bool {
        (self.high - self.low) % self.step == 0
    }
}

impl Default for MeasurementGrid {
    fn default() -> Self {
        Self::CAMPUS
    }
}
