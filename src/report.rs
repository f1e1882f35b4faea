//! Per-building history: readings at fixed intervals before the current
//! time and a printable weekly summary.

use std::fmt;

use serde::Serialize;

use crate::calendar;
use crate::error::{Error, Result};
use crate::model::Building;
use crate::ranking::min_max_scale;

/// Narrowest and widest text bar, in blocks.
const BAR_MIN: usize = 1;
const BAR_SPAN: f64 = 19.0;

/// One point of a building's history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", content = "watts", rename_all = "snake_case")]
pub enum Reading {
    Watts(f64),
    /// No reading was recorded at that grid point.
    Missing,
    /// Earlier than the history floor.
    BeforeStart,
}

impl Reading {
    pub fn watts(&self) -> Option<f64> {
        match self {
            Self::Watts(w) => Some(*w),
            Self::Missing | Self::BeforeStart => None,
        }
    }
}

/// Time of the `i`-th history point before `current`. Saturates instead of
/// overflowing, so far-off points land before any floor.
pub fn history_time(current: i64, interval: i64, i: usize) -> i64 {
    let steps = i64::try_from(i).unwrap_or(i64::MAX);
    current.saturating_sub(interval.saturating_mul(steps))
}

/// Readings at `current_time - i * interval` for `i` in `0..count`.
///
/// Points before `floor` are [`Reading::BeforeStart`]; lookup misses are
/// [`Reading::Missing`].
///
/// # Errors
///
/// Returns [`Error::Argument`] if `count` or `interval` is below one.
pub fn last_readings(
    building: &Building,
    floor: i64,
    interval: i64,
    count: usize,
) -> Result<Vec<Reading>> {
    if count < 1 {
        return Err(Error::Argument("history needs at least one reading".into()));
    }
    if interval < 1 {
        return Err(Error::Argument(format!(
            "history interval must be positive, got {interval}"
        )));
    }

    (0..count)
        .map(|i| {
            let time = history_time(building.current_time(), interval, i);
            if time < floor {
                return Ok(Reading::BeforeStart);
            }
            match building.wattage(time) {
                Ok(w) => Ok(Reading::Watts(w)),
                Err(Error::MissingReading { .. }) => Ok(Reading::Missing),
                Err(e) => Err(e),
            }
        })
        .collect()
}

/// One line of a [`WeeklySummary`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryLine {
    pub time: i64,
    pub label: String,
    pub reading: Reading,
    /// Relative size in `[0, 1]` among the available readings.
    pub scale: Option<f64>,
}

/// Current wattage plus the same hour on previous days.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklySummary {
    pub name: String,
    pub building_id: u32,
    pub current_time: i64,
    /// Long form of `current_time`.
    pub when: String,
    pub lines: Vec<HistoryLine>,
}

impl WeeklySummary {
    /// Collects `days` daily readings ending at the building's current time.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`last_readings`] and [`calendar::describe`].
    pub fn for_building(building: &Building, floor: i64, interval: i64, days: usize) -> Result<Self> {
        let readings = last_readings(building, floor, interval, days)?;
        let available: Vec<f64> = readings.iter().filter_map(Reading::watts).collect();
        let mut scales = min_max_scale(&available).into_iter();

        let mut lines = Vec::with_capacity(readings.len());
        for (i, reading) in readings.into_iter().enumerate() {
            let time = history_time(building.current_time(), interval, i);
            let label = match (i, reading) {
                (0, _) => "Today".to_string(),
                (_, Reading::BeforeStart) => "No such time".to_string(),
                _ => calendar::day_label(time)?,
            };
            let scale = reading.watts().and_then(|_| scales.next());
            lines.push(HistoryLine {
                time,
                label,
                reading,
                scale,
            });
        }

        Ok(Self {
            name: building.name().to_string(),
            building_id: building.building_id(),
            current_time: building.current_time(),
            when: calendar::describe(building.current_time())?,
            lines,
        })
    }
}

impl fmt::Display for WeeklySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{}) on {}", self.name, self.building_id, self.when)?;
        for line in &self.lines {
            writeln!(f)?;
            let value = match line.reading {
                Reading::Watts(w) => format!("{w:.3} Watts"),
                Reading::Missing => "no reading".to_string(),
                Reading::BeforeStart => String::new(),
            };
            let bar = line
                .scale
                .map(|s| "#".repeat(BAR_MIN + (s * BAR_SPAN).round() as usize))
                .unwrap_or_default();
            write!(f, "{:<14} {:<22} {}", format!("{}:", line.label), value, bar)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::geo::Coordinate;
    use crate::model::{BuildingBuilder, MeasurementGrid, Site};

    const DAY: i64 = 86_400;
    const GRID: MeasurementGrid = MeasurementGrid::CAMPUS;

    fn building_at(now: i64, readings: &[(i64, f64)]) -> Building {
        let mut site = Site::new(0, 5);
        for &(t, w) in readings {
            assert!(site.add_time_watt(t, w).is_ok());
        }
        let mut b = BuildingBuilder::new();
        b.building_id(5)
            .name("Ryder Hall")
            .sites(vec![site])
            .centroid(Coordinate::new(42.336, -71.091))
            .outline(Vec::new())
            .current_time(now);
        match b.build() {
            Ok(b) => b,
            Err(e) => panic!("fixture build failed: {e}"),
        }
    }

    #[test]
    fn readings_step_back_by_interval() {
        let now = GRID.low() + 3 * DAY;
        let b = building_at(now, &[(now, 30.0), (now - DAY, 10.0), (now - 2 * DAY, 20.0)]);
        let readings = last_readings(&b, GRID.low(), DAY, 3).unwrap_or_default();
        assert_eq!(
            readings,
            vec![Reading::Watts(30.0), Reading::Watts(10.0), Reading::Watts(20.0)]
        );
    }

    #[test]
    fn before_floor_and_missing_are_distinct() {
        let now = GRID.low() + DAY;
        let b = building_at(now, &[(now, 5.0)]);
        let readings = last_readings(&b, GRID.low(), DAY, 3).unwrap_or_default();
        assert_eq!(
            readings,
            vec![Reading::Watts(5.0), Reading::Missing, Reading::BeforeStart]
        );
    }

    #[test]
    fn invalid_arguments_are_rejected() {
        let b = building_at(GRID.low(), &[]);
        for (interval, count) in [(DAY, 0), (0, 7), (-DAY, 7)] {
            let err = last_readings(&b, GRID.low(), interval, count).err().map(|e| e.kind());
            assert_eq!(err, Some(ErrorKind::Argument));
        }
    }

    #[test]
    fn huge_interval_reaches_before_start_without_overflow() {
        let now = GRID.low() + DAY;
        let b = building_at(now, &[(now, 5.0)]);
        let interval = i64::MAX / 4;
        let readings = last_readings(&b, GRID.low(), interval, 7).unwrap_or_default();
        assert_eq!(readings.len(), 7);
        assert_eq!(readings[0], Reading::Watts(5.0));
        assert!(readings[1..].iter().all(|r| *r == Reading::BeforeStart));

        let summary = WeeklySummary::for_building(&b, GRID.low(), interval, 7);
        let lines = summary.map(|s| s.lines).unwrap_or_default();
        assert_eq!(lines.len(), 7);
        assert!(lines[6].time < GRID.low());
        assert_eq!(lines[6].label, "No such time");
    }

    #[test]
    fn weekly_summary_labels_and_scales() {
        let now = GRID.low() + DAY;
        let b = building_at(now, &[(now, 40.0), (now - DAY, 20.0)]);
        let summary = WeeklySummary::for_building(&b, GRID.low(), DAY, 3);
        let summary = match summary {
            Ok(s) => s,
            Err(e) => panic!("summary failed: {e}"),
        };
        let labels: Vec<&str> = summary.lines.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, vec!["Today", "December 9", "No such time"]);
        assert_eq!(summary.lines[0].scale, Some(1.0));
        assert_eq!(summary.lines[1].scale, Some(0.0));
        assert_eq!(summary.lines[2].scale, None);

        let text = summary.to_string();
        assert!(text.starts_with("Ryder Hall (#5) on December 10, 2013 at 12:00"));
        assert!(text.contains("40.000 Watts"));
        assert!(text.contains(&"#".repeat(20)));
    }
}
