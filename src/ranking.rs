//! Wattage ranking, shading and min-max scaling for presentation layers.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::Building;

/// Largest batch that can be ranked: one palette level per building.
pub const MAX_RANKED: usize = 255;

/// Alpha of scaled building colors.
const SCALED_ALPHA: i32 = 175;

/// An RGBA color with every channel in `[0, 255]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub alpha: u8,
}

impl Color {
    /// Sentinel color for buildings reporting exactly zero watts.
    pub const NO_DATA: Self = Self {
        r: 0,
        g: 128,
        b: 255,
        alpha: 225,
    };

    /// Builds a color, clamping each channel into `[0, 255]`.
    pub fn clamped(r: i32, g: i32, b: i32, alpha: i32) -> Self {
        let clamp = |v: i32| v.clamp(0, 255) as u8;
        Self {
            r: clamp(r),
            g: clamp(g),
            b: clamp(b),
            alpha: clamp(alpha),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02x}{:02x}{:02x}{:02x}",
            self.r, self.g, self.b, self.alpha
        )
    }
}

/// Color class assigned to a ranked building.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum Shade {
    /// Exactly zero watts, treated as "no data" rather than "lowest".
    NoData,
    /// Rank-proportional intensity `rank / count`, in `[0, 1)`.
    Scaled { intensity: f64 },
}

impl Shade {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoData => "no_data",
            Self::Scaled { .. } => "scaled",
        }
    }

    /// Intensity, or `None` for the no-data class.
    pub fn intensity(&self) -> Option<f64> {
        match self {
            Self::NoData => None,
            Self::Scaled { intensity } => Some(*intensity),
        }
    }
}

/// One entry of a ranking, ascending by wattage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked {
    /// Position in the ascending order, starting at 0.
    pub rank: usize,
    pub building_id: u32,
    pub name: String,
    /// Quantized time the wattage was read at.
    pub time: i64,
    pub watts: f64,
    pub shade: Shade,
    pub color: Color,
}

impl fmt::Display for Ranked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>3}. {:<32} #{:<5} {:>12.3} W  {:<7} {}",
            self.rank,
            self.name,
            self.building_id,
            self.watts,
            self.shade.label(),
            self.color,
        )
    }
}

/// Moves every building to `time`, sorts the slice ascending by current
/// wattage (stable, so ties keep input order) and shades each entry.
///
/// # Errors
///
/// - [`Error::Capacity`] if there are more than [`MAX_RANKED`] buildings;
///   nothing is modified.
/// - [`Error::MissingReading`] if any building lacks a reading at the new
///   time; times are updated but the order is left unchanged.
pub fn rank_and_color(buildings: &mut [Building], time: i64) -> Result<Vec<Ranked>> {
    check_capacity(buildings.len())?;
    for building in buildings.iter_mut() {
        building.change_time(time);
    }
    for building in buildings.iter() {
        building.current_wattage()?;
    }

    buildings.sort_by_cached_key(|b| TotalWatts(b.current_wattage().unwrap_or_default()));

    let sorted = buildings
        .iter()
        .map(|b| Ok((b, b.current_time(), b.current_wattage()?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(shade(sorted))
}

/// Ranks `buildings` at `time` without touching their current time.
///
/// # Errors
///
/// Same as [`rank_and_color`].
pub fn rank_at(buildings: &[Building], time: i64) -> Result<Vec<Ranked>> {
    check_capacity(buildings.len())?;
    let mut entries = buildings
        .iter()
        .map(|b| Ok((b, b.grid().snap(time), b.wattage(time)?)))
        .collect::<Result<Vec<_>>>()?;
    entries.sort_by(|a, b| a.2.total_cmp(&b.2));
    Ok(shade(entries))
}

/// Outcome of [`advance`].
#[derive(Debug, Clone)]
pub struct Advance {
    pub ranking: Vec<Ranked>,
    /// Every building sits on the upper bound of its grid.
    pub reached_end: bool,
}

/// Re-ranks at the first building's current time plus `step`.
///
/// # Errors
///
/// Same as [`rank_and_color`].
pub fn advance(buildings: &mut [Building], step: i64) -> Result<Advance> {
    let Some(first) = buildings.first() else {
        return Ok(Advance {
            ranking: Vec::new(),
            reached_end: true,
        });
    };
    let next = first.current_time().saturating_add(step);
    let ranking = rank_and_color(buildings, next)?;
    let reached_end = buildings
        .iter()
        .all(|b| b.current_time() >= b.grid().high());
    Ok(Advance {
        ranking,
        reached_end,
    })
}

/// Linearly maps `series` onto `[0, 1]` by its min and max.
///
/// A constant or empty series maps to all zeros.
///
/// # Examples
///
/// ```
/// use campus_power::ranking::min_max_scale;
///
/// assert_eq!(min_max_scale(&[0.0, 5.0, 10.0]), vec![0.0, 0.5, 1.0]);
/// assert_eq!(min_max_scale(&[3.0, 3.0]), vec![0.0, 0.0]);
/// ```
pub fn min_max_scale(series: &[f64]) -> Vec<f64> {
    let Some(&first) = series.first() else {
        return Vec::new();
    };
    let (min, max) = series
        .iter()
        .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let span = max - min;
    if span == 0.0 {
        return vec![0.0; series.len()];
    }
    series.iter().map(|v| (v - min) / span).collect()
}

fn check_capacity(count: usize) -> Result<()> {
    if count > MAX_RANKED {
        return Err(Error::Capacity {
            count,
            max: MAX_RANKED,
        });
    }
    Ok(())
}

/// Assigns shades to entries already sorted ascending by wattage.
fn shade(sorted: Vec<(&Building, i64, f64)>) -> Vec<Ranked> {
    let count = sorted.len();
    let level_step = if count == 0 { 0 } else { 255 / count as i32 };

    sorted
        .into_iter()
        .enumerate()
        .map(|(rank, (building, time, watts))| {
            let (shade, color) = if watts == 0.0 {
                (Shade::NoData, Color::NO_DATA)
            } else {
                (
                    Shade::Scaled {
                        intensity: rank as f64 / count as f64,
                    },
                    Color::clamped(255, 255 - level_step * rank as i32, 0, SCALED_ALPHA),
                )
            };
            Ranked {
                rank,
                building_id: building.building_id(),
                name: building.name().to_string(),
                time,
                watts,
                shade,
                color,
            }
        })
        .collect()
}

/// Total order over wattages for stable sorting.
#[derive(Debug, Clone, Copy)]
struct TotalWatts(f64);

impl PartialEq for TotalWatts {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TotalWatts {}

impl PartialOrd for TotalWatts {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TotalWatts {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::geo::Coordinate;
    use crate::model::{BuildingBuilder, MeasurementGrid, Site};

    const GRID: MeasurementGrid = MeasurementGrid::CAMPUS;

    fn building(id: u32, readings: &[(i64, f64)]) -> Building {
        let mut site = Site::new(id, id);
        for &(t, w) in readings {
            assert!(site.add_time_watt(t, w).is_ok());
        }
        let mut b = BuildingBuilder::new();
        b.building_id(id)
            .name(format!("B{id}"))
            .sites(vec![site])
            .centroid(Coordinate::new(0.0, 0.0))
            .outline(Vec::new())
            .current_time(GRID.low());
        match b.build() {
            Ok(b) => b,
            Err(e) => panic!("fixture build failed: {e}"),
        }
    }

    fn at(t: i64, watts: &[f64]) -> Vec<Building> {
        watts
            .iter()
            .enumerate()
            .map(|(i, &w)| building(i as u32, &[(t, w)]))
            .collect()
    }

    #[test]
    fn zero_is_no_data_and_rest_ascend() {
        let t = GRID.low() + 900;
        let mut buildings = at(t, &[15.0, 0.0, 5.0]);
        let ranking = rank_and_color(&mut buildings, t).unwrap_or_default();

        assert_eq!(ranking.len(), 3);
        assert_eq!(ranking[0].shade, Shade::NoData);
        assert_eq!(ranking[0].color, Color::NO_DATA);
        assert_eq!(ranking[1].watts, 5.0);
        assert_eq!(ranking[2].watts, 15.0);
        let low = ranking[1].shade.intensity().unwrap_or(f64::NAN);
        let high = ranking[2].shade.intensity().unwrap_or(f64::NAN);
        assert!(low < high, "{low} should be below {high}");
        assert_eq!(ranking[1].color, Color::clamped(255, 170, 0, 175));
        assert_eq!(ranking[2].color, Color::clamped(255, 85, 0, 175));

        let order: Vec<u32> = buildings.iter().map(Building::building_id).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn rank_and_color_moves_current_time() {
        let t = GRID.low() + 900;
        let mut buildings = at(t, &[1.0, 2.0]);
        assert!(rank_and_color(&mut buildings, t + 100).is_ok());
        assert!(buildings.iter().all(|b| b.current_time() == t));
    }

    #[test]
    fn ties_keep_input_order() {
        let t = GRID.low();
        let mut buildings = at(t, &[4.0, 4.0, 1.0, 4.0]);
        let ranking = rank_and_color(&mut buildings, t).unwrap_or_default();
        let ids: Vec<u32> = ranking.iter().map(|r| r.building_id).collect();
        assert_eq!(ids, vec![2, 0, 1, 3]);
    }

    #[test]
    fn oversized_batch_is_a_capacity_error() {
        let t = GRID.low();
        let mut buildings = at(t, &[1.0; MAX_RANKED + 1]);
        let err = rank_and_color(&mut buildings, t).err().map(|e| e.kind());
        assert_eq!(err, Some(ErrorKind::Capacity));
        assert_eq!(
            rank_at(&buildings, t).err().map(|e| e.kind()),
            Some(ErrorKind::Capacity)
        );
    }

    #[test]
    fn full_batch_is_accepted() {
        let t = GRID.low();
        let watts: Vec<f64> = (1..=MAX_RANKED).map(|w| w as f64).collect();
        let mut buildings = at(t, &watts);
        let ranking = rank_and_color(&mut buildings, t).unwrap_or_default();
        assert_eq!(ranking.len(), MAX_RANKED);
        assert_eq!(ranking[MAX_RANKED - 1].color.g, 1);
    }

    #[test]
    fn missing_reading_fails_ranking() {
        let t = GRID.low();
        let mut buildings = vec![building(0, &[(t, 1.0)]), building(1, &[])];
        let err = rank_and_color(&mut buildings, t).err().map(|e| e.kind());
        assert_eq!(err, Some(ErrorKind::Lookup));
    }

    #[test]
    fn rank_at_leaves_buildings_untouched() {
        let t = GRID.low() + 900;
        let buildings = at(t, &[3.0, 1.0]);
        let ranking = rank_at(&buildings, t + 10).unwrap_or_default();
        assert_eq!(ranking[0].building_id, 1);
        assert_eq!(ranking[0].time, t);
        assert!(buildings.iter().all(|b| b.current_time() == GRID.low()));
    }

    #[test]
    fn advance_steps_forward_and_stops_at_end() {
        let t = GRID.high() - 900;
        let mut buildings = vec![building(0, &[(t, 1.0), (GRID.high(), 2.0)])];
        buildings[0].change_time(t - 900);
        let step = advance(&mut buildings, 900);
        assert_eq!(step.as_ref().map(|a| a.reached_end).ok(), Some(false));

        let step = advance(&mut buildings, 9_000);
        assert_eq!(step.as_ref().map(|a| a.reached_end).ok(), Some(true));
        assert_eq!(buildings[0].current_time(), GRID.high());
    }

    #[test]
    fn min_max_scale_cases() {
        assert_eq!(min_max_scale(&[3.0, 3.0, 3.0]), vec![0.0, 0.0, 0.0]);
        assert_eq!(min_max_scale(&[0.0, 10.0]), vec![0.0, 1.0]);
        assert_eq!(min_max_scale(&[]), Vec::<f64>::new());
        assert_eq!(min_max_scale(&[-2.0, 0.0, 2.0]), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn color_channels_clamp() {
        let c = Color::clamped(300, -4, 12, 255);
        assert_eq!((c.r, c.g, c.b, c.alpha), (255, 0, 12, 255));
        assert_eq!(c.to_string(), "#ff000cff");
    }
}
