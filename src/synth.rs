//! Seeded generator for campus extracts in the three CSV layouts.
//!
//! Produces a small but realistic campus for demos and tests: buildings
//! with quoted centroid and outline cells, sites spread across them (plus
//! one orphan meter) and 15-minute measurements following a daily load
//! curve with Gaussian noise and occasional blank cells.

use std::f64::consts::PI;
use std::fs;
use std::io;
use std::path::Path;

use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::info;

use crate::config::DataConfig;
use crate::geo::Coordinate;
use crate::io::SourcePaths;
use crate::model::{DEFAULT_CURRENT_TIME, MeasurementGrid};

const DAY: i64 = 86_400;
const CAMPUS_CENTER: (f64, f64) = (42.3398, -71.0892);
const FIRST_BUILDING_ID: u32 = 100;
const HALL_NAMES: &[&str] = &[
    "Snell Library",
    "Ell Hall",
    "Richards Hall",
    "Hayden Hall",
    "Dodge Hall",
    "Churchill Hall",
    "Mugar Life Sciences",
    "Shillman Hall",
    "Forsyth Building",
    "Robinson Hall",
    "Meserve Hall",
    "Cabot Center",
];

/// Parameters of a generated campus.
#[derive(Debug, Clone)]
pub struct SyntheticCampus {
    pub buildings: usize,
    /// Each building gets between one and this many sites.
    pub max_sites_per_building: usize,
    /// Time of the first measurement row; snapped onto `grid`.
    pub start: i64,
    /// Number of measurement rows, one per grid step.
    pub rows: usize,
    /// Probability that a reading cell is left blank.
    pub blank_ratio: f64,
    pub seed: u64,
    pub grid: MeasurementGrid,
}

impl Default for SyntheticCampus {
    /// A week of history before the default current time plus one day after.
    fn default() -> Self {
        let grid = MeasurementGrid::CAMPUS;
        Self {
            buildings: HALL_NAMES.len(),
            max_sites_per_building: 3,
            start: DEFAULT_CURRENT_TIME - 7 * DAY,
            rows: (8 * DAY / grid.step()) as usize,
            blank_ratio: 0.01,
            seed: 42,
            grid,
        }
    }
}

/// Rendered file contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticFiles {
    pub buildings: String,
    pub sites: String,
    pub measurements: String,
}

impl SyntheticCampus {
    /// Renders the three extracts. Identical parameters give identical text.
    pub fn render(&self) -> SyntheticFiles {
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut buildings = String::from(
            "building_id,name,campus,category,year,perimeter,area,footprint,centroid,outline\n",
        );
        let mut sites = String::from("site_id,label,kind,building_id\n");
        let mut owners = Vec::new();

        for i in 0..self.buildings {
            let building_id = FIRST_BUILDING_ID + i as u32;
            let name = HALL_NAMES
                .get(i)
                .map_or_else(|| format!("Hall {building_id}"), |n| (*n).to_string());
            let centroid = Coordinate::new(
                CAMPUS_CENTER.0 + rng.random_range(-0.004..0.004),
                CAMPUS_CENTER.1 + rng.random_range(-0.004..0.004),
            );
            let half_w = rng.random_range(0.0002..0.0008);
            let half_h = rng.random_range(0.0002..0.0008);
            let outline = rectangle(centroid, half_w, half_h);
            let perimeter: i64 = rng.random_range(150..900);
            let footprint: i64 = rng.random_range(800..12_000);
            let area = footprint as f64 * rng.random_range(1.5..6.0);
            let year: u32 = rng.random_range(1920..2014);

            buildings.push_str(&format!(
                "{building_id},{name},Main Campus,academic,{year},{perimeter},{area:.2},{footprint},\"{centroid}\",\"[{}]\"\n",
                join(&outline)
            ));

            let count = rng.random_range(1..=self.max_sites_per_building.max(1));
            for _ in 0..count {
                owners.push(building_id);
            }
        }
        // A meter whose building is not in the extract.
        owners.push(FIRST_BUILDING_ID + self.buildings as u32 + 1);

        let mut loads = Vec::with_capacity(owners.len());
        for (site_id, building_id) in owners.iter().enumerate() {
            sites.push_str(&format!("{site_id},Meter {site_id},electric,{building_id}\n"));
            loads.push(SiteLoad {
                base: rng.random_range(20.0..400.0),
                swing: rng.random_range(0.2..0.6),
                phase: rng.random_range(-0.5..0.5),
            });
        }

        let mut measurements = String::from("time");
        for site_id in 0..owners.len() {
            measurements.push_str(&format!(",{site_id}"));
        }
        measurements.push('\n');

        let start = self.grid.snap(self.start);
        for row in 0..self.rows {
            let time = start + row as i64 * self.grid.step();
            measurements.push_str(&time.to_string());
            for load in &loads {
                if rng.random_bool(self.blank_ratio.clamp(0.0, 1.0)) {
                    measurements.push(',');
                } else {
                    let watts = load.watts(time, &mut rng);
                    measurements.push_str(&format!(",{watts:.3}"));
                }
            }
            measurements.push('\n');
        }

        SyntheticFiles {
            buildings,
            sites,
            measurements,
        }
    }

    /// Writes the three extracts under `dir` with the default file names.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if the directory or a file cannot be written.
    pub fn write_to_dir(&self, dir: &Path) -> io::Result<SourcePaths> {
        fs::create_dir_all(dir)?;
        let files = self.render();
        let data = DataConfig::in_dir(dir);
        fs::write(&data.buildings, files.buildings)?;
        fs::write(&data.sites, files.sites)?;
        fs::write(&data.measurements, files.measurements)?;
        info!(dir = %dir.display(), seed = self.seed, "wrote synthetic campus");
        Ok(SourcePaths {
            buildings: data.buildings,
            sites: data.sites,
            measurements: data.measurements,
        })
    }
}

/// Daily load curve of one meter.
struct SiteLoad {
    base: f64,
    /// Relative amplitude of the daily swing.
    swing: f64,
    phase: f64,
}

impl SiteLoad {
    fn watts(&self, time: i64, rng: &mut StdRng) -> f64 {
        let day_pos = time.rem_euclid(DAY) as f64 / DAY as f64;
        let sinus = (2.0 * PI * day_pos + self.phase).sin();
        let noise = gaussian_noise(rng, 0.05 * self.base);
        (self.base * (1.0 + self.swing * sinus) + noise).max(0.001)
    }
}

/// Gaussian noise with mean 0 via the Box-Muller transform.
fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }
    let u1: f64 = rng.random::<f64>().clamp(1e-9, 1.0);
    let u2: f64 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos() * std_dev
}

/// Closed rectangle around `center`, first vertex repeated at the end.
fn rectangle(center: Coordinate, half_w: f64, half_h: f64) -> Vec<Coordinate> {
    let (lat, lon) = (center.lat(), center.lon());
    let corners = vec![
        Coordinate::new(lat - half_h, lon - half_w),
        Coordinate::new(lat - half_h, lon + half_w),
        Coordinate::new(lat + half_h, lon + half_w),
        Coordinate::new(lat + half_h, lon - half_w),
    ];
    let first = corners[0];
    corners.into_iter().chain(std::iter::once(first)).collect()
}

fn join(points: &[Coordinate]) -> String {
    points
        .iter()
        .map(Coordinate::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
