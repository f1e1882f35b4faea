//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use campus_power::io::{IngestOptions, Ingestion, SourcePaths, ingest_readers};
use campus_power::model::{DEFAULT_CURRENT_TIME, MeasurementGrid};
use campus_power::synth::SyntheticCampus;

/// One building (id 7) with one site (id 0).
pub const ONE_BUILDING: &str = "\
building_id,name,campus,category,year,perimeter,area,footprint,centroid,outline
7,Snell Library,Main Campus,academic,1990,420,5123.5,2100,\"[42.338, -71.088]\",\"[[42.338, -71.088], [42.339, -71.087]]\"
";

pub const ONE_SITE: &str = "\
site_id,label,kind,building_id
0,Snell Main,electric,7
";

/// Single reading of 812.5 W for site 0 at the default current time.
pub fn one_reading() -> String {
    format!("time,0\n{DEFAULT_CURRENT_TIME},812.5\n")
}

/// A fresh, empty directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!(
        "campus-power-test-{name}-{}-{n}",
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("scratch dir should be creatable");
    dir
}

/// Writes the three extracts into `dir` and returns their paths.
pub fn write_sources(dir: &Path, buildings: &str, sites: &str, measurements: &str) -> SourcePaths {
    let paths = SourcePaths {
        buildings: dir.join("buildingDB.csv"),
        sites: dir.join("siteDB.csv"),
        measurements: dir.join("measureDB_parallel.csv"),
    };
    fs::write(&paths.buildings, buildings).expect("write buildings");
    fs::write(&paths.sites, sites).expect("write sites");
    fs::write(&paths.measurements, measurements).expect("write measurements");
    paths
}

/// Two days of synthetic data starting at the grid origin.
pub fn small_campus() -> SyntheticCampus {
    SyntheticCampus {
        buildings: 6,
        start: MeasurementGrid::CAMPUS.low(),
        rows: 2 * 96,
        blank_ratio: 0.0,
        seed: 7,
        ..SyntheticCampus::default()
    }
}

/// Options placing every building at noon of the second day.
pub fn small_campus_options() -> IngestOptions {
    IngestOptions {
        initial_time: MeasurementGrid::CAMPUS.low() + 86_400 + 12 * 3600,
        ..IngestOptions::default()
    }
}

/// Ingests [`small_campus`] from memory.
pub fn ingest_small_campus() -> Ingestion {
    let files = small_campus().render();
    ingest_readers(
        files.buildings.as_bytes(),
        files.sites.as_bytes(),
        files.measurements.as_bytes(),
        &small_campus_options(),
    )
}
