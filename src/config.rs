//! TOML-based application configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::io::{IngestOptions, SourcePaths};
use crate::model::{DEFAULT_CURRENT_TIME, MeasurementGrid};

/// Top-level configuration parsed from TOML.
///
/// Every section has defaults matching the campus extract. Load from TOML
/// with [`AppConfig::from_toml_file`] or start from [`AppConfig::campus`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Locations of the three CSV extracts.
    #[serde(default)]
    pub data: DataConfig,
    /// Quantization grid.
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    /// History and cycling settings.
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    pub buildings: PathBuf,
    pub sites: PathBuf,
    pub measurements: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            buildings: PathBuf::from("buildingDB.csv"),
            sites: PathBuf::from("siteDB.csv"),
            measurements: PathBuf::from("measureDB_parallel.csv"),
        }
    }
}

impl DataConfig {
    /// The default file names placed under `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        let names = Self::default();
        Self {
            buildings: dir.join(names.buildings),
            sites: dir.join(names.sites),
            measurements: dir.join(names.measurements),
        }
    }
}

/// Grid bounds and step in unix seconds.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    pub low: i64,
    pub high: i64,
    pub step: i64,
}

impl Default for GridConfig {
    fn default() -> Self {
        let campus = MeasurementGrid::CAMPUS;
        Self {
            low: campus.low(),
            high: campus.high(),
            step: campus.step(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestConfig {
    /// Initial `current_time` of every building (unix seconds).
    pub initial_time: i64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            initial_time: DEFAULT_CURRENT_TIME,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Number of readings in a building history (must be > 0).
    pub history_len: usize,
    /// Spacing of history readings in seconds (must be > 0).
    pub interval_secs: i64,
    /// Earliest time a history may reach; the grid start when unset.
    pub history_floor: Option<i64>,
    /// Time added on each ranking cycle in seconds (must be > 0).
    pub cycle_step_secs: i64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            history_len: 7,
            interval_secs: 86_400,
            history_floor: None,
            cycle_step_secs: 9_000,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"grid.step"`).
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl AppConfig {
    /// Available preset names.
    pub const PRESETS: &[&str] = &["campus", "demo"];

    /// The campus extract in the working directory.
    pub fn campus() -> Self {
        Self::default()
    }

    /// Generated sample data under the system temp directory.
    ///
    /// The files are not written here; see [`crate::synth::SyntheticCampus`].
    pub fn demo() -> Self {
        Self {
            data: DataConfig::in_dir(&Self::demo_dir()),
            ..Self::default()
        }
    }

    /// Directory the `demo` preset reads from.
    pub fn demo_dir() -> PathBuf {
        std::env::temp_dir().join("campus-power-demo")
    }

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "campus" => Ok(Self::campus()),
            "demo" => Ok(Self::demo()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        match self.measurement_grid() {
            Err(e) => errors.push(e),
            Ok(grid) => {
                let t = self.ingest.initial_time;
                if t < grid.low() || t > grid.high() {
                    errors.push(ConfigError {
                        field: "ingest.initial_time".into(),
                        message: format!("must be within [grid.low, grid.high], got {t}"),
                    });
                } else if !grid.contains(t) {
                    errors.push(ConfigError {
                        field: "ingest.initial_time".into(),
                        message: format!("must be a grid point, got {t} (nearest {})", grid.snap(t)),
                    });
                }
            }
        }

        let r = &self.report;
        if r.history_len == 0 {
            errors.push(ConfigError {
                field: "report.history_len".into(),
                message: "must be > 0".into(),
            });
        }
        if r.interval_secs <= 0 {
            errors.push(ConfigError {
                field: "report.interval_secs".into(),
                message: "must be > 0".into(),
            });
        }
        if r.cycle_step_secs <= 0 {
            errors.push(ConfigError {
                field: "report.cycle_step_secs".into(),
                message: "must be > 0".into(),
            });
        }

        errors
    }

    /// The configured grid.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` on `grid` if the bounds or step are unusable.
    pub fn measurement_grid(&self) -> Result<MeasurementGrid, ConfigError> {
        let g = self.grid;
        MeasurementGrid::new(g.low, g.high, g.step).map_err(|e| ConfigError {
            field: "grid".into(),
            message: e.to_string(),
        })
    }

    /// Options handed to the ingestion pipeline.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::measurement_grid`].
    pub fn ingest_options(&self) -> Result<IngestOptions, ConfigError> {
        Ok(IngestOptions {
            grid: self.measurement_grid()?,
            initial_time: self.ingest.initial_time,
        })
    }

    pub fn source_paths(&self) -> SourcePaths {
        SourcePaths {
            buildings: self.data.buildings.clone(),
            sites: self.data.sites.clone(),
            measurements: self.data.measurements.clone(),
        }
    }

    /// Earliest time a building history may reach.
    pub fn history_floor(&self) -> i64 {
        self.report.history_floor.unwrap_or(self.grid.low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn campus_preset_valid() {
        let errors = AppConfig::campus().validate();
        assert!(errors.is_empty(), "campus should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_unknown() {
        let err = AppConfig::from_preset("nonexistent").err();
        assert!(err.is_some_and(|e| e.message.contains("unknown preset")));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in AppConfig::PRESETS {
            let cfg = AppConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(AppConfig::validate).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn demo_reads_from_its_own_directory() {
        let cfg = AppConfig::demo();
        assert!(cfg.data.buildings.starts_with(AppConfig::demo_dir()));
        assert!(cfg.data.measurements.ends_with("measureDB_parallel.csv"));
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[data]
buildings = "data/b.csv"
sites = "data/s.csv"
measurements = "data/m.csv"

[grid]
low = 0
high = 86400
step = 900

[ingest]
initial_time = 43200

[report]
history_len = 3
interval_secs = 3600
history_floor = 1800
cycle_step_secs = 900
"#;
        let cfg = AppConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.grid.high), Some(86_400));
        assert_eq!(cfg.as_ref().map(AppConfig::history_floor), Some(1800));
        assert_eq!(
            cfg.as_ref().map(|c| c.source_paths().sites),
            Some(PathBuf::from("data/s.csv"))
        );
        assert!(cfg.map(|c| c.validate()).unwrap_or_default().is_empty());
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[grid]
step = 900
bogus_field = true
"#;
        assert!(AppConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[report]
history_len = 14
"#;
        let cfg = AppConfig::from_toml_str(toml).ok();
        assert_eq!(cfg.as_ref().map(|c| c.report.history_len), Some(14));
        assert_eq!(cfg.as_ref().map(|c| c.report.interval_secs), Some(86_400));
        assert_eq!(
            cfg.as_ref().map(AppConfig::history_floor),
            Some(MeasurementGrid::CAMPUS.low())
        );
    }

    #[test]
    fn validation_catches_bad_grid() {
        let mut cfg = AppConfig::campus();
        cfg.grid.step = 0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "grid"));
        assert!(cfg.ingest_options().is_err());
    }

    #[test]
    fn validation_catches_initial_time_outside_grid() {
        let mut cfg = AppConfig::campus();
        cfg.ingest.initial_time = cfg.grid.high + 1;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "ingest.initial_time"));
    }

    #[test]
    fn validation_catches_initial_time_off_grid() {
        let mut cfg = AppConfig::campus();
        cfg.ingest.initial_time = cfg.grid.low + 1;
        let errors = cfg.validate();
        let error = errors.iter().find(|e| e.field == "ingest.initial_time");
        assert!(error.is_some_and(|e| e.message.contains("grid point")));

        cfg.ingest.initial_time = cfg.grid.low + cfg.grid.step;
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn validation_catches_zero_history() {
        let mut cfg = AppConfig::campus();
        cfg.report.history_len = 0;
        cfg.report.interval_secs = -1;
        let fields: Vec<String> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"report.history_len".to_string()));
        assert!(fields.contains(&"report.interval_secs".to_string()));
    }
}
