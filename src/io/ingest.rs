//! Builds the campus model from the three CSV extracts.
//!
//! The phases always run in the same order: building metadata, then site
//! metadata, then measurements. Sites are attached to buildings only after
//! every measurement has been recorded.
//!
//! A malformed line stops the phase reading it. Whatever that phase had
//! accumulated is kept and the failure is reported as an [`IngestIssue`]
//! alongside the result, so a damaged extract still yields a partial model.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::geo::Coordinate;
use crate::model::{Building, BuildingBuilder, DEFAULT_CURRENT_TIME, MeasurementGrid, Site};
use crate::text::split_masked;

/// Character that masks commas inside a CSV cell.
const QUOTE: char = '"';

/// Column layout of the building metadata extract.
mod building_col {
    pub const ID: usize = 0;
    pub const NAME: usize = 1;
    pub const PERIMETER: usize = 5;
    pub const AREA: usize = 6;
    pub const FOOTPRINT: usize = 7;
    pub const CENTROID: usize = 8;
    pub const OUTLINE: usize = 9;
}

/// Column layout of the site metadata extract.
mod site_col {
    pub const SITE_ID: usize = 0;
    pub const BUILDING_ID: usize = 3;
    pub const MIN_COLUMNS: usize = 4;
}

/// Which extract an issue came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Buildings,
    Sites,
    Measurements,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Buildings => "building file",
            Self::Sites => "site file",
            Self::Measurements => "measurement file",
        };
        f.write_str(name)
    }
}

/// A failure that stopped a phase or dropped a building.
#[derive(Debug)]
pub struct IngestIssue {
    /// Extract the failure belongs to.
    pub source: SourceKind,
    /// 1-based line number, header included, when tied to a line.
    pub line: Option<usize>,
    pub error: Error,
}

impl fmt::Display for IngestIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} line {line}: {}", self.source, self.error),
            None => write!(f, "{}: {}", self.source, self.error),
        }
    }
}

/// Result of one phase: everything read before the first failure.
#[derive(Debug)]
pub struct Partial<T> {
    pub value: T,
    /// The failure that stopped the phase, if any.
    pub issue: Option<IngestIssue>,
}

impl<T> Partial<T> {
    /// Whether the phase consumed its whole input.
    pub fn is_complete(&self) -> bool {
        self.issue.is_none()
    }
}

/// Settings applied to every ingested building.
#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
    /// Grid used for all wattage queries.
    pub grid: MeasurementGrid,
    /// Initial `current_time` of every building.
    pub initial_time: i64,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            grid: MeasurementGrid::CAMPUS,
            initial_time: DEFAULT_CURRENT_TIME,
        }
    }
}

/// Locations of the three extracts.
#[derive(Debug, Clone)]
pub struct SourcePaths {
    pub buildings: PathBuf,
    pub sites: PathBuf,
    pub measurements: PathBuf,
}

/// Final model plus every issue met on the way.
#[derive(Debug)]
pub struct Ingestion {
    /// Buildings in building-file order.
    pub buildings: Vec<Building>,
    pub issues: Vec<IngestIssue>,
}

impl Ingestion {
    /// Whether every phase read its whole input and every building was built.
    pub fn is_complete(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Reads the three extracts from disk, in order.
///
/// A file that cannot be opened contributes nothing and is reported as an
/// issue; the remaining phases still run.
pub fn ingest(paths: &SourcePaths, options: &IngestOptions) -> Ingestion {
    let mut issues = Vec::new();

    let builders = match open(&paths.buildings) {
        Ok(reader) => keep(read_building_file(reader, options), &mut issues),
        Err(error) => {
            report(&mut issues, SourceKind::Buildings, None, error);
            Vec::new()
        }
    };

    let mut sites = match open(&paths.sites) {
        Ok(reader) => keep(read_site_file(reader), &mut issues),
        Err(error) => {
            report(&mut issues, SourceKind::Sites, None, error);
            Vec::new()
        }
    };

    match open(&paths.measurements) {
        Ok(reader) => {
            keep(read_measure_file(reader, &mut sites), &mut issues);
        }
        Err(error) => report(&mut issues, SourceKind::Measurements, None, error),
    }

    assemble(builders, sites, issues)
}

/// Same as [`ingest`] over already-open readers.
pub fn ingest_readers<B, S, M>(
    buildings: B,
    sites: S,
    measurements: M,
    options: &IngestOptions,
) -> Ingestion
where
    B: BufRead,
    S: BufRead,
    M: BufRead,
{
    let mut issues = Vec::new();
    let builders = keep(read_building_file(buildings, options), &mut issues);
    let mut site_list = keep(read_site_file(sites), &mut issues);
    keep(read_measure_file(measurements, &mut site_list), &mut issues);
    assemble(builders, site_list, issues)
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("cannot open \"{}\": {e}", path.display()),
        ))
    })?;
    Ok(BufReader::new(file))
}

fn keep<T>(partial: Partial<T>, issues: &mut Vec<IngestIssue>) -> T {
    if let Some(issue) = partial.issue {
        warn!(%issue, "stopped reading early, keeping partial result");
        issues.push(issue);
    }
    partial.value
}

fn report(issues: &mut Vec<IngestIssue>, source: SourceKind, line: Option<usize>, error: Error) {
    let issue = IngestIssue {
        source,
        line,
        error,
    };
    warn!(%issue, "ingestion issue");
    issues.push(issue);
}

fn assemble(
    mut builders: Vec<BuildingBuilder>,
    sites: Vec<Site>,
    mut issues: Vec<IngestIssue>,
) -> Ingestion {
    if let Err(error) = link_sites(sites, &mut builders) {
        report(&mut issues, SourceKind::Sites, None, error);
    }

    let mut buildings = Vec::with_capacity(builders.len());
    for builder in builders {
        let id = builder.identify().ok();
        match builder.build() {
            Ok(building) => buildings.push(building),
            Err(error) => {
                warn!(building_id = ?id, %error, "dropping building");
                report(&mut issues, SourceKind::Buildings, None, error);
            }
        }
    }

    info!(
        buildings = buildings.len(),
        issues = issues.len(),
        "ingestion finished"
    );
    Ingestion { buildings, issues }
}

/// Phase 1: one builder per building row, header skipped.
pub fn read_building_file<R: BufRead>(
    reader: R,
    options: &IngestOptions,
) -> Partial<Vec<BuildingBuilder>> {
    let mut builders = Vec::new();
    let issue = for_each_row(reader, SourceKind::Buildings, |line| {
        builders.push(parse_building_row(line, options)?);
        Ok(())
    });
    info!(count = builders.len(), "read building metadata");
    Partial {
        value: builders,
        issue,
    }
}

/// Phase 2: bare sites, header skipped. Rows with fewer than four columns
/// are ignored.
pub fn read_site_file<R: BufRead>(reader: R) -> Partial<Vec<Site>> {
    let mut sites = Vec::new();
    let issue = for_each_row(reader, SourceKind::Sites, |line| {
        let cells = split_masked(line, QUOTE);
        if cells.len() < site_col::MIN_COLUMNS {
            debug!(line, "skipping short site row");
            return Ok(());
        }
        let site_id = parse_int(cells[site_col::SITE_ID], "site id")?;
        let building_id = parse_int(cells[site_col::BUILDING_ID], "building id")?;
        sites.push(Site::new(site_id, building_id));
        Ok(())
    });
    info!(count = sites.len(), "read site metadata");
    Partial { value: sites, issue }
}

/// Phase 3: records every row's readings into `sites`, header skipped.
///
/// Each site reads column `site_id + 1`; an empty cell is a reading of
/// zero. Timestamps are stored as written. The value is the number of rows
/// fully applied.
pub fn read_measure_file<R: BufRead>(reader: R, sites: &mut [Site]) -> Partial<usize> {
    let mut rows = 0usize;
    let issue = for_each_row(reader, SourceKind::Measurements, |line| {
        let cells = split_masked(line, QUOTE);
        let time: i64 = parse_int(cells[0], "timestamp")?;
        for site in sites.iter_mut() {
            let column = site.site_id() as usize + 1;
            let cell = cells.get(column).ok_or_else(|| {
                Error::format(format!(
                    "no column {column} for site {} (row has {})",
                    site.site_id(),
                    cells.len()
                ))
            })?;
            let watts = if cell.trim().is_empty() {
                0.0
            } else {
                parse_real(cell, "reading")?
            };
            site.add_time_watt(time, watts)?;
        }
        rows += 1;
        Ok(())
    });
    info!(rows, sites = sites.len(), "read measurements");
    Partial { value: rows, issue }
}

/// Moves every site into the builder with the matching building id.
///
/// Every builder receives a (possibly empty) site list. Sites whose
/// building is unknown are dropped; their count is returned. When two
/// builders share an id the first one gets the sites.
///
/// # Errors
///
/// Returns [`Error::Unidentified`] if a builder has no id.
pub fn link_sites(sites: Vec<Site>, builders: &mut [BuildingBuilder]) -> Result<usize> {
    let mut by_building: HashMap<u32, Vec<Site>> = HashMap::new();
    for site in sites {
        by_building.entry(site.building_id()).or_default().push(site);
    }

    for builder in builders.iter_mut() {
        let id = builder.identify()?;
        builder.sites(by_building.remove(&id).unwrap_or_default());
    }

    let dropped: usize = by_building.values().map(Vec::len).sum();
    if dropped > 0 {
        debug!(
            dropped,
            buildings = ?by_building.keys().collect::<Vec<_>>(),
            "dropping sites of unknown buildings"
        );
    }
    Ok(dropped)
}

/// Runs `f` on every non-blank line after the header. Stops at the first
/// read or row failure and returns it.
fn for_each_row<R: BufRead>(
    reader: R,
    source: SourceKind,
    mut f: impl FnMut(&str) -> Result<()>,
) -> Option<IngestIssue> {
    for (idx, line) in reader.lines().enumerate() {
        let number = idx + 1;
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                return Some(IngestIssue {
                    source,
                    line: Some(number),
                    error: e.into(),
                });
            }
        };
        if idx == 0 || line.trim().is_empty() {
            continue;
        }
        if let Err(error) = f(&line) {
            return Some(IngestIssue {
                source,
                line: Some(number),
                error,
            });
        }
    }
    None
}

fn parse_building_row(line: &str, options: &IngestOptions) -> Result<BuildingBuilder> {
    let cells = split_masked(line, QUOTE);
    let cell = |idx: usize| {
        cells
            .get(idx)
            .copied()
            .ok_or_else(|| Error::format(format!("missing column {idx}")))
    };

    let centroid = Coordinate::parse_one(strip_outer(cell(building_col::CENTROID)?, 1)?)?;
    let outline = Coordinate::parse_all(strip_outer(cell(building_col::OUTLINE)?, 2)?)?;

    let mut builder = BuildingBuilder::new();
    builder
        .building_id(parse_int(cell(building_col::ID)?, "building id")?)
        .name(cell(building_col::NAME)?)
        .perimeter(parse_int(cell(building_col::PERIMETER)?, "perimeter")?)
        .area(parse_real(cell(building_col::AREA)?, "area")?)
        .footprint(parse_int(cell(building_col::FOOTPRINT)?, "footprint")?)
        .centroid(centroid)
        .outline(outline)
        .current_time(options.grid.snap(options.initial_time))
        .grid(options.grid);
    Ok(builder)
}

/// Drops `n` characters from both ends of `s`.
fn strip_outer(s: &str, n: usize) -> Result<&str> {
    let count = s.chars().count();
    if count < 2 * n {
        return Err(Error::format(format!(
            "{s:?} is too short to strip {n} character(s) from each end"
        )));
    }
    let offset = |nth: usize| s.char_indices().nth(nth).map_or(s.len(), |(i, _)| i);
    Ok(&s[offset(n)..offset(count - n)])
}

fn parse_int<T>(text: &str, what: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    let text = text.trim();
    text.parse::<T>()
        .map_err(|e| Error::format(format!("invalid {what} {text:?}: {e}")))
}

fn parse_real(text: &str, what: &str) -> Result<f64> {
    let text = text.trim();
    text.parse::<f64>()
        .map_err(|e| Error::format(format!("invalid {what} {text:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const T0: i64 = DEFAULT_CURRENT_TIME;

    const BUILDINGS: &str = "\
id,name,campus,type,use,perimeter,area,footprint,centroid,outline
1,Snell Library,main,x,y,410,9801.5,3200,\"[42.338, -71.088]\",\"[[42.338, -71.088], [42.339, -71.087], [42.338, -71.088]]\"
2,Curry Center,main,x,y,300,5000.25,2100,\"[42.339, -71.087]\",\"[[42.339, -71.087], [42.340, -71.086], [42.339, -71.087]]\"
";

    const SITES: &str = "\
site_id,name,kind,building_id
0,Snell Main,elec,1
1,Curry A,elec,2
2,Curry B,elec,2
3,Orphan,elec,99
4,short
";

    fn measures() -> String {
        format!(
            "time,s0,s1,s2,s3\n{T0},100.0,20,,5\n{},50,30,10,5\n",
            T0 + 900
        )
    }

    fn run(buildings: &str, sites: &str, measures: &str) -> Ingestion {
        ingest_readers(
            buildings.as_bytes(),
            sites.as_bytes(),
            measures.as_bytes(),
            &IngestOptions::default(),
        )
    }

    #[test]
    fn full_ingest_links_and_averages() {
        let result = run(BUILDINGS, SITES, &measures());
        assert!(result.is_complete(), "issues: {:?}", result.issues);
        assert_eq!(result.buildings.len(), 2);

        let snell = &result.buildings[0];
        assert_eq!(snell.name(), "Snell Library");
        assert_eq!(snell.building_id(), 1);
        assert_eq!(snell.perimeter(), 410);
        assert_eq!(snell.area(), 9801.5);
        assert_eq!(snell.footprint(), 3200);
        assert_eq!(snell.centroid(), Coordinate::new(42.338, -71.088));
        assert_eq!(snell.outline().len(), 3);
        assert_eq!(snell.current_time(), T0);
        assert_eq!(snell.current_wattage().ok(), Some(100.0));

        let curry = &result.buildings[1];
        assert_eq!(curry.sites().len(), 2);
        // Blank cell for site 2 counts as zero.
        assert_eq!(curry.current_wattage().ok(), Some(10.0));
        assert_eq!(curry.wattage(T0 + 900).ok(), Some(20.0));
    }

    #[test]
    fn off_grid_initial_time_snaps_to_grid() {
        let options = IngestOptions {
            initial_time: T0 + 1,
            ..IngestOptions::default()
        };
        let result = ingest_readers(
            BUILDINGS.as_bytes(),
            SITES.as_bytes(),
            measures().as_bytes(),
            &options,
        );
        assert!(result.is_complete(), "issues: {:?}", result.issues);
        for b in &result.buildings {
            assert_eq!(b.current_time(), T0);
            assert!(options.grid.contains(b.current_time()));
        }
        assert_eq!(result.buildings[0].current_wattage().ok(), Some(100.0));
    }

    #[test]
    fn short_site_rows_are_skipped() {
        let partial = read_site_file(SITES.as_bytes());
        assert!(partial.is_complete());
        assert_eq!(partial.value.len(), 4);
    }

    #[test]
    fn orphan_sites_are_dropped() {
        let mut builders = read_building_file(BUILDINGS.as_bytes(), &IngestOptions::default()).value;
        let sites = read_site_file(SITES.as_bytes()).value;
        assert_eq!(link_sites(sites, &mut builders).ok(), Some(1));
    }

    #[test]
    fn unidentified_builder_fails_linking() {
        let mut builders = vec![BuildingBuilder::new()];
        let err = link_sites(Vec::new(), &mut builders);
        assert!(matches!(err, Err(Error::Unidentified)));
    }

    #[test]
    fn malformed_building_row_keeps_earlier_rows() {
        let broken = BUILDINGS.replace("5000.25", "lots");
        let result = run(&broken, SITES, &measures());
        assert_eq!(result.buildings.len(), 1);
        assert_eq!(result.buildings[0].name(), "Snell Library");
        assert_eq!(result.issues.len(), 1);
        let issue = &result.issues[0];
        assert_eq!(issue.source, SourceKind::Buildings);
        assert_eq!(issue.line, Some(3));
        assert_eq!(issue.error.kind(), ErrorKind::Format);
    }

    #[test]
    fn bad_outline_is_a_format_error() {
        let broken = BUILDINGS.replace("[42.340, -71.086]", "[42.340 -71.086]");
        let partial = read_building_file(broken.as_bytes(), &IngestOptions::default());
        assert_eq!(partial.value.len(), 1);
        assert_eq!(
            partial.issue.map(|i| i.error.kind()),
            Some(ErrorKind::Format)
        );
    }

    #[test]
    fn duplicate_timestamp_stops_measurements() {
        let dup = format!("time,s0,s1,s2,s3\n{T0},1,2,3,4\n{T0},5,6,7,8\n");
        let mut sites = read_site_file(SITES.as_bytes()).value;
        let partial = read_measure_file(dup.as_bytes(), &mut sites);
        assert_eq!(partial.value, 1);
        assert_eq!(partial.issue.as_ref().and_then(|i| i.line), Some(3));
        assert_eq!(
            partial.issue.map(|i| i.error.kind()),
            Some(ErrorKind::State)
        );
        assert_eq!(sites[0].wattage(&MeasurementGrid::CAMPUS, T0).ok(), Some(1.0));
    }

    #[test]
    fn missing_measure_column_is_reported() {
        let narrow = format!("time,s0\n{T0},1\n");
        let result = run(BUILDINGS, SITES, &narrow);
        assert_eq!(result.buildings.len(), 2);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].source, SourceKind::Measurements);
        assert_eq!(result.issues[0].error.kind(), ErrorKind::Format);
    }

    #[test]
    fn blank_lines_are_ignored() {
        let spaced = BUILDINGS.replace("\n2,", "\n\n2,");
        let result = run(&spaced, SITES, &measures());
        assert!(result.is_complete(), "issues: {:?}", result.issues);
        assert_eq!(result.buildings.len(), 2);
    }

    #[test]
    fn empty_sources_give_empty_model() {
        let result = run("", "", "");
        assert!(result.is_complete());
        assert!(result.buildings.is_empty());
    }

    #[test]
    fn unopenable_files_are_issues_not_panics() {
        let missing = std::env::temp_dir().join("campus-power-does-not-exist.csv");
        let paths = SourcePaths {
            buildings: missing.clone(),
            sites: missing.clone(),
            measurements: missing,
        };
        let result = ingest(&paths, &IngestOptions::default());
        assert!(result.buildings.is_empty());
        assert_eq!(result.issues.len(), 3);
        assert!(result.issues.iter().all(|i| i.error.kind() == ErrorKind::Io));
    }

    #[test]
    fn strip_outer_handles_quotes() {
        assert_eq!(strip_outer("\"[1, 2]\"", 1).ok(), Some("[1, 2]"));
        assert_eq!(strip_outer("\"[[1, 2]]\"", 2).ok(), Some("[1, 2]"));
        assert_eq!(strip_outer("ab", 1).ok(), Some(""));
        assert!(strip_outer("a", 1).is_err());
    }
}
