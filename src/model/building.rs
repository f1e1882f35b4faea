use std::fmt;

use super::grid::MeasurementGrid;
use super::site::Site;
use crate::error::{Error, Result};
use crate::geo::Coordinate;

/// A building: static geometry plus the meters it owns.
///
/// Everything except `current_time` is fixed once built. Wattage queries
/// average the owned sites at a quantized time.
#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    name: String,
    building_id: u32,
    sites: Vec<Site>,
    footprint: i64,
    perimeter: i64,
    area: f64,
    centroid: Coordinate,
    outline: Vec<Coordinate>,
    current_time: i64,
    grid: MeasurementGrid,
}

impl Building {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn building_id(&self) -> u32 {
        self.building_id
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn footprint(&self) -> i64 {
        self.footprint
    }

    pub fn perimeter(&self) -> i64 {
        self.perimeter
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    /// Center point of the building.
    pub fn centroid(&self) -> Coordinate {
        self.centroid
    }

    /// Polygon vertices in source winding order.
    pub fn outline(&self) -> &[Coordinate] {
        &self.outline
    }

    /// Default query time, always a point of [`Building::grid`].
    pub fn current_time(&self) -> i64 {
        self.current_time
    }

    pub fn grid(&self) -> MeasurementGrid {
        self.grid
    }

    /// Moves the default query time to `time` snapped onto the grid.
    pub fn change_time(&mut self, time: i64) {
        self.current_time = self.grid.snap(time);
    }

    /// Mean wattage of all sites at [`Building::current_time`].
    ///
    /// # Errors
    ///
    /// See [`Building::wattage`].
    pub fn current_wattage(&self) -> Result<f64> {
        self.wattage(self.current_time)
    }

    /// Mean wattage of all sites at `time` (quantized per site).
    ///
    /// A building without sites reports zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingReading`] from the first site with no reading
    /// at the quantized time.
    pub fn wattage(&self, time: i64) -> Result<f64> {
        if self.sites.is_empty() {
            return Ok(0.0);
        }
        let mut total = 0.0;
        for site in &self.sites {
            total += site.wattage(&self.grid, time)?;
        }
        Ok(total / self.sites.len() as f64)
    }
}

impl fmt::Display for Building {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (#{}) sites={} footprint={} perimeter={} area={} centroid={} vertices={} time={}",
            self.name,
            self.building_id,
            self.sites.len(),
            self.footprint,
            self.perimeter,
            self.area,
            self.centroid,
            self.outline.len(),
            self.current_time,
        )
    }
}

/// Incrementally collects the fields of a [`Building`].
///
/// Setters may be called in any order; setting a field twice keeps the last
/// value. Missing required fields are only reported by [`build`].
///
/// [`build`]: BuildingBuilder::build
///
/// # Examples
///
/// ```
/// use campus_power::geo::Coordinate;
/// use campus_power::model::BuildingBuilder;
///
/// let mut builder = BuildingBuilder::new();
/// builder
///     .building_id(3)
///     .name("Snell Library")
///     .centroid(Coordinate::new(42.338, -71.088))
///     .outline(vec![Coordinate::new(42.338, -71.088)])
///     .sites(Vec::new());
/// let building = builder.build().unwrap();
/// assert_eq!(building.wattage(0).unwrap(), 0.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BuildingBuilder {
    name: Option<String>,
    building_id: Option<u32>,
    sites: Option<Vec<Site>>,
    footprint: i64,
    perimeter: i64,
    area: f64,
    centroid: Option<Coordinate>,
    outline: Option<Vec<Coordinate>>,
    current_time: i64,
    grid: MeasurementGrid,
}

impl BuildingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    pub fn building_id(&mut self, building_id: u32) -> &mut Self {
        self.building_id = Some(building_id);
        self
    }

    pub fn sites(&mut self, sites: Vec<Site>) -> &mut Self {
        self.sites = Some(sites);
        self
    }

    pub fn footprint(&mut self, footprint: i64) -> &mut Self {
        self.footprint = footprint;
        self
    }

    pub fn perimeter(&mut self, perimeter: i64) -> &mut Self {
        self.perimeter = perimeter;
        self
    }

    pub fn area(&mut self, area: f64) -> &mut Self {
        self.area = area;
        self
    }

    pub fn centroid(&mut self, centroid: Coordinate) -> &mut Self {
        self.centroid = Some(centroid);
        self
    }

    pub fn outline(&mut self, outline: Vec<Coordinate>) -> &mut Self {
        self.outline = Some(outline);
        self
    }

    /// Initial query time, stored as given.
    pub fn current_time(&mut self, current_time: i64) -> &mut Self {
        self.current_time = current_time;
        self
    }

    /// Grid used for every wattage query of the built building.
    pub fn grid(&mut self, grid: MeasurementGrid) -> &mut Self {
        self.grid = grid;
        self
    }

    /// Identifier assigned so far, used to match sites to builders.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unidentified`] if no identifier was set yet.
    pub fn identify(&self) -> Result<u32> {
        self.building_id.ok_or(Error::Unidentified)
    }

    /// Finalizes the building.
    ///
    /// Footprint, perimeter, area and current time default to zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first unset field among id,
    /// name, sites, centroid and outline.
    pub fn build(self) -> Result<Building> {
        let building_id = self
            .building_id
            .ok_or(Error::Validation { field: "building_id" })?;
        let name = self.name.ok_or(Error::Validation { field: "name" })?;
        let sites = self.sites.ok_or(Error::Validation { field: "sites" })?;
        let centroid = self.centroid.ok_or(Error::Validation { field: "centroid" })?;
        let outline = self.outline.ok_or(Error::Validation { field: "outline" })?;

        Ok(Building {
            name,
            building_id,
            sites,
            footprint: self.footprint,
            perimeter: self.perimeter,
            area: self.area,
            centroid,
            outline,
            current_time: self.current_time,
            grid: self.grid,
        })
    }
}
