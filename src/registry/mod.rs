//! The area registry: every area, overlap edge and demographic cell,
//! built once from the input files and read-only afterwards.
//!
//! Construction goes through [`RegistryBuilder`] (or [`GeoRegistry::load`],
//! which drives a builder from a [`DataConfig`]). Once built, a
//! [`GeoRegistry`] holds only owned data, so it can be shared by reference
//! between threads without locking.

mod population;
mod relationships;
pub(crate) mod table;

#[cfg(test)]
pub(crate) mod fixtures;

use hashbrown::HashMap;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::DataConfig;
use crate::error::{GeoError, Result};
use crate::models::{AgeGroup, Area, AreaKey, DemographicRecord, Gender, GeoType, OverlapEdge};
use crate::spatial::{load_boundaries, AreaBoundary};

pub use population::{complete_totals, load_population, PopulationTable};
pub use relationships::{load_relationships, RelationshipTable};

/// Age/sex cells for one area
pub type DemographicCells = BTreeMap<(AgeGroup, Gender), u64>;

/// Edge positions keyed by geography type, then code
type EdgeIndex = HashMap<GeoType, HashMap<String, Vec<usize>>>;

/// One-time initialization phase for a [`GeoRegistry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    areas: HashMap<GeoType, HashMap<String, Area>>,
    edges: Vec<OverlapEdge>,
    demographics: HashMap<AreaKey, DemographicCells>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an area, or fill the gaps of an existing record with the same key.
    pub fn add_area(&mut self, area: Area) -> &mut Self {
        let by_code = self.areas.entry(area.geo_type).or_default();
        match by_code.get_mut(&area.code) {
            Some(existing) => existing.absorb(area),
            None => {
                by_code.insert(area.code.clone(), area);
            }
        }
        self
    }

    pub fn add_edge(&mut self, edge: OverlapEdge) -> &mut Self {
        self.edges.push(edge);
        self
    }

    /// Add one demographic cell; the first value seen for a cell wins.
    pub fn add_demographic(&mut self, record: DemographicRecord) -> &mut Self {
        self.demographics
            .entry(record.area)
            .or_default()
            .entry((record.age_group, record.gender))
            .or_insert(record.count);
        self
    }

    pub fn add_population_table(&mut self, table: PopulationTable) -> &mut Self {
        for area in table.areas {
            self.add_area(area);
        }
        for record in table.demographics {
            self.add_demographic(record);
        }
        self
    }

    pub fn add_relationship_table(&mut self, table: RelationshipTable) -> &mut Self {
        for area in table.areas {
            self.add_area(area);
        }
        for edge in table.edges {
            self.add_edge(edge);
        }
        self
    }

    /// Boundaries contribute their area attributes and centroid; the
    /// geometry itself is not retained.
    pub fn add_boundaries(&mut self, boundaries: Vec<AreaBoundary>) -> &mut Self {
        for boundary in boundaries {
            self.add_area(boundary.area);
        }
        self
    }

    /// Finish construction.
    ///
    /// Every edge endpoint gets an area record (named after its code when no
    /// table describes it), duplicate edges keep their first occurrence, and
    /// the lower/higher edge indexes are built.
    pub fn build(mut self) -> GeoRegistry {
        let mut seen: hashbrown::HashSet<(AreaKey, AreaKey)> = hashbrown::HashSet::new();
        let mut edges = Vec::with_capacity(self.edges.len());
        let mut duplicates = 0usize;

        for edge in std::mem::take(&mut self.edges) {
            if !seen.insert((edge.lower(), edge.higher())) {
                duplicates += 1;
                continue;
            }
            for key in [edge.lower(), edge.higher()] {
                self.add_area(Area::new(key.code, key.geo_type, ""));
            }
            edges.push(edge);
        }

        if duplicates > 0 {
            warn!("Ignored {} duplicate overlap edges", duplicates);
        }

        for by_code in self.areas.values_mut() {
            for area in by_code.values_mut() {
                if area.name.trim().is_empty() {
                    area.name = area.code.clone();
                }
            }
        }

        let mut by_lower = EdgeIndex::new();
        let mut by_higher = EdgeIndex::new();
        for (idx, edge) in edges.iter().enumerate() {
            by_lower
                .entry(edge.lower_type)
                .or_default()
                .entry(edge.lower_code.clone())
                .or_default()
                .push(idx);
            by_higher
                .entry(edge.higher_type)
                .or_default()
                .entry(edge.higher_code.clone())
                .or_default()
                .push(idx);
        }

        let registry = GeoRegistry {
            areas: self.areas,
            edges,
            by_lower,
            by_higher,
            demographics: self.demographics,
        };

        info!(
            "Registry built: {} areas, {} overlap edges, {} areas with demographics",
            registry.area_count(),
            registry.edge_count(),
            registry.demographics.len()
        );
        for geo_type in GeoType::all() {
            debug!("  {}: {} areas", geo_type, registry.count(*geo_type));
        }

        registry
    }
}

/// Immutable lookup tables for areas, overlap edges and demographics.
#[derive(Debug)]
pub struct GeoRegistry {
    areas: HashMap<GeoType, HashMap<String, Area>>,
    edges: Vec<OverlapEdge>,
    by_lower: EdgeIndex,
    by_higher: EdgeIndex,
    demographics: HashMap<AreaKey, DemographicCells>,
}

impl GeoRegistry {
    /// Load every table named by the config.
    ///
    /// Population tables are read first so their names and figures take
    /// precedence, then boundaries (centroids), then relationship tables.
    /// Missing required files are fatal, missing optional ones are logged.
    pub fn load(config: &DataConfig) -> Result<Self> {
        let mut builder = RegistryBuilder::new();

        for table in &config.population {
            let path = config.resolve(&table.path);
            if check_present(&path, table.optional)? {
                builder.add_population_table(load_population(&path, table.geo_type)?);
            }
        }

        for table in &config.boundaries {
            let path = config.resolve(&table.path);
            if check_present(&path, table.optional)? {
                builder.add_boundaries(load_boundaries(&path, table.geo_type)?);
            }
        }

        for rel in &config.relationships {
            let path = config.resolve(&rel.path);
            if check_present(&path, rel.optional)? {
                builder.add_relationship_table(load_relationships(&path, rel.lower, rel.higher)?);
            }
        }

        let registry = builder.build();
        if registry.area_count() == 0 {
            return Err(GeoError::EmptyRegistry);
        }
        Ok(registry)
    }

    pub fn area(&self, geo_type: GeoType, code: &str) -> Option<&Area> {
        self.areas.get(&geo_type)?.get(code)
    }

    /// True if this exact record's key is registered.
    pub fn contains(&self, area: &Area) -> bool {
        self.area(area.geo_type, &area.code).is_some()
    }

    /// All areas of one type, in no particular order.
    pub fn areas(&self, geo_type: GeoType) -> impl Iterator<Item = &Area> {
        self.areas.get(&geo_type).into_iter().flat_map(|m| m.values())
    }

    pub fn count(&self, geo_type: GeoType) -> usize {
        self.areas.get(&geo_type).map_or(0, |m| m.len())
    }

    pub fn area_count(&self) -> usize {
        self.areas.values().map(|m| m.len()).sum()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[OverlapEdge] {
        &self.edges
    }

    /// Edges whose higher (containing) endpoint is the given area.
    pub fn edges_into(&self, geo_type: GeoType, code: &str) -> impl Iterator<Item = &OverlapEdge> {
        Self::indexed(&self.by_higher, geo_type, code).map(move |i| &self.edges[i])
    }

    /// Edges whose lower (contained) endpoint is the given area.
    pub fn edges_from(&self, geo_type: GeoType, code: &str) -> impl Iterator<Item = &OverlapEdge> {
        Self::indexed(&self.by_lower, geo_type, code).map(move |i| &self.edges[i])
    }

    pub fn demographic_cells(&self, geo_type: GeoType, code: &str) -> Option<&DemographicCells> {
        self.demographics.get(&AreaKey::new(geo_type, code))
    }

    fn indexed<'a>(
        index: &'a EdgeIndex,
        geo_type: GeoType,
        code: &str,
    ) -> impl Iterator<Item = usize> + 'a {
        index
            .get(&geo_type)
            .and_then(|m| m.get(code))
            .into_iter()
            .flat_map(|v| v.iter().copied())
    }
}

fn check_present(path: &Path, optional: bool) -> Result<bool> {
    if path.exists() {
        return Ok(true);
    }
    if optional {
        info!("Optional table {} not found, skipping", path.display());
        Ok(false)
    } else {
        Err(GeoError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "required table not found"),
        ))
    }
}
