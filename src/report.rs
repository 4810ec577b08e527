//! Canned reports built on the lookup layer: suburbs of a city, major
//! cities, state rollups, city comparisons and SUA coverage.

use hashbrown::HashMap;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::error::Result;
use crate::lookup::{listing_order, within_distance, AreaDistance, AreaOverlap, GeoService, ResolveMode};
use crate::models::{Area, GeoType};

/// Population threshold for [`major_cities`]
pub const MAJOR_CITY_POPULATION: u64 = 100_000;

/// Name ABS gives the pseudo-SUA that collects non-urban localities
const NON_URBAN_SUA_PREFIX: &str = "not in any";

const STATES: &[(&str, &str)] = &[
    ("NSW", "New South Wales"),
    ("VIC", "Victoria"),
    ("QLD", "Queensland"),
    ("SA", "South Australia"),
    ("WA", "Western Australia"),
    ("TAS", "Tasmania"),
    ("NT", "Northern Territory"),
    ("ACT", "Australian Capital Territory"),
    ("OT", "Other Territories"),
];

/// True if `filter` names the area's state, by full name or abbreviation.
pub fn state_matches(area_state: Option<&str>, filter: &str) -> bool {
    let Some(state) = area_state else {
        return false;
    };
    let filter = filter.trim();
    if state.eq_ignore_ascii_case(filter) {
        return true;
    }
    STATES.iter().any(|(abbrev, name)| {
        abbrev.eq_ignore_ascii_case(filter) && (state.eq_ignore_ascii_case(name) || state.eq_ignore_ascii_case(abbrev))
    })
}

fn is_urban(sua: &Area) -> bool {
    !sua.name.to_lowercase().starts_with(NON_URBAN_SUA_PREFIX)
}

/// SAL areas lying within an SUA by at least `min_overlap` percent.
pub fn suburbs_in_city<'r>(service: &GeoService<'r>, city: &str, min_overlap: f64) -> Result<Vec<AreaOverlap<'r>>> {
    service.areas_within_named(city, GeoType::Sua, GeoType::Sal, min_overlap)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NearSort {
    #[default]
    Distance,
    Population,
    /// Share of the suburb inside the city, highest first
    Overlap,
    Name,
}

impl FromStr for NearSort {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "distance" => Ok(NearSort::Distance),
            "population" => Ok(NearSort::Population),
            "overlap" => Ok(NearSort::Overlap),
            "name" => Ok(NearSort::Name),
            other => Err(format!(
                "unknown sort '{}' (expected distance, population, overlap or name)",
                other
            )),
        }
    }
}

impl fmt::Display for NearSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NearSort::Distance => "distance",
            NearSort::Population => "population",
            NearSort::Overlap => "overlap",
            NearSort::Name => "name",
        };
        f.write_str(s)
    }
}

/// SAL areas whose centroid lies within `max_km` of the city's centroid.
pub fn suburbs_near_city<'r>(
    service: &GeoService<'r>,
    city: &str,
    max_km: f64,
    sort: NearSort,
) -> Result<Vec<AreaDistance<'r>>> {
    let sua = service.resolve_one(city, GeoType::Sua, ResolveMode::BestGuess)?;
    let mut rows = within_distance(sua, service.registry().areas(GeoType::Sal), max_km)?;

    match sort {
        NearSort::Distance => {}
        NearSort::Population => rows.sort_by(|a, b| listing_order(a.area, b.area)),
        NearSort::Overlap => {
            // Suburbs with no edge into the city count as 0%
            let shares: HashMap<&str, f64> = service
                .areas_within(sua, GeoType::Sal, 0.0)?
                .into_iter()
                .map(|r| (r.area.code.as_str(), r.overlap_pct))
                .collect();
            let share = |area: &Area| shares.get(area.code.as_str()).copied().unwrap_or(0.0);
            rows.sort_by(|a, b| {
                share(b.area)
                    .total_cmp(&share(a.area))
                    .then_with(|| a.area.name.cmp(&b.area.name))
                    .then_with(|| a.area.code.cmp(&b.area.code))
            });
        }
        NearSort::Name => rows.sort_by(|a, b| a.area.name.cmp(&b.area.name).then_with(|| a.area.code.cmp(&b.area.code))),
    }
    Ok(rows)
}

/// SUAs with at least `min_population` residents, largest first.
pub fn major_cities<'r>(service: &GeoService<'r>, min_population: u64) -> Vec<&'r Area> {
    let mut cities: Vec<&'r Area> = service
        .registry()
        .areas(GeoType::Sua)
        .filter(|a| is_urban(a) && a.population.is_some_and(|p| p >= min_population))
        .collect();
    cities.sort_by(|a, b| listing_order(a, b));
    cities
}

/// Top `n` SAL areas by population, optionally limited to one state.
pub fn largest_suburbs<'r>(service: &GeoService<'r>, n: usize, state: Option<&str>) -> Vec<&'r Area> {
    let mut suburbs: Vec<&'r Area> = service
        .registry()
        .areas(GeoType::Sal)
        .filter(|a| a.population.is_some())
        .filter(|a| state.map_or(true, |s| state_matches(a.state.as_deref(), s)))
        .collect();
    suburbs.sort_by(|a, b| listing_order(a, b));
    suburbs.truncate(n);
    suburbs
}

/// SAL areas in one state with at least `min_population` residents.
///
/// With a zero threshold, areas of unknown population are included.
pub fn suburbs_in_state<'r>(service: &GeoService<'r>, state: &str, min_population: u64) -> Vec<&'r Area> {
    let mut suburbs: Vec<&'r Area> = service
        .registry()
        .areas(GeoType::Sal)
        .filter(|a| state_matches(a.state.as_deref(), state))
        .filter(|a| min_population == 0 || a.population.is_some_and(|p| p >= min_population))
        .collect();
    suburbs.sort_by(|a, b| listing_order(a, b));
    suburbs
}

/// Case-insensitive name search, ordered by state then name.
pub fn find_areas_by_name<'r>(
    service: &GeoService<'r>,
    pattern: &str,
    geo_type: GeoType,
    state: Option<&str>,
) -> Vec<&'r Area> {
    let needle = pattern.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut found: Vec<&'r Area> = service
        .registry()
        .areas(geo_type)
        .filter(|a| a.name.to_lowercase().contains(&needle))
        .filter(|a| state.map_or(true, |s| state_matches(a.state.as_deref(), s)))
        .collect();
    found.sort_by(|a, b| {
        a.state
            .cmp(&b.state)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.code.cmp(&b.code))
    });
    found
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatePopulation {
    pub state: String,
    pub areas: usize,
    pub population: u64,
}

/// Known population summed per state, largest first. Areas without a state
/// are grouped under "Unknown".
pub fn population_by_state(service: &GeoService<'_>, geo_type: GeoType) -> Vec<StatePopulation> {
    let mut by_state: HashMap<String, StatePopulation> = HashMap::new();
    for area in service.registry().areas(geo_type) {
        let state = area.state.clone().unwrap_or_else(|| "Unknown".to_string());
        let entry = by_state.entry(state.clone()).or_insert_with(|| StatePopulation {
            state,
            areas: 0,
            population: 0,
        });
        entry.areas += 1;
        entry.population = entry.population.saturating_add(area.population.unwrap_or(0));
    }

    let mut rows: Vec<StatePopulation> = by_state.into_values().collect();
    rows.sort_by(|a, b| b.population.cmp(&a.population).then_with(|| a.state.cmp(&b.state)));
    rows
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompareMetric {
    #[default]
    Population,
    Area,
    SuburbCount,
    Density,
}

impl FromStr for CompareMetric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "population" => Ok(CompareMetric::Population),
            "area" | "area_sqkm" => Ok(CompareMetric::Area),
            "suburb_count" | "suburbs" => Ok(CompareMetric::SuburbCount),
            "density" => Ok(CompareMetric::Density),
            other => Err(format!("unknown metric '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityComparison {
    pub city: String,
    pub code: String,
    pub suburb_count: usize,
    /// Sum of known suburb populations
    pub population: u64,
    pub area_sqkm: Option<f64>,
    /// Residents per square kilometre
    pub density: Option<f64>,
}

impl CityComparison {
    fn metric(&self, metric: CompareMetric) -> Option<f64> {
        match metric {
            CompareMetric::Population => Some(self.population as f64),
            CompareMetric::Area => self.area_sqkm,
            CompareMetric::SuburbCount => Some(self.suburb_count as f64),
            CompareMetric::Density => self.density,
        }
    }
}

/// Side-by-side figures for several cities, sorted by `metric` descending.
/// Cities that cannot be resolved are logged and left out.
pub fn compare_cities(
    service: &GeoService<'_>,
    cities: &[&str],
    min_overlap: f64,
    metric: CompareMetric,
) -> Vec<CityComparison> {
    let mut rows = Vec::with_capacity(cities.len());

    for city in cities {
        let sua = match service.resolve_one(city, GeoType::Sua, ResolveMode::BestGuess) {
            Ok(sua) => sua,
            Err(e) => {
                warn!("Skipping city '{}': {}", city, e);
                continue;
            }
        };
        let suburbs = match service.areas_within(sua, GeoType::Sal, min_overlap) {
            Ok(suburbs) => suburbs,
            Err(e) => {
                warn!("Skipping city '{}': {}", city, e);
                continue;
            }
        };

        let population = suburbs
            .iter()
            .filter_map(|s| s.area.population)
            .fold(0u64, u64::saturating_add);
        rows.push(CityComparison {
            city: sua.name.clone(),
            code: sua.code.clone(),
            suburb_count: suburbs.len(),
            population,
            area_sqkm: sua.area_sqkm,
            density: sua.density_of(population),
        });
    }

    rows.sort_by(|a, b| match (a.metric(metric), b.metric(metric)) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    rows
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateCoverage {
    pub state: String,
    pub total_sal_count: usize,
    pub urban_sal_count: usize,
    pub urban_percentage: f64,
    pub total_population: u64,
    pub urban_population: u64,
    pub urban_pop_percentage: Option<f64>,
}

/// How much of each state lies inside a Significant Urban Area.
///
/// A suburb counts as urban when it has any overlap edge into an SUA other
/// than the ABS "Not in any Significant Urban Area" pseudo-area. Sorted by
/// urban share of suburbs, descending.
pub fn geographic_coverage(service: &GeoService<'_>) -> Vec<StateCoverage> {
    let registry = service.registry();
    let mut by_state: HashMap<String, StateCoverage> = HashMap::new();

    for sal in registry.areas(GeoType::Sal) {
        let Some(state) = sal.state.clone() else {
            continue;
        };
        let urban = registry
            .edges_from(GeoType::Sal, &sal.code)
            .filter(|e| e.higher_type == GeoType::Sua && e.overlap_pct > 0.0)
            .filter_map(|e| registry.area(GeoType::Sua, &e.higher_code))
            .any(is_urban);
        let population = sal.population.unwrap_or(0);

        let entry = by_state.entry(state.clone()).or_insert_with(|| StateCoverage {
            state,
            total_sal_count: 0,
            urban_sal_count: 0,
            urban_percentage: 0.0,
            total_population: 0,
            urban_population: 0,
            urban_pop_percentage: None,
        });
        entry.total_sal_count += 1;
        entry.total_population = entry.total_population.saturating_add(population);
        if urban {
            entry.urban_sal_count += 1;
            entry.urban_population = entry.urban_population.saturating_add(population);
        }
    }

    let mut rows: Vec<StateCoverage> = by_state
        .into_values()
        .map(|mut row| {
            row.urban_percentage = round1(row.urban_sal_count as f64 / row.total_sal_count as f64 * 100.0);
            if row.total_population > 0 {
                row.urban_pop_percentage =
                    Some(round1(row.urban_population as f64 / row.total_population as f64 * 100.0));
            }
            row
        })
        .collect();

    rows.sort_by(|a, b| {
        b.urban_percentage
            .partial_cmp(&a.urban_percentage)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.state.cmp(&b.state))
    });
    debug!("Coverage computed for {} states", rows.len());
    rows
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::DEFAULT_MIN_OVERLAP;
    use crate::models::{AreaKey, OverlapEdge};
    use crate::registry::fixtures;
    use crate::registry::RegistryBuilder;

    fn names<'a>(areas: impl IntoIterator<Item = &'a Area>) -> Vec<&'a str> {
        areas.into_iter().map(|a| a.name.as_str()).collect()
    }

    #[test]
    fn test_state_matches() {
        assert!(state_matches(Some("New South Wales"), "nsw"));
        assert!(state_matches(Some("New South Wales"), "new south wales"));
        assert!(state_matches(Some("NSW"), "NSW"));
        assert!(!state_matches(Some("Victoria"), "NSW"));
        assert!(!state_matches(None, "NSW"));
    }

    #[test]
    fn test_suburbs_in_city() {
        let registry = fixtures::registry();
        let service = GeoService::new(&registry);

        let rows = suburbs_in_city(&service, "Sydney", DEFAULT_MIN_OVERLAP).unwrap();
        assert_eq!(names(rows.iter().map(|r| r.area)), vec!["Parramatta", "Sydney", "Bondi Beach"]);

        assert!(suburbs_in_city(&service, "Atlantis", DEFAULT_MIN_OVERLAP)
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_suburbs_near_city_sorting() {
        let registry = fixtures::registry();
        let service = GeoService::new(&registry);

        let by_distance = suburbs_near_city(&service, "Sydney", 25.0, NearSort::Distance).unwrap();
        assert_eq!(
            names(by_distance.iter().map(|r| r.area)),
            vec!["Sydney", "Bondi Beach", "Parramatta"]
        );

        let by_population = suburbs_near_city(&service, "Sydney", 25.0, NearSort::Population).unwrap();
        assert_eq!(
            names(by_population.iter().map(|r| r.area)),
            vec!["Parramatta", "Sydney", "Bondi Beach"]
        );

        let by_name = suburbs_near_city(&service, "Sydney", 25.0, NearSort::Name).unwrap();
        assert_eq!(
            names(by_name.iter().map(|r| r.area)),
            vec!["Bondi Beach", "Parramatta", "Sydney"]
        );

        // Bondi and Sydney both lie fully inside; Parramatta at 97.5%
        let by_overlap = suburbs_near_city(&service, "Sydney", 25.0, "overlap".parse().unwrap()).unwrap();
        assert_eq!(
            names(by_overlap.iter().map(|r| r.area)),
            vec!["Bondi Beach", "Sydney", "Parramatta"]
        );
    }

    #[test]
    fn test_major_cities() {
        let registry = fixtures::registry();
        let service = GeoService::new(&registry);

        assert_eq!(names(major_cities(&service, MAJOR_CITY_POPULATION)), vec!["Melbourne", "Sydney"]);
        assert_eq!(major_cities(&service, 10_000).len(), 3);
    }

    #[test]
    fn test_largest_suburbs() {
        let registry = fixtures::registry();
        let service = GeoService::new(&registry);

        assert_eq!(names(largest_suburbs(&service, 2, None)), vec!["Parramatta", "Richmond"]);
        assert_eq!(
            names(largest_suburbs(&service, 2, Some("NSW"))),
            vec!["Parramatta", "Sydney"]
        );
        // Back O Bourke has no population and is never ranked
        assert_eq!(largest_suburbs(&service, 100, Some("NSW")).len(), 5);
    }

    #[test]
    fn test_suburbs_in_state() {
        let registry = fixtures::registry();
        let service = GeoService::new(&registry);

        assert_eq!(names(suburbs_in_state(&service, "VIC", 0)), vec!["Richmond"]);
        assert_eq!(suburbs_in_state(&service, "NSW", 0).len(), 6);
        assert_eq!(
            names(suburbs_in_state(&service, "NSW", 15_000)),
            vec!["Parramatta", "Sydney"]
        );
    }

    #[test]
    fn test_find_areas_by_name() {
        let registry = fixtures::registry();
        let service = GeoService::new(&registry);

        let found = find_areas_by_name(&service, "rich", GeoType::Sal, None);
        let states: Vec<Option<&str>> = found.iter().map(|a| a.state.as_deref()).collect();
        assert_eq!(states, vec![Some("New South Wales"), Some("Victoria")]);

        assert_eq!(find_areas_by_name(&service, "rich", GeoType::Sal, Some("vic")).len(), 1);
        assert!(find_areas_by_name(&service, "", GeoType::Sal, None).is_empty());
    }

    #[test]
    fn test_population_by_state() {
        let registry = fixtures::registry();
        let service = GeoService::new(&registry);

        let rows = population_by_state(&service, GeoType::Sal);
        assert_eq!(rows[0].state, "New South Wales");
        assert_eq!(rows[0].areas, 6);
        assert_eq!(rows[0].population, 11_000 + 17_000 + 30_000 + 5_000 + 8_000);
        assert_eq!(rows[1].state, "Victoria");
        assert_eq!(rows[1].population, 28_000);
    }

    #[test]
    fn test_compare_cities() {
        let registry = fixtures::registry();
        let service = GeoService::new(&registry);

        let rows = compare_cities(
            &service,
            &["Melbourne", "Atlantis", "Sydney"],
            DEFAULT_MIN_OVERLAP,
            CompareMetric::Population,
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].city, "Sydney");
        assert_eq!(rows[0].suburb_count, 3);
        assert_eq!(rows[0].population, 58_000);
        let density = rows[0].density.unwrap();
        assert!((density - 58_000.0 / 2_037.0).abs() < 1e-9);
        assert_eq!(rows[1].city, "Melbourne");

        let by_area = compare_cities(&service, &["Sydney", "Melbourne"], DEFAULT_MIN_OVERLAP, CompareMetric::Area);
        assert_eq!(by_area[0].city, "Melbourne");
    }

    #[test]
    fn test_geographic_coverage() {
        let registry = fixtures::registry();
        let service = GeoService::new(&registry);

        let rows = geographic_coverage(&service);
        let vic = rows.iter().find(|r| r.state == "Victoria").unwrap();
        assert_eq!(vic.urban_percentage, 100.0);

        let nsw = rows.iter().find(|r| r.state == "New South Wales").unwrap();
        assert_eq!(nsw.total_sal_count, 6);
        assert_eq!(nsw.urban_sal_count, 5);
        assert_eq!(nsw.urban_percentage, 83.3);
        assert_eq!(nsw.urban_pop_percentage, Some(100.0));
        assert_eq!(rows[0].state, "Victoria");
    }

    #[test]
    fn test_huge_populations_saturate() {
        let mut builder = RegistryBuilder::new();
        builder.add_area(
            Area::new("9001", GeoType::Sua, "Bigtown")
                .with_state("Tasmania")
                .with_area_sqkm(10.0),
        );
        for code in ["60001", "60002"] {
            builder
                .add_area(
                    Area::new(code, GeoType::Sal, format!("Suburb {}", code))
                        .with_state("Tasmania")
                        .with_population(u64::MAX),
                )
                .add_edge(
                    OverlapEdge::new(
                        AreaKey::new(GeoType::Sal, code),
                        AreaKey::new(GeoType::Sua, "9001"),
                        100.0,
                    )
                    .unwrap(),
                );
        }
        let registry = builder.build();
        let service = GeoService::new(&registry);

        assert_eq!(population_by_state(&service, GeoType::Sal)[0].population, u64::MAX);

        let coverage = geographic_coverage(&service);
        assert_eq!(coverage[0].total_population, u64::MAX);
        assert_eq!(coverage[0].urban_pop_percentage, Some(100.0));

        let rows = compare_cities(&service, &["Bigtown"], DEFAULT_MIN_OVERLAP, CompareMetric::Population);
        assert_eq!(rows[0].population, u64::MAX);
        assert_eq!(rows[0].suburb_count, 2);
    }

    #[test]
    fn test_non_urban_pseudo_area_not_counted() {
        let mut builder = RegistryBuilder::new();
        builder
            .add_area(Area::new("50001", GeoType::Sal, "Outback").with_state("Western Australia"))
            .add_area(Area::new("5999", GeoType::Sua, "Not in any Significant Urban Area (WA)"))
            .add_edge(
                OverlapEdge::new(
                    AreaKey::new(GeoType::Sal, "50001"),
                    AreaKey::new(GeoType::Sua, "5999"),
                    100.0,
                )
                .unwrap(),
            );
        let registry = builder.build();
        let service = GeoService::new(&registry);

        let rows = geographic_coverage(&service);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].urban_sal_count, 0);
        assert_eq!(rows[0].urban_pop_percentage, None);
    }
}
