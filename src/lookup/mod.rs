//! Query surface over a built [`GeoRegistry`]: name resolution, overlap
//! joins, the centroid distance filter and demographic breakdowns.

mod demographics;
mod distance;
mod join;
mod resolver;

use std::cmp::Ordering;

use crate::models::Area;
use crate::registry::GeoRegistry;

pub use demographics::Demographics;
pub use distance::{distance_km, within_distance, AreaDistance};
pub use join::AreaOverlap;
pub use resolver::{Candidate, MatchQuality, ResolveMode};

/// Overlap threshold used when a caller has no opinion
pub const DEFAULT_MIN_OVERLAP: f64 = 50.0;

/// Read-only query service borrowing a registry.
///
/// Results borrow from the registry, not from the service, so a service can
/// be created per call site and dropped freely.
#[derive(Clone, Copy)]
pub struct GeoService<'r> {
    registry: &'r GeoRegistry,
}

impl<'r> GeoService<'r> {
    pub fn new(registry: &'r GeoRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r GeoRegistry {
        self.registry
    }
}

/// Conventional order for area listings: larger population first (unknown
/// last), then name, then code.
pub(crate) fn listing_order(a: &Area, b: &Area) -> Ordering {
    population_desc(a.population, b.population)
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.code.cmp(&b.code))
}

pub(crate) fn population_desc(a: Option<u64>, b: Option<u64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeoType;

    #[test]
    fn test_listing_order_unknown_population_last() {
        let big = Area::new("1", GeoType::Sal, "Zetland").with_population(10);
        let small = Area::new("2", GeoType::Sal, "Alexandria").with_population(5);
        let unknown = Area::new("3", GeoType::Sal, "Aaa");

        let mut areas = vec![&unknown, &small, &big];
        areas.sort_by(|a, b| listing_order(a, b));
        let names: Vec<&str> = areas.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Zetland", "Alexandria", "Aaa"]);
    }
}
