//! Area records held by the registry.

use serde::{Deserialize, Serialize};

use super::GeoType;

/// Geographic point (lat/lon)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(p: GeoPoint) -> Self {
        geo::Point::new(p.lon, p.lat)
    }
}

/// Registry key: codes are only unique within one geography type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AreaKey {
    pub geo_type: GeoType,
    pub code: String,
}

impl AreaKey {
    pub fn new(geo_type: GeoType, code: impl Into<String>) -> Self {
        Self {
            geo_type,
            code: code.into(),
        }
    }
}

/// One geographic unit of one geography type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    /// ABS code, normalised (no type prefix)
    pub code: String,

    pub geo_type: GeoType,

    /// Display name, e.g. "Bondi Beach (NSW)"
    pub name: String,

    /// Usual resident population, if a population table covers this area
    #[serde(skip_serializing_if = "Option::is_none")]
    pub population: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_sqkm: Option<f64>,

    /// Centroid of the boundary polygon
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centroid: Option<GeoPoint>,
}

impl Area {
    pub fn new(code: impl Into<String>, geo_type: GeoType, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            geo_type,
            name: name.into(),
            population: None,
            state: None,
            area_sqkm: None,
            centroid: None,
        }
    }

    pub fn with_population(mut self, population: u64) -> Self {
        self.population = Some(population);
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_centroid(mut self, lat: f64, lon: f64) -> Self {
        self.centroid = Some(GeoPoint::new(lat, lon));
        self
    }

    pub fn with_area_sqkm(mut self, area_sqkm: f64) -> Self {
        self.area_sqkm = Some(area_sqkm);
        self
    }

    pub fn key(&self) -> AreaKey {
        AreaKey::new(self.geo_type, self.code.clone())
    }

    /// `residents` per km² of this area, when its extent is known and non-zero.
    pub fn density_of(&self, residents: u64) -> Option<f64> {
        self.area_sqkm
            .filter(|sqkm| *sqkm > 0.0)
            .map(|sqkm| residents as f64 / sqkm)
    }

    /// Fill fields this record is missing from another record of the same area.
    ///
    /// Values already present win; sources are absorbed in load order.
    pub fn absorb(&mut self, other: Area) {
        debug_assert_eq!(self.key(), other.key());
        if self.name.trim().is_empty() {
            self.name = other.name;
        }
        self.population = self.population.or(other.population);
        if self.state.is_none() {
            self.state = other.state;
        }
        self.area_sqkm = self.area_sqkm.or(other.area_sqkm);
        self.centroid = self.centroid.or(other.centroid);
    }
}
