//! Core data models for the geography registry.

pub mod area;
pub mod demographic;
pub mod geo_type;
pub mod overlap;

pub use area::{Area, AreaKey, GeoPoint};
pub use demographic::{parse_demographic_column, AgeGroup, DemographicRecord, Gender};
pub use geo_type::GeoType;
pub use overlap::OverlapEdge;
