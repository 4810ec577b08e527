//! ausgeo - Australian statistical geography lookups
//!
//! Loads ABS population, relationship and boundary tables into an in-memory
//! registry and answers name resolution, overlap, distance and demographic
//! queries against it. Shared by the `query` and `ingest` binaries.

pub mod config;
pub mod error;
pub mod lookup;
pub mod models;
pub mod registry;
pub mod report;
pub mod spatial;

pub use config::DataConfig;
pub use error::{GeoError, Result};
pub use lookup::{GeoService, ResolveMode};
pub use models::{AgeGroup, Area, Gender, GeoType};
pub use registry::{GeoRegistry, RegistryBuilder};
