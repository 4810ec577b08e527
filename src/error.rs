//! Error types shared by the registry loaders and the query surface.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::GeoType;

pub type Result<T, E = GeoError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum GeoError {
    /// Resolution produced no candidate where exactly one area was required.
    #[error("no {geo_type} area matches '{query}'")]
    NotFound { query: String, geo_type: GeoType },

    /// Strict resolution found several equally good candidates.
    #[error("'{query}' matches {} {geo_type} areas: {}", candidates.len(), candidates.join(", "))]
    AmbiguousMatch {
        query: String,
        geo_type: GeoType,
        candidates: Vec<String>,
    },

    #[error("unknown geography type '{0}' (expected one of lga, sa2, sal, sua)")]
    InvalidGeoType(String),

    #[error("{}:{line}: {reason}", path.display())]
    MalformedRow {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("{}: required column '{column}' not found", path.display())]
    MissingColumn { path: PathBuf, column: String },

    /// Overlap percentages and distances must be finite numbers.
    #[error("invalid threshold {0}: expected a finite number")]
    InvalidThreshold(f64),

    #[error("area {0} has no centroid")]
    MissingCentroid(String),

    #[error("no areas were loaded; check the data directory and table paths")]
    EmptyRegistry,

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("{}: {source}", path.display())]
    GeoJson {
        path: PathBuf,
        #[source]
        source: geojson::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl GeoError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GeoError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for the "nothing matched" outcomes a caller may want to treat as a miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GeoError::NotFound { .. })
    }
}
