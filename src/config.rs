//! Data file layout for the registry.
//!
//! Either written by hand as TOML:
//!
//! ```toml
//! data_dir = "/data/geo"
//!
//! [[population]]
//! geo_type = "sua"
//! path = "Population/sua_population.csv"
//!
//! [[relationships]]
//! lower = "sal"
//! higher = "sua"
//! path = "Relationships/sal_to_sua.csv"
//!
//! [[boundaries]]
//! geo_type = "sal"
//! path = "Boundaries/sal_2021.geojson"
//! optional = true
//! ```
//!
//! or derived from a directory laid out like the ABS downloads with
//! [`DataConfig::from_data_dir`].

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{GeoError, Result};
use crate::models::GeoType;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DataConfig {
    /// Base directory for relative table paths
    #[serde(default)]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub population: Vec<TableConfig>,
    #[serde(default)]
    pub relationships: Vec<RelationshipConfig>,
    #[serde(default)]
    pub boundaries: Vec<TableConfig>,
}

/// A per-geography table (population CSV or boundary GeoJSON)
#[derive(Debug, Deserialize, Clone)]
pub struct TableConfig {
    pub geo_type: GeoType,
    pub path: PathBuf,
    /// Skip silently (with a log line) when the file does not exist
    #[serde(default)]
    pub optional: bool,
}

/// An overlap table joining a finer geography to a coarser one
#[derive(Debug, Deserialize, Clone)]
pub struct RelationshipConfig {
    pub lower: GeoType,
    pub higher: GeoType,
    pub path: PathBuf,
    #[serde(default)]
    pub optional: bool,
}

impl DataConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| GeoError::io(path, e))?;
        let mut config: DataConfig = toml::from_str(&content)
            .map_err(|e| GeoError::Config(format!("{}: {}", path.display(), e)))?;

        // A relative data_dir is relative to the config file itself
        if config.data_dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.data_dir = parent.join(&config.data_dir);
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Derive a layout from a data directory:
    /// `Population/<type>_population.csv`, `Relationships/<lower>_to_sua.csv`
    /// and any `<type>*.geojson` under `Boundaries/`. Every table is optional.
    pub fn from_data_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();

        let population = GeoType::all()
            .iter()
            .map(|geo_type| TableConfig {
                geo_type: *geo_type,
                path: PathBuf::from("Population").join(format!("{}_population.csv", geo_type.key())),
                optional: true,
            })
            .collect();

        let relationships = [GeoType::Lga, GeoType::Sa2, GeoType::Sal]
            .iter()
            .map(|lower| RelationshipConfig {
                lower: *lower,
                higher: GeoType::Sua,
                path: PathBuf::from("Relationships").join(format!("{}_to_sua.csv", lower.key())),
                optional: true,
            })
            .collect();

        let boundaries = discover_boundaries(&data_dir.join("Boundaries"));

        Self {
            data_dir,
            population,
            relationships,
            boundaries,
        }
    }

    /// Resolve a configured path against `data_dir`.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    fn validate(&self) -> Result<()> {
        for rel in &self.relationships {
            if rel.lower == rel.higher {
                return Err(GeoError::Config(format!(
                    "relationship table {} joins {} to itself",
                    rel.path.display(),
                    rel.lower
                )));
            }
        }
        Ok(())
    }
}

/// Find `<type>*.geojson` files (e.g. `sal_2021.geojson`, `SUA_2021_AUST.geojson`).
fn discover_boundaries(dir: &Path) -> Vec<TableConfig> {
    if !dir.exists() {
        return Vec::new();
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let Ok(entry) = entry else { continue };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let lower = file_name.to_ascii_lowercase();
        if !(lower.ends_with(".geojson") || lower.ends_with(".geojson.gz")) {
            continue;
        }
        let geo_type = GeoType::all().iter().copied().find(|t| {
            lower
                .strip_prefix(t.key())
                .map(|rest| rest.starts_with(['_', '-', '.']))
                .unwrap_or(false)
        });
        if let Some(geo_type) = geo_type {
            debug!("Found {} boundary file {}", geo_type, path.display());
            found.push(TableConfig {
                geo_type,
                path: path.to_path_buf(),
                optional: true,
            });
        }
    }
    found
}
