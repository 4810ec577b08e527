//! Name/code resolution.
//!
//! Matching tiers, best first:
//! 1. exact code (after stripping an ABS type prefix),
//! 2. exact case-insensitive name,
//! 3. case-insensitive substring of the name.
//!
//! Each area is reported once, in its best tier. Within a tier, larger
//! populations rank first, then names and codes alphabetically.

use serde::Serialize;
use tracing::debug;

use super::{listing_order, GeoService};
use crate::error::{GeoError, Result};
use crate::models::{Area, GeoType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchQuality {
    ExactCode,
    ExactName,
    Substring,
}

/// A ranked resolution candidate
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Candidate<'r> {
    pub area: &'r Area,
    pub quality: MatchQuality,
}

/// How [`GeoService::resolve_one`] treats several equally good candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResolveMode {
    /// Take the top-ranked candidate
    #[default]
    BestGuess,
    /// Fail with [`GeoError::AmbiguousMatch`] when the best tier holds more than one area
    Strict,
}

impl<'r> GeoService<'r> {
    /// All candidates for `query`, best first, with their match tier.
    pub fn rank(&self, query: &str, geo_type: GeoType) -> Vec<Candidate<'r>> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let code = geo_type.normalize_code(query);
        let needle = query.to_lowercase();

        let mut candidates: Vec<Candidate<'r>> = self
            .registry()
            .areas(geo_type)
            .filter_map(|area| {
                let quality = if area.code == code {
                    MatchQuality::ExactCode
                } else {
                    let name = area.name.to_lowercase();
                    if name == needle {
                        MatchQuality::ExactName
                    } else if name.contains(&needle) {
                        MatchQuality::Substring
                    } else {
                        return None;
                    }
                };
                Some(Candidate { area, quality })
            })
            .collect();

        candidates.sort_by(|a, b| {
            a.quality
                .cmp(&b.quality)
                .then_with(|| listing_order(a.area, b.area))
        });

        debug!(
            "Resolved '{}' ({}) to {} candidates",
            query,
            geo_type,
            candidates.len()
        );
        candidates
    }

    /// Areas matching `query`, best first. Empty when nothing matches.
    pub fn resolve(&self, query: &str, geo_type: GeoType) -> Vec<&'r Area> {
        self.rank(query, geo_type)
            .into_iter()
            .map(|c| c.area)
            .collect()
    }

    /// Resolve to exactly one area.
    pub fn resolve_one(&self, query: &str, geo_type: GeoType, mode: ResolveMode) -> Result<&'r Area> {
        let candidates = self.rank(query, geo_type);

        let Some(best) = candidates.first() else {
            return Err(GeoError::NotFound {
                query: query.to_string(),
                geo_type,
            });
        };

        if mode == ResolveMode::Strict {
            let tied: Vec<String> = candidates
                .iter()
                .take_while(|c| c.quality == best.quality)
                .map(|c| describe(c.area))
                .collect();
            if tied.len() > 1 {
                return Err(GeoError::AmbiguousMatch {
                    query: query.to_string(),
                    geo_type,
                    candidates: tied,
                });
            }
        }

        Ok(best.area)
    }
}

fn describe(area: &Area) -> String {
    match &area.state {
        Some(state) => format!("{} {} ({})", area.code, area.name, state),
        None => format!("{} {}", area.code, area.name),
    }
}
