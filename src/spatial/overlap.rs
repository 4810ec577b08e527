//! Overlap computation between two boundary sets.

use geo::{Area, BooleanOps, Intersects};
use serde::Serialize;
use tracing::{debug, warn};

use super::{AreaBoundary, BoundaryIndex};
use crate::models::GeoType;

/// One row of a generated relationship table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapRow {
    pub lower_code: String,
    pub lower_name: String,
    pub state: String,
    pub higher_code: String,
    pub higher_name: String,
    pub overlap_pct: f64,
}

impl OverlapRow {
    /// CSV header matching the relationship loader's column aliases
    pub fn header(lower: GeoType, higher: GeoType) -> [String; 6] {
        [
            format!("{}_code", lower.key()),
            format!("{}_name", lower.key()),
            "state".to_string(),
            format!("{}_code", higher.key()),
            format!("{}_name", higher.key()),
            "overlap_pct".to_string(),
        ]
    }

    pub fn record(&self) -> [String; 6] {
        [
            self.lower_code.clone(),
            self.lower_name.clone(),
            self.state.clone(),
            self.higher_code.clone(),
            self.higher_name.clone(),
            format!("{:.4}", self.overlap_pct),
        ]
    }
}

/// Percentage of `lower` covered by each intersecting higher boundary.
///
/// Areas are compared in the boundaries' own coordinate space, so the ratio
/// is exact for equal-area projections and a close approximation for
/// geographic coordinates at suburb scale. Zero-area pairs are dropped.
pub fn overlaps_for(lower: &AreaBoundary, higher: &BoundaryIndex) -> Vec<OverlapRow> {
    let Some(bbox) = lower.bbox() else {
        return Vec::new();
    };

    let lower_area = lower.geometry.unsigned_area();
    if lower_area <= 0.0 {
        warn!(
            "Skipping {} {} ({}): zero-area geometry",
            lower.area.geo_type, lower.area.code, lower.area.name
        );
        return Vec::new();
    }

    let mut rows = Vec::new();
    for candidate in higher.intersecting(bbox) {
        if !lower.geometry.intersects(&candidate.geometry) {
            continue;
        }

        let shared = lower.geometry.intersection(&candidate.geometry).unsigned_area();
        let pct = (shared / lower_area * 100.0).clamp(0.0, 100.0);
        if pct <= 0.0 {
            continue;
        }

        debug!(
            "{} {} overlaps {} {} by {:.2}%",
            lower.area.geo_type, lower.area.code, candidate.area.geo_type, candidate.area.code, pct
        );

        rows.push(OverlapRow {
            lower_code: lower.area.code.clone(),
            lower_name: lower.area.name.clone(),
            state: lower.area.state.clone().unwrap_or_default(),
            higher_code: candidate.area.code.clone(),
            higher_name: candidate.area.name.clone(),
            overlap_pct: pct,
        });
    }

    rows.sort_by(|a, b| b.overlap_pct.total_cmp(&a.overlap_pct));
    rows
}
