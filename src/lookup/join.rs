//! Overlap joins across geography levels.
//!
//! Edges point from a lower (contained) area to a higher (containing) one.
//! [`GeoService::areas_within`] walks edges into a target, and
//! [`GeoService::containing`] walks edges out of it. Both filter on the
//! edge's overlap percentage and sort by population (unknown last), then
//! overlap, then name.

use serde::Serialize;
use std::cmp::Ordering;
use tracing::debug;

use super::{population_desc, GeoService, ResolveMode};
use crate::error::{GeoError, Result};
use crate::models::{Area, GeoType, OverlapEdge};

/// An area reached through an overlap edge, with that edge's percentage.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AreaOverlap<'r> {
    #[serde(flatten)]
    pub area: &'r Area,
    pub overlap_pct: f64,
}

impl<'r> GeoService<'r> {
    /// Areas of `result_type` lying within `target` by at least `min_overlap_pct`.
    pub fn areas_within(
        &self,
        target: &Area,
        result_type: GeoType,
        min_overlap_pct: f64,
    ) -> Result<Vec<AreaOverlap<'r>>> {
        check_threshold(min_overlap_pct)?;
        self.ensure_registered(target)?;
        let registry = self.registry();

        let matches = registry
            .edges_into(target.geo_type, &target.code)
            .filter(|edge| edge.lower_type == result_type)
            .filter_map(|edge| self.reach(edge, edge.lower_type, &edge.lower_code, min_overlap_pct));

        let result = sorted(matches.collect());
        debug!(
            "{} {} areas within {} {} at >= {}%",
            result.len(),
            result_type,
            target.geo_type,
            target.code,
            min_overlap_pct
        );
        Ok(result)
    }

    /// Areas of `container_type` that `target` lies within by at least `min_overlap_pct`.
    pub fn containing(
        &self,
        target: &Area,
        container_type: GeoType,
        min_overlap_pct: f64,
    ) -> Result<Vec<AreaOverlap<'r>>> {
        check_threshold(min_overlap_pct)?;
        self.ensure_registered(target)?;
        let registry = self.registry();

        let matches = registry
            .edges_from(target.geo_type, &target.code)
            .filter(|edge| edge.higher_type == container_type)
            .filter_map(|edge| self.reach(edge, edge.higher_type, &edge.higher_code, min_overlap_pct));

        let result = sorted(matches.collect());
        debug!(
            "{} {} areas containing {} {} at >= {}%",
            result.len(),
            container_type,
            target.geo_type,
            target.code,
            min_overlap_pct
        );
        Ok(result)
    }

    /// [`Self::areas_within`] with the target given by name or code.
    pub fn areas_within_named(
        &self,
        target: &str,
        target_type: GeoType,
        result_type: GeoType,
        min_overlap_pct: f64,
    ) -> Result<Vec<AreaOverlap<'r>>> {
        let area = self.resolve_one(target, target_type, ResolveMode::BestGuess)?;
        self.areas_within(area, result_type, min_overlap_pct)
    }

    /// [`Self::containing`] with the target given by name or code.
    pub fn containing_named(
        &self,
        target: &str,
        target_type: GeoType,
        container_type: GeoType,
        min_overlap_pct: f64,
    ) -> Result<Vec<AreaOverlap<'r>>> {
        let area = self.resolve_one(target, target_type, ResolveMode::BestGuess)?;
        self.containing(area, container_type, min_overlap_pct)
    }

    fn ensure_registered(&self, target: &Area) -> Result<()> {
        if self.registry().contains(target) {
            Ok(())
        } else {
            Err(GeoError::NotFound {
                query: target.code.clone(),
                geo_type: target.geo_type,
            })
        }
    }

    fn reach(
        &self,
        edge: &OverlapEdge,
        geo_type: GeoType,
        code: &str,
        min_overlap_pct: f64,
    ) -> Option<AreaOverlap<'r>> {
        if edge.overlap_pct < min_overlap_pct {
            return None;
        }
        let area = self.registry().area(geo_type, code)?;
        Some(AreaOverlap {
            area,
            overlap_pct: edge.overlap_pct,
        })
    }
}

/// NaN compares false against every edge, so it would let all of them through.
fn check_threshold(min_overlap_pct: f64) -> Result<()> {
    if min_overlap_pct.is_finite() {
        Ok(())
    } else {
        Err(GeoError::InvalidThreshold(min_overlap_pct))
    }
}

fn sorted(mut rows: Vec<AreaOverlap<'_>>) -> Vec<AreaOverlap<'_>> {
    rows.sort_by(|a, b| {
        population_desc(a.area.population, b.area.population)
            .then_with(|| {
                b.overlap_pct
                    .partial_cmp(&a.overlap_pct)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.area.name.cmp(&b.area.name))
            .then_with(|| a.area.code.cmp(&b.area.code))
    });
    rows
}
