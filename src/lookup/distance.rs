//! Great-circle distance filtering between area centroids.

use geo::{Distance, Haversine, Point};
use serde::Serialize;
use std::cmp::Ordering;

use crate::error::{GeoError, Result};
use crate::models::{Area, GeoPoint};

/// Haversine distance in kilometres.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    Haversine.distance(Point::from(a), Point::from(b)) / 1000.0
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct AreaDistance<'r> {
    #[serde(flatten)]
    pub area: &'r Area,
    pub distance_km: f64,
}

/// Candidates whose centroid lies within `max_km` of the reference centroid,
/// nearest first. Candidates without a centroid are skipped.
pub fn within_distance<'r, I>(reference: &Area, candidates: I, max_km: f64) -> Result<Vec<AreaDistance<'r>>>
where
    I: IntoIterator<Item = &'r Area>,
{
    let origin = reference
        .centroid
        .ok_or_else(|| GeoError::MissingCentroid(format!("{} {}", reference.geo_type, reference.code)))?;

    let mut nearby: Vec<AreaDistance<'r>> = candidates
        .into_iter()
        .filter_map(|area| {
            let distance_km = distance_km(origin, area.centroid?);
            (distance_km <= max_km).then_some(AreaDistance { area, distance_km })
        })
        .collect();

    nearby.sort_by(|a, b| {
        a.distance_km
            .partial_cmp(&b.distance_km)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.area.name.cmp(&b.area.name))
    });
    Ok(nearby)
}
