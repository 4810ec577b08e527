//! Overlap edges linking a contained area to the area that contains it.

use serde::{Deserialize, Serialize};

use super::{AreaKey, GeoType};

/// Source rounding can push an overlap a hair past 100%.
pub const OVERLAP_TOLERANCE: f64 = 0.01;

/// Share of a lower-level unit that falls inside a higher-level unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlapEdge {
    pub lower_code: String,
    pub lower_type: GeoType,
    pub higher_code: String,
    pub higher_type: GeoType,
    /// Percentage in [0, 100]
    pub overlap_pct: f64,
}

impl OverlapEdge {
    /// Build an edge, rejecting percentages outside [0, 100].
    ///
    /// Values within [`OVERLAP_TOLERANCE`] of the bounds are clamped.
    pub fn new(lower: AreaKey, higher: AreaKey, overlap_pct: f64) -> Result<Self, String> {
        if !overlap_pct.is_finite() {
            return Err(format!("overlap {} is not a number", overlap_pct));
        }
        if overlap_pct < -OVERLAP_TOLERANCE || overlap_pct > 100.0 + OVERLAP_TOLERANCE {
            return Err(format!("overlap {} outside [0, 100]", overlap_pct));
        }
        Ok(Self {
            lower_code: lower.code,
            lower_type: lower.geo_type,
            higher_code: higher.code,
            higher_type: higher.geo_type,
            overlap_pct: overlap_pct.clamp(0.0, 100.0),
        })
    }

    pub fn lower(&self) -> AreaKey {
        AreaKey::new(self.lower_type, self.lower_code.clone())
    }

    pub fn higher(&self) -> AreaKey {
        AreaKey::new(self.higher_type, self.higher_code.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> (AreaKey, AreaKey) {
        (
            AreaKey::new(GeoType::Sal, "10001"),
            AreaKey::new(GeoType::Sua, "1030"),
        )
    }

    #[test]
    fn test_rounding_clamped() {
        let (lower, higher) = keys();
        let edge = OverlapEdge::new(lower, higher, 100.004).unwrap();
        assert_eq!(edge.overlap_pct, 100.0);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let (lower, higher) = keys();
        assert!(OverlapEdge::new(lower.clone(), higher.clone(), 140.0).is_err());
        assert!(OverlapEdge::new(lower.clone(), higher.clone(), -3.0).is_err());
        assert!(OverlapEdge::new(lower, higher, f64::NAN).is_err());
    }
}
