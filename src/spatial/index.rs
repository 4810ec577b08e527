//! Spatial index for candidate boundary pairs.

use rstar::{RTree, RTreeObject, AABB};
use std::sync::Arc;
use tracing::info;

use super::AreaBoundary;

/// Wrapper for R-tree indexing of boundaries
#[derive(Clone)]
pub struct IndexedBoundary {
    pub boundary: Arc<AreaBoundary>,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedBoundary {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedBoundary {
    pub fn new(boundary: AreaBoundary) -> Option<Self> {
        let (min_x, min_y, max_x, max_y) = boundary.bbox()?;
        Some(Self {
            boundary: Arc::new(boundary),
            envelope: AABB::from_corners([min_x, min_y], [max_x, max_y]),
        })
    }
}

/// R-tree over boundary bounding boxes
pub struct BoundaryIndex {
    tree: RTree<IndexedBoundary>,
}

impl BoundaryIndex {
    pub fn build(boundaries: Vec<AreaBoundary>) -> Self {
        let indexed: Vec<IndexedBoundary> = boundaries
            .into_iter()
            .filter_map(IndexedBoundary::new)
            .collect();

        let tree = RTree::bulk_load(indexed);
        info!("Spatial index built with {} entries", tree.size());

        Self { tree }
    }

    /// Boundaries whose bounding box intersects the given one.
    /// Exact geometry tests are left to the caller.
    pub fn intersecting(&self, bbox: (f64, f64, f64, f64)) -> Vec<Arc<AreaBoundary>> {
        let (min_x, min_y, max_x, max_y) = bbox;
        let query_envelope = AABB::from_corners([min_x, min_y], [max_x, max_y]);

        self.tree
            .locate_in_envelope_intersecting(&query_envelope)
            .map(|ib| Arc::clone(&ib.boundary))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
