//! Boundary geometry: GeoJSON loading, centroid derivation, and the
//! overlap computation used to generate relationship tables.

mod boundary;
mod index;
mod overlap;

pub use boundary::{load_boundaries, AreaBoundary};
pub use index::BoundaryIndex;
pub use overlap::{overlaps_for, OverlapRow};

#[cfg(test)]
pub(crate) use boundary::tests::{collection, square_feature};
