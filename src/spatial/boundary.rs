//! Boundary loading from GeoJSON exports of the ABS shapefiles.

use geo::{BoundingRect, Centroid, MultiPolygon};
use geojson::{Feature, GeoJson, JsonObject, JsonValue};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{GeoError, Result};
use crate::models::{Area, GeoPoint, GeoType};
use crate::registry::table;

/// A single boundary polygon with its area record
#[derive(Debug, Clone)]
pub struct AreaBoundary {
    pub area: Area,
    pub geometry: MultiPolygon<f64>,
}

impl AreaBoundary {
    /// Get the bounding box of this boundary
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        self.geometry
            .bounding_rect()
            .map(|rect| (rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }
}

/// Load every feature of a GeoJSON FeatureCollection as a boundary of `geo_type`.
///
/// Features without a code or without polygonal geometry are skipped with a
/// warning; the centroid of each kept geometry is stored on its area.
pub fn load_boundaries(path: &Path, geo_type: GeoType) -> Result<Vec<AreaBoundary>> {
    info!("Loading {} boundaries from {}", geo_type, path.display());

    let mut content = String::new();
    table::open_maybe_gz(path)?
        .read_to_string(&mut content)
        .map_err(|e| GeoError::io(path, e))?;
    let geojson: GeoJson = content.parse().map_err(|source| GeoError::GeoJson {
        path: path.to_path_buf(),
        source,
    })?;

    let features = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(_) => {
            return Err(GeoError::Config(format!(
                "{}: expected a FeatureCollection, found a bare geometry",
                path.display()
            )))
        }
    };

    let mut boundaries = Vec::with_capacity(features.len());
    let mut skipped = 0usize;

    for (idx, feature) in features.into_iter().enumerate() {
        match feature_to_boundary(feature, geo_type) {
            Ok(boundary) => boundaries.push(boundary),
            Err(reason) => {
                warn!("Skipping {} feature #{} in {}: {}", geo_type, idx, path.display(), reason);
                skipped += 1;
            }
        }
    }

    info!(
        "Loaded {} {} boundaries ({} skipped)",
        boundaries.len(),
        geo_type,
        skipped
    );
    Ok(boundaries)
}

fn feature_to_boundary(feature: Feature, geo_type: GeoType) -> std::result::Result<AreaBoundary, String> {
    let props = feature.properties.unwrap_or_default();

    let code = find_property(&props, &table::code_aliases(geo_type))
        .map(|c| geo_type.normalize_code(&c))
        .filter(|c| !c.is_empty())
        .ok_or("missing area code")?;

    let name = find_property(&props, &table::name_aliases(geo_type)).unwrap_or_default();
    let mut area = Area::new(code, geo_type, name);
    area.state = find_property(&props, &table::state_aliases()).filter(|s| !s.is_empty());
    area.area_sqkm = find_property(&props, &table::area_aliases()).and_then(|a| a.parse().ok());

    let geometry = feature
        .geometry
        .ok_or_else(|| format!("area {} has no geometry", area.code))?;
    let geometry: geo_types::Geometry<f64> = geometry
        .try_into()
        .map_err(|e| format!("area {}: {}", area.code, e))?;

    let geometry = match geometry {
        geo_types::Geometry::MultiPolygon(mp) => mp,
        geo_types::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
        other => {
            return Err(format!(
                "area {} has non-polygonal geometry ({:?})",
                area.code,
                geometry_kind(&other)
            ))
        }
    };

    if geometry.0.is_empty() {
        return Err(format!("area {} has empty geometry", area.code));
    }

    area.centroid = geometry.centroid().map(|p| GeoPoint::new(p.y(), p.x()));
    if area.centroid.is_none() {
        debug!("No centroid for {} {}", geo_type, area.code);
    }

    Ok(AreaBoundary { area, geometry })
}

/// Case-insensitive property lookup; numbers are rendered without a
/// trailing ".0" so numeric codes compare equal to CSV text codes.
fn find_property(props: &JsonObject, aliases: &[String]) -> Option<String> {
    aliases.iter().find_map(|alias| {
        props
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(alias))
            .and_then(|(_, v)| match v {
                JsonValue::String(s) => Some(s.trim().to_string()),
                JsonValue::Number(n) => Some(match n.as_i64() {
                    Some(i) => i.to_string(),
                    None => n.to_string(),
                }),
                _ => None,
            })
    })
}

fn geometry_kind(geometry: &geo_types::Geometry<f64>) -> &'static str {
    match geometry {
        geo_types::Geometry::Point(_) => "Point",
        geo_types::Geometry::Line(_) => "Line",
        geo_types::Geometry::LineString(_) => "LineString",
        geo_types::Geometry::Polygon(_) => "Polygon",
        geo_types::Geometry::MultiPoint(_) => "MultiPoint",
        geo_types::Geometry::MultiLineString(_) => "MultiLineString",
        geo_types::Geometry::MultiPolygon(_) => "MultiPolygon",
        geo_types::Geometry::GeometryCollection(_) => "GeometryCollection",
        geo_types::Geometry::Rect(_) => "Rect",
        geo_types::Geometry::Triangle(_) => "Triangle",
    }
}
