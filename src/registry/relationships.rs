//! Overlap (relationship) table loading.

use std::path::Path;
use tracing::{info, warn};

use super::table::{self, Headers};
use crate::error::{GeoError, Result};
use crate::models::{Area, AreaKey, GeoType, OverlapEdge};

/// Edges read from one relationship table, plus whatever names and states
/// the table carries for its endpoints.
#[derive(Debug, Default)]
pub struct RelationshipTable {
    pub edges: Vec<OverlapEdge>,
    pub areas: Vec<Area>,
    pub skipped: usize,
}

/// Column aliases that name a specific geography (no bare "code"/"name").
fn specific(aliases: Vec<String>) -> Vec<String> {
    aliases
        .into_iter()
        .filter(|a| a != "code" && a != "name")
        .collect()
}

/// Load `<lower>_code, <higher>_code, overlap_pct` rows.
pub fn load_relationships(path: &Path, lower: GeoType, higher: GeoType) -> Result<RelationshipTable> {
    let mut reader = table::csv_reader(path)?;
    let headers = Headers::new(reader.headers()?);

    let lower_idx = headers.require(&specific(table::code_aliases(lower)), path)?;
    let higher_idx = headers.require(&specific(table::code_aliases(higher)), path)?;
    let pct_idx = headers.require(&table::overlap_aliases(), path)?;
    let lower_name_idx = headers.find(&specific(table::name_aliases(lower)));
    let higher_name_idx = headers.find(&specific(table::name_aliases(higher)));
    let state_idx = headers.find(&table::state_aliases());

    let mut out = RelationshipTable::default();

    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let field = |idx: Option<usize>| idx.and_then(|i| record.get(i)).map(str::trim).unwrap_or("");

        let lower_code = lower.normalize_code(field(Some(lower_idx)));
        let higher_code = higher.normalize_code(field(Some(higher_idx)));
        let raw_pct = field(Some(pct_idx));

        let edge = if lower_code.is_empty() || higher_code.is_empty() {
            Err("missing area code".to_string())
        } else {
            raw_pct
                .parse::<f64>()
                .map_err(|_| format!("'{}' is not an overlap percentage", raw_pct))
                .and_then(|pct| {
                    OverlapEdge::new(
                        AreaKey::new(lower, lower_code.clone()),
                        AreaKey::new(higher, higher_code.clone()),
                        pct,
                    )
                })
        };

        let edge = match edge {
            Ok(edge) => edge,
            Err(reason) => {
                let err = GeoError::MalformedRow {
                    path: path.to_path_buf(),
                    line,
                    reason,
                };
                warn!("Skipping row: {}", err);
                out.skipped += 1;
                continue;
            }
        };

        let mut lower_area = Area::new(lower_code, lower, field(lower_name_idx));
        let state = field(state_idx);
        if !state.is_empty() {
            lower_area.state = Some(state.to_string());
        }
        out.areas.push(lower_area);
        out.areas.push(Area::new(higher_code, higher, field(higher_name_idx)));
        out.edges.push(edge);
    }

    info!(
        "Loaded {} {}->{} overlap edges from {}{}",
        out.edges.len(),
        lower,
        higher,
        path.display(),
        if out.skipped > 0 {
            format!(", skipped {} malformed rows", out.skipped)
        } else {
            String::new()
        }
    );

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_generated_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sal_to_sua.csv");
        fs::write(
            &path,
            "sal_code,sal_name,state,sua_code,sua_name,overlap_pct\n\
             10001,Bondi,New South Wales,1030,Sydney,87.5\n\
             10002,Far Away,New South Wales,1030,Sydney,150\n\
             10003,Nowhere,New South Wales,1030,Sydney,\n",
        )
        .unwrap();

        let table = load_relationships(&path, GeoType::Sal, GeoType::Sua).unwrap();
        assert_eq!(table.edges.len(), 1);
        assert_eq!(table.skipped, 2);

        let edge = &table.edges[0];
        assert_eq!(edge.lower_code, "10001");
        assert_eq!(edge.higher_code, "1030");
        assert_eq!(edge.overlap_pct, 87.5);

        let bondi = &table.areas[0];
        assert_eq!(bondi.name, "Bondi");
        assert_eq!(bondi.state.as_deref(), Some("New South Wales"));
        assert_eq!(table.areas[1].name, "Sydney");
    }

    #[test]
    fn test_overlap_percentage_alias() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lga_to_sua.csv");
        fs::write(
            &path,
            "lga_code,sua_code,overlap_percentage\nLGA10050,1001,99.2\n",
        )
        .unwrap();

        let table = load_relationships(&path, GeoType::Lga, GeoType::Sua).unwrap();
        assert_eq!(table.edges[0].lower_code, "10050");
        assert_eq!(table.edges[0].overlap_pct, 99.2);
    }

    #[test]
    fn test_missing_overlap_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sa2_to_sua.csv");
        fs::write(&path, "sa2_code,sua_code\n101,1030\n").unwrap();
        let err = load_relationships(&path, GeoType::Sa2, GeoType::Sua).unwrap_err();
        assert!(matches!(err, GeoError::MissingColumn { column, .. } if column == "overlap_pct"));
    }
}
