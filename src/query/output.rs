//! Result rendering for the query CLI: aligned tables, CSV or JSON on stdout.

use std::io::{self, Write};

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

use ausgeo::lookup::{AreaDistance, AreaOverlap, Candidate, Demographics};
use ausgeo::models::Area;
use ausgeo::report::{CityComparison, StateCoverage, StatePopulation};
use ausgeo::{AgeGroup, Gender};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Table,
    Json,
    Csv,
}

/// Named cells for table and CSV output. Columns that are empty in every
/// row are left out.
pub trait Tabular {
    fn cells(&self) -> Vec<(&'static str, Option<String>)>;
}

/// Flat view of an area plus whatever the query attached to it
#[derive(Debug, Clone, Serialize)]
pub struct AreaRow {
    pub code: String,
    pub name: String,
    pub geo_type: String,
    pub state: Option<String>,
    pub population: Option<u64>,
    pub area_sqkm: Option<f64>,
    pub overlap_pct: Option<f64>,
    pub distance_km: Option<f64>,
    pub match_quality: Option<String>,
}

impl From<&Area> for AreaRow {
    fn from(area: &Area) -> Self {
        Self {
            code: area.code.clone(),
            name: area.name.clone(),
            geo_type: area.geo_type.to_string(),
            state: area.state.clone(),
            population: area.population,
            area_sqkm: area.area_sqkm,
            overlap_pct: None,
            distance_km: None,
            match_quality: None,
        }
    }
}

impl From<&AreaOverlap<'_>> for AreaRow {
    fn from(row: &AreaOverlap<'_>) -> Self {
        Self {
            overlap_pct: Some(row.overlap_pct),
            ..AreaRow::from(row.area)
        }
    }
}

impl From<&AreaDistance<'_>> for AreaRow {
    fn from(row: &AreaDistance<'_>) -> Self {
        Self {
            distance_km: Some(row.distance_km),
            ..AreaRow::from(row.area)
        }
    }
}

impl From<&Candidate<'_>> for AreaRow {
    fn from(candidate: &Candidate<'_>) -> Self {
        let quality = serde_json::to_value(candidate.quality)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string));
        Self {
            match_quality: quality,
            ..AreaRow::from(candidate.area)
        }
    }
}

impl Tabular for AreaRow {
    fn cells(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("code", Some(self.code.clone())),
            ("name", Some(self.name.clone())),
            ("type", Some(self.geo_type.clone())),
            ("state", self.state.clone()),
            ("population", self.population.map(|p| p.to_string())),
            ("area_sqkm", self.area_sqkm.map(|a| format!("{:.1}", a))),
            ("overlap_pct", self.overlap_pct.map(|p| format!("{:.1}", p))),
            ("distance_km", self.distance_km.map(|d| format!("{:.2}", d))),
            ("match", self.match_quality.clone()),
        ]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DemographicRow {
    pub age_group: AgeGroup,
    pub gender: Gender,
    pub count: u64,
}

impl Tabular for DemographicRow {
    fn cells(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("age_group", Some(self.age_group.to_string())),
            ("gender", Some(self.gender.to_string())),
            ("count", Some(self.count.to_string())),
        ]
    }
}

/// Flatten a demographic answer into rows. `age_group`/`gender` fill in
/// whichever dimension the query fixed.
pub fn demographic_rows(d: &Demographics, age_group: Option<AgeGroup>, gender: Option<Gender>) -> Vec<DemographicRow> {
    let age_group_or_total = age_group.unwrap_or(AgeGroup::Total);
    let gender_or_total = gender.unwrap_or(Gender::Total);

    match d {
        Demographics::Count(count) => vec![DemographicRow {
            age_group: age_group_or_total,
            gender: gender_or_total,
            count: *count,
        }],
        Demographics::ByGender(map) => map
            .iter()
            .map(|(g, count)| DemographicRow {
                age_group: age_group_or_total,
                gender: *g,
                count: *count,
            })
            .collect(),
        Demographics::ByAgeGroup(map) => map
            .iter()
            .map(|(a, count)| DemographicRow {
                age_group: *a,
                gender: gender_or_total,
                count: *count,
            })
            .collect(),
        Demographics::Table(table) => table
            .iter()
            .flat_map(|(a, by_gender)| {
                by_gender.iter().map(move |(g, count)| DemographicRow {
                    age_group: *a,
                    gender: *g,
                    count: *count,
                })
            })
            .collect(),
    }
}

impl Tabular for StatePopulation {
    fn cells(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("state", Some(self.state.clone())),
            ("areas", Some(self.areas.to_string())),
            ("population", Some(self.population.to_string())),
        ]
    }
}

impl Tabular for CityComparison {
    fn cells(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("city", Some(self.city.clone())),
            ("code", Some(self.code.clone())),
            ("suburbs", Some(self.suburb_count.to_string())),
            ("population", Some(self.population.to_string())),
            ("area_sqkm", self.area_sqkm.map(|a| format!("{:.1}", a))),
            ("density", self.density.map(|d| format!("{:.1}", d))),
        ]
    }
}

impl Tabular for StateCoverage {
    fn cells(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("state", Some(self.state.clone())),
            ("sal_count", Some(self.total_sal_count.to_string())),
            ("urban_sal_count", Some(self.urban_sal_count.to_string())),
            ("urban_pct", Some(format!("{:.1}", self.urban_percentage))),
            ("population", Some(self.total_population.to_string())),
            ("urban_population", Some(self.urban_population.to_string())),
            ("urban_pop_pct", self.urban_pop_percentage.map(|p| format!("{:.1}", p))),
        ]
    }
}

/// Write `rows` to stdout in the requested format.
pub fn emit<T: Serialize + Tabular>(rows: &[T], format: Format) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match format {
        Format::Json => {
            serde_json::to_writer_pretty(&mut out, rows)?;
            writeln!(out)?;
        }
        Format::Csv => {
            let (headers, body) = grid(rows);
            let mut writer = csv::Writer::from_writer(out);
            writer.write_record(&headers)?;
            for row in body {
                writer.write_record(&row)?;
            }
            writer.flush()?;
        }
        Format::Table => {
            if rows.is_empty() {
                writeln!(out, "(no results)")?;
                return Ok(());
            }
            let (headers, body) = grid(rows);
            let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
            for row in &body {
                for (w, cell) in widths.iter_mut().zip(row) {
                    *w = (*w).max(cell.chars().count());
                }
            }

            write_line(&mut out, &headers, &widths)?;
            let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
            write_line(&mut out, &rule, &widths)?;
            for row in &body {
                write_line(&mut out, row, &widths)?;
            }
        }
    }
    Ok(())
}

/// Headers and string cells, dropping columns with no value in any row.
fn grid<T: Tabular>(rows: &[T]) -> (Vec<String>, Vec<Vec<String>>) {
    let cells: Vec<Vec<(&'static str, Option<String>)>> = rows.iter().map(Tabular::cells).collect();
    let Some(first) = cells.first() else {
        return (Vec::new(), Vec::new());
    };

    let keep: Vec<bool> = (0..first.len())
        .map(|i| cells.iter().any(|row| row[i].1.is_some()))
        .collect();

    let headers = first
        .iter()
        .zip(&keep)
        .filter(|(_, k)| **k)
        .map(|((name, _), _)| name.to_string())
        .collect();

    let body = cells
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&keep)
                .filter(|(_, k)| **k)
                .map(|((_, value), _)| value.unwrap_or_default())
                .collect()
        })
        .collect();

    (headers, body)
}

fn write_line(out: &mut impl Write, cells: &[String], widths: &[usize]) -> io::Result<()> {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
        .collect();
    writeln!(out, "{}", line.join("  ").trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ausgeo::GeoType;
    use std::collections::BTreeMap;

    #[test]
    fn test_grid_drops_empty_columns() {
        let rows = vec![
            AreaRow::from(&Area::new("10001", GeoType::Sal, "Bondi Beach").with_population(11_000)),
            AreaRow::from(&Area::new("10006", GeoType::Sal, "Back O Bourke")),
        ];
        let (headers, body) = grid(&rows);
        assert_eq!(headers, vec!["code", "name", "type", "population"]);
        assert_eq!(body[0], vec!["10001", "Bondi Beach", "SAL", "11000"]);
        assert_eq!(body[1][3], "");
    }

    #[test]
    fn test_demographic_rows_fill_fixed_dimension() {
        let mut by_gender = BTreeMap::new();
        by_gender.insert(Gender::Male, 300);
        by_gender.insert(Gender::Female, 280);

        let rows = demographic_rows(&Demographics::ByGender(by_gender), Some(AgeGroup::Age0To4), None);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.age_group == AgeGroup::Age0To4));

        let rows = demographic_rows(&Demographics::Count(7), None, Some(Gender::Female));
        assert_eq!(rows[0].age_group, AgeGroup::Total);
        assert_eq!(rows[0].count, 7);
    }
}
