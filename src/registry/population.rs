//! Population table loading.
//!
//! Handles the ABS-style CSV tables and the "merged column" export of the
//! SAL census table, where each line reads `SAL10001Tot_P_M120Tot_P_F98...`.

use regex::Regex;
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::table::{self, Headers};
use crate::error::{GeoError, Result};
use crate::models::{
    parse_demographic_column, AgeGroup, Area, AreaKey, DemographicRecord, Gender, GeoType,
};

/// Rows read from one population table.
#[derive(Debug, Default)]
pub struct PopulationTable {
    pub areas: Vec<Area>,
    pub demographics: Vec<DemographicRecord>,
    /// Rows dropped as malformed
    pub skipped: usize,
}

type Cells = BTreeMap<(AgeGroup, Gender), u64>;

/// Load a population table for one geography type.
pub fn load_population(path: &Path, geo_type: GeoType) -> Result<PopulationTable> {
    let header = table::first_line(path)?;
    let table = if header.contains(',') {
        load_csv(path, geo_type)?
    } else {
        debug!("{} has no delimiters, reading merged-column layout", path.display());
        load_merged(path, geo_type)?
    };

    info!(
        "Loaded {} {} areas ({} demographic cells) from {}{}",
        table.areas.len(),
        geo_type,
        table.demographics.len(),
        path.display(),
        if table.skipped > 0 {
            format!(", skipped {} malformed rows", table.skipped)
        } else {
            String::new()
        }
    );
    Ok(table)
}

fn load_csv(path: &Path, geo_type: GeoType) -> Result<PopulationTable> {
    let mut reader = table::csv_reader(path)?;
    let headers = Headers::new(reader.headers()?);

    let code_idx = headers.require(&table::code_aliases(geo_type), path)?;
    let name_idx = headers.find(&table::name_aliases(geo_type));
    let state_idx = headers.find(&table::state_aliases());
    let pop_idx = headers.find(&table::population_aliases());
    let area_idx = headers.find(&table::area_aliases());

    let demographic_columns: Vec<(usize, AgeGroup, Gender)> = headers
        .iter()
        .filter_map(|(i, h)| parse_demographic_column(h).map(|(age, gender)| (i, age, gender)))
        .collect();

    if demographic_columns.is_empty() {
        debug!("{} has no demographic columns", path.display());
    }

    let mut table = PopulationTable::default();

    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let row = parse_row(&record, geo_type, code_idx, name_idx, state_idx, pop_idx, area_idx)
            .and_then(|area| {
                let cells = parse_cells(&record, &demographic_columns)?;
                Ok((area, cells))
            });

        let (mut area, cells) = match row {
            Ok(row) => row,
            Err(reason) => {
                let err = GeoError::MalformedRow {
                    path: path.to_path_buf(),
                    line,
                    reason,
                };
                warn!("Skipping row: {}", err);
                table.skipped += 1;
                continue;
            }
        };

        if let Err(reason) = push_cells(&mut table, &mut area, cells) {
            warn!("Skipping row: {}", malformed(path, line, &reason));
            table.skipped += 1;
            continue;
        }
        table.areas.push(area);
    }

    Ok(table)
}

fn parse_row(
    record: &csv::StringRecord,
    geo_type: GeoType,
    code_idx: usize,
    name_idx: Option<usize>,
    state_idx: Option<usize>,
    pop_idx: Option<usize>,
    area_idx: Option<usize>,
) -> std::result::Result<Area, String> {
    let field = |idx: Option<usize>| idx.and_then(|i| record.get(i)).map(str::trim).unwrap_or("");

    let code = geo_type.normalize_code(field(Some(code_idx)));
    if code.is_empty() {
        return Err("empty area code".to_string());
    }

    let mut area = Area::new(code, geo_type, field(name_idx));

    let state = field(state_idx);
    if !state.is_empty() {
        area.state = Some(state.to_string());
    }

    area.population = table::parse_count(field(pop_idx))?;

    let area_sqkm = field(area_idx);
    if !area_sqkm.is_empty() {
        let value: f64 = area_sqkm
            .parse()
            .map_err(|_| format!("'{}' is not an area in km²", area_sqkm))?;
        if value.is_finite() && value >= 0.0 {
            area.area_sqkm = Some(value);
        }
    }

    Ok(area)
}

fn parse_cells(
    record: &csv::StringRecord,
    columns: &[(usize, AgeGroup, Gender)],
) -> std::result::Result<Cells, String> {
    let mut cells = Cells::new();
    for (idx, age, gender) in columns {
        let raw = record.get(*idx).unwrap_or("");
        if let Some(count) = table::parse_count(raw)? {
            cells.insert((*age, *gender), count);
        }
    }
    Ok(cells)
}

/// Attach a row's demographic cells, completing totals and the area population.
///
/// Nothing is attached when the totals cannot be completed.
fn push_cells(table: &mut PopulationTable, area: &mut Area, mut cells: Cells) -> std::result::Result<(), String> {
    complete_totals(&mut cells)?;

    if area.population.is_none() {
        area.population = cells.get(&(AgeGroup::Total, Gender::Total)).copied();
    }

    let key = AreaKey::new(area.geo_type, area.code.clone());
    table
        .demographics
        .extend(cells.into_iter().map(|((age_group, gender), count)| DemographicRecord {
            area: key.clone(),
            age_group,
            gender,
            count,
        }));
    Ok(())
}

/// Fill in synthetic totals the source left out: persons = male + female for
/// each age group, and the all-ages row as the sum of the bands.
///
/// Source values are never overwritten. Fails, leaving `cells` untouched,
/// if a synthetic total does not fit in a `u64`.
pub fn complete_totals(cells: &mut Cells) -> std::result::Result<(), String> {
    let mut completed = cells.clone();
    gender_totals(&mut completed)?;

    let has_age_total = completed.keys().any(|(age, _)| *age == AgeGroup::Total);
    if !has_age_total {
        for gender in [Gender::Male, Gender::Female, Gender::Total] {
            let counts: Vec<u64> = AgeGroup::bands()
                .iter()
                .filter_map(|band| completed.get(&(*band, gender)).copied())
                .collect();
            if counts.is_empty() {
                continue;
            }
            let sum = counts
                .iter()
                .try_fold(0u64, |acc, n| acc.checked_add(*n))
                .ok_or_else(|| format!("all-ages {} total overflows", gender))?;
            completed.insert((AgeGroup::Total, gender), sum);
        }
        gender_totals(&mut completed)?;
    }

    *cells = completed;
    Ok(())
}

fn gender_totals(cells: &mut Cells) -> std::result::Result<(), String> {
    let ages: Vec<AgeGroup> = cells.keys().map(|(age, _)| *age).collect();
    for age in ages {
        if cells.contains_key(&(age, Gender::Total)) {
            continue;
        }
        let male = cells.get(&(age, Gender::Male)).copied();
        let female = cells.get(&(age, Gender::Female)).copied();
        if let (Some(m), Some(f)) = (male, female) {
            let total = m
                .checked_add(f)
                .ok_or_else(|| format!("persons count for age {} overflows", age))?;
            cells.insert((age, Gender::Total), total);
        }
    }
    Ok(())
}

fn load_merged(path: &Path, geo_type: GeoType) -> Result<PopulationTable> {
    let code_re = Regex::new(&format!(r"(?i)^{}(\d+)", geo_type.key()))
        .map_err(|e| GeoError::Config(e.to_string()))?;
    let cell_re = Regex::new(r"(?i)((?:Age_(?:\d+_\d+|85ov)(?:_yr)?|Tot_P)_[MFP])(\d+)")
        .map_err(|e| GeoError::Config(e.to_string()))?;

    let reader = BufReader::new(table::open_maybe_gz(path)?);
    let mut table = PopulationTable::default();

    // Skip header
    for (idx, line) in reader.lines().enumerate().skip(1) {
        let line = line.map_err(|e| GeoError::io(path, e))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(code) = code_re.captures(line).and_then(|c| c.get(1)) else {
            let err = malformed(path, idx as u64 + 1, "no area code at start of line");
            warn!("Skipping row: {}", err);
            table.skipped += 1;
            continue;
        };

        let mut cells = Cells::new();
        for caps in cell_re.captures_iter(&line[code.end()..]) {
            let (Some((age, gender)), Ok(count)) = (
                parse_demographic_column(&caps[1]),
                caps[2].parse::<u64>(),
            ) else {
                continue;
            };
            cells.entry((age, gender)).or_insert(count);
        }

        let mut area = Area::new(code.as_str(), geo_type, "");
        if let Err(reason) = push_cells(&mut table, &mut area, cells) {
            warn!("Skipping row: {}", malformed(path, idx as u64 + 1, &reason));
            table.skipped += 1;
            continue;
        }
        table.areas.push(area);
    }

    Ok(table)
}

fn malformed(path: &Path, line: u64, reason: &str) -> GeoError {
    GeoError::MalformedRow {
        path: PathBuf::from(path),
        line,
        reason: reason.to_string(),
    }
}
