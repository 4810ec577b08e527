//! Shared CSV plumbing: gzip-aware readers and header alias lookup.

use csv::{ReaderBuilder, StringRecord};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::error::{GeoError, Result};
use crate::models::GeoType;

/// Open a file, transparently decompressing `.gz`.
pub fn open_maybe_gz(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path).map_err(|e| GeoError::io(path, e))?;
    let reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(reader)
}

/// Open a CSV table with a header row.
pub fn csv_reader(path: &Path) -> Result<csv::Reader<Box<dyn Read>>> {
    let reader = open_maybe_gz(path)?;
    Ok(ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader))
}

/// Read just the first line, for format sniffing.
pub fn first_line(path: &Path) -> Result<String> {
    let mut reader = BufReader::new(open_maybe_gz(path)?);
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .map_err(|e| GeoError::io(path, e))?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Column positions looked up by case-insensitive aliases.
pub struct Headers {
    names: Vec<String>,
}

impl Headers {
    pub fn new(record: &StringRecord) -> Self {
        Self {
            names: record
                .iter()
                .map(|h| h.trim().trim_start_matches('\u{feff}').to_ascii_lowercase())
                .collect(),
        }
    }

    /// Index of the first alias present in the header row.
    pub fn find(&self, aliases: &[String]) -> Option<usize> {
        aliases.iter().find_map(|alias| {
            let alias = alias.to_ascii_lowercase();
            self.names.iter().position(|h| *h == alias)
        })
    }

    pub fn require(&self, aliases: &[String], path: &Path) -> Result<usize> {
        self.find(aliases).ok_or_else(|| GeoError::MissingColumn {
            path: path.to_path_buf(),
            column: aliases.first().cloned().unwrap_or_default(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.names.iter().enumerate().map(|(i, h)| (i, h.as_str()))
    }
}

/// Header aliases for one geography type's columns, covering the ABS 2016/2021
/// naming schemes and the lowercase names used by generated mapping files.
pub fn code_aliases(geo_type: GeoType) -> Vec<String> {
    let key = geo_type.key();
    let upper = key.to_ascii_uppercase();
    vec![
        format!("{}_code", key),
        format!("{} code", upper),
        format!("{}_CODE_2021", upper),
        format!("{}_CODE21", upper),
        format!("{}_CODE_2016", upper),
        "code".to_string(),
    ]
}

pub fn name_aliases(geo_type: GeoType) -> Vec<String> {
    let key = geo_type.key();
    let upper = key.to_ascii_uppercase();
    vec![
        format!("{}_name", key),
        geo_type.label().to_string(),
        format!("{}_NAME_2021", upper),
        format!("{}_NAME21", upper),
        format!("{}_NAME_2016", upper),
        "name".to_string(),
    ]
}

pub fn state_aliases() -> Vec<String> {
    ["state", "state_name", "STE_NAME21", "STATE_NAME_2021", "STE_NAME_2021"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn population_aliases() -> Vec<String> {
    ["population", "Tot_P_P", "persons"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn area_aliases() -> Vec<String> {
    ["area_sqkm", "Area_sqkm", "AREA_ALBERS_SQKM", "AREASQKM21"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn overlap_aliases() -> Vec<String> {
    ["overlap_pct", "overlap_percentage", "overlap"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Parse a population-style count: tolerates thousands separators and
/// a trailing ".0" from spreadsheet exports; blank means unknown.
pub fn parse_count(raw: &str) -> std::result::Result<Option<u64>, String> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() || cleaned == "-" || cleaned.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    if let Ok(n) = cleaned.parse::<u64>() {
        return Ok(Some(n));
    }
    match cleaned.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 => Ok(Some(f as u64)),
        _ => Err(format!("'{}' is not a non-negative count", raw.trim())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_case_insensitive() {
        let record = StringRecord::from(vec!["\u{feff}SUA code", "Significant Urban Area", "Population"]);
        let headers = Headers::new(&record);
        assert_eq!(headers.find(&code_aliases(GeoType::Sua)), Some(0));
        assert_eq!(headers.find(&name_aliases(GeoType::Sua)), Some(1));
        assert_eq!(headers.find(&population_aliases()), Some(2));
        assert_eq!(headers.find(&state_aliases()), None);
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("1,234"), Ok(Some(1234)));
        assert_eq!(parse_count("42.0"), Ok(Some(42)));
        assert_eq!(parse_count(""), Ok(None));
        assert!(parse_count("-5").is_err());
        assert!(parse_count("abc").is_err());
    }
}
