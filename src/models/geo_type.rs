//! Australian Statistical Geography Standard (ASGS) levels handled by the registry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GeoError;

/// Geography type of an area record.
/// See: https://www.abs.gov.au/statistics/standards/australian-statistical-geography-standard-asgs-edition-3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum GeoType {
    /// Local Government Area (council boundary)
    Lga,
    /// Statistical Area Level 2
    Sa2,
    /// Suburbs and Localities
    Sal,
    /// Significant Urban Area
    Sua,
}

impl GeoType {
    /// All geography types, finest first.
    pub fn all() -> &'static [GeoType] {
        &[GeoType::Sal, GeoType::Sa2, GeoType::Lga, GeoType::Sua]
    }

    /// Lowercase key used in file names and column prefixes ("sal", "sua", ...)
    pub fn key(&self) -> &'static str {
        match self {
            GeoType::Lga => "lga",
            GeoType::Sa2 => "sa2",
            GeoType::Sal => "sal",
            GeoType::Sua => "sua",
        }
    }

    /// Long ABS label, as used for the name column of the published population tables
    pub fn label(&self) -> &'static str {
        match self {
            GeoType::Lga => "Local Government Area",
            GeoType::Sa2 => "Statistical Area Level 2",
            GeoType::Sal => "Suburbs and Localities",
            GeoType::Sua => "Significant Urban Area",
        }
    }

    /// Strip the ABS type prefix from a code ("SAL10001" -> "10001").
    ///
    /// The prefix is only removed when what follows is numeric, so genuine
    /// alphanumeric codes are left untouched.
    pub fn normalize_code(&self, raw: &str) -> String {
        let code = raw.trim();
        let prefix = self.key();
        if let (Some(head), Some(rest)) = (code.get(..prefix.len()), code.get(prefix.len()..)) {
            if head.eq_ignore_ascii_case(prefix)
                && !rest.is_empty()
                && rest.chars().all(|c| c.is_ascii_digit())
            {
                return rest.to_string();
            }
        }
        code.to_string()
    }
}

impl fmt::Display for GeoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoType::Lga => write!(f, "LGA"),
            GeoType::Sa2 => write!(f, "SA2"),
            GeoType::Sal => write!(f, "SAL"),
            GeoType::Sua => write!(f, "SUA"),
        }
    }
}

impl FromStr for GeoType {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lga" => Ok(GeoType::Lga),
            "sa2" => Ok(GeoType::Sa2),
            "sal" => Ok(GeoType::Sal),
            "sua" => Ok(GeoType::Sua),
            _ => Err(GeoError::InvalidGeoType(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("SUA".parse::<GeoType>().unwrap(), GeoType::Sua);
        assert_eq!(" sal ".parse::<GeoType>().unwrap(), GeoType::Sal);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "postcode".parse::<GeoType>().unwrap_err();
        assert!(matches!(err, GeoError::InvalidGeoType(s) if s == "postcode"));
    }

    #[test]
    fn test_normalize_code_strips_prefix() {
        assert_eq!(GeoType::Sal.normalize_code("SAL10001"), "10001");
        assert_eq!(GeoType::Lga.normalize_code(" lga10050 "), "10050");
    }

    #[test]
    fn test_normalize_code_keeps_other_codes() {
        assert_eq!(GeoType::Sal.normalize_code("10001"), "10001");
        assert_eq!(GeoType::Sua.normalize_code("SUAX1"), "SUAX1");
        assert_eq!(GeoType::Sua.normalize_code("SUA"), "SUA");
    }
}
