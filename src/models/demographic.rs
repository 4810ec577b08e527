//! Age/sex census counts (ABS General Community Profile G01 layout).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use super::AreaKey;

/// ABS five/ten-year age bands, plus the all-ages aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "0_4")]
    Age0To4,
    #[serde(rename = "5_14")]
    Age5To14,
    #[serde(rename = "15_19")]
    Age15To19,
    #[serde(rename = "20_24")]
    Age20To24,
    #[serde(rename = "25_34")]
    Age25To34,
    #[serde(rename = "35_44")]
    Age35To44,
    #[serde(rename = "45_54")]
    Age45To54,
    #[serde(rename = "55_64")]
    Age55To64,
    #[serde(rename = "65_74")]
    Age65To74,
    #[serde(rename = "75_84")]
    Age75To84,
    #[serde(rename = "85ov")]
    Age85Over,
    #[serde(rename = "total")]
    Total,
}

impl AgeGroup {
    /// Every band, excluding [`AgeGroup::Total`].
    pub fn bands() -> &'static [AgeGroup] {
        &[
            AgeGroup::Age0To4,
            AgeGroup::Age5To14,
            AgeGroup::Age15To19,
            AgeGroup::Age20To24,
            AgeGroup::Age25To34,
            AgeGroup::Age35To44,
            AgeGroup::Age45To54,
            AgeGroup::Age55To64,
            AgeGroup::Age65To74,
            AgeGroup::Age75To84,
            AgeGroup::Age85Over,
        ]
    }

    /// Band label as it appears in ABS column names
    pub fn label(&self) -> &'static str {
        match self {
            AgeGroup::Age0To4 => "0_4",
            AgeGroup::Age5To14 => "5_14",
            AgeGroup::Age15To19 => "15_19",
            AgeGroup::Age20To24 => "20_24",
            AgeGroup::Age25To34 => "25_34",
            AgeGroup::Age35To44 => "35_44",
            AgeGroup::Age45To54 => "45_54",
            AgeGroup::Age55To64 => "55_64",
            AgeGroup::Age65To74 => "65_74",
            AgeGroup::Age75To84 => "75_84",
            AgeGroup::Age85Over => "85ov",
            AgeGroup::Total => "total",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AgeGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if s == "total" || s == "tot" {
            return Ok(AgeGroup::Total);
        }
        AgeGroup::bands()
            .iter()
            .copied()
            .find(|band| band.label() == s)
            .ok_or_else(|| format!("unknown age group '{}'", s))
    }
}

/// Sex as reported by the census; `Total` is the ABS "persons" column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Total,
}

impl Gender {
    fn from_suffix(c: &str) -> Option<Self> {
        match c {
            "m" | "M" => Some(Gender::Male),
            "f" | "F" => Some(Gender::Female),
            "p" | "P" => Some(Gender::Total),
            _ => None,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "M"),
            Gender::Female => write!(f, "F"),
            Gender::Total => write!(f, "total"),
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "m" | "male" => Ok(Gender::Male),
            "f" | "female" => Ok(Gender::Female),
            "p" | "persons" | "total" => Ok(Gender::Total),
            other => Err(format!("unknown gender '{}'", other)),
        }
    }
}

/// One cell of the age/sex table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemographicRecord {
    pub area: AreaKey,
    pub age_group: AgeGroup,
    pub gender: Gender,
    pub count: u64,
}

fn column_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:age_(?P<band>[0-9]+_[0-9]+|85ov)(?:_yr)?|tot_p)_(?P<sex>[mfp])$")
            .expect("demographic column pattern is valid")
    })
}

/// Map a census column name ("Age_25_34_yr_F", "Tot_P_P") to its table cell.
pub fn parse_demographic_column(name: &str) -> Option<(AgeGroup, Gender)> {
    let caps = column_regex().captures(name.trim())?;
    let gender = Gender::from_suffix(caps.name("sex")?.as_str())?;
    let age_group = match caps.name("band") {
        Some(band) => band.as_str().parse().ok()?,
        None => AgeGroup::Total,
    };
    Some((age_group, gender))
}
