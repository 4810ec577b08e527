//! Age/sex breakdowns for a single area.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

use super::GeoService;
use crate::models::{AgeGroup, Gender, GeoType};
use crate::registry::{complete_totals, DemographicCells};

/// Shape of a demographic answer depends on which filters were supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Demographics {
    /// Both age group and gender given
    Count(u64),
    /// Age group given: counts per gender
    ByGender(BTreeMap<Gender, u64>),
    /// Gender given: counts per age group
    ByAgeGroup(BTreeMap<AgeGroup, u64>),
    /// Neither given
    Table(BTreeMap<AgeGroup, BTreeMap<Gender, u64>>),
}

impl Demographics {
    /// True when no cell is known for the requested slice.
    pub fn is_empty(&self) -> bool {
        match self {
            Demographics::Count(n) => *n == 0,
            Demographics::ByGender(m) => m.is_empty(),
            Demographics::ByAgeGroup(m) => m.is_empty(),
            Demographics::Table(m) => m.is_empty(),
        }
    }
}

impl<'r> GeoService<'r> {
    /// Demographic counts for one area. Unknown areas and missing cells
    /// read as zero or empty maps, never as an error.
    pub fn demographics(
        &self,
        geo_type: GeoType,
        area_code: &str,
        age_group: Option<AgeGroup>,
        gender: Option<Gender>,
    ) -> Demographics {
        let code = geo_type.normalize_code(area_code);
        let mut cells: DemographicCells = self
            .registry()
            .demographic_cells(geo_type, &code)
            .cloned()
            .unwrap_or_default();
        if let Err(reason) = complete_totals(&mut cells) {
            warn!("Totals for {} {} left incomplete: {}", geo_type, code, reason);
        }

        match (age_group, gender) {
            (Some(age), Some(sex)) => Demographics::Count(cells.get(&(age, sex)).copied().unwrap_or(0)),
            (Some(age), None) => Demographics::ByGender(
                cells
                    .iter()
                    .filter(|((a, _), _)| *a == age)
                    .map(|((_, g), n)| (*g, *n))
                    .collect(),
            ),
            (None, Some(sex)) => Demographics::ByAgeGroup(
                cells
                    .iter()
                    .filter(|((_, g), _)| *g == sex)
                    .map(|((a, _), n)| (*a, *n))
                    .collect(),
            ),
            (None, None) => {
                let mut table: BTreeMap<AgeGroup, BTreeMap<Gender, u64>> = BTreeMap::new();
                for ((age, sex), n) in cells {
                    table.entry(age).or_default().insert(sex, n);
                }
                Demographics::Table(table)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AreaKey, DemographicRecord};
    use crate::registry::fixtures::{self, BONDI};
    use crate::registry::RegistryBuilder;

    #[test]
    fn test_single_count() {
        let registry = fixtures::registry();
        let service = GeoService::new(&registry);

        let d = service.demographics(GeoType::Sal, BONDI, Some(AgeGroup::Age25To34), Some(Gender::Female));
        assert_eq!(d, Demographics::Count(2_300));

        let missing = service.demographics(GeoType::Sal, BONDI, Some(AgeGroup::Age85Over), Some(Gender::Male));
        assert_eq!(missing, Demographics::Count(0));
    }

    #[test]
    fn test_gender_split_sums_to_total() {
        let registry = fixtures::registry();
        let service = GeoService::new(&registry);

        for age in [AgeGroup::Age0To4, AgeGroup::Age25To34, AgeGroup::Total] {
            let Demographics::ByGender(by_gender) = service.demographics(GeoType::Sal, BONDI, Some(age), None) else {
                panic!("expected a per-gender map");
            };
            assert_eq!(
                by_gender[&Gender::Male] + by_gender[&Gender::Female],
                by_gender[&Gender::Total]
            );
        }
    }

    #[test]
    fn test_age_breakdown_for_gender() {
        let registry = fixtures::registry();
        let service = GeoService::new(&registry);

        let Demographics::ByAgeGroup(by_age) = service.demographics(GeoType::Sal, BONDI, None, Some(Gender::Male)) else {
            panic!("expected a per-age map");
        };
        assert_eq!(by_age.len(), 3);
        assert_eq!(by_age[&AgeGroup::Age0To4], 300);
        assert_eq!(by_age[&AgeGroup::Total], 5_400);
    }

    #[test]
    fn test_full_table_and_prefixed_code() {
        let registry = fixtures::registry();
        let service = GeoService::new(&registry);

        let Demographics::Table(table) = service.demographics(GeoType::Sal, "SAL10001", None, None) else {
            panic!("expected a table");
        };
        assert_eq!(table[&AgeGroup::Total][&Gender::Total], 11_000);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_unknown_area_is_empty() {
        let registry = fixtures::registry();
        let service = GeoService::new(&registry);

        assert!(service.demographics(GeoType::Sua, "9999", None, None).is_empty());
        // codes are scoped by type
        assert!(service.demographics(GeoType::Lga, BONDI, None, None).is_empty());
    }

    #[test]
    fn test_synthetic_totals_from_bands() {
        let key = AreaKey::new(GeoType::Sa2, "101021007");
        let mut builder = RegistryBuilder::new();
        for (age_group, gender, count) in [
            (AgeGroup::Age0To4, Gender::Male, 10),
            (AgeGroup::Age0To4, Gender::Female, 12),
            (AgeGroup::Age5To14, Gender::Male, 20),
            (AgeGroup::Age5To14, Gender::Female, 18),
        ] {
            builder.add_demographic(DemographicRecord {
                area: key.clone(),
                age_group,
                gender,
                count,
            });
        }
        let registry = builder.build();
        let service = GeoService::new(&registry);

        assert_eq!(
            service.demographics(GeoType::Sa2, "101021007", Some(AgeGroup::Total), Some(Gender::Total)),
            Demographics::Count(60)
        );
        assert_eq!(
            service.demographics(GeoType::Sa2, "101021007", Some(AgeGroup::Age0To4), Some(Gender::Total)),
            Demographics::Count(22)
        );
    }

    #[test]
    fn test_overflowing_cells_keep_source_values() {
        let key = AreaKey::new(GeoType::Sal, "10009");
        let mut builder = RegistryBuilder::new();
        for (gender, count) in [(Gender::Male, u64::MAX), (Gender::Female, 1)] {
            builder.add_demographic(DemographicRecord {
                area: key.clone(),
                age_group: AgeGroup::Age0To4,
                gender,
                count,
            });
        }
        let registry = builder.build();
        let service = GeoService::new(&registry);

        let Demographics::ByGender(by_gender) = service.demographics(GeoType::Sal, "10009", Some(AgeGroup::Age0To4), None) else {
            panic!("expected a per-gender map");
        };
        assert_eq!(by_gender[&Gender::Male], u64::MAX);
        assert!(!by_gender.contains_key(&Gender::Total));
    }
}
