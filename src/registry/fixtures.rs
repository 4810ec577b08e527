//! Small hand-built registry shared by the lookup and report tests.

use super::{GeoRegistry, RegistryBuilder};
use crate::models::{AgeGroup, Area, AreaKey, DemographicRecord, Gender, GeoType, OverlapEdge};

pub(crate) const SYDNEY_SUA: &str = "1030";
pub(crate) const MELBOURNE_SUA: &str = "2111";
pub(crate) const BONDI: &str = "10001";

fn edge(lower: (GeoType, &str), higher: (GeoType, &str), pct: f64) -> OverlapEdge {
    OverlapEdge::new(
        AreaKey::new(lower.0, lower.1),
        AreaKey::new(higher.0, higher.1),
        pct,
    )
    .unwrap()
}

pub(crate) fn registry() -> GeoRegistry {
    let nsw = "New South Wales";
    let vic = "Victoria";
    let mut builder = RegistryBuilder::new();

    builder
        .add_area(
            Area::new(SYDNEY_SUA, GeoType::Sua, "Sydney")
                .with_population(4_186_000)
                .with_state(nsw)
                .with_area_sqkm(2_037.0)
                .with_centroid(-33.87, 151.21),
        )
        .add_area(
            Area::new(MELBOURNE_SUA, GeoType::Sua, "Melbourne")
                .with_population(4_196_000)
                .with_state(vic)
                .with_area_sqkm(2_543.0)
                .with_centroid(-37.81, 144.96),
        )
        .add_area(
            Area::new("1009", GeoType::Sua, "Bathurst")
                .with_population(37_000)
                .with_state(nsw)
                .with_centroid(-33.42, 149.58),
        )
        .add_area(
            Area::new(BONDI, GeoType::Sal, "Bondi Beach")
                .with_population(11_000)
                .with_state(nsw)
                .with_centroid(-33.891, 151.274),
        )
        .add_area(
            Area::new("10002", GeoType::Sal, "Sydney")
                .with_population(17_000)
                .with_state(nsw)
                .with_centroid(-33.87, 151.21),
        )
        .add_area(
            Area::new("10003", GeoType::Sal, "Parramatta")
                .with_population(30_000)
                .with_state(nsw)
                .with_centroid(-33.815, 151.003),
        )
        .add_area(
            Area::new("10004", GeoType::Sal, "Richmond")
                .with_population(5_000)
                .with_state(nsw)
                .with_centroid(-33.6, 150.75),
        )
        .add_area(
            Area::new("20001", GeoType::Sal, "Richmond")
                .with_population(28_000)
                .with_state(vic)
                .with_centroid(-37.82, 145.0),
        )
        .add_area(
            Area::new("10005", GeoType::Sal, "Katoomba")
                .with_population(8_000)
                .with_state(nsw)
                .with_centroid(-33.71, 150.31),
        )
        .add_area(Area::new("10006", GeoType::Sal, "Back O Bourke").with_state(nsw))
        .add_area(
            Area::new("17200", GeoType::Lga, "Sydney (C)")
                .with_population(211_000)
                .with_state(nsw),
        );

    builder
        .add_edge(edge((GeoType::Sal, BONDI), (GeoType::Sua, SYDNEY_SUA), 100.0))
        .add_edge(edge((GeoType::Sal, "10002"), (GeoType::Sua, SYDNEY_SUA), 100.0))
        .add_edge(edge((GeoType::Sal, "10003"), (GeoType::Sua, SYDNEY_SUA), 97.5))
        .add_edge(edge((GeoType::Sal, "10004"), (GeoType::Sua, SYDNEY_SUA), 40.0))
        .add_edge(edge((GeoType::Sal, "10005"), (GeoType::Sua, SYDNEY_SUA), 12.0))
        .add_edge(edge((GeoType::Sal, "20001"), (GeoType::Sua, MELBOURNE_SUA), 100.0))
        .add_edge(edge((GeoType::Lga, "17200"), (GeoType::Sua, SYDNEY_SUA), 100.0));

    let bondi = AreaKey::new(GeoType::Sal, BONDI);
    let cells = [
        (AgeGroup::Age0To4, Gender::Male, 300),
        (AgeGroup::Age0To4, Gender::Female, 280),
        (AgeGroup::Age0To4, Gender::Total, 580),
        (AgeGroup::Age25To34, Gender::Male, 2_100),
        (AgeGroup::Age25To34, Gender::Female, 2_300),
        (AgeGroup::Age25To34, Gender::Total, 4_400),
        (AgeGroup::Total, Gender::Male, 5_400),
        (AgeGroup::Total, Gender::Female, 5_600),
        (AgeGroup::Total, Gender::Total, 11_000),
    ];
    for (age_group, gender, count) in cells {
        builder.add_demographic(DemographicRecord {
            area: bondi.clone(),
            age_group,
            gender,
            count,
        });
    }

    builder.build()
}
