//! Static table of areas the generator produces records for.

use saferoute_core::{EconomicIndicators, GeoPoint, LandUse, RiskLevel};

/// Fixed description of a named area.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaProfile {
    /// Neighborhood name.
    pub name: &'static str,
    /// Centre of the area.
    pub center: GeoPoint,
    /// Risk band the area's records carry.
    pub risk_level: RiskLevel,
    /// Predominant land use.
    pub land_use: LandUse,
    /// Residents per square mile.
    pub population_density: f64,
    /// Socio-economic indicators.
    pub economic_indicators: EconomicIndicators,
}

impl AreaProfile {
    /// Identifier prefix for records in this area, e.g. `mission-district`.
    #[must_use]
    pub fn slug(&self) -> String {
        self.name
            .chars()
            .filter_map(|c| {
                if c.is_ascii_alphanumeric() {
                    Some(c.to_ascii_lowercase())
                } else if c == ' ' || c == '-' {
                    Some('-')
                } else {
                    None
                }
            })
            .collect()
    }
}

const fn area(
    name: &'static str,
    center: (f64, f64),
    risk_level: RiskLevel,
    land_use: LandUse,
    population_density: f64,
    economics: (u32, f64, f64, f64),
) -> AreaProfile {
    AreaProfile {
        name,
        center: GeoPoint::new(center.0, center.1),
        risk_level,
        land_use,
        population_density,
        economic_indicators: EconomicIndicators {
            median_income: economics.0,
            unemployment_rate: economics.1,
            business_density: economics.2,
            lighting_infrastructure: economics.3,
        },
    }
}

/// Twelve San Francisco neighborhoods.
///
/// Economic tuples are `(median income, unemployment %, business density,
/// lighting infrastructure)`.
pub const SAN_FRANCISCO_AREAS: [AreaProfile; 12] = [
    area(
        "Financial District",
        (37.7946, -122.3999),
        RiskLevel::Low,
        LandUse::Commercial,
        3_500.0,
        (120_000, 3.1, 45.0, 92.0),
    ),
    area(
        "Union Square",
        (37.7880, -122.4075),
        RiskLevel::Medium,
        LandUse::Commercial,
        9_800.0,
        (85_000, 4.5, 50.0, 90.0),
    ),
    area(
        "Tenderloin",
        (37.7847, -122.4141),
        RiskLevel::Critical,
        LandUse::Mixed,
        35_000.0,
        (28_000, 12.5, 30.0, 60.0),
    ),
    area(
        "SoMa",
        (37.7785, -122.4056),
        RiskLevel::High,
        LandUse::Mixed,
        8_600.0,
        (65_000, 7.2, 35.0, 72.0),
    ),
    area(
        "Mission District",
        (37.7599, -122.4148),
        RiskLevel::High,
        LandUse::Mixed,
        11_200.0,
        (62_000, 6.8, 38.0, 70.0),
    ),
    area(
        "Castro",
        (37.7609, -122.4350),
        RiskLevel::Low,
        LandUse::Residential,
        10_500.0,
        (110_000, 3.5, 25.0, 82.0),
    ),
    area(
        "Haight-Ashbury",
        (37.7692, -122.4481),
        RiskLevel::Medium,
        LandUse::Mixed,
        12_800.0,
        (78_000, 5.0, 22.0, 75.0),
    ),
    area(
        "North Beach",
        (37.8061, -122.4103),
        RiskLevel::Medium,
        LandUse::Commercial,
        14_500.0,
        (72_000, 4.8, 40.0, 85.0),
    ),
    area(
        "Chinatown",
        (37.7941, -122.4078),
        RiskLevel::Medium,
        LandUse::Commercial,
        28_000.0,
        (35_000, 6.0, 55.0, 80.0),
    ),
    area(
        "Pacific Heights",
        (37.7925, -122.4382),
        RiskLevel::Low,
        LandUse::Residential,
        9_200.0,
        (185_000, 2.2, 12.0, 88.0),
    ),
    area(
        "Bayview-Hunters Point",
        (37.7292, -122.3920),
        RiskLevel::High,
        LandUse::Industrial,
        4_300.0,
        (45_000, 11.0, 10.0, 55.0),
    ),
    area(
        "Golden Gate Park",
        (37.7694, -122.4862),
        RiskLevel::Low,
        LandUse::Recreational,
        800.0,
        (95_000, 3.0, 2.0, 40.0),
    ),
];
