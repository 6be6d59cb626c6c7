use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Who is clearing the vehicle through customs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImporterType {
    Individual,
    Company,
}

impl ImporterType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Company => "company",
        }
    }
}

impl FromStr for ImporterType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "individual" | "person" | "fl" => Ok(Self::Individual),
            "company" | "legal" | "ul" => Ok(Self::Company),
            other => Err(format!("unknown importer type '{other}'")),
        }
    }
}

/// Declared purpose of the imported vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageType {
    Personal,
    Commercial,
}

impl UsageType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Commercial => "commercial",
        }
    }
}

impl FromStr for UsageType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "personal" | "private" => Ok(Self::Personal),
            "commercial" | "business" => Ok(Self::Commercial),
            other => Err(format!("unknown usage type '{other}'")),
        }
    }
}

/// Duty regime selected from the importer/usage pair.
///
/// Only an individual importing for personal use gets the unified duty; every
/// other combination is assessed like a commercial import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DutyRegime {
    Personal,
    Commercial,
}

impl DutyRegime {
    pub const fn select(importer: ImporterType, usage: UsageType) -> Self {
        match (importer, usage) {
            (ImporterType::Individual, UsageType::Personal) => Self::Personal,
            _ => Self::Commercial,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Personal => "individual/personal (unified duty)",
            Self::Commercial => "company/commercial",
        }
    }

    pub const fn requires_engine_power(self) -> bool {
        matches!(self, Self::Commercial)
    }
}

impl fmt::Display for DutyRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Vehicle class used to pick the utilization fee base rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleKind {
    #[default]
    Passenger,
    Commercial,
}

impl VehicleKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Passenger => "passenger",
            Self::Commercial => "commercial",
        }
    }
}

impl FromStr for VehicleKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "passenger" | "car" => Ok(Self::Passenger),
            "commercial" | "truck" => Ok(Self::Commercial),
            other => Err(format!("unknown vehicle kind '{other}'")),
        }
    }
}

/// Powertrain as understood by the tariff tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelKind {
    Petrol,
    Diesel,
    Electric,
    Hybrid,
    SeriesHybrid,
}

impl FuelKind {
    /// Maps a free-form answer ("бензин", "Diesel", "PHEV", ...) onto a fuel kind.
    /// Anything unrecognised is treated as petrol.
    pub fn from_user_input(value: &str) -> Self {
        let normalized = value.trim().to_lowercase();

        if ["элект", "bev", "electric"]
            .iter()
            .any(|marker| normalized.contains(marker))
        {
            return Self::Electric;
        }
        if ["последоват", "series", "erev"]
            .iter()
            .any(|marker| normalized.contains(marker))
        {
            return Self::SeriesHybrid;
        }
        if ["гибрид", "hev", "phev", "hybrid"]
            .iter()
            .any(|marker| normalized.contains(marker))
        {
            return Self::Hybrid;
        }
        if normalized.contains("диз") || normalized.contains("diesel") {
            return Self::Diesel;
        }

        Self::Petrol
    }

    /// Label used in the fuel column of the rule table.
    pub const fn rule_label(self) -> &'static str {
        match self {
            Self::Petrol => "Бензин",
            Self::Diesel => "Дизель",
            Self::Electric => "Электро",
            Self::Hybrid | Self::SeriesHybrid => "Гибрид",
        }
    }
}
