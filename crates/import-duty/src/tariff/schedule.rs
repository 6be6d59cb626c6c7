use super::clearance::ClearanceLadder;
use super::excise::ExciseTable;
use super::utilization::UtilizationSchedule;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::info;

#[derive(Debug)]
pub enum ScheduleError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Invalid(String),
}

impl std::fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleError::Io(err) => write!(f, "failed to read tariff schedule: {}", err),
            ScheduleError::Json(err) => write!(f, "invalid tariff schedule JSON: {}", err),
            ScheduleError::Invalid(reason) => write!(f, "inconsistent tariff schedule: {}", reason),
        }
    }
}

impl std::error::Error for ScheduleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScheduleError::Io(err) => Some(err),
            ScheduleError::Json(err) => Some(err),
            ScheduleError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ScheduleError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for ScheduleError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Fixed jurisdiction schedule: currencies, VAT default, excise bands,
/// clearance ladder and utilization configuration.
///
/// Every section falls back to the built-in values when omitted from the
/// JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TariffSchedule {
    pub local_currency: String,
    /// Currency the rule table's per-cc rates are expressed in.
    pub rule_currency: String,
    pub default_vat_pct: Decimal,
    pub excise: ExciseTable,
    pub clearance: ClearanceLadder,
    pub utilization: UtilizationSchedule,
}

impl Default for TariffSchedule {
    fn default() -> Self {
        Self {
            local_currency: "RUB".to_string(),
            rule_currency: "EUR".to_string(),
            default_vat_pct: dec!(20),
            excise: ExciseTable::default(),
            clearance: ClearanceLadder::default(),
            utilization: UtilizationSchedule::default(),
        }
    }
}

impl TariffSchedule {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ScheduleError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let schedule = Self::from_reader(file)?;
        info!(path = %path.display(), "tariff schedule loaded");
        Ok(schedule)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ScheduleError> {
        let schedule: Self = serde_json::from_reader(reader)?;
        schedule.validate()?;
        Ok(schedule)
    }

    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.local_currency.trim().is_empty() || self.rule_currency.trim().is_empty() {
            return Err(ScheduleError::Invalid(
                "currency codes must not be empty".to_string(),
            ));
        }
        if self.default_vat_pct < Decimal::ZERO {
            return Err(ScheduleError::Invalid(
                "default VAT must not be negative".to_string(),
            ));
        }
        self.excise.validate().map_err(ScheduleError::Invalid)?;
        self.clearance.validate().map_err(ScheduleError::Invalid)?;
        self.utilization.validate().map_err(ScheduleError::Invalid)?;
        Ok(())
    }
}
