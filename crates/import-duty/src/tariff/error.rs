use super::domain::DutyRegime;
use serde::Serialize;
use std::fmt;

/// Failure raised by a duty calculation. None of these are retryable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalculationError {
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },
    #[error("{0}")]
    NoApplicableRule(RuleMiss),
    #[error("missing tariff configuration: {0}")]
    MissingConfiguration(String),
    #[error("currency {0} is not present in the exchange-rate snapshot")]
    UnsupportedCurrency(String),
}

impl CalculationError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(detail: impl Into<String>) -> Self {
        Self::MissingConfiguration(detail.into())
    }
}

/// The last lookup that failed once every age-bucket candidate was exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleMiss {
    pub regime: DutyRegime,
    pub segment: String,
    pub category: String,
    pub fuel: String,
    pub engine_cc: u32,
    pub engine_hp: Option<u32>,
    pub age_bucket: String,
    pub tried_age_buckets: Vec<String>,
}

impl fmt::Display for RuleMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no {} rule for {}/{}/{} with {} cc",
            self.regime, self.segment, self.category, self.fuel, self.engine_cc
        )?;
        if let Some(hp) = self.engine_hp {
            write!(f, ", {hp} hp")?;
        }
        write!(
            f,
            " in age bucket '{}' (tried: {})",
            self.age_bucket,
            self.tried_age_buckets.join(", ")
        )
    }
}
