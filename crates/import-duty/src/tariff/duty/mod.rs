mod company;
mod individual;

use super::domain::DutyRegime;
use super::error::CalculationError;
use super::rules::RuleRow;
use super::schedule::TariffSchedule;
use rust_decimal::Decimal;
use serde::Serialize;

/// Which term of the duty formula produced the final amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DutyBasis {
    UnifiedPercentage,
    UnifiedMinimumPerCc,
    UnifiedSpecificPerCc,
    AdValorem,
    MinimumPerCc,
    SpecificPerCc,
}

impl DutyBasis {
    pub const fn label(self) -> &'static str {
        match self {
            Self::UnifiedPercentage => "unified rate, percentage of value",
            Self::UnifiedMinimumPerCc => "unified rate, per-cc minimum",
            Self::UnifiedSpecificPerCc => "unified rate, specific per cc",
            Self::AdValorem => "ad valorem",
            Self::MinimumPerCc => "per-cc minimum",
            Self::SpecificPerCc => "specific per cc",
        }
    }
}

/// Values a matched rule row is applied to.
#[derive(Debug, Clone, Copy)]
pub struct DutyContext<'a> {
    /// Customs value in the rule currency.
    pub customs_value_rule: Decimal,
    pub customs_value_local: Decimal,
    /// Local-currency units per one rule-currency unit.
    pub rule_rate: Decimal,
    pub engine_cc: u32,
    pub engine_hp: Option<u32>,
    pub schedule: &'a TariffSchedule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DutyAssessment {
    pub duty_rule_currency: Decimal,
    pub duty_local: Decimal,
    pub excise: Decimal,
    pub vat: Decimal,
    pub basis: DutyBasis,
}

pub fn assess(
    regime: DutyRegime,
    row: &RuleRow,
    context: &DutyContext<'_>,
) -> Result<DutyAssessment, CalculationError> {
    match regime {
        DutyRegime::Personal => individual::assess(row, context),
        DutyRegime::Commercial => company::assess(row, context),
    }
}

/// Largest candidate; the earlier candidate wins ties.
fn largest(candidates: impl IntoIterator<Item = (Decimal, DutyBasis)>) -> Option<(Decimal, DutyBasis)> {
    candidates
        .into_iter()
        .fold(None, |best, candidate| match best {
            Some(best) if best.0 >= candidate.0 => Some(best),
            _ => Some(candidate),
        })
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::tariff::rules::{DutyKind, RangeBounds, RuleRow};

    pub(crate) fn blank_row() -> RuleRow {
        RuleRow {
            segment: "Легковой".into(),
            category: "M1".into(),
            fuel: "Бензин".into(),
            age_bucket: "≤3".into(),
            engine_cc: RangeBounds::UNBOUNDED,
            engine_hp: RangeBounds::UNBOUNDED,
            duty_kind: DutyKind::AdValoremOnly,
            duty_pct: None,
            min_per_cc: None,
            specific_per_cc: None,
            personal_pct: None,
            personal_min_per_cc: None,
            vat_pct: None,
            excise_per_hp: None,
        }
    }
}
