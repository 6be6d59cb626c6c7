use super::cells::RangeBounds;
use rust_decimal::Decimal;
use serde::Serialize;

const AD_VALOREM_MARKERS: &[&str] = &["адвалор", "ad valorem", "ad-valorem", "advalorem"];

/// How the commercial duty of a bracket is assessed, decided once at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DutyKind {
    /// Percentage of customs value, but not less than a per-cc minimum.
    AdValoremWithMinimum,
    /// Fixed rate per cubic centimetre.
    SpecificPerUnit,
    /// Plain percentage of customs value.
    AdValoremOnly,
}

impl DutyKind {
    pub(crate) fn classify(tag: Option<&str>, specific_per_cc: Option<Decimal>) -> Self {
        let tag = tag.map(str::to_lowercase).unwrap_or_default();
        if AD_VALOREM_MARKERS.iter().any(|marker| tag.contains(marker)) {
            return Self::AdValoremWithMinimum;
        }
        if specific_per_cc.is_some_and(|rate| !rate.is_zero()) {
            return Self::SpecificPerUnit;
        }
        Self::AdValoremOnly
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::AdValoremWithMinimum => "ad valorem with per-cc minimum",
            Self::SpecificPerUnit => "specific per cc",
            Self::AdValoremOnly => "ad valorem",
        }
    }
}

/// One tariff bracket of the rule table.
///
/// A row carries both the commercial duty columns and the unified personal
/// duty columns; which ones are read depends on the regime being assessed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleRow {
    pub segment: String,
    pub category: String,
    pub fuel: String,
    pub age_bucket: String,
    pub engine_cc: RangeBounds,
    pub engine_hp: RangeBounds,
    pub duty_kind: DutyKind,
    pub duty_pct: Option<Decimal>,
    pub min_per_cc: Option<Decimal>,
    pub specific_per_cc: Option<Decimal>,
    pub personal_pct: Option<Decimal>,
    pub personal_min_per_cc: Option<Decimal>,
    pub vat_pct: Option<Decimal>,
    pub excise_per_hp: Option<Decimal>,
}

impl RuleRow {
    pub(crate) fn same_bracket_key(&self, other: &RuleRow) -> bool {
        self.segment == other.segment
            && self.category == other.category
            && self.fuel == other.fuel
            && self.age_bucket == other.age_bucket
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn duty_kind_is_decided_from_tag_then_specific_rate() {
        assert_eq!(
            DutyKind::classify(Some("Адвалор+Мин"), None),
            DutyKind::AdValoremWithMinimum
        );
        assert_eq!(
            DutyKind::classify(Some("Ad valorem / min"), Some(dec!(3.0))),
            DutyKind::AdValoremWithMinimum
        );
        assert_eq!(
            DutyKind::classify(Some("СТП"), Some(dec!(3.0))),
            DutyKind::SpecificPerUnit
        );
        assert_eq!(
            DutyKind::classify(None, Some(Decimal::ZERO)),
            DutyKind::AdValoremOnly
        );
    }
}
