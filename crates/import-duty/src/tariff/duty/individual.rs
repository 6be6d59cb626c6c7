use super::{largest, DutyAssessment, DutyBasis, DutyContext};
use crate::tariff::error::CalculationError;
use crate::tariff::money::{checked_product, percent_of, round_money};
use crate::tariff::rules::RuleRow;
use rust_decimal::Decimal;

/// Unified personal duty. Excise and VAT are part of the unified rate and
/// are reported as zero.
pub(super) fn assess(
    row: &RuleRow,
    context: &DutyContext<'_>,
) -> Result<DutyAssessment, CalculationError> {
    let cc = Decimal::from(context.engine_cc);
    let mut candidates = Vec::with_capacity(2);

    if let Some(pct) = row.personal_pct {
        candidates.push((
            round_money(percent_of(context.customs_value_rule, pct)?),
            DutyBasis::UnifiedPercentage,
        ));
    }
    if let Some(min_per_cc) = row.personal_min_per_cc {
        candidates.push((
            round_money(checked_product(cc, min_per_cc)?),
            DutyBasis::UnifiedMinimumPerCc,
        ));
    }
    if candidates.is_empty() {
        if let Some(specific) = row.specific_per_cc {
            candidates.push((
                round_money(checked_product(cc, specific)?),
                DutyBasis::UnifiedSpecificPerCc,
            ));
        }
    }

    let (duty_rule_currency, basis) = largest(candidates).ok_or_else(|| {
        CalculationError::missing(format!(
            "rule {}/{}/{} ({}) has no unified duty rate",
            row.segment, row.category, row.fuel, row.age_bucket
        ))
    })?;

    Ok(DutyAssessment {
        duty_rule_currency,
        duty_local: round_money(checked_product(duty_rule_currency, context.rule_rate)?),
        excise: Decimal::ZERO,
        vat: Decimal::ZERO,
        basis,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tariff::duty::test_support::blank_row;
    use crate::tariff::schedule::TariffSchedule;
    use rust_decimal_macros::dec;

    fn context(schedule: &TariffSchedule, engine_cc: u32) -> DutyContext<'_> {
        DutyContext {
            customs_value_rule: dec!(10000),
            customs_value_local: dec!(1000000),
            rule_rate: dec!(100),
            engine_cc,
            engine_hp: None,
            schedule,
        }
    }

    #[test]
    fn per_cc_minimum_wins_for_cheap_large_engines() {
        let schedule = TariffSchedule::default();
        let mut row = blank_row();
        row.personal_pct = Some(dec!(48));
        row.personal_min_per_cc = Some(dec!(6.2));

        let duty = assess(&row, &context(&schedule, 2300)).expect("duty");
        assert_eq!(duty.duty_rule_currency, dec!(14260));
        assert_eq!(duty.duty_local, dec!(1426000));
        assert_eq!(duty.basis, DutyBasis::UnifiedMinimumPerCc);
        assert_eq!(duty.excise, Decimal::ZERO);
        assert_eq!(duty.vat, Decimal::ZERO);
    }

    #[test]
    fn percentage_wins_for_expensive_small_engines() {
        let schedule = TariffSchedule::default();
        let mut row = blank_row();
        row.personal_pct = Some(dec!(54));
        row.personal_min_per_cc = Some(dec!(2.5));

        let duty = assess(&row, &context(&schedule, 998)).expect("duty");
        assert_eq!(duty.duty_rule_currency, dec!(5400));
        assert_eq!(duty.basis, DutyBasis::UnifiedPercentage);
    }

    #[test]
    fn specific_rate_is_used_only_without_unified_rates() {
        let schedule = TariffSchedule::default();
        let mut row = blank_row();
        row.specific_per_cc = Some(dec!(3.0));

        let duty = assess(&row, &context(&schedule, 1500)).expect("duty");
        assert_eq!(duty.duty_rule_currency, dec!(4500));
        assert_eq!(duty.basis, DutyBasis::UnifiedSpecificPerCc);

        row.personal_min_per_cc = Some(dec!(1.0));
        let duty = assess(&row, &context(&schedule, 1500)).expect("duty");
        assert_eq!(duty.duty_rule_currency, dec!(1500));
    }

    #[test]
    fn rows_without_rates_are_a_configuration_gap() {
        let schedule = TariffSchedule::default();
        assert!(matches!(
            assess(&blank_row(), &context(&schedule, 1500)),
            Err(CalculationError::MissingConfiguration(_))
        ));
    }
}
