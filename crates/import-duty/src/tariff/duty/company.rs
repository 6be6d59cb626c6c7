use super::{largest, DutyAssessment, DutyBasis, DutyContext};
use crate::tariff::error::CalculationError;
use crate::tariff::money::{checked_product, checked_sum, percent_of, round_money};
use crate::tariff::rules::{DutyKind, RuleRow};
use rust_decimal::Decimal;

/// Commercial duty with separate excise and VAT.
pub(super) fn assess(
    row: &RuleRow,
    context: &DutyContext<'_>,
) -> Result<DutyAssessment, CalculationError> {
    let engine_hp = context.engine_hp.ok_or_else(|| {
        CalculationError::validation("engine power", "required for commercial imports")
    })?;

    let (duty_rule_currency, basis) = duty(row, context)?;
    let duty_local = round_money(checked_product(duty_rule_currency, context.rule_rate)?);

    let excise = match row.excise_per_hp {
        Some(rate) => round_money(checked_product(rate, Decimal::from(engine_hp))?),
        None => context.schedule.excise.excise_for(engine_hp)?,
    };

    let vat_pct = row.vat_pct.unwrap_or(context.schedule.default_vat_pct);
    let vat_base = checked_sum([context.customs_value_local, duty_local, excise])?;
    let vat = round_money(percent_of(vat_base, vat_pct)?);

    Ok(DutyAssessment {
        duty_rule_currency,
        duty_local,
        excise,
        vat,
        basis,
    })
}

fn duty(row: &RuleRow, context: &DutyContext<'_>) -> Result<(Decimal, DutyBasis), CalculationError> {
    let cc = Decimal::from(context.engine_cc);
    let ad_valorem = row
        .duty_pct
        .map(|pct| percent_of(context.customs_value_rule, pct))
        .transpose()?
        .map(|amount| (round_money(amount), DutyBasis::AdValorem));
    let per_cc = |rate: Option<Decimal>, basis: DutyBasis| {
        rate.map(|rate| checked_product(cc, rate))
            .transpose()
            .map(|amount| amount.map(|amount| (round_money(amount), basis)))
    };

    let picked = match row.duty_kind {
        DutyKind::AdValoremWithMinimum => {
            let minimum = per_cc(row.min_per_cc, DutyBasis::MinimumPerCc)?;
            largest(ad_valorem.into_iter().chain(minimum))
        }
        DutyKind::SpecificPerUnit => {
            per_cc(row.specific_per_cc, DutyBasis::SpecificPerCc)?.or(ad_valorem)
        }
        DutyKind::AdValoremOnly => ad_valorem,
    };

    picked.ok_or_else(|| {
        CalculationError::missing(format!(
            "rule {}/{}/{} ({}) has no {} rate",
            row.segment,
            row.category,
            row.fuel,
            row.age_bucket,
            row.duty_kind.label()
        ))
    })
}
