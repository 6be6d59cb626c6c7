use super::error::CalculationError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rounds a monetary amount to two decimal places, half away from zero.
///
/// Every computed quantity goes through this function as soon as it is
/// produced, so intermediate roundings are part of the observable result.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn out_of_range() -> CalculationError {
    CalculationError::validation("customs value", "out of range")
}

/// `a * b`, with overflow reported as an out-of-range customs value.
pub(crate) fn checked_product(a: Decimal, b: Decimal) -> Result<Decimal, CalculationError> {
    a.checked_mul(b).ok_or_else(out_of_range)
}

pub(crate) fn checked_quotient(a: Decimal, b: Decimal) -> Result<Decimal, CalculationError> {
    a.checked_div(b).ok_or_else(out_of_range)
}

pub(crate) fn checked_sum(
    amounts: impl IntoIterator<Item = Decimal>,
) -> Result<Decimal, CalculationError> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |sum, amount| {
            sum.checked_add(amount).ok_or_else(out_of_range)
        })
}

pub(crate) fn percent_of(amount: Decimal, pct: Decimal) -> Result<Decimal, CalculationError> {
    Ok(checked_product(amount, pct)? / Decimal::ONE_HUNDRED)
}

/// Exchange rates captured for a single calculation.
///
/// Rates are expressed as local-currency units per one foreign unit. The local
/// currency itself always converts at one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FxSnapshot {
    local_currency: String,
    #[serde(default)]
    rates: BTreeMap<String, Decimal>,
}

impl FxSnapshot {
    pub fn new(local_currency: impl Into<String>) -> Self {
        Self {
            local_currency: local_currency.into().trim().to_ascii_uppercase(),
            rates: BTreeMap::new(),
        }
    }

    pub fn with_rate(mut self, code: impl Into<String>, rate: Decimal) -> Self {
        self.rates
            .insert(code.into().trim().to_ascii_uppercase(), rate);
        self
    }

    pub fn local_currency(&self) -> &str {
        &self.local_currency
    }

    pub fn is_local(&self, code: &str) -> bool {
        self.local_currency.eq_ignore_ascii_case(code.trim())
    }

    /// Local-currency units per one unit of `code`.
    pub fn rate(&self, code: &str) -> Result<Decimal, CalculationError> {
        let code = code.trim();
        if self.is_local(code) {
            return Ok(Decimal::ONE);
        }

        let rate = self
            .rates
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(code))
            .map(|(_, rate)| *rate)
            .ok_or_else(|| CalculationError::UnsupportedCurrency(code.to_ascii_uppercase()))?;

        if rate <= Decimal::ZERO {
            return Err(CalculationError::validation(
                "exchange rate",
                format!("{} rate must be positive, got {rate}", code.to_ascii_uppercase()),
            ));
        }

        Ok(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_money(dec!(2.345)), dec!(2.35));
        assert_eq!(round_money(dec!(2.344)), dec!(2.34));
        assert_eq!(round_money(dec!(101244.005)), dec!(101244.01));
        assert_eq!(round_money(dec!(14260)), dec!(14260.00));
    }

    #[test]
    fn overflowing_arithmetic_is_a_validation_error() {
        assert_eq!(percent_of(dec!(2500), dec!(20)).expect("fits"), dec!(500));
        assert_eq!(
            checked_sum([dec!(1.25), dec!(2.5), dec!(3)]).expect("fits"),
            dec!(6.75)
        );

        for result in [
            checked_product(Decimal::MAX, dec!(2)),
            checked_quotient(Decimal::MAX, dec!(0.5)),
            checked_sum([Decimal::MAX, Decimal::ONE]),
            percent_of(Decimal::MAX, dec!(20)),
        ] {
            match result {
                Err(CalculationError::Validation { field, reason }) => {
                    assert_eq!(field, "customs value");
                    assert_eq!(reason, "out of range");
                }
                other => panic!("expected validation error, got {other:?}"),
            }
        }
    }

    #[test]
    fn snapshot_resolves_local_and_foreign_codes() {
        let fx = FxSnapshot::new("rub").with_rate("eur", dec!(100));
        assert_eq!(fx.rate("RUB").expect("local"), Decimal::ONE);
        assert_eq!(fx.rate("EUR").expect("eur"), dec!(100));
        assert_eq!(fx.rate(" eur ").expect("trimmed"), dec!(100));

        match fx.rate("JPY") {
            Err(CalculationError::UnsupportedCurrency(code)) => assert_eq!(code, "JPY"),
            other => panic!("expected unsupported currency, got {other:?}"),
        }
    }

    #[test]
    fn snapshot_rejects_non_positive_rates() {
        let fx = FxSnapshot::new("RUB").with_rate("USD", Decimal::ZERO);
        assert!(matches!(
            fx.rate("USD"),
            Err(CalculationError::Validation { .. })
        ));
    }
}
