use super::error::CalculationError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Fixed fee for customs values up to and including `up_to`; the final
/// bracket has no upper threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearanceBracket {
    pub up_to: Option<Decimal>,
    pub fee: Decimal,
}

/// Customs clearance fee ladder keyed by customs value in local currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClearanceLadder {
    brackets: Vec<ClearanceBracket>,
}

impl Default for ClearanceLadder {
    fn default() -> Self {
        let bracket = |up_to, fee| ClearanceBracket { up_to, fee };
        Self {
            brackets: vec![
                bracket(Some(dec!(200000)), dec!(1067)),
                bracket(Some(dec!(450000)), dec!(2134)),
                bracket(Some(dec!(1200000)), dec!(4269)),
                bracket(Some(dec!(3000000)), dec!(11746)),
                bracket(Some(dec!(5000000)), dec!(16524)),
                bracket(Some(dec!(7000000)), dec!(20000)),
                bracket(None, dec!(30000)),
            ],
        }
    }
}

impl ClearanceLadder {
    pub fn new(brackets: Vec<ClearanceBracket>) -> Result<Self, String> {
        let ladder = Self { brackets };
        ladder.validate()?;
        Ok(ladder)
    }

    pub fn brackets(&self) -> &[ClearanceBracket] {
        &self.brackets
    }

    pub fn fee_for(&self, customs_value_local: Decimal) -> Result<Decimal, CalculationError> {
        if customs_value_local <= Decimal::ZERO {
            return Err(CalculationError::validation(
                "customs value",
                format!("must be positive, got {customs_value_local}"),
            ));
        }

        self.brackets
            .iter()
            .find(|bracket| bracket.up_to.map_or(true, |limit| customs_value_local <= limit))
            .or_else(|| self.brackets.last())
            .map(|bracket| bracket.fee)
            .ok_or_else(|| CalculationError::missing("clearance fee ladder is empty"))
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        let Some((last, leading)) = self.brackets.split_last() else {
            return Err("clearance ladder needs at least one bracket".to_string());
        };
        if last.up_to.is_some() {
            return Err("the last clearance bracket must be unbounded".to_string());
        }

        let mut previous: Option<(Decimal, Decimal)> = None;
        for bracket in leading {
            let Some(limit) = bracket.up_to else {
                return Err("only the last clearance bracket may be unbounded".to_string());
            };
            if let Some((prev_limit, prev_fee)) = previous {
                if limit <= prev_limit {
                    return Err("clearance thresholds must increase".to_string());
                }
                if bracket.fee < prev_fee {
                    return Err("clearance fees must not decrease".to_string());
                }
            }
            previous = Some((limit, bracket.fee));
        }
        if previous.is_some_and(|(_, prev_fee)| last.fee < prev_fee) {
            return Err("clearance fees must not decrease".to_string());
        }

        Ok(())
    }
}
