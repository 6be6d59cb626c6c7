use super::error::CalculationError;
use super::money::{checked_product, round_money};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// One power band: applies up to and including `up_to_hp`, or above every
/// other band when the bound is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExciseBand {
    pub up_to_hp: Option<u32>,
    pub rate_per_hp: Decimal,
}

/// Excise rates per horsepower, ordered by increasing power.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExciseTable {
    bands: Vec<ExciseBand>,
}

impl Default for ExciseTable {
    fn default() -> Self {
        let band = |up_to_hp, rate_per_hp| ExciseBand {
            up_to_hp,
            rate_per_hp,
        };
        Self {
            bands: vec![
                band(Some(90), dec!(0)),
                band(Some(150), dec!(61)),
                band(Some(200), dec!(583)),
                band(Some(300), dec!(955)),
                band(Some(400), dec!(1628)),
                band(Some(500), dec!(1685)),
                band(None, dec!(1740)),
            ],
        }
    }
}

impl ExciseTable {
    pub fn new(bands: Vec<ExciseBand>) -> Result<Self, String> {
        let table = Self { bands };
        table.validate()?;
        Ok(table)
    }

    pub fn bands(&self) -> &[ExciseBand] {
        &self.bands
    }

    /// Rate of the first band whose bound covers `hp`, else the last band.
    pub fn rate_for(&self, hp: u32) -> Result<Decimal, CalculationError> {
        self.bands
            .iter()
            .find(|band| band.up_to_hp.map_or(true, |bound| hp <= bound))
            .or_else(|| self.bands.last())
            .map(|band| band.rate_per_hp)
            .ok_or_else(|| CalculationError::missing("excise band table is empty"))
    }

    pub fn excise_for(&self, hp: u32) -> Result<Decimal, CalculationError> {
        let rate = self.rate_for(hp)?;
        Ok(round_money(checked_product(rate, Decimal::from(hp))?))
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        let Some((last, leading)) = self.bands.split_last() else {
            return Err("excise table needs at least one band".to_string());
        };
        if last.up_to_hp.is_some() {
            return Err("the last excise band must be unbounded".to_string());
        }

        let mut previous: Option<&ExciseBand> = None;
        for band in &self.bands {
            if band.rate_per_hp.is_sign_negative() {
                return Err(format!("negative excise rate {}", band.rate_per_hp));
            }
            if let Some(prev) = previous {
                if band.rate_per_hp < prev.rate_per_hp {
                    return Err("excise rates must not decrease with power".to_string());
                }
            }
            previous = Some(band);
        }

        let mut bound = None;
        for band in leading {
            let Some(up_to) = band.up_to_hp else {
                return Err("only the last excise band may be unbounded".to_string());
            };
            if bound.is_some_and(|prev| up_to <= prev) {
                return Err("excise band bounds must increase".to_string());
            }
            bound = Some(up_to);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_edges_are_inclusive() {
        let table = ExciseTable::default();
        assert_eq!(table.rate_for(90).expect("rate"), dec!(0));
        assert_eq!(table.rate_for(91).expect("rate"), dec!(61));
        assert_eq!(table.rate_for(150).expect("rate"), dec!(61));
        assert_eq!(table.rate_for(151).expect("rate"), dec!(583));
        assert_eq!(table.rate_for(900).expect("rate"), dec!(1740));
    }

    #[test]
    fn excise_multiplies_rate_by_power() {
        let table = ExciseTable::default();
        assert_eq!(table.excise_for(249).expect("excise"), dec!(237795));
        assert_eq!(table.excise_for(80).expect("excise"), Decimal::ZERO);
    }

    #[test]
    fn default_table_is_valid() {
        assert!(ExciseTable::default().validate().is_ok());
    }

    #[test]
    fn invalid_tables_are_rejected() {
        assert!(ExciseTable::new(Vec::new()).is_err());
        assert!(ExciseTable::new(vec![ExciseBand {
            up_to_hp: Some(100),
            rate_per_hp: dec!(10),
        }])
        .is_err());
        assert!(ExciseTable::new(vec![
            ExciseBand {
                up_to_hp: Some(100),
                rate_per_hp: dec!(50),
            },
            ExciseBand {
                up_to_hp: None,
                rate_per_hp: dec!(10),
            },
        ])
        .is_err());
    }

    #[test]
    fn empty_table_reports_missing_configuration() {
        let table = ExciseTable { bands: Vec::new() };
        assert!(matches!(
            table.rate_for(100),
            Err(CalculationError::MissingConfiguration(_))
        ));
    }
}
