//! Utilization (recycling) fee.
//!
//! The fee is a base rate for the vehicle kind times a coefficient picked by
//! regime, fuel, displacement and a two-way age split. A date-versioned rule
//! table can then replace the plain product with a cost-difference formula
//! and a multiplier for vehicles missing from the approved list.

use super::domain::{DutyRegime, FuelKind, VehicleKind};
use super::error::CalculationError;
use super::money::{checked_product, checked_sum, round_money};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Age split used by the utilization coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilAgeBucket {
    UpToThree,
    OverThree,
}

impl UtilAgeBucket {
    pub fn for_age(age_years: f64) -> Self {
        if age_years <= 3.0 {
            Self::UpToThree
        } else {
            Self::OverThree
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::UpToThree => "≤3y",
            Self::OverThree => ">3y",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseRates {
    #[serde(default)]
    pub passenger: Option<Decimal>,
    #[serde(default)]
    pub commercial: Option<Decimal>,
}

impl Default for BaseRates {
    fn default() -> Self {
        Self {
            passenger: Some(dec!(20000)),
            commercial: Some(dec!(150000)),
        }
    }
}

impl BaseRates {
    fn for_kind(&self, kind: VehicleKind) -> Result<Decimal, CalculationError> {
        let rate = match kind {
            VehicleKind::Passenger => self.passenger,
            VehicleKind::Commercial => self.commercial,
        };
        rate.ok_or_else(|| {
            CalculationError::missing(format!(
                "utilization base rate for {} vehicles",
                kind.label()
            ))
        })
    }
}

/// Coefficients configured separately for each side of the three-year split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeSplit<T> {
    pub up_to_3y: Option<T>,
    pub over_3y: Option<T>,
}

impl<T> AgeSplit<T> {
    fn get(&self, bucket: UtilAgeBucket) -> Option<&T> {
        match bucket {
            UtilAgeBucket::UpToThree => self.up_to_3y.as_ref(),
            UtilAgeBucket::OverThree => self.over_3y.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CcCoefficient {
    pub up_to_cc: Option<u32>,
    pub coefficient: Decimal,
}

fn cc_ladder(values: [Decimal; 5]) -> Vec<CcCoefficient> {
    let bounds = [Some(1000), Some(2000), Some(3000), Some(3500), None];
    bounds
        .into_iter()
        .zip(values)
        .map(|(up_to_cc, coefficient)| CcCoefficient {
            up_to_cc,
            coefficient,
        })
        .collect()
}

fn ladder_coefficient(
    ladder: &[CcCoefficient],
    engine_cc: u32,
    context: &str,
) -> Result<Decimal, CalculationError> {
    ladder
        .iter()
        .find(|step| step.up_to_cc.is_some_and(|bound| engine_cc <= bound))
        .or_else(|| ladder.iter().find(|step| step.up_to_cc.is_none()))
        .map(|step| step.coefficient)
        .ok_or_else(|| {
            CalculationError::missing(format!(
                "{context} utilization coefficient for {engine_cc} cc"
            ))
        })
}

/// Coefficients for an individual importing for personal use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalCoefficients {
    #[serde(default)]
    pub electric: Option<Decimal>,
    #[serde(default)]
    pub hybrid: Option<Decimal>,
    #[serde(default)]
    pub by_engine_cc: Vec<CcCoefficient>,
}

impl PersonalCoefficients {
    fn pick(&self, fuel: FuelKind, engine_cc: u32) -> Result<Decimal, CalculationError> {
        match fuel {
            FuelKind::Electric => self.electric.ok_or_else(|| {
                CalculationError::missing("personal utilization coefficient for electric vehicles")
            }),
            FuelKind::Hybrid | FuelKind::SeriesHybrid => self.hybrid.ok_or_else(|| {
                CalculationError::missing("personal utilization coefficient for hybrids")
            }),
            FuelKind::Petrol | FuelKind::Diesel => {
                ladder_coefficient(&self.by_engine_cc, engine_cc, "personal")
            }
        }
    }
}

/// Coefficients for company imports and any commercial use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommercialCoefficients {
    #[serde(default)]
    pub electric: Option<Decimal>,
    #[serde(default)]
    pub series_hybrid: Option<Decimal>,
    #[serde(default)]
    pub by_engine_cc: Vec<CcCoefficient>,
}

impl CommercialCoefficients {
    fn pick(&self, fuel: FuelKind, engine_cc: u32) -> Result<Decimal, CalculationError> {
        match fuel {
            FuelKind::Electric => self.electric.ok_or_else(|| {
                CalculationError::missing("commercial utilization coefficient for electric vehicles")
            }),
            FuelKind::SeriesHybrid => self.series_hybrid.ok_or_else(|| {
                CalculationError::missing("commercial utilization coefficient for series hybrids")
            }),
            FuelKind::Petrol | FuelKind::Diesel | FuelKind::Hybrid => {
                ladder_coefficient(&self.by_engine_cc, engine_cc, "commercial")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilizationFormula {
    /// Base fee plus a share of the positive gap between average and actual cost.
    BasePlusHalfDifference,
    /// Base fee only.
    Base,
}

fn default_half_diff_factor() -> Decimal {
    dec!(0.5)
}

/// Formula in force from `effective_from` until a later rule takes over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRule {
    pub effective_from: NaiveDate,
    pub formula: UtilizationFormula,
    #[serde(default = "default_half_diff_factor")]
    pub half_diff_factor: Decimal,
    #[serde(default)]
    pub not_listed_multiplier: Option<Decimal>,
}

/// Inputs to a single utilization fee lookup.
#[derive(Debug, Clone, Copy)]
pub struct UtilizationRequest {
    pub regime: DutyRegime,
    pub vehicle_kind: VehicleKind,
    pub fuel: FuelKind,
    pub engine_cc: u32,
    pub age_years: f64,
    pub declaration_date: NaiveDate,
    pub average_vehicle_cost: Option<Decimal>,
    pub actual_costs: Option<Decimal>,
    pub not_on_approved_list: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UtilizationFee {
    pub age_bucket: UtilAgeBucket,
    pub base_rate: Decimal,
    pub coefficient: Decimal,
    pub base_fee: Decimal,
    pub fee: Decimal,
    pub date_rule: Option<NaiveDate>,
    pub cost_difference_applied: bool,
    pub multiplier_applied: bool,
}

/// Injected utilization configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtilizationSchedule {
    #[serde(default)]
    pub base_rates: BaseRates,
    pub personal: AgeSplit<PersonalCoefficients>,
    pub commercial: AgeSplit<CommercialCoefficients>,
    #[serde(default)]
    pub date_rules: Vec<DateRule>,
}

impl Default for UtilizationSchedule {
    fn default() -> Self {
        Self {
            base_rates: BaseRates::default(),
            personal: AgeSplit {
                up_to_3y: Some(PersonalCoefficients {
                    electric: Some(dec!(0.17)),
                    hybrid: Some(dec!(0.17)),
                    by_engine_cc: cc_ladder([
                        dec!(0.17),
                        dec!(0.17),
                        dec!(0.17),
                        dec!(107.67),
                        dec!(137.11),
                    ]),
                }),
                over_3y: Some(PersonalCoefficients {
                    electric: Some(dec!(0.26)),
                    hybrid: Some(dec!(0.26)),
                    by_engine_cc: cc_ladder([
                        dec!(0.26),
                        dec!(0.26),
                        dec!(0.26),
                        dec!(164.84),
                        dec!(180.24),
                    ]),
                }),
            },
            commercial: AgeSplit {
                up_to_3y: Some(CommercialCoefficients {
                    electric: Some(dec!(33.37)),
                    series_hybrid: Some(dec!(33.37)),
                    by_engine_cc: cc_ladder([
                        dec!(4.06),
                        dec!(15.03),
                        dec!(42.24),
                        dec!(48.5),
                        dec!(61.76),
                    ]),
                }),
                over_3y: Some(CommercialCoefficients {
                    electric: Some(dec!(58.7)),
                    series_hybrid: Some(dec!(58.7)),
                    by_engine_cc: cc_ladder([
                        dec!(10.36),
                        dec!(26.44),
                        dec!(63.95),
                        dec!(74.25),
                        dec!(81.19),
                    ]),
                }),
            },
            date_rules: vec![DateRule {
                effective_from: NaiveDate::from_ymd_opt(2025, 5, 1)
                    .unwrap_or(NaiveDate::MIN),
                formula: UtilizationFormula::BasePlusHalfDifference,
                half_diff_factor: default_half_diff_factor(),
                not_listed_multiplier: Some(dec!(3.0)),
            }],
        }
    }
}

impl UtilizationSchedule {
    /// Latest rule whose effective date is not after `declaration_date`.
    pub fn applicable_rule(&self, declaration_date: NaiveDate) -> Option<&DateRule> {
        self.date_rules
            .iter()
            .filter(|rule| rule.effective_from <= declaration_date)
            .max_by_key(|rule| rule.effective_from)
    }

    pub fn coefficient(
        &self,
        regime: DutyRegime,
        fuel: FuelKind,
        engine_cc: u32,
        bucket: UtilAgeBucket,
    ) -> Result<Decimal, CalculationError> {
        match regime {
            DutyRegime::Personal => self
                .personal
                .get(bucket)
                .ok_or_else(|| {
                    CalculationError::missing(format!(
                        "personal utilization coefficients for {}",
                        bucket.label()
                    ))
                })?
                .pick(fuel, engine_cc),
            DutyRegime::Commercial => self
                .commercial
                .get(bucket)
                .ok_or_else(|| {
                    CalculationError::missing(format!(
                        "commercial utilization coefficients for {}",
                        bucket.label()
                    ))
                })?
                .pick(fuel, engine_cc),
        }
    }

    pub fn fee(&self, request: &UtilizationRequest) -> Result<UtilizationFee, CalculationError> {
        for (field, value) in [
            ("average vehicle cost", request.average_vehicle_cost),
            ("actual costs", request.actual_costs),
        ] {
            if let Some(value) = value {
                if value < Decimal::ZERO {
                    return Err(CalculationError::validation(
                        field,
                        format!("must not be negative, got {value}"),
                    ));
                }
            }
        }

        let age_bucket = UtilAgeBucket::for_age(request.age_years);
        let base_rate = self.base_rates.for_kind(request.vehicle_kind)?;
        let coefficient =
            self.coefficient(request.regime, request.fuel, request.engine_cc, age_bucket)?;
        let base_fee = round_money(checked_product(base_rate, coefficient)?);

        let mut fee = base_fee;
        let mut cost_difference_applied = false;
        let mut multiplier_applied = false;
        let rule = self.applicable_rule(request.declaration_date);

        if let Some(rule) = rule {
            if let (UtilizationFormula::BasePlusHalfDifference, Some(average), Some(actual)) =
                (rule.formula, request.average_vehicle_cost, request.actual_costs)
            {
                let gap = (average - actual).max(Decimal::ZERO);
                fee = round_money(checked_sum([
                    fee,
                    checked_product(gap, rule.half_diff_factor)?,
                ])?);
                cost_difference_applied = true;
            }

            if request.not_on_approved_list {
                if let Some(multiplier) = rule.not_listed_multiplier {
                    fee = round_money(checked_product(fee, multiplier)?);
                    multiplier_applied = true;
                }
            }
        }

        Ok(UtilizationFee {
            age_bucket,
            base_rate,
            coefficient,
            base_fee,
            fee,
            date_rule: rule.map(|rule| rule.effective_from),
            cost_difference_applied,
            multiplier_applied,
        })
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        for (kind, rate) in [
            ("passenger", self.base_rates.passenger),
            ("commercial", self.base_rates.commercial),
        ] {
            if rate.is_some_and(|rate| rate <= Decimal::ZERO) {
                return Err(format!("{kind} utilization base rate must be positive"));
            }
        }

        let ladders = [
            self.personal.up_to_3y.as_ref().map(|c| &c.by_engine_cc),
            self.personal.over_3y.as_ref().map(|c| &c.by_engine_cc),
            self.commercial.up_to_3y.as_ref().map(|c| &c.by_engine_cc),
            self.commercial.over_3y.as_ref().map(|c| &c.by_engine_cc),
        ];
        for ladder in ladders.into_iter().flatten() {
            let mut previous: Option<u32> = None;
            for step in ladder {
                if step.coefficient.is_sign_negative() {
                    return Err("utilization coefficients must not be negative".to_string());
                }
                if let Some(bound) = step.up_to_cc {
                    if previous.is_some_and(|prev| bound <= prev) {
                        return Err("utilization cc ladder bounds must increase".to_string());
                    }
                    previous = Some(bound);
                }
            }
        }

        let mut dates: Vec<NaiveDate> = self.date_rules.iter().map(|r| r.effective_from).collect();
        dates.sort();
        if dates.windows(2).any(|pair| pair[0] == pair[1]) {
            return Err("utilization date rules must have distinct effective dates".to_string());
        }
        for rule in &self.date_rules {
            if rule.half_diff_factor.is_sign_negative() {
                return Err("half-difference factor must not be negative".to_string());
            }
            if rule.not_listed_multiplier.is_some_and(|m| m <= Decimal::ZERO) {
                return Err("not-listed multiplier must be positive".to_string());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn request(engine_cc: u32, age_years: f64, declaration_date: NaiveDate) -> UtilizationRequest {
        UtilizationRequest {
            regime: DutyRegime::Personal,
            vehicle_kind: VehicleKind::Passenger,
            fuel: FuelKind::Petrol,
            engine_cc,
            age_years,
            declaration_date,
            average_vehicle_cost: None,
            actual_costs: None,
            not_on_approved_list: false,
        }
    }

    #[test]
    fn personal_petrol_under_three_years_uses_base_times_coefficient() {
        let schedule = UtilizationSchedule::default();
        let fee = schedule
            .fee(&request(1800, 2.0, date(2024, 12, 1)))
            .expect("fee");
        assert_eq!(fee.coefficient, dec!(0.17));
        assert_eq!(fee.base_fee, dec!(3400));
        assert_eq!(fee.fee, dec!(3400));
        assert_eq!(fee.date_rule, None);
    }

    #[test]
    fn large_engines_climb_the_displacement_ladder() {
        let schedule = UtilizationSchedule::default();
        let fee = schedule
            .fee(&request(3200, 5.0, date(2024, 1, 10)))
            .expect("fee");
        assert_eq!(fee.age_bucket, UtilAgeBucket::OverThree);
        assert_eq!(fee.coefficient, dec!(164.84));
        assert_eq!(fee.fee, dec!(3296800));
    }

    #[test]
    fn cost_difference_applies_after_the_cutover() {
        let schedule = UtilizationSchedule::default();
        let mut req = request(1800, 2.0, date(2025, 6, 1));
        req.average_vehicle_cost = Some(dec!(1000000));
        req.actual_costs = Some(dec!(800000));

        let fee = schedule.fee(&req).expect("fee");
        assert!(fee.cost_difference_applied);
        assert_eq!(fee.fee, dec!(103400));
        assert_eq!(fee.date_rule, Some(date(2025, 5, 1)));

        req.declaration_date = date(2025, 4, 30);
        let before = schedule.fee(&req).expect("fee");
        assert!(!before.cost_difference_applied);
        assert_eq!(before.fee, dec!(3400));
    }

    #[test]
    fn negative_gap_is_not_subtracted() {
        let schedule = UtilizationSchedule::default();
        let mut req = request(1800, 2.0, date(2025, 6, 1));
        req.average_vehicle_cost = Some(dec!(500000));
        req.actual_costs = Some(dec!(800000));
        assert_eq!(schedule.fee(&req).expect("fee").fee, dec!(3400));
    }

    #[test]
    fn one_sided_costs_leave_the_base_fee() {
        let schedule = UtilizationSchedule::default();
        let mut req = request(1800, 2.0, date(2025, 6, 1));
        req.average_vehicle_cost = Some(dec!(1000000));
        let fee = schedule.fee(&req).expect("fee");
        assert!(!fee.cost_difference_applied);
        assert_eq!(fee.fee, dec!(3400));
    }

    #[test]
    fn negative_costs_are_rejected() {
        let schedule = UtilizationSchedule::default();
        let mut req = request(1800, 2.0, date(2025, 6, 1));
        req.average_vehicle_cost = Some(dec!(1000000));
        req.actual_costs = Some(dec!(-1));

        match schedule.fee(&req) {
            Err(CalculationError::Validation { field, .. }) => assert_eq!(field, "actual costs"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn not_listed_multiplier_comes_from_the_applicable_rule() {
        let schedule = UtilizationSchedule::default();
        let mut req = request(4000, 5.0, date(2025, 6, 1));
        req.average_vehicle_cost = Some(dec!(900000));
        req.actual_costs = Some(dec!(700000));
        req.not_on_approved_list = true;

        let fee = schedule.fee(&req).expect("fee");
        assert!(fee.multiplier_applied);
        // (20000 * 180.24 + 200000 * 0.5) * 3
        assert_eq!(fee.fee, dec!(11114400));
    }

    #[test]
    fn latest_rule_not_after_the_declaration_wins() {
        let mut schedule = UtilizationSchedule::default();
        schedule.date_rules.push(DateRule {
            effective_from: date(2026, 1, 1),
            formula: UtilizationFormula::Base,
            half_diff_factor: dec!(0.5),
            not_listed_multiplier: None,
        });

        assert_eq!(
            schedule
                .applicable_rule(date(2025, 12, 31))
                .map(|rule| rule.formula),
            Some(UtilizationFormula::BasePlusHalfDifference)
        );
        assert_eq!(
            schedule
                .applicable_rule(date(2026, 1, 1))
                .map(|rule| rule.formula),
            Some(UtilizationFormula::Base)
        );
        assert!(schedule.applicable_rule(date(2020, 1, 1)).is_none());
    }

    #[test]
    fn commercial_series_hybrids_use_their_own_coefficient() {
        let schedule = UtilizationSchedule::default();
        let coefficient = schedule
            .coefficient(
                DutyRegime::Commercial,
                FuelKind::SeriesHybrid,
                1500,
                UtilAgeBucket::OverThree,
            )
            .expect("coefficient");
        assert_eq!(coefficient, dec!(58.7));

        let coefficient = schedule
            .coefficient(
                DutyRegime::Commercial,
                FuelKind::Hybrid,
                1500,
                UtilAgeBucket::UpToThree,
            )
            .expect("coefficient");
        assert_eq!(coefficient, dec!(15.03));
    }

    #[test]
    fn missing_coefficients_surface_as_configuration_errors() {
        let mut schedule = UtilizationSchedule::default();
        schedule.personal.over_3y = None;
        assert!(matches!(
            schedule.fee(&request(1800, 6.0, date(2024, 1, 1))),
            Err(CalculationError::MissingConfiguration(_))
        ));

        let mut schedule = UtilizationSchedule::default();
        schedule.base_rates.passenger = None;
        assert!(matches!(
            schedule.fee(&request(1800, 1.0, date(2024, 1, 1))),
            Err(CalculationError::MissingConfiguration(_))
        ));
    }

    #[test]
    fn schedules_may_omit_one_side_of_the_age_split() {
        let mut json = serde_json::to_value(UtilizationSchedule::default()).expect("serializes");
        json["personal"]
            .as_object_mut()
            .expect("personal split")
            .remove("over_3y");

        let schedule: UtilizationSchedule = serde_json::from_value(json).expect("deserializes");
        assert!(schedule.personal.over_3y.is_none());
        assert_eq!(
            schedule.personal.up_to_3y,
            UtilizationSchedule::default().personal.up_to_3y
        );
        assert_eq!(
            schedule.commercial,
            UtilizationSchedule::default().commercial
        );
        assert!(matches!(
            schedule.fee(&request(1800, 6.0, date(2024, 1, 1))),
            Err(CalculationError::MissingConfiguration(_))
        ));
    }
}
