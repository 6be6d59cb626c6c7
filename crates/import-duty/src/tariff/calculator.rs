use super::age::{self, AgeCandidates, AgeCategory};
use super::domain::{DutyRegime, FuelKind, ImporterType, UsageType, VehicleKind};
use super::duty::{self, DutyAssessment, DutyBasis, DutyContext};
use super::error::{CalculationError, RuleMiss};
use super::money::{checked_product, checked_quotient, checked_sum, round_money, FxSnapshot};
use super::rules::{MatchPass, RuleQuery, RuleRepository};
use super::schedule::TariffSchedule;
use super::utilization::{UtilizationFee, UtilizationRequest};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Upper bound for declared amounts: customs value and the utilization costs.
const MAX_DECLARED_AMOUNT: Decimal = dec!(1000000000000000);

fn default_segment() -> String {
    "Легковой".to_string()
}

fn default_category() -> String {
    "M1".to_string()
}

fn default_currency() -> String {
    "EUR".to_string()
}

/// Everything a single calculation depends on, including the exchange rates
/// captured by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationInput {
    pub importer: ImporterType,
    pub usage: UsageType,
    #[serde(default)]
    pub vehicle_kind: VehicleKind,
    #[serde(default = "default_segment")]
    pub segment: String,
    #[serde(default = "default_category")]
    pub category: String,
    /// Free-form fuel or drivetrain description, e.g. "бензин" or "PHEV".
    pub fuel: String,
    pub engine_cc: u32,
    #[serde(default)]
    pub engine_hp: Option<u32>,
    pub production_year: i32,
    pub declaration_date: NaiveDate,
    /// The importer's own answer to "is the vehicle older than three years".
    #[serde(default)]
    pub older_than_three: bool,
    pub customs_value: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub fx: FxSnapshot,
    #[serde(default)]
    pub average_vehicle_cost: Option<Decimal>,
    #[serde(default)]
    pub actual_costs: Option<Decimal>,
    #[serde(default)]
    pub not_on_approved_list: bool,
    /// Vehicle equipped for a disabled driver; VAT is not charged.
    #[serde(default)]
    pub vat_exempt: bool,
}

impl CalculationInput {
    fn validate(&self, regime: DutyRegime) -> Result<(), CalculationError> {
        if self.engine_cc == 0 {
            return Err(CalculationError::validation(
                "engine displacement",
                "must be a positive number of cubic centimetres",
            ));
        }
        match self.engine_hp {
            Some(0) => {
                return Err(CalculationError::validation(
                    "engine power",
                    "must be a positive number of horsepower",
                ))
            }
            None if regime.requires_engine_power() => {
                return Err(CalculationError::validation(
                    "engine power",
                    "required for commercial imports",
                ))
            }
            _ => {}
        }
        if self.customs_value <= Decimal::ZERO {
            return Err(CalculationError::validation(
                "customs value",
                format!("must be positive, got {}", self.customs_value),
            ));
        }
        if self.customs_value > MAX_DECLARED_AMOUNT {
            return Err(CalculationError::validation("customs value", "out of range"));
        }
        if NaiveDate::from_ymd_opt(self.production_year, 12, 31).is_none() {
            return Err(CalculationError::validation(
                "production year",
                format!("{} is out of range", self.production_year),
            ));
        }
        if self.production_year > self.declaration_date.year() {
            return Err(CalculationError::validation(
                "production year",
                format!(
                    "{} is after the declaration date {}",
                    self.production_year, self.declaration_date
                ),
            ));
        }
        for (field, value) in [
            ("average vehicle cost", self.average_vehicle_cost),
            ("actual costs", self.actual_costs),
        ] {
            if value.is_some_and(|value| value < Decimal::ZERO) {
                return Err(CalculationError::validation(field, "must not be negative"));
            }
            if value.is_some_and(|value| value > MAX_DECLARED_AMOUNT) {
                return Err(CalculationError::validation(field, "out of range"));
            }
        }
        Ok(())
    }
}

/// Result of one calculation. All amounts are in local currency unless the
/// field name says otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    pub regime: DutyRegime,
    pub fuel: FuelKind,
    pub age_bucket: String,
    pub duty_basis: DutyBasis,
    pub customs_value_local: Decimal,
    pub customs_value_rule_currency: Decimal,
    pub duty_rule_currency: Decimal,
    pub duty_local: Decimal,
    pub excise: Decimal,
    pub vat: Decimal,
    pub clearance_fee: Decimal,
    pub utilization_fee: Decimal,
    pub total: Decimal,
    pub total_with_utilization: Decimal,
    pub notes: Vec<String>,
}

/// Calculation entry point over one rule table and tariff schedule.
///
/// Holds no mutable state, so a single instance can serve concurrent
/// requests.
#[derive(Debug, Clone)]
pub struct DutyCalculator {
    rules: Arc<RuleRepository>,
    schedule: Arc<TariffSchedule>,
}

struct MatchedDuty {
    label: String,
    pass: MatchPass,
    assessment: DutyAssessment,
}

impl DutyCalculator {
    pub fn new(rules: Arc<RuleRepository>, schedule: Arc<TariffSchedule>) -> Self {
        Self { rules, schedule }
    }

    pub fn rules(&self) -> &Arc<RuleRepository> {
        &self.rules
    }

    pub fn schedule(&self) -> &Arc<TariffSchedule> {
        &self.schedule
    }

    pub fn calculate(&self, input: &CalculationInput) -> Result<Breakdown, CalculationError> {
        let regime = DutyRegime::select(input.importer, input.usage);
        let fuel = FuelKind::from_user_input(&input.fuel);
        input.validate(regime)?;

        if !input
            .fx
            .local_currency()
            .eq_ignore_ascii_case(&self.schedule.local_currency)
        {
            return Err(CalculationError::validation(
                "exchange rates",
                format!(
                    "snapshot is quoted in {} but the schedule expects {}",
                    input.fx.local_currency(),
                    self.schedule.local_currency
                ),
            ));
        }

        let value_rate = input.fx.rate(&input.currency)?;
        let rule_rate = input.fx.rate(&self.schedule.rule_currency)?;
        let value_in_local = checked_product(input.customs_value, value_rate)?;
        let customs_value_local = round_money(value_in_local);
        let customs_value_rule = if input
            .currency
            .trim()
            .eq_ignore_ascii_case(&self.schedule.rule_currency)
        {
            input.customs_value
        } else {
            round_money(checked_quotient(value_in_local, rule_rate)?)
        };

        let age_years = age::actual_age_years(input.production_year, input.declaration_date);
        let candidates = match regime {
            DutyRegime::Personal => age::candidates_for_individual(
                input.older_than_three,
                age_years,
                self.rules.age_buckets(),
            ),
            DutyRegime::Commercial => {
                age::candidates_for_company(age_years, self.rules.age_buckets())
            }
        };
        debug!(
            regime = regime.label(),
            fuel = fuel.rule_label(),
            age_years,
            candidates = ?candidates.labels,
            "resolving duty rule"
        );

        let context = DutyContext {
            customs_value_rule,
            customs_value_local,
            rule_rate,
            engine_cc: input.engine_cc,
            engine_hp: input.engine_hp,
            schedule: &self.schedule,
        };
        let matched = self.match_and_assess(input, regime, fuel, &candidates, &context)?;

        let mut notes = Vec::new();
        notes.push(format!(
            "{} regime, rule bucket '{}'",
            regime.label(),
            matched.label
        ));
        if let Some(note) = fallback_note(&candidates, &matched.label, age_years) {
            notes.push(note);
        }
        if matched.pass == MatchPass::PowerRelaxed {
            if let Some(hp) = input.engine_hp {
                notes.push(format!(
                    "no bracket covers {hp} hp; matched on displacement only"
                ));
            }
        }
        if self.rules.is_built_in() {
            notes.push("rates come from the built-in fallback table".to_string());
        }

        let mut assessment = matched.assessment;
        if input.vat_exempt && !assessment.vat.is_zero() {
            assessment.vat = Decimal::ZERO;
            notes.push("VAT waived for a vehicle equipped for a disabled driver".to_string());
        }

        let clearance_fee = self.schedule.clearance.fee_for(customs_value_local)?;
        let utilization = self.schedule.utilization.fee(&UtilizationRequest {
            regime,
            vehicle_kind: input.vehicle_kind,
            fuel,
            engine_cc: input.engine_cc,
            age_years,
            declaration_date: input.declaration_date,
            average_vehicle_cost: input.average_vehicle_cost,
            actual_costs: input.actual_costs,
            not_on_approved_list: input.not_on_approved_list,
        })?;
        notes.extend(utilization_notes(&utilization));

        let total = round_money(checked_sum([
            assessment.duty_local,
            assessment.excise,
            assessment.vat,
            clearance_fee,
        ])?);
        let total_with_utilization = round_money(checked_sum([total, utilization.fee])?);

        debug!(
            regime = regime.label(),
            age_bucket = %matched.label,
            %total,
            %total_with_utilization,
            "duty calculated"
        );

        Ok(Breakdown {
            regime,
            fuel,
            age_bucket: matched.label,
            duty_basis: assessment.basis,
            customs_value_local,
            customs_value_rule_currency: customs_value_rule,
            duty_rule_currency: assessment.duty_rule_currency,
            duty_local: assessment.duty_local,
            excise: assessment.excise,
            vat: assessment.vat,
            clearance_fee,
            utilization_fee: utilization.fee,
            total,
            total_with_utilization,
            notes,
        })
    }

    fn match_and_assess(
        &self,
        input: &CalculationInput,
        regime: DutyRegime,
        fuel: FuelKind,
        candidates: &AgeCandidates,
        context: &DutyContext<'_>,
    ) -> Result<MatchedDuty, CalculationError> {
        let mut tried = Vec::with_capacity(candidates.labels.len());

        for label in &candidates.labels {
            tried.push(label.clone());
            let query = RuleQuery {
                segment: input.segment.trim(),
                category: input.category.trim(),
                fuel: fuel.rule_label(),
                age_bucket: label,
                engine_cc: input.engine_cc,
                engine_hp: input.engine_hp,
            };
            let Some(hit) = self.rules.pick(&query) else {
                debug!(age_bucket = %label, "no rule for age bucket");
                continue;
            };

            let assessment = duty::assess(regime, hit.row, context)?;
            return Ok(MatchedDuty {
                label: label.clone(),
                pass: hit.pass,
                assessment,
            });
        }

        Err(CalculationError::NoApplicableRule(RuleMiss {
            regime,
            segment: input.segment.trim().to_string(),
            category: input.category.trim().to_string(),
            fuel: fuel.rule_label().to_string(),
            engine_cc: input.engine_cc,
            engine_hp: input.engine_hp,
            age_bucket: tried
                .last()
                .cloned()
                .unwrap_or_else(|| candidates.preferred().to_string()),
            tried_age_buckets: tried,
        }))
    }
}

fn fallback_note(candidates: &AgeCandidates, used: &str, age_years: f64) -> Option<String> {
    let faithful = AgeCategory::from_label(used)
        .is_some_and(|category| category.satisfies(candidates.ideal));
    if faithful {
        return None;
    }
    Some(format!(
        "age bucket {} is not available in the rule table; used '{}' instead (actual age {:.1} years)",
        candidates.ideal, used, age_years
    ))
}

fn utilization_notes(fee: &UtilizationFee) -> Vec<String> {
    let mut notes = Vec::new();
    if fee.cost_difference_applied {
        if let Some(effective_from) = fee.date_rule {
            notes.push(format!(
                "utilization fee includes the cost-difference term in force since {effective_from}"
            ));
        }
    }
    if fee.multiplier_applied {
        notes.push("utilization fee multiplied for a vehicle not on the approved list".to_string());
    }
    notes
}
