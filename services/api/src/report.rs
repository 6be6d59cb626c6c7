use crate::infra::{parse_amount, parse_date, parse_rate};
use chrono::{Local, NaiveDate};
use clap::Args;
use import_duty::config::AppConfig;
use import_duty::error::AppError;
use import_duty::service::load_calculator;
use import_duty::tariff::{
    Breakdown, CalculationInput, FxSnapshot, ImporterType, RuleTableSummary, TariffSchedule,
    UsageType, VehicleKind,
};
use rust_decimal::Decimal;

#[derive(Args, Debug)]
pub(crate) struct CalcArgs {
    /// Who clears the vehicle: individual or company
    #[arg(long, default_value = "individual")]
    pub(crate) importer: ImporterType,
    /// Declared usage: personal or commercial
    #[arg(long, default_value = "personal")]
    pub(crate) usage: UsageType,
    /// Vehicle class for the utilization fee: passenger or commercial
    #[arg(long, default_value = "passenger")]
    pub(crate) vehicle_kind: VehicleKind,
    /// Rule table segment
    #[arg(long, default_value = "Легковой")]
    pub(crate) segment: String,
    /// Rule table vehicle category
    #[arg(long, default_value = "M1")]
    pub(crate) category: String,
    /// Fuel or drivetrain, e.g. "бензин", "diesel", "PHEV"
    #[arg(long)]
    pub(crate) fuel: String,
    /// Engine displacement in cm³
    #[arg(long)]
    pub(crate) engine_cc: u32,
    /// Engine power in hp; required for company or commercial imports
    #[arg(long)]
    pub(crate) engine_hp: Option<u32>,
    /// Year of manufacture
    #[arg(long)]
    pub(crate) production_year: i32,
    /// Declaration date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) declaration_date: Option<NaiveDate>,
    /// The importer states the vehicle is older than three years
    #[arg(long)]
    pub(crate) older_than_three: bool,
    /// Customs value in the declared currency
    #[arg(long, value_parser = parse_amount)]
    pub(crate) value: Decimal,
    /// Currency of the customs value
    #[arg(long, default_value = "EUR")]
    pub(crate) currency: String,
    /// Exchange rate into the local currency as CODE=VALUE; repeatable
    #[arg(long = "rate", value_parser = parse_rate)]
    pub(crate) rates: Vec<(String, Decimal)>,
    /// Local currency the rates are quoted in
    #[arg(long, default_value = "RUB")]
    pub(crate) local_currency: String,
    /// Average vehicle cost used by the cost-difference utilization formula
    #[arg(long, value_parser = parse_amount)]
    pub(crate) average_cost: Option<Decimal>,
    /// Actual costs used by the cost-difference utilization formula
    #[arg(long, value_parser = parse_amount)]
    pub(crate) actual_costs: Option<Decimal>,
    /// Vehicle is not on the approved list (raises the utilization fee)
    #[arg(long)]
    pub(crate) not_listed: bool,
    /// Vehicle is adapted for a disabled driver; VAT is not charged
    #[arg(long)]
    pub(crate) vat_exempt: bool,
    /// Print the breakdown as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

impl CalcArgs {
    fn into_input(self, today: NaiveDate) -> (CalculationInput, bool) {
        let fx = self
            .rates
            .into_iter()
            .fold(FxSnapshot::new(self.local_currency), |fx, (code, rate)| {
                fx.with_rate(code, rate)
            });

        let input = CalculationInput {
            importer: self.importer,
            usage: self.usage,
            vehicle_kind: self.vehicle_kind,
            segment: self.segment,
            category: self.category,
            fuel: self.fuel,
            engine_cc: self.engine_cc,
            engine_hp: self.engine_hp,
            production_year: self.production_year,
            declaration_date: self.declaration_date.unwrap_or(today),
            older_than_three: self.older_than_three,
            customs_value: self.value,
            currency: self.currency.trim().to_ascii_uppercase(),
            fx,
            average_vehicle_cost: self.average_cost,
            actual_costs: self.actual_costs,
            not_on_approved_list: self.not_listed,
            vat_exempt: self.vat_exempt,
        };
        (input, self.json)
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct RulesArgs {
    /// Print the summary as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_calc(args: CalcArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let calculator = load_calculator(&config.tariff)?;

    let (input, as_json) = args.into_input(Local::now().date_naive());
    let breakdown = calculator.calculate(&input)?;

    if as_json {
        println!("{}", to_json(&breakdown)?);
    } else {
        println!("{}", render_breakdown(&breakdown, calculator.schedule()));
    }
    Ok(())
}

pub(crate) fn run_rules(args: RulesArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let calculator = load_calculator(&config.tariff)?;
    let summary = calculator.rules().summary();

    if args.json {
        println!("{}", to_json(&summary)?);
    } else {
        println!("{}", render_rules_summary(&summary));
    }
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value)
        .map_err(|err| AppError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err)))
}

pub(crate) fn render_breakdown(breakdown: &Breakdown, schedule: &TariffSchedule) -> String {
    let local = schedule.local_currency.as_str();
    let rule = schedule.rule_currency.as_str();

    let mut lines = vec![
        format!("Regime: {}", breakdown.regime.label()),
        format!(
            "Fuel: {} | age bucket {}",
            breakdown.fuel.rule_label(),
            breakdown.age_bucket
        ),
        format!(
            "Customs value: {:.2} {local} ({:.2} {rule})",
            breakdown.customs_value_local, breakdown.customs_value_rule_currency
        ),
        format!(
            "- Duty: {:.2} {local} ({:.2} {rule}, {})",
            breakdown.duty_local,
            breakdown.duty_rule_currency,
            breakdown.duty_basis.label()
        ),
        format!("- Excise: {:.2} {local}", breakdown.excise),
        format!("- VAT: {:.2} {local}", breakdown.vat),
        format!("- Clearance fee: {:.2} {local}", breakdown.clearance_fee),
        format!("Total: {:.2} {local}", breakdown.total),
        format!("- Utilization fee: {:.2} {local}", breakdown.utilization_fee),
        format!(
            "Total with utilization: {:.2} {local}",
            breakdown.total_with_utilization
        ),
    ];

    if !breakdown.notes.is_empty() {
        lines.push("Notes:".to_string());
        lines.extend(breakdown.notes.iter().map(|note| format!("  - {note}")));
    }

    lines.join("\n")
}

pub(crate) fn render_rules_summary(summary: &RuleTableSummary) -> String {
    let mut lines = vec![
        format!("Rule source: {}", summary.source.describe()),
        format!("- {} rows", summary.rows),
        format!("- Age buckets: {}", summary.age_labels.join(", ")),
    ];

    if summary.built_in {
        lines.push("- Using the built-in fallback table".to_string());
    }

    if summary.overlaps.is_empty() {
        lines.push("- No overlapping brackets".to_string());
    } else {
        lines.push(format!(
            "- {} overlapping bracket pairs (earlier row wins):",
            summary.overlaps.len()
        ));
        for overlap in &summary.overlaps {
            lines.push(format!(
                "  - rows {} and {}: {} / {} / {} / {}",
                overlap.first_row,
                overlap.second_row,
                overlap.segment,
                overlap.category,
                overlap.fuel,
                overlap.age_bucket
            ));
        }
    }

    lines.join("\n")
}
