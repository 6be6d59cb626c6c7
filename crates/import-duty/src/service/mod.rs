mod router;

pub use router::duty_router;

use crate::config::TariffConfig;
use crate::error::AppError;
use crate::tariff::{
    Breakdown, CalculationError, CalculationInput, DutyCalculator, RuleLoadError,
    RuleRepository, RuleTableSummary, TariffSchedule,
};
use std::sync::{Arc, RwLock};
use tracing::info;

/// Builds a calculator from the configured rule table and schedule.
///
/// A missing rule file falls back to the built-in table; a missing or
/// invalid schedule file is an error.
pub fn load_calculator(config: &TariffConfig) -> Result<DutyCalculator, AppError> {
    let rules = RuleRepository::load(&config.rules_path)?;
    let schedule = match &config.schedule_path {
        Some(path) => TariffSchedule::from_path(path)?,
        None => TariffSchedule::default(),
    };
    Ok(DutyCalculator::new(Arc::new(rules), Arc::new(schedule)))
}

/// Shared handle around the current calculator.
///
/// Calculations clone the inner `Arc` and run without holding the lock, so
/// a reload never blocks or alters an in-flight calculation.
pub struct DutyService {
    calculator: RwLock<Arc<DutyCalculator>>,
}

impl DutyService {
    pub fn new(calculator: DutyCalculator) -> Self {
        Self {
            calculator: RwLock::new(Arc::new(calculator)),
        }
    }

    pub fn calculator(&self) -> Arc<DutyCalculator> {
        self.calculator
            .read()
            .expect("calculator lock poisoned")
            .clone()
    }

    pub fn calculate(&self, input: &CalculationInput) -> Result<Breakdown, CalculationError> {
        self.calculator().calculate(input)
    }

    pub fn rules_summary(&self) -> RuleTableSummary {
        self.calculator().rules().summary()
    }

    /// Re-reads the rule source and swaps in a calculator over the new table.
    pub fn reload_rules(&self) -> Result<RuleTableSummary, RuleLoadError> {
        let current = self.calculator();
        let rules = current.rules().reload()?;
        let summary = rules.summary();
        let next = DutyCalculator::new(Arc::new(rules), current.schedule().clone());

        *self.calculator.write().expect("calculator lock poisoned") = Arc::new(next);
        info!(
            source = %summary.source.describe(),
            rows = summary.rows,
            "rule table reloaded"
        );
        Ok(summary)
    }
}
