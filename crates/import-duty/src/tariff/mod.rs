//! Rule-driven customs duty engine for imported vehicles.
//!
//! The engine is synchronous and pure: a [`DutyCalculator`] holds a loaded
//! [`RuleRepository`] and [`TariffSchedule`] behind `Arc`s and turns a
//! [`CalculationInput`] into a [`Breakdown`].

pub mod age;
pub mod calculator;
pub mod clearance;
pub mod domain;
pub mod duty;
pub mod error;
pub mod excise;
pub mod money;
pub mod rules;
pub mod schedule;
pub mod utilization;

pub use calculator::{Breakdown, CalculationInput, DutyCalculator};
pub use domain::{DutyRegime, FuelKind, ImporterType, UsageType, VehicleKind};
pub use error::{CalculationError, RuleMiss};
pub use money::{round_money, FxSnapshot};
pub use rules::{RuleLoadError, RuleRepository, RuleSource, RuleTableSummary};
pub use schedule::{ScheduleError, TariffSchedule};
