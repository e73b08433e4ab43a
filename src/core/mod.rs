mod config;
mod deduction;
mod engine;
mod error;
mod federal;
mod fica;
mod household;
mod income;
mod retirement;
mod schedule;
mod state;
#[cfg(test)]
pub(crate) mod testing;
mod timeframe;
mod types;

pub use config::{
    AdditionalMedicareThresholds, FederalTaxConfig, FicaConfig, LocalTaxConfig, RetirementConfig,
    RuleData, SdiConfig, StateIncomeTax, StateTaxConfig, StatesConfig,
};
pub use deduction::{
    Deduction, DeductionFrequency, DeductionKind, DeductionSummary, PayFrequency,
};
pub use engine::TaxCalculationEngine;
pub use error::CalcError;
pub use federal::FederalTaxCalculator;
pub use fica::FicaCalculator;
pub use household::{
    ExpenseSplit, Household, HouseholdSplit, SharedExpense, SplitMethod, SplitResult, split,
};
pub use income::IncomeInput;
pub use retirement::{
    ContributionRoom, RetirementLimits, contribution_room, hsa_limit, ira_limit, retirement_limits,
};
pub use schedule::{
    BracketAmount, Ceiling, RateSchedule, ScheduleError, ScheduleEvaluation, TaxBracket,
};
pub use state::StateTaxCalculator;
pub use timeframe::{
    Timeframe, TimeframeBreakdown, convert, days_to_earn, hours_to_earn, to_all_timeframes,
    to_all_timeframes_with_schedule,
};
pub use types::{
    EffectiveRates, FederalTaxResult, FicaResult, FilingStatus, ScenarioComparison,
    StateIncomeTaxDetail, StateTaxResult, TaxCalculationInput, TaxCalculationResult, UsState,
};
