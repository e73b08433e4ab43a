use rust_decimal::Decimal;

use super::config::{RuleData, StateIncomeTax, StateTaxConfig};
use super::error::CalcError;
use super::types::{FilingStatus, StateIncomeTaxDetail, StateTaxResult, UsState};

#[derive(Clone, Copy)]
pub struct StateTaxCalculator<'a> {
    rules: &'a dyn RuleData,
}

impl<'a> StateTaxCalculator<'a> {
    pub fn new(rules: &'a dyn RuleData) -> Self {
        Self { rules }
    }

    pub fn calculate(
        &self,
        taxable_income: Decimal,
        state: UsState,
        status: FilingStatus,
        year: u32,
    ) -> Result<StateTaxResult, CalcError> {
        let config = self.rules.state(state, year)?;
        let income = taxable_income.max(Decimal::ZERO);

        let (income_tax, detail) = match &config.income_tax {
            StateIncomeTax::NoTax => return Ok(StateTaxResult::zero(state, income)),
            StateIncomeTax::Flat { rate } => {
                (income * *rate, StateIncomeTaxDetail::Flat { rate: *rate })
            }
            StateIncomeTax::Progressive {
                schedules,
                standard_deduction,
            } => {
                let schedule = schedules
                    .get(&status)
                    .or_else(|| schedules.get(&FilingStatus::Single))
                    .ok_or_else(|| {
                        CalcError::unavailable(format!("{} brackets", state.code()), year)
                    })?;
                let deduction = standard_deduction
                    .get(&status)
                    .or_else(|| standard_deduction.get(&FilingStatus::Single))
                    .copied()
                    .unwrap_or(Decimal::ZERO);
                let adjusted_income = (income - deduction).max(Decimal::ZERO);
                let evaluation = schedule.evaluate(adjusted_income);
                (
                    evaluation.tax,
                    StateIncomeTaxDetail::Progressive {
                        standard_deduction: deduction,
                        adjusted_income,
                        marginal_rate: evaluation.marginal_rate,
                        bracket_breakdown: evaluation.breakdown,
                    },
                )
            }
        };

        let sdi = sdi_tax(config, income);
        let local_tax = local_tax(config, income);
        let total_tax = income_tax + sdi + local_tax;
        let effective_rate = if income > Decimal::ZERO {
            total_tax / income
        } else {
            Decimal::ZERO
        };

        Ok(StateTaxResult {
            state,
            taxable_income: income,
            income_tax,
            sdi,
            local_tax,
            total_tax,
            effective_rate,
            detail,
        })
    }
}

fn sdi_tax(config: &StateTaxConfig, income: Decimal) -> Decimal {
    config.sdi.as_ref().map_or(Decimal::ZERO, |sdi| {
        let covered = sdi.wage_base.map_or(income, |cap| income.min(cap));
        covered * sdi.rate
    })
}

// Average-rate approximation, not city-specific.
fn local_tax(config: &StateTaxConfig, income: Decimal) -> Decimal {
    config
        .local_tax
        .as_ref()
        .map_or(Decimal::ZERO, |local| income * local.average_rate)
}
