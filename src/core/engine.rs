use std::thread;

use rust_decimal::Decimal;

use super::config::RuleData;
use super::error::CalcError;
use super::federal::FederalTaxCalculator;
use super::fica::FicaCalculator;
use super::retirement::{RetirementLimits, retirement_limits};
use super::state::StateTaxCalculator;
use super::timeframe::to_all_timeframes;
use super::types::{
    EffectiveRates, ScenarioComparison, TaxCalculationInput, TaxCalculationResult, UsState,
};

const STATE_WORKERS: usize = 8;

/// Gross-to-net pipeline over one rule-data snapshot.
#[derive(Clone, Copy)]
pub struct TaxCalculationEngine<'a> {
    rules: &'a dyn RuleData,
    year: u32,
}

impl<'a> TaxCalculationEngine<'a> {
    pub fn new(rules: &'a dyn RuleData) -> Self {
        Self {
            year: rules.tax_year(),
            rules,
        }
    }

    pub fn for_year(rules: &'a dyn RuleData, year: u32) -> Self {
        Self { rules, year }
    }

    pub fn year(&self) -> u32 {
        self.year
    }

    pub fn calculate(
        &self,
        input: &TaxCalculationInput,
    ) -> Result<TaxCalculationResult, CalcError> {
        let federal_calc = FederalTaxCalculator::new(self.rules);
        let state_calc = StateTaxCalculator::new(self.rules);
        let fica_calc = FicaCalculator::new(self.rules);

        let gross = input.gross_income.max(Decimal::ZERO);
        let status = input.filing_status;

        let total_pre_tax =
            non_negative(input.pre_tax_deductions) + non_negative(input.traditional_401k);

        let federal_standard_deduction = federal_calc.standard_deduction(status, self.year)?;
        let federal_taxable_income =
            (gross - total_pre_tax - federal_standard_deduction).max(Decimal::ZERO);
        let federal = federal_calc.calculate(federal_taxable_income, status, self.year)?;

        // The state applies its own standard deduction.
        let state_taxable_income = (gross - total_pre_tax).max(Decimal::ZERO);
        let state = state_calc.calculate(state_taxable_income, input.state, status, self.year)?;

        let fica = fica_calc.calculate(gross, status, self.year)?;

        let total_post_tax =
            non_negative(input.post_tax_deductions) + non_negative(input.roth_401k);
        let total_taxes = federal.tax + state.total_tax + fica.total;
        let net = gross - total_taxes - total_pre_tax - total_post_tax;

        let (take_home_percentage, effective_rates) = if gross > Decimal::ZERO {
            (
                net / gross * Decimal::ONE_HUNDRED,
                EffectiveRates {
                    federal: federal.tax / gross,
                    state: state.total_tax / gross,
                    fica: fica.total / gross,
                    total: total_taxes / gross,
                },
            )
        } else {
            (Decimal::ZERO, EffectiveRates::default())
        };

        Ok(TaxCalculationResult {
            year: self.year,
            gross_income: gross,
            total_pre_tax,
            federal_taxable_income,
            federal_standard_deduction,
            state_taxable_income,
            federal,
            state,
            fica,
            total_post_tax,
            total_taxes,
            net,
            take_home_percentage,
            effective_rates,
            timeframes: to_all_timeframes(net),
        })
    }

    pub fn compare_scenarios(
        &self,
        base: &TaxCalculationInput,
        scenario: &TaxCalculationInput,
    ) -> Result<ScenarioComparison, CalcError> {
        let base = self.calculate(base)?;
        let scenario = self.calculate(scenario)?;
        let net_difference = scenario.net - base.net;

        Ok(ScenarioComparison {
            monthly_difference: net_difference / Decimal::from(12),
            net_difference,
            base,
            scenario,
        })
    }

    /// Contribution room and account limits from this snapshot's
    /// retirement table.
    pub fn retirement_limits(
        &self,
        contributed: Decimal,
        age: u32,
        family_coverage: bool,
    ) -> Result<RetirementLimits, CalcError> {
        let limits = self.rules.retirement(self.year)?;
        Ok(retirement_limits(limits, contributed, age, family_coverage))
    }

    /// Runs `input` in every jurisdiction, best net first.
    pub fn compare_all_states(
        &self,
        input: &TaxCalculationInput,
    ) -> Result<Vec<TaxCalculationResult>, CalcError> {
        let states = UsState::all();
        let chunk_size = states.len().div_ceil(STATE_WORKERS);

        let chunks: Vec<Result<Vec<TaxCalculationResult>, CalcError>> = thread::scope(|scope| {
            let handles: Vec<_> = states
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|state| {
                                let mut moved = input.clone();
                                moved.state = *state;
                                self.calculate(&moved)
                            })
                            .collect::<Result<Vec<_>, CalcError>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        });

        let mut results = Vec::with_capacity(states.len());
        for chunk in chunks {
            results.extend(chunk?);
        }
        results.sort_by(|a, b| b.net.cmp(&a.net).then(a.state.state.cmp(&b.state.state)));
        Ok(results)
    }
}

fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}
