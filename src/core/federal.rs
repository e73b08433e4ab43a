use rust_decimal::Decimal;

use super::config::RuleData;
use super::error::CalcError;
use super::types::{FederalTaxResult, FilingStatus};

#[derive(Clone, Copy)]
pub struct FederalTaxCalculator<'a> {
    rules: &'a dyn RuleData,
}

impl<'a> FederalTaxCalculator<'a> {
    pub fn new(rules: &'a dyn RuleData) -> Self {
        Self { rules }
    }

    pub fn standard_deduction(
        &self,
        status: FilingStatus,
        year: u32,
    ) -> Result<Decimal, CalcError> {
        self.rules
            .federal(year)?
            .standard_deduction(status)
            .ok_or_else(|| federal_unavailable("standard deduction", status, year))
    }

    pub fn calculate(
        &self,
        taxable_income: Decimal,
        status: FilingStatus,
        year: u32,
    ) -> Result<FederalTaxResult, CalcError> {
        let schedule = self
            .rules
            .federal(year)?
            .schedule(status)
            .ok_or_else(|| federal_unavailable("brackets", status, year))?;
        let taxable_income = taxable_income.max(Decimal::ZERO);
        let evaluation = schedule.evaluate(taxable_income);

        Ok(FederalTaxResult {
            taxable_income,
            tax: evaluation.tax,
            marginal_rate: evaluation.marginal_rate,
            effective_rate: evaluation.effective_rate,
            bracket_breakdown: evaluation.breakdown,
        })
    }
}

fn federal_unavailable(what: &str, status: FilingStatus, year: u32) -> CalcError {
    CalcError::unavailable(format!("federal {what} ({})", status.as_str()), year)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{StubRules, YEAR};
    use rust_decimal_macros::dec;

    #[test]
    fn single_filer_at_one_hundred_thousand() {
        let rules = StubRules::new();
        let result = FederalTaxCalculator::new(&rules)
            .calculate(dec!(100000), FilingStatus::Single, YEAR)
            .expect("federal tax");
        assert_eq!(result.tax, dec!(17053.00));
        assert_eq!(result.marginal_rate, dec!(0.22));
        assert_eq!(result.effective_rate, dec!(0.17053));
        let summed: Decimal = result.bracket_breakdown.iter().map(|b| b.tax).sum();
        assert_eq!(summed, result.tax);
    }

    #[test]
    fn joint_filers_use_their_own_schedule() {
        let rules = StubRules::new();
        let result = FederalTaxCalculator::new(&rules)
            .calculate(dec!(100000), FilingStatus::MarriedFilingJointly, YEAR)
            .expect("federal tax");
        assert_eq!(result.tax, dec!(2320) + dec!(8532) + dec!(5700) * dec!(0.22));
        assert_eq!(result.marginal_rate, dec!(0.22));
    }

    #[test]
    fn negative_taxable_income_is_clamped() {
        let rules = StubRules::new();
        let result = FederalTaxCalculator::new(&rules)
            .calculate(dec!(-500), FilingStatus::Single, YEAR)
            .expect("federal tax");
        assert_eq!(result.taxable_income, Decimal::ZERO);
        assert_eq!(result.tax, Decimal::ZERO);
        assert_eq!(result.marginal_rate, dec!(0.10));
        assert!(result.bracket_breakdown.is_empty());
    }

    #[test]
    fn missing_year_is_data_unavailable() {
        let rules = StubRules::new();
        let err = FederalTaxCalculator::new(&rules)
            .calculate(dec!(50000), FilingStatus::Single, 2031)
            .expect_err("no 2031 data");
        assert!(matches!(err, CalcError::DataUnavailable { year: 2031, .. }));
    }

    #[test]
    fn standard_deduction_falls_back_to_single() {
        let rules = StubRules::new();
        let calculator = FederalTaxCalculator::new(&rules);
        assert_eq!(
            calculator.standard_deduction(FilingStatus::HeadOfHousehold, YEAR),
            Ok(dec!(21900))
        );
        assert_eq!(
            calculator.standard_deduction(FilingStatus::MarriedFilingSeparately, YEAR),
            Ok(dec!(14600))
        );
        assert_eq!(
            calculator.standard_deduction(FilingStatus::QualifyingWidower, YEAR),
            Ok(dec!(29200))
        );
    }
}
