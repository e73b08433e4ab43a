use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::deduction::PayFrequency;
use super::types::TaxCalculationInput;

/// The pieces that make up annual gross income. Negative components are
/// treated as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IncomeInput {
    pub gross_annual_salary: Decimal,
    pub bonuses: Decimal,
    pub other_income: Decimal,
    pub pay_frequency: PayFrequency,
}

impl IncomeInput {
    pub fn new(gross_annual_salary: Decimal) -> Self {
        Self {
            gross_annual_salary,
            ..Self::default()
        }
    }

    pub fn total_gross(&self) -> Decimal {
        [self.gross_annual_salary, self.bonuses, self.other_income]
            .into_iter()
            .map(|amount| amount.max(Decimal::ZERO))
            .sum()
    }

    /// Gross salary per paycheck; bonuses and other income are not spread
    /// across pay periods.
    pub fn salary_per_paycheck(&self) -> Decimal {
        self.gross_annual_salary.max(Decimal::ZERO)
            / Decimal::from(self.pay_frequency.periods_per_year())
    }

    pub fn apply_to(&self, input: &mut TaxCalculationInput) {
        input.gross_income = self.total_gross();
    }
}
