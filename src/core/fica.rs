use rust_decimal::Decimal;

use super::config::RuleData;
use super::error::CalcError;
use super::types::{FicaResult, FilingStatus};

/// Payroll taxes. Always fed gross pay: pre-tax deductions do not reduce
/// the social security or Medicare base here.
#[derive(Clone, Copy)]
pub struct FicaCalculator<'a> {
    rules: &'a dyn RuleData,
}

impl<'a> FicaCalculator<'a> {
    pub fn new(rules: &'a dyn RuleData) -> Self {
        Self { rules }
    }

    pub fn calculate(
        &self,
        gross_income: Decimal,
        status: FilingStatus,
        year: u32,
    ) -> Result<FicaResult, CalcError> {
        let config = self.rules.fica(year)?;
        let gross = gross_income.max(Decimal::ZERO);

        let social_security =
            gross.min(config.social_security_wage_base) * config.social_security_rate;
        let medicare = gross * config.medicare_rate;
        let threshold = config.additional_medicare_threshold.for_status(status);
        let additional_medicare = if gross > threshold {
            (gross - threshold) * config.additional_medicare_rate
        } else {
            Decimal::ZERO
        };

        Ok(FicaResult {
            social_security,
            social_security_wage_base: config.social_security_wage_base,
            medicare,
            additional_medicare,
            additional_medicare_threshold: threshold,
            total: social_security + medicare + additional_medicare,
        })
    }
}
