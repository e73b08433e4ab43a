use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::TaxCalculationInput;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionKind {
    HealthInsurance,
    DentalInsurance,
    VisionInsurance,
    Hsa,
    Fsa,
    Commuter,
    LifeInsurance,
    DisabilityInsurance,
    UnionDues,
    #[serde(rename = "traditional_401k")]
    Traditional401k,
    #[serde(rename = "roth_401k")]
    Roth401k,
    Other,
}

impl DeductionKind {
    pub fn label(self) -> &'static str {
        match self {
            DeductionKind::HealthInsurance => "Health Insurance",
            DeductionKind::DentalInsurance => "Dental Insurance",
            DeductionKind::VisionInsurance => "Vision Insurance",
            DeductionKind::Hsa => "HSA",
            DeductionKind::Fsa => "FSA",
            DeductionKind::Commuter => "Commuter Benefits",
            DeductionKind::LifeInsurance => "Life Insurance",
            DeductionKind::DisabilityInsurance => "Disability Insurance",
            DeductionKind::UnionDues => "Union Dues",
            DeductionKind::Traditional401k => "Traditional 401(k)",
            DeductionKind::Roth401k => "Roth 401(k)",
            DeductionKind::Other => "Other",
        }
    }

    pub fn is_pre_tax_by_default(self) -> bool {
        matches!(
            self,
            DeductionKind::HealthInsurance
                | DeductionKind::DentalInsurance
                | DeductionKind::VisionInsurance
                | DeductionKind::Hsa
                | DeductionKind::Fsa
                | DeductionKind::Commuter
                | DeductionKind::Traditional401k
        )
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayFrequency {
    Weekly,
    #[default]
    BiWeekly,
    SemiMonthly,
    Monthly,
}

impl PayFrequency {
    pub fn periods_per_year(self) -> u32 {
        match self {
            PayFrequency::Weekly => 52,
            PayFrequency::BiWeekly => 26,
            PayFrequency::SemiMonthly => 24,
            PayFrequency::Monthly => 12,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionFrequency {
    PerPaycheck,
    Monthly,
    Annual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deduction {
    pub kind: DeductionKind,
    pub name: String,
    pub amount: Decimal,
    pub frequency: DeductionFrequency,
    pub periods_per_year: u32,
    pub pre_tax: bool,
}

impl Deduction {
    pub fn new(
        kind: DeductionKind,
        amount: Decimal,
        frequency: DeductionFrequency,
        pay: PayFrequency,
    ) -> Self {
        Self {
            kind,
            name: kind.label().to_string(),
            amount,
            frequency,
            periods_per_year: pay.periods_per_year(),
            pre_tax: kind.is_pre_tax_by_default(),
        }
    }

    pub fn annual_amount(&self) -> Decimal {
        match self.frequency {
            DeductionFrequency::PerPaycheck => self.amount * Decimal::from(self.periods_per_year),
            DeductionFrequency::Monthly => self.amount * Decimal::from(12),
            DeductionFrequency::Annual => self.amount,
        }
    }
}

/// Annual totals of a deduction list in the shape the engine consumes.
/// 401(k) contributions are kept apart from the other pre/post-tax items.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeductionSummary {
    pub pre_tax: Decimal,
    pub post_tax: Decimal,
    pub traditional_401k: Decimal,
    pub roth_401k: Decimal,
}

impl DeductionSummary {
    pub fn from_deductions(deductions: &[Deduction]) -> Self {
        deductions.iter().fold(Self::default(), |mut summary, deduction| {
            let annual = deduction.annual_amount();
            match deduction.kind {
                DeductionKind::Traditional401k => summary.traditional_401k += annual,
                DeductionKind::Roth401k => summary.roth_401k += annual,
                _ if deduction.pre_tax => summary.pre_tax += annual,
                _ => summary.post_tax += annual,
            }
            summary
        })
    }

    pub fn total(&self) -> Decimal {
        self.pre_tax + self.post_tax + self.traditional_401k + self.roth_401k
    }

    pub fn apply_to(&self, input: &mut TaxCalculationInput) {
        input.pre_tax_deductions = self.pre_tax;
        input.post_tax_deductions = self.post_tax;
        input.traditional_401k = self.traditional_401k;
        input.roth_401k = self.roth_401k;
    }
}
