use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::CalcError;
use super::schedule::RateSchedule;
use super::types::{FilingStatus, UsState};

/// Read-only view of one year's rule data. Calculators only ever see rule
/// data through this trait, so a snapshot can be swapped for a test double.
pub trait RuleData: Send + Sync {
    fn tax_year(&self) -> u32;

    fn federal(&self, year: u32) -> Result<&FederalTaxConfig, CalcError>;

    fn fica(&self, year: u32) -> Result<&FicaConfig, CalcError>;

    fn state(&self, state: UsState, year: u32) -> Result<&StateTaxConfig, CalcError>;

    fn retirement(&self, year: u32) -> Result<&RetirementConfig, CalcError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FederalTaxConfig {
    pub tax_year: u32,
    pub brackets: BTreeMap<FilingStatus, RateSchedule>,
    pub standard_deduction: BTreeMap<FilingStatus, Decimal>,
}

impl FederalTaxConfig {
    pub fn schedule(&self, status: FilingStatus) -> Option<&RateSchedule> {
        self.brackets
            .get(&status)
            .or_else(|| status.federal_fallback().and_then(|f| self.brackets.get(&f)))
    }

    pub fn standard_deduction(&self, status: FilingStatus) -> Option<Decimal> {
        self.standard_deduction
            .get(&status)
            .or_else(|| {
                status
                    .federal_fallback()
                    .and_then(|f| self.standard_deduction.get(&f))
            })
            .copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalMedicareThresholds {
    pub single: Decimal,
    pub married_filing_jointly: Decimal,
    pub married_filing_separately: Decimal,
}

impl AdditionalMedicareThresholds {
    pub fn for_status(&self, status: FilingStatus) -> Decimal {
        match status {
            FilingStatus::MarriedFilingJointly => self.married_filing_jointly,
            FilingStatus::MarriedFilingSeparately => self.married_filing_separately,
            FilingStatus::Single
            | FilingStatus::HeadOfHousehold
            | FilingStatus::QualifyingWidower => self.single,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FicaConfig {
    pub tax_year: u32,
    pub social_security_rate: Decimal,
    pub social_security_wage_base: Decimal,
    pub medicare_rate: Decimal,
    pub additional_medicare_rate: Decimal,
    pub additional_medicare_threshold: AdditionalMedicareThresholds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "taxType", rename_all = "camelCase")]
pub enum StateIncomeTax {
    NoTax,
    Flat {
        rate: Decimal,
    },
    #[serde(rename_all = "camelCase")]
    Progressive {
        schedules: BTreeMap<FilingStatus, RateSchedule>,
        #[serde(default)]
        standard_deduction: BTreeMap<FilingStatus, Decimal>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdiConfig {
    pub rate: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wage_base: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalTaxConfig {
    pub average_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateTaxConfig {
    pub income_tax: StateIncomeTax,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdi: Option<SdiConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_tax: Option<LocalTaxConfig>,
}

impl StateTaxConfig {
    pub fn no_tax() -> Self {
        Self {
            income_tax: StateIncomeTax::NoTax,
            sdi: None,
            local_tax: None,
        }
    }

    pub fn type_label(&self) -> &'static str {
        match self.income_tax {
            StateIncomeTax::NoTax => "none",
            StateIncomeTax::Flat { .. } => "flat",
            StateIncomeTax::Progressive { .. } => "progressive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatesConfig {
    pub tax_year: u32,
    pub states: BTreeMap<UsState, StateTaxConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetirementConfig {
    pub tax_year: u32,
    pub elective_deferral_limit: Decimal,
    pub catch_up_contribution: Decimal,
    pub catch_up_age: u32,
    pub ira_limit: Decimal,
    pub ira_catch_up: Decimal,
    pub hsa_self_limit: Decimal,
    pub hsa_family_limit: Decimal,
}
