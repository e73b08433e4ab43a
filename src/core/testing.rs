//! Hand-built rule data for calculator tests.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::config::{
    AdditionalMedicareThresholds, FederalTaxConfig, FicaConfig, LocalTaxConfig, RetirementConfig,
    RuleData, SdiConfig, StateIncomeTax, StateTaxConfig,
};
use super::error::CalcError;
use super::schedule::RateSchedule;
use super::types::{FilingStatus, UsState};

pub(crate) const YEAR: u32 = 2024;

pub(crate) struct StubRules {
    pub federal: FederalTaxConfig,
    pub fica: FicaConfig,
    pub states: BTreeMap<UsState, StateTaxConfig>,
    pub retirement: RetirementConfig,
}

impl StubRules {
    pub fn new() -> Self {
        let single = RateSchedule::from_rates(&[
            (dec!(0), dec!(0.10)),
            (dec!(11600), dec!(0.12)),
            (dec!(47150), dec!(0.22)),
            (dec!(100525), dec!(0.24)),
            (dec!(191950), dec!(0.32)),
            (dec!(243725), dec!(0.35)),
            (dec!(609350), dec!(0.37)),
        ])
        .expect("single schedule");
        let joint = RateSchedule::from_rates(&[
            (dec!(0), dec!(0.10)),
            (dec!(23200), dec!(0.12)),
            (dec!(94300), dec!(0.22)),
            (dec!(201050), dec!(0.24)),
            (dec!(383900), dec!(0.32)),
            (dec!(487450), dec!(0.35)),
            (dec!(731200), dec!(0.37)),
        ])
        .expect("joint schedule");

        let california = RateSchedule::from_rates(&[
            (dec!(0), dec!(0.01)),
            (dec!(10412), dec!(0.02)),
            (dec!(24684), dec!(0.04)),
            (dec!(38959), dec!(0.06)),
            (dec!(54081), dec!(0.08)),
            (dec!(68350), dec!(0.093)),
            (dec!(349137), dec!(0.103)),
        ])
        .expect("state schedule");

        let states = BTreeMap::from([
            (UsState::Texas, StateTaxConfig::no_tax()),
            (
                UsState::Pennsylvania,
                StateTaxConfig {
                    income_tax: StateIncomeTax::Flat { rate: dec!(0.0307) },
                    sdi: None,
                    local_tax: None,
                },
            ),
            (
                UsState::California,
                StateTaxConfig {
                    income_tax: StateIncomeTax::Progressive {
                        schedules: BTreeMap::from([(FilingStatus::Single, california)]),
                        standard_deduction: BTreeMap::from([(FilingStatus::Single, dec!(5363))]),
                    },
                    sdi: Some(SdiConfig {
                        rate: dec!(0.011),
                        wage_base: Some(dec!(153164)),
                    }),
                    local_tax: None,
                },
            ),
            (
                UsState::Maryland,
                StateTaxConfig {
                    income_tax: StateIncomeTax::Flat { rate: dec!(0.05) },
                    sdi: Some(SdiConfig {
                        rate: dec!(0.001),
                        wage_base: None,
                    }),
                    local_tax: Some(LocalTaxConfig {
                        average_rate: dec!(0.03),
                    }),
                },
            ),
            (
                UsState::Oregon,
                StateTaxConfig {
                    income_tax: StateIncomeTax::Progressive {
                        schedules: BTreeMap::new(),
                        standard_deduction: BTreeMap::new(),
                    },
                    sdi: None,
                    local_tax: None,
                },
            ),
        ]);

        Self {
            federal: FederalTaxConfig {
                tax_year: YEAR,
                brackets: BTreeMap::from([
                    (FilingStatus::Single, single),
                    (FilingStatus::MarriedFilingJointly, joint),
                ]),
                standard_deduction: BTreeMap::from([
                    (FilingStatus::Single, dec!(14600)),
                    (FilingStatus::MarriedFilingJointly, dec!(29200)),
                    (FilingStatus::HeadOfHousehold, dec!(21900)),
                ]),
            },
            fica: FicaConfig {
                tax_year: YEAR,
                social_security_rate: dec!(0.062),
                social_security_wage_base: dec!(168600),
                medicare_rate: dec!(0.0145),
                additional_medicare_rate: dec!(0.009),
                additional_medicare_threshold: AdditionalMedicareThresholds {
                    single: dec!(200000),
                    married_filing_jointly: dec!(250000),
                    married_filing_separately: dec!(125000),
                },
            },
            states,
            retirement: RetirementConfig {
                tax_year: YEAR,
                elective_deferral_limit: dec!(23000),
                catch_up_contribution: dec!(7500),
                catch_up_age: 50,
                ira_limit: dec!(7000),
                ira_catch_up: dec!(1000),
                hsa_self_limit: dec!(4150),
                hsa_family_limit: dec!(8300),
            },
        }
    }

    fn check_year(&self, what: &str, year: u32) -> Result<(), CalcError> {
        if year == YEAR {
            Ok(())
        } else {
            Err(CalcError::unavailable(what, year))
        }
    }
}

impl RuleData for StubRules {
    fn tax_year(&self) -> u32 {
        YEAR
    }

    fn federal(&self, year: u32) -> Result<&FederalTaxConfig, CalcError> {
        self.check_year("federal", year)?;
        Ok(&self.federal)
    }

    fn fica(&self, year: u32) -> Result<&FicaConfig, CalcError> {
        self.check_year("fica", year)?;
        Ok(&self.fica)
    }

    fn state(&self, state: UsState, year: u32) -> Result<&StateTaxConfig, CalcError> {
        self.check_year(state.code(), year)?;
        self.states
            .get(&state)
            .ok_or_else(|| CalcError::unavailable(state.code(), year))
    }

    fn retirement(&self, year: u32) -> Result<&RetirementConfig, CalcError> {
        self.check_year("retirement", year)?;
        Ok(&self.retirement)
    }
}

pub(crate) fn approx(actual: Decimal, expected: Decimal, tolerance: Decimal) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected} (±{tolerance}), got {actual}"
    );
}
