//! Rule data: the year-scoped [`TaxRuleSet`] snapshot and the provider that
//! chooses between the compiled-in bundle, the on-disk cache and the remote
//! endpoint.

mod cache;
pub mod embedded;
mod error;
mod manifest;
mod provider;
mod remote;
mod validate;

use serde::{Deserialize, Serialize};

use crate::core::{
    CalcError, FederalTaxConfig, FicaConfig, RetirementConfig, RuleData, StateTaxConfig,
    StatesConfig, UsState,
};

pub use cache::{CacheMetadata, CacheRead, RuleCache};
pub use error::{CacheError, RefreshError, RemoteError, RuleDataError, ValidationError};
pub use manifest::{TaxDataManifest, sha256_hex};
pub use provider::{
    ActiveRules, DataFreshness, DataTier, ProviderConfig, RefreshOutcome, RuleDataProvider,
};
pub use remote::{HttpRemoteSource, RemoteSource, VersionCheck};
pub use validate::{parse_payload, validate};

/// One complete, immutable year of rule data. Also the wire shape of the
/// remote `GET /tax-data/{year}` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxRuleSet {
    pub version: String,
    pub tax_year: u32,
    pub federal: FederalTaxConfig,
    pub fica: FicaConfig,
    pub states: StatesConfig,
    pub retirement: RetirementConfig,
}

impl TaxRuleSet {
    fn check_year(&self, what: &str, year: u32) -> Result<(), CalcError> {
        if year == self.tax_year {
            Ok(())
        } else {
            Err(CalcError::DataUnavailable {
                what: what.to_string(),
                year,
            })
        }
    }
}

impl RuleData for TaxRuleSet {
    fn tax_year(&self) -> u32 {
        self.tax_year
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
        self.states.states.get(&state).ok_or_else(|| CalcError::DataUnavailable {
            what: format!("state {}", state.code()),
            year,
        })
    }

    fn retirement(&self, year: u32) -> Result<&RetirementConfig, CalcError> {
        self.check_year("retirement", year)?;
        Ok(&self.retirement)
    }
}
