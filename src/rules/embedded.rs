//! The compiled-in rule bundle. It never expires and is the floor every
//! other tier falls back to.

use serde::de::DeserializeOwned;
use tracing::debug;

use super::TaxRuleSet;
use super::error::RuleDataError;
use super::manifest::TaxDataManifest;
use super::validate::validate;

const MANIFEST_JSON: &str = include_str!("../../data/manifest.json");
const FEDERAL: (&str, &str) = ("federal_2024.json", include_str!("../../data/federal_2024.json"));
const FICA: (&str, &str) = ("fica_2024.json", include_str!("../../data/fica_2024.json"));
const STATES: (&str, &str) = ("states_2024.json", include_str!("../../data/states_2024.json"));
const RETIREMENT: (&str, &str) = (
    "retirement_2024.json",
    include_str!("../../data/retirement_2024.json"),
);

pub fn manifest() -> Result<TaxDataManifest, RuleDataError> {
    parse("manifest.json", MANIFEST_JSON)
}

pub fn load() -> Result<TaxRuleSet, RuleDataError> {
    let manifest = manifest()?;

    let rules = TaxRuleSet {
        version: manifest.data_version.clone(),
        tax_year: manifest.tax_year,
        federal: verified(&manifest, FEDERAL)?,
        fica: verified(&manifest, FICA)?,
        states: verified(&manifest, STATES)?,
        retirement: verified(&manifest, RETIREMENT)?,
    };
    validate(&rules, manifest.tax_year)?;

    debug!(
        version = %rules.version,
        tax_year = rules.tax_year,
        states = rules.states.states.len(),
        "loaded embedded rule data"
    );
    Ok(rules)
}

fn verified<T: DeserializeOwned>(
    manifest: &TaxDataManifest,
    (file, content): (&str, &str),
) -> Result<T, RuleDataError> {
    manifest.verify(file, content.as_bytes())?;
    parse(file, content)
}

fn parse<T: DeserializeOwned>(file: &str, content: &str) -> Result<T, RuleDataError> {
    serde_json::from_str(content).map_err(|source| RuleDataError::Parse {
        file: file.to_string(),
        source,
    })
}
