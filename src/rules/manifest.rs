use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::RuleDataError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxDataManifest {
    pub schema_version: String,
    pub data_version: String,
    pub tax_year: u32,
    pub effective_date: NaiveDate,
    pub expiration_date: NaiveDate,
    /// File name to lowercase hex SHA-256 of its exact bytes.
    pub files: BTreeMap<String, String>,
}

impl TaxDataManifest {
    pub fn is_effective_on(&self, date: NaiveDate) -> bool {
        self.effective_date <= date && date <= self.expiration_date
    }

    pub fn verify(&self, file: &str, content: &[u8]) -> Result<(), RuleDataError> {
        let expected = self
            .files
            .get(file)
            .ok_or_else(|| RuleDataError::MissingChecksum(file.to_string()))?;
        let actual = sha256_hex(content);
        if !expected.eq_ignore_ascii_case(&actual) {
            return Err(RuleDataError::ChecksumMismatch {
                file: file.to_string(),
                expected: expected.clone(),
                actual,
            });
        }
        Ok(())
    }
}

pub fn sha256_hex(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}
