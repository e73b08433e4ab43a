use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    #[error("no {what} rule data for tax year {year}")]
    DataUnavailable { what: String, year: u32 },
}

impl CalcError {
    pub(crate) fn unavailable(what: impl Into<String>, year: u32) -> Self {
        CalcError::DataUnavailable {
            what: what.into(),
            year,
        }
    }
}
