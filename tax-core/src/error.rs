use thiserror::Error;

use crate::rates::RateTableError;

/// Precondition failures. Every variant is raised before any arithmetic runs,
/// so a failed request never yields a partial result.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaxError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("unsupported filing status: {0}")]
    UnsupportedFilingStatus(String),

    #[error("unsupported state: {0}")]
    UnsupportedState(String),

    #[error("no rate tables loaded for tax year {0}")]
    UnsupportedTaxYear(i32),

    #[error("state {0} appears in more than one scenario")]
    DuplicateState(String),

    #[error("invalid rate tables: {0}")]
    InvalidRateTable(#[from] RateTableError),
}
