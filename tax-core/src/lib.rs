//! Federal, payroll and state tax liability calculations.
//!
//! The crate is a pure calculation core: it takes a validated
//! [`TaxpayerProfile`] plus a [`RateTables`] snapshot and returns immutable
//! result records. It performs no I/O.
//!
//! ```
//! use std::sync::Arc;
//!
//! use rust_decimal_macros::dec;
//! use tax_core::{FilingStatus, RateTables, TaxCalculator, TaxpayerProfile, WageRecord};
//!
//! let calculator = TaxCalculator::new(Arc::new(RateTables::builtin()), 2024).unwrap();
//!
//! let mut profile = TaxpayerProfile::new(FilingStatus::Single);
//! profile.income_sources.w2_forms.push(WageRecord {
//!     wages_tips_compensation: dec!(50000),
//!     federal_income_tax_withheld: dec!(5000),
//!     ..WageRecord::default()
//! });
//!
//! let federal = calculator.calculate_federal(&profile).unwrap();
//! assert_eq!(federal.taxable_income, dec!(35400.00));
//! ```

pub mod calculations;
pub mod error;
pub mod models;
pub mod rates;

pub use calculations::{
    CreditResult, CreditSummary, FederalResult, MultiStateResult, PayrollResult,
    QuarterlyEstimate, ReturnSummary, StateResult, TaxCalculator,
};
pub use error::TaxError;
pub use models::*;
pub use rates::{RateTableError, RateTables, TaxYearRates};
