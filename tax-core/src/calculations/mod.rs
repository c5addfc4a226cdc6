//! Liability engines and the [`TaxCalculator`] facade that chains them.
//!
//! Each engine borrows one year's [`TaxYearRates`](crate::rates::TaxYearRates)
//! and turns a [`TaxpayerProfile`](crate::models::TaxpayerProfile) into an
//! immutable result record. Engines never fail: every precondition is checked
//! by the calculator or by profile validation before they run.

pub mod brackets;
pub mod calculator;
pub mod common;
pub mod credits;
pub mod federal;
pub mod payroll;
pub mod reciprocity;
pub mod state;
pub mod summary;
pub mod worksheets;

pub use calculator::TaxCalculator;
pub use credits::{CreditEngine, CreditResult, CreditSummary};
pub use federal::{CalculationDetails, FederalLiabilityEngine, FederalResult};
pub use payroll::{PayrollReconciliationEngine, PayrollResult};
pub use reciprocity::{MultiStateResult, MultiStateSummary, ReciprocityOptimizer};
pub use state::{StateCalculator, StateLiabilityEngine, StateResult};
pub use summary::{
    QuarterlyEstimate, ReturnSummary, StateQuarterlyEstimate, SummaryAggregator, SummaryBlock,
};
