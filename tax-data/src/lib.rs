//! Bracket data files for `tax-core` rate tables.
//!
//! Each CSV file lists IRS rate schedules for one or more tax years. Loading
//! turns them into validated [`tax_core::TaxYearRates`] that can be added to a
//! [`tax_core::RateTables`] snapshot.

mod loader;

pub use loader::{TaxBracketLoader, TaxBracketLoaderError, TaxBracketRecord};
