//! Self-employment tax worksheet.
//!
//! Computes the self-employment tax the federal engine adds to "other taxes".
//!
//! # Worksheet Structure
//!
//! | Line | Description |
//! |------|-------------|
//! | 1    | Net profit from self-employment |
//! | 2    | Line 1 × 92.35% (net earnings factor) |
//! | 3    | Maximum earnings subject to social security tax |
//! | 4    | Smaller of Line 2 or Line 3 |
//! | 5    | Social security tax: Line 4 × 12.4% |
//! | 6    | Medicare tax: Line 2 × 2.9% |
//! | 7    | Self-employment tax: Line 5 + Line 6 |
//!
//! The worksheet does not offset the wage base by W-2 wages, applies no
//! minimum-earnings threshold and does not produce the deductible half of the
//! tax. Values are carried at full precision; the caller rounds.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::calculations::worksheets::{SeWorksheet, SeWorksheetConfig};
//!
//! let config = SeWorksheetConfig {
//!     ss_wage_max: dec!(160200),
//!     ss_tax_rate: dec!(0.124),
//!     medicare_tax_rate: dec!(0.029),
//!     net_earnings_factor: dec!(0.9235),
//! };
//!
//! let result = SeWorksheet::new(config).calculate(dec!(100000));
//!
//! assert_eq!(result.net_earnings, dec!(92350));
//! assert_eq!(result.self_employment_tax, dec!(14129.55));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::rates::PayrollRates;

/// Rates and limits the worksheet reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeWorksheetConfig {
    /// Maximum earnings subject to social security tax (Line 3).
    pub ss_wage_max: Decimal,

    /// Combined employer and employee social security rate (Line 5).
    pub ss_tax_rate: Decimal,

    /// Combined employer and employee Medicare rate (Line 6).
    pub medicare_tax_rate: Decimal,

    /// Share of net profit treated as net earnings (Line 2).
    pub net_earnings_factor: Decimal,
}

impl SeWorksheetConfig {
    /// Reads the self-employment constants out of a year's payroll rates.
    pub fn from_payroll_rates(rates: &PayrollRates) -> Self {
        Self {
            ss_wage_max: rates.social_security_wage_base,
            ss_tax_rate: rates.self_employment_ss_rate,
            medicare_tax_rate: rates.self_employment_medicare_rate,
            net_earnings_factor: rates.net_earnings_factor,
        }
    }
}

/// Line values of one worksheet run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeWorksheetResult {
    /// Line 1.
    pub se_income: Decimal,

    /// Line 2.
    pub net_earnings: Decimal,

    /// Line 4.
    pub ss_taxable_earnings: Decimal,

    /// Line 5.
    pub social_security_tax: Decimal,

    /// Line 6.
    pub medicare_tax: Decimal,

    /// Line 7.
    pub self_employment_tax: Decimal,
}

#[derive(Debug, Clone)]
pub struct SeWorksheet {
    config: SeWorksheetConfig,
}

impl SeWorksheet {
    pub fn new(config: SeWorksheetConfig) -> Self {
        Self { config }
    }

    /// Runs the worksheet. Zero or negative profit yields an all-zero result.
    pub fn calculate(
        &self,
        se_income: Decimal,
    ) -> SeWorksheetResult {
        if se_income <= Decimal::ZERO {
            if se_income < Decimal::ZERO {
                warn!(
                    se_income = %se_income,
                    "Self-employment income is negative; no SE tax due"
                );
            }
            return SeWorksheetResult {
                se_income,
                ..SeWorksheetResult::default()
            };
        }

        // Line 2
        let net_earnings = se_income * self.config.net_earnings_factor;

        // Line 4
        let ss_taxable_earnings = self.ss_taxable_earnings(net_earnings);

        // Line 5
        let social_security_tax = ss_taxable_earnings * self.config.ss_tax_rate;

        // Line 6
        let medicare_tax = net_earnings * self.config.medicare_tax_rate;

        SeWorksheetResult {
            se_income,
            net_earnings,
            ss_taxable_earnings,
            social_security_tax,
            medicare_tax,
            self_employment_tax: social_security_tax + medicare_tax,
        }
    }

    /// Smaller of net earnings or the social security wage maximum.
    fn ss_taxable_earnings(
        &self,
        net_earnings: Decimal,
    ) -> Decimal {
        if net_earnings > self.config.ss_wage_max {
            warn!(
                net_earnings = %net_earnings,
                ss_wage_max = %self.config.ss_wage_max,
                "Net earnings exceed SS wage maximum; excess is subject to Medicare only"
            );
            return self.config.ss_wage_max;
        }
        net_earnings
    }
}
