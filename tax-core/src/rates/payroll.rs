use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{RateTableError, ensure_positive, ensure_rate};
use crate::models::ByFilingStatus;

/// FICA, self-employment and additional Medicare constants for one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollRates {
    /// Employee share of social security tax.
    pub social_security_rate: Decimal,
    /// Employee share of Medicare tax.
    pub medicare_rate: Decimal,
    /// Maximum earnings subject to social security tax.
    pub social_security_wage_base: Decimal,
    pub additional_medicare_rate: Decimal,
    /// Medicare wages above which additional Medicare tax applies.
    pub additional_medicare_thresholds: ByFilingStatus<Decimal>,
    /// Combined employer and employee social security rate.
    pub self_employment_ss_rate: Decimal,
    /// Combined employer and employee Medicare rate.
    pub self_employment_medicare_rate: Decimal,
    /// Share of SE income treated as net earnings (92.35%).
    pub net_earnings_factor: Decimal,
}

impl PayrollRates {
    pub fn validate(&self) -> Result<(), RateTableError> {
        ensure_rate("payroll.social_security_rate", self.social_security_rate)?;
        ensure_rate("payroll.medicare_rate", self.medicare_rate)?;
        ensure_positive(
            "payroll.social_security_wage_base",
            self.social_security_wage_base,
        )?;
        ensure_rate(
            "payroll.additional_medicare_rate",
            self.additional_medicare_rate,
        )?;
        for (_, threshold) in self.additional_medicare_thresholds.iter() {
            ensure_positive("payroll.additional_medicare_thresholds", *threshold)?;
        }
        ensure_rate(
            "payroll.self_employment_ss_rate",
            self.self_employment_ss_rate,
        )?;
        ensure_rate(
            "payroll.self_employment_medicare_rate",
            self.self_employment_medicare_rate,
        )?;
        if self.net_earnings_factor <= Decimal::ZERO || self.net_earnings_factor > Decimal::ONE {
            return Err(RateTableError::InvalidRate {
                name: "payroll.net_earnings_factor",
                value: self.net_earnings_factor,
            });
        }
        Ok(())
    }
}

/// Safe-harbor rules for the quarterly estimate projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimatedTaxRules {
    /// AGI above which the high-income multiplier applies.
    pub high_income_agi: Decimal,
    pub high_income_multiplier: Decimal,
    pub standard_multiplier: Decimal,
}

impl EstimatedTaxRules {
    pub fn validate(&self) -> Result<(), RateTableError> {
        ensure_positive(
            "estimated_tax.high_income_multiplier",
            self.high_income_multiplier,
        )?;
        ensure_positive("estimated_tax.standard_multiplier", self.standard_multiplier)
    }
}
