//! Reconciles W-2 payroll withholding against the statutory employee share.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::round_half_up;
use crate::models::TaxpayerProfile;
use crate::rates::PayrollRates;

/// Statutory social security and Medicare tax compared with what employers
/// withheld. Positive differences mean too little was withheld.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollResult {
    pub social_security_wages: Decimal,
    pub medicare_wages: Decimal,
    pub social_security_tax_withheld: Decimal,
    pub medicare_tax_withheld: Decimal,
    pub correct_social_security_tax: Decimal,
    pub correct_medicare_tax: Decimal,
    pub social_security_difference: Decimal,
    pub medicare_difference: Decimal,
    pub total_payroll_tax_difference: Decimal,
}

#[derive(Debug, Clone, Copy)]
pub struct PayrollReconciliationEngine<'a> {
    rates: &'a PayrollRates,
}

impl<'a> PayrollReconciliationEngine<'a> {
    pub fn new(rates: &'a PayrollRates) -> Self {
        Self { rates }
    }

    /// Totals every W-2 and compares withholding with the statutory amount.
    ///
    /// Social security wages are capped at the wage base before the rate is
    /// applied; Medicare wages are not capped. Each difference is rounded
    /// once from the exact amounts, and the total is the sum of the rounded
    /// differences.
    pub fn calculate(
        &self,
        profile: &TaxpayerProfile,
    ) -> PayrollResult {
        let w2_forms = &profile.income_sources.w2_forms;
        let ss_wages: Decimal = w2_forms.iter().map(|w2| w2.social_security_wages).sum();
        let medicare_wages: Decimal = w2_forms.iter().map(|w2| w2.medicare_wages).sum();
        let ss_withheld: Decimal = w2_forms
            .iter()
            .map(|w2| w2.social_security_tax_withheld)
            .sum();
        let medicare_withheld: Decimal = w2_forms.iter().map(|w2| w2.medicare_tax_withheld).sum();

        let ss_taxable = self.capped_social_security_wages(ss_wages);
        let correct_ss = ss_taxable * self.rates.social_security_rate;
        let correct_medicare = medicare_wages * self.rates.medicare_rate;

        let ss_difference = round_half_up(correct_ss - ss_withheld);
        let medicare_difference = round_half_up(correct_medicare - medicare_withheld);

        debug!(
            w2_count = w2_forms.len(),
            ss_difference = %ss_difference,
            medicare_difference = %medicare_difference,
            "Payroll reconciled"
        );

        PayrollResult {
            social_security_wages: round_half_up(ss_wages),
            medicare_wages: round_half_up(medicare_wages),
            social_security_tax_withheld: round_half_up(ss_withheld),
            medicare_tax_withheld: round_half_up(medicare_withheld),
            correct_social_security_tax: round_half_up(correct_ss),
            correct_medicare_tax: round_half_up(correct_medicare),
            social_security_difference: ss_difference,
            medicare_difference,
            total_payroll_tax_difference: ss_difference + medicare_difference,
        }
    }

    fn capped_social_security_wages(
        &self,
        ss_wages: Decimal,
    ) -> Decimal {
        let wage_base = self.rates.social_security_wage_base;
        if ss_wages > wage_base {
            debug!(
                ss_wages = %ss_wages,
                wage_base = %wage_base,
                "Social security wages exceed the wage base; excess is not taxed"
            );
            return wage_base;
        }
        ss_wages
    }
}
