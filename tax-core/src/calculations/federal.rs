//! Federal income tax liability.
//!
//! The pipeline runs in a fixed order:
//!
//! 1. AGI: total income less above-the-line adjustments, floored at zero.
//! 2. Taxable income: AGI less the itemized or standard deduction, floored at
//!    zero.
//! 3. Income tax from the filing-status bracket table.
//! 4. Nonrefundable credits reduce income tax, never below zero.
//! 5. Other taxes: self-employment tax and additional Medicare tax.
//! 6. Payments (withholding plus estimated payments) and refundable credits
//!    are netted against total tax to give either a refund or an amount owed.
//!
//! Intermediate values keep full precision. Every monetary field of
//! [`FederalResult`] is rounded to the cent when the result is assembled.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::brackets::{apply_brackets, marginal_rate};
use crate::calculations::common::{clamp_at_zero, floor_at_zero, percent_of, round_half_up};
use crate::calculations::credits::{CreditEngine, CreditSummary};
use crate::calculations::worksheets::{SeWorksheet, SeWorksheetConfig};
use crate::models::TaxpayerProfile;
use crate::rates::TaxYearRates;

/// How the deduction was chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationDetails {
    /// `false` when itemized line items were deducted instead.
    pub standard_deduction_used: bool,
    /// The filing-status standard deduction, whether or not it was used.
    pub standard_deduction_amount: Decimal,
    /// The deduction actually subtracted from AGI.
    pub deduction_amount: Decimal,
    pub tax_year: i32,
}

/// Federal liability for one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederalResult {
    pub agi: Decimal,
    pub taxable_income: Decimal,
    pub income_tax_before_credits: Decimal,
    pub total_credits: Decimal,
    pub tax_after_credits: Decimal,
    pub self_employment_tax: Decimal,
    pub additional_medicare_tax: Decimal,
    pub other_taxes: Decimal,
    pub total_tax_liability: Decimal,
    pub total_payments: Decimal,
    pub refund_amount: Decimal,
    pub owe_amount: Decimal,
    /// Total tax as a percentage of AGI.
    pub effective_tax_rate: Decimal,
    /// Rate of the bracket containing taxable income, as a percentage.
    pub marginal_tax_rate: Decimal,
    pub credits_breakdown: CreditSummary,
    pub calculation_details: CalculationDetails,
}

#[derive(Debug, Clone, Copy)]
pub struct FederalLiabilityEngine<'a> {
    rates: &'a TaxYearRates,
}

impl<'a> FederalLiabilityEngine<'a> {
    pub fn new(rates: &'a TaxYearRates) -> Self {
        Self { rates }
    }

    pub fn calculate(
        &self,
        profile: &TaxpayerProfile,
    ) -> FederalResult {
        let status = profile.filing_status;

        let agi = self.adjusted_gross_income(profile);

        let standard_deduction = self.rates.standard_deduction(status);
        let itemized = profile.itemized_total();
        let deduction = itemized.unwrap_or(standard_deduction);
        let taxable_income = clamp_at_zero("taxable_income", agi - deduction);

        let table = self.rates.bracket_table(status);
        let income_tax = apply_brackets(taxable_income, table);
        debug!(
            filing_status = %status,
            agi = %agi,
            taxable_income = %taxable_income,
            income_tax = %income_tax,
            "Income tax calculated"
        );

        let credits = CreditEngine::new(self.rates).calculate(profile, agi);
        let tax_after_credits = (income_tax - credits.total_nonrefundable).max(Decimal::ZERO);

        let self_employment_tax = self.self_employment_tax(profile);
        let additional_medicare_tax = self.additional_medicare_tax(profile);
        let other_taxes = self_employment_tax + additional_medicare_tax;

        let total_tax = tax_after_credits + other_taxes;
        let total_payments = profile.federal_withholding() + profile.total_estimated_payments();

        let refund = (total_payments - total_tax + credits.total_refundable).max(Decimal::ZERO);
        let owe = (total_tax - total_payments - credits.total_refundable).max(Decimal::ZERO);

        let result = FederalResult {
            agi: round_half_up(agi),
            taxable_income: round_half_up(taxable_income),
            income_tax_before_credits: round_half_up(income_tax),
            total_credits: round_half_up(credits.total()),
            tax_after_credits: round_half_up(tax_after_credits),
            self_employment_tax: round_half_up(self_employment_tax),
            additional_medicare_tax: round_half_up(additional_medicare_tax),
            other_taxes: round_half_up(other_taxes),
            total_tax_liability: round_half_up(total_tax),
            total_payments: round_half_up(total_payments),
            refund_amount: round_half_up(refund),
            owe_amount: round_half_up(owe),
            effective_tax_rate: round_half_up(percent_of(total_tax, agi)),
            marginal_tax_rate: round_half_up(
                marginal_rate(taxable_income, table) * Decimal::ONE_HUNDRED,
            ),
            credits_breakdown: credits.rounded(),
            calculation_details: CalculationDetails {
                standard_deduction_used: itemized.is_none(),
                standard_deduction_amount: standard_deduction,
                deduction_amount: round_half_up(deduction),
                tax_year: self.rates.tax_year,
            },
        };

        debug!(
            total_tax = %result.total_tax_liability,
            refund = %result.refund_amount,
            owe = %result.owe_amount,
            "Federal liability calculated"
        );
        result
    }

    /// Total income less adjustments, floored at zero.
    fn adjusted_gross_income(
        &self,
        profile: &TaxpayerProfile,
    ) -> Decimal {
        floor_at_zero("agi", profile.total_income() - profile.adjustments.total())
    }

    fn self_employment_tax(
        &self,
        profile: &TaxpayerProfile,
    ) -> Decimal {
        if profile.self_employment_income <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let config = SeWorksheetConfig::from_payroll_rates(&self.rates.payroll);
        SeWorksheet::new(config)
            .calculate(profile.self_employment_income)
            .self_employment_tax
    }

    /// Additional Medicare tax on W-2 Medicare wages above the
    /// filing-status threshold.
    fn additional_medicare_tax(
        &self,
        profile: &TaxpayerProfile,
    ) -> Decimal {
        let payroll = &self.rates.payroll;
        let threshold = *payroll
            .additional_medicare_thresholds
            .get(profile.filing_status);
        let excess = profile.total_medicare_wages() - threshold;
        if excess <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        excess * payroll.additional_medicare_rate
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{
        DeductionType, Dependent, FilingStatus, Form1099Record, Relationship, WageRecord,
    };
    use crate::rates::RateTables;

    fn rates() -> TaxYearRates {
        RateTables::builtin().year(2024).unwrap().clone()
    }

    fn wage_earner(
        status: FilingStatus,
        wages: Decimal,
        withheld: Decimal,
    ) -> TaxpayerProfile {
        let mut profile = TaxpayerProfile::new(status);
        profile.income_sources.w2_forms.push(WageRecord {
            wages_tips_compensation: wages,
            federal_income_tax_withheld: withheld,
            social_security_wages: wages,
            medicare_wages: wages,
            ..WageRecord::default()
        });
        profile
    }

    // =========================================================================
    // end-to-end tests
    // =========================================================================

    #[test]
    fn single_filer_with_one_w2() {
        let rates = rates();
        let engine = FederalLiabilityEngine::new(&rates);
        let profile = wage_earner(FilingStatus::Single, dec!(50000), dec!(5000));

        let result = engine.calculate(&profile);

        assert_eq!(result.agi, dec!(50000.00));
        assert_eq!(result.taxable_income, dec!(35400.00));
        assert_eq!(result.income_tax_before_credits, dec!(4028.00));
        assert_eq!(result.total_tax_liability, dec!(4028.00));
        assert_eq!(result.total_payments, dec!(5000.00));
        assert_eq!(result.refund_amount, dec!(972.00));
        assert_eq!(result.owe_amount, dec!(0));
        assert_eq!(result.effective_tax_rate, dec!(8.06));
        assert_eq!(result.marginal_tax_rate, dec!(12.00));
        assert!(result.calculation_details.standard_deduction_used);
        assert_eq!(result.calculation_details.deduction_amount, dec!(14600));
    }

    #[test]
    fn income_below_standard_deduction_has_no_tax() {
        let rates = rates();
        let engine = FederalLiabilityEngine::new(&rates);
        let profile = wage_earner(FilingStatus::Single, dec!(12000), dec!(300));

        let result = engine.calculate(&profile);

        assert_eq!(result.taxable_income, dec!(0));
        assert_eq!(result.total_tax_liability, dec!(0));
        assert_eq!(result.refund_amount, dec!(300.00));
    }

    #[test]
    fn zero_income_has_zero_effective_rate() {
        let rates = rates();
        let engine = FederalLiabilityEngine::new(&rates);
        let profile = TaxpayerProfile::new(FilingStatus::Single);

        let result = engine.calculate(&profile);

        assert_eq!(result.agi, dec!(0));
        assert_eq!(result.effective_tax_rate, dec!(0));
        assert_eq!(result.refund_amount, dec!(0));
        assert_eq!(result.owe_amount, dec!(0));
    }

    #[test]
    fn adjustments_larger_than_income_floor_agi_at_zero() {
        let rates = rates();
        let engine = FederalLiabilityEngine::new(&rates);
        let mut profile = wage_earner(FilingStatus::Single, dec!(1000), dec!(0));
        profile.adjustments.student_loan_interest = dec!(2500);

        let result = engine.calculate(&profile);

        assert_eq!(result.agi, dec!(0));
    }

    #[test]
    fn agi_includes_1099_and_other_income_less_adjustments() {
        let rates = rates();
        let engine = FederalLiabilityEngine::new(&rates);
        let mut profile = wage_earner(FilingStatus::Single, dec!(40000), dec!(0));
        profile.income_sources.forms_1099.push(Form1099Record {
            amount: dec!(5000),
            federal_income_tax_withheld: dec!(500),
        });
        profile.income_sources.other_income = dec!(1000);
        profile.adjustments.educator_expenses = dec!(300);
        profile.adjustments.hsa_deduction = dec!(700);

        let result = engine.calculate(&profile);

        assert_eq!(result.agi, dec!(45000.00));
        assert_eq!(result.total_payments, dec!(500.00));
    }

    // =========================================================================
    // deduction tests
    // =========================================================================

    #[test]
    fn itemized_deductions_replace_standard() {
        let rates = rates();
        let engine = FederalLiabilityEngine::new(&rates);
        let mut profile = wage_earner(FilingStatus::Single, dec!(100000), dec!(0));
        profile.deduction_type = DeductionType::Itemized;
        profile.itemized_deductions = BTreeMap::from([
            ("mortgage_interest".to_string(), dec!(15000)),
            ("charitable".to_string(), dec!(5000)),
        ]);

        let result = engine.calculate(&profile);

        assert_eq!(result.taxable_income, dec!(80000.00));
        assert!(!result.calculation_details.standard_deduction_used);
        assert_eq!(result.calculation_details.standard_deduction_amount, dec!(14600));
    }

    #[test]
    fn itemized_without_items_falls_back_to_standard() {
        let rates = rates();
        let engine = FederalLiabilityEngine::new(&rates);
        let mut profile = wage_earner(FilingStatus::HeadOfHousehold, dec!(60000), dec!(0));
        profile.deduction_type = DeductionType::Itemized;

        let result = engine.calculate(&profile);

        assert_eq!(result.taxable_income, dec!(38100.00));
        assert!(result.calculation_details.standard_deduction_used);
    }

    // =========================================================================
    // credit tests
    // =========================================================================

    #[test]
    fn nonrefundable_credits_cannot_push_tax_below_zero() {
        let rates = rates();
        let engine = FederalLiabilityEngine::new(&rates);
        let mut profile = wage_earner(FilingStatus::Single, dec!(16000), dec!(0));
        profile.education_expenses = dec!(4000);

        let result = engine.calculate(&profile);

        // 1,400 taxable × 10% = 140 against a 2,500 nonrefundable credit.
        assert_eq!(result.income_tax_before_credits, dec!(140.00));
        assert_eq!(result.tax_after_credits, dec!(0));
        assert_eq!(result.refund_amount, dec!(0));
        assert_eq!(result.owe_amount, dec!(0));
    }

    #[test]
    fn fractional_credit_is_rounded_only_on_the_result() {
        let rates = rates();
        let engine = FederalLiabilityEngine::new(&rates);
        let mut profile = wage_earner(FilingStatus::Single, dec!(36000), dec!(0));
        profile.education_expenses = dec!(2000.02);

        let result = engine.calculate(&profile);

        // 2,348 tax less a 2,000.005 credit leaves 347.995.
        assert_eq!(result.income_tax_before_credits, dec!(2348.00));
        assert_eq!(result.total_credits, dec!(2000.01));
        assert_eq!(result.credits_breakdown.education_credit.total, dec!(2000.01));
        assert_eq!(result.tax_after_credits, dec!(348.00));
        assert_eq!(result.owe_amount, dec!(348.00));
    }

    #[test]
    fn refundable_credits_add_to_refund() {
        let rates = rates();
        let engine = FederalLiabilityEngine::new(&rates);
        let mut profile = wage_earner(FilingStatus::HeadOfHousehold, dec!(25000), dec!(100));
        profile.earned_income = dec!(25000);
        profile.dependents.push(Dependent {
            relationship: Relationship::Child,
            age: 6,
        });

        let result = engine.calculate(&profile);

        // 3,100 taxable × 10% = 310 tax; CTC 2,000 of which 300 nonrefundable,
        // 1,700 refundable plus 3,800 EIC.
        assert_eq!(result.tax_after_credits, dec!(10.00));
        assert_eq!(result.total_credits, dec!(5800.00));
        assert_eq!(result.refund_amount, dec!(5590.00));
        assert_eq!(result.owe_amount, dec!(0));
    }

    #[test]
    fn high_income_joint_filers_lose_child_tax_credit() {
        let rates = rates();
        let engine = FederalLiabilityEngine::new(&rates);
        let mut profile = wage_earner(FilingStatus::MarriedFilingJointly, dec!(500000), dec!(0));
        profile.dependents = vec![
            Dependent {
                relationship: Relationship::Child,
                age: 3,
            },
            Dependent {
                relationship: Relationship::Child,
                age: 9,
            },
        ];

        let result = engine.calculate(&profile);

        assert_eq!(result.credits_breakdown.child_tax_credit.total, dec!(0));
    }

    // =========================================================================
    // other tax tests
    // =========================================================================

    #[test]
    fn self_employment_tax_is_added_to_other_taxes() {
        let rates = rates();
        let engine = FederalLiabilityEngine::new(&rates);
        let mut profile = TaxpayerProfile::new(FilingStatus::Single);
        profile.self_employment_income = dec!(50000);

        let result = engine.calculate(&profile);

        assert_eq!(result.self_employment_tax, dec!(7064.78));
        assert_eq!(result.other_taxes, dec!(7064.78));
        assert_eq!(result.total_tax_liability, dec!(7064.78));
        assert_eq!(result.owe_amount, dec!(7064.78));
    }

    #[test]
    fn additional_medicare_tax_above_threshold() {
        let rates = rates();
        let engine = FederalLiabilityEngine::new(&rates);
        let profile = wage_earner(FilingStatus::Single, dec!(250000), dec!(0));

        let result = engine.calculate(&profile);

        assert_eq!(result.additional_medicare_tax, dec!(450.00));
    }

    #[test]
    fn additional_medicare_tax_uses_joint_threshold() {
        let rates = rates();
        let engine = FederalLiabilityEngine::new(&rates);
        let profile = wage_earner(FilingStatus::MarriedFilingJointly, dec!(250000), dec!(0));

        let result = engine.calculate(&profile);

        assert_eq!(result.additional_medicare_tax, dec!(0));
    }

    // =========================================================================
    // payment tests
    // =========================================================================

    #[test]
    fn estimated_payments_count_toward_payments() {
        let rates = rates();
        let engine = FederalLiabilityEngine::new(&rates);
        let mut profile = wage_earner(FilingStatus::Single, dec!(50000), dec!(2000));
        profile.estimated_payments = vec![dec!(500), dec!(500)];

        let result = engine.calculate(&profile);

        assert_eq!(result.total_payments, dec!(3000.00));
        assert_eq!(result.owe_amount, dec!(1028.00));
        assert_eq!(result.refund_amount, dec!(0));
    }

    #[test]
    fn refund_and_owe_are_never_both_positive() {
        let rates = rates();
        let engine = FederalLiabilityEngine::new(&rates);

        for withheld in [dec!(0), dec!(4028), dec!(9000)] {
            let profile = wage_earner(FilingStatus::Single, dec!(50000), withheld);

            let result = engine.calculate(&profile);

            assert!(
                result.refund_amount.is_zero() || result.owe_amount.is_zero(),
                "withheld {withheld}"
            );
        }
    }
}
