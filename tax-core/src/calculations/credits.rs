//! Child tax credit, earned income credit and education credit.
//!
//! Each credit is split into a refundable and a nonrefundable portion. The
//! federal engine subtracts the nonrefundable total from income tax (never
//! below zero) and nets the refundable total against payments.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::{round_half_up, round_whole};
use crate::models::TaxpayerProfile;
use crate::rates::TaxYearRates;

/// One credit and its refundable split.
///
/// `refundable + nonrefundable == total`, and neither portion is negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditResult {
    pub total: Decimal,
    pub refundable: Decimal,
    pub nonrefundable: Decimal,
}

impl CreditResult {
    /// Splits `total` so that at most `refundable_cap` is refundable.
    pub fn split(
        total: Decimal,
        refundable_cap: Decimal,
    ) -> Self {
        let total = total.max(Decimal::ZERO);
        let refundable = total.min(refundable_cap.max(Decimal::ZERO));
        Self {
            total,
            refundable,
            nonrefundable: total - refundable,
        }
    }

    pub fn fully_refundable(total: Decimal) -> Self {
        Self::split(total, total)
    }

    pub fn nonrefundable(total: Decimal) -> Self {
        Self::split(total, Decimal::ZERO)
    }

    fn rounded(self) -> Self {
        let total = round_half_up(self.total);
        let refundable = round_half_up(self.refundable);
        Self {
            total,
            refundable,
            nonrefundable: total - refundable,
        }
    }
}

/// All credits for one return.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditSummary {
    pub child_tax_credit: CreditResult,
    pub earned_income_credit: CreditResult,
    pub education_credit: CreditResult,
    pub total_refundable: Decimal,
    pub total_nonrefundable: Decimal,
}

impl CreditSummary {
    fn new(
        child_tax_credit: CreditResult,
        earned_income_credit: CreditResult,
        education_credit: CreditResult,
    ) -> Self {
        let credits = [child_tax_credit, earned_income_credit, education_credit];
        Self {
            child_tax_credit,
            earned_income_credit,
            education_credit,
            total_refundable: credits.iter().map(|c| c.refundable).sum(),
            total_nonrefundable: credits.iter().map(|c| c.nonrefundable).sum(),
        }
    }

    pub fn total(&self) -> Decimal {
        self.total_refundable + self.total_nonrefundable
    }

    /// Every credit rounded to the cent, with totals summed from the rounded
    /// portions.
    pub fn rounded(&self) -> Self {
        Self::new(
            self.child_tax_credit.rounded(),
            self.earned_income_credit.rounded(),
            self.education_credit.rounded(),
        )
    }
}

/// Computes credits from a profile and its AGI.
#[derive(Debug, Clone, Copy)]
pub struct CreditEngine<'a> {
    rates: &'a TaxYearRates,
}

impl<'a> CreditEngine<'a> {
    pub fn new(rates: &'a TaxYearRates) -> Self {
        Self { rates }
    }

    /// Every credit for `profile`, at full precision.
    pub fn calculate(
        &self,
        profile: &TaxpayerProfile,
        agi: Decimal,
    ) -> CreditSummary {
        let summary = CreditSummary::new(
            self.child_tax_credit(profile, agi),
            self.earned_income_credit(profile, agi),
            self.education_credit(profile, agi),
        );
        debug!(
            refundable = %summary.total_refundable,
            nonrefundable = %summary.total_nonrefundable,
            "Credits calculated"
        );
        summary
    }

    /// Child tax credit for children under 17.
    ///
    /// Above the filing-status threshold the credit drops by the per-step
    /// reduction for every step of AGI over the threshold, with the step count
    /// rounded half-up.
    pub fn child_tax_credit(
        &self,
        profile: &TaxpayerProfile,
        agi: Decimal,
    ) -> CreditResult {
        let amounts = &self.rates.child_tax_credit;
        let children = Decimal::from(profile.qualifying_children());
        if children.is_zero() {
            return CreditResult::default();
        }

        let mut credit = children * amounts.per_child;
        let threshold = *amounts.phase_out_thresholds.get(profile.filing_status);
        if agi > threshold {
            let steps = round_whole((agi - threshold) / amounts.phase_out_step);
            let reduction = steps * amounts.phase_out_reduction;
            debug!(
                agi = %agi,
                threshold = %threshold,
                reduction = %reduction,
                "Child tax credit phased out"
            );
            credit = (credit - reduction).max(Decimal::ZERO);
        }

        CreditResult::split(credit, children * amounts.refundable_per_child)
    }

    /// Earned income credit, simplified to a phase-in and an AGI cliff.
    ///
    /// Fully refundable. Zero when no earned income is reported.
    pub fn earned_income_credit(
        &self,
        profile: &TaxpayerProfile,
        agi: Decimal,
    ) -> CreditResult {
        let amounts = &self.rates.earned_income_credit;
        let earned = profile.earned_income;
        if earned <= Decimal::ZERO {
            return CreditResult::default();
        }
        if agi > *amounts.income_limits.get(profile.filing_status) {
            return CreditResult::default();
        }

        let children = profile.children();
        let max_credit = amounts.max_credit(children);
        let credit = if earned < amounts.phase_in_threshold {
            let rate = if children > 0 {
                amounts.phase_in_rate_with_children
            } else {
                amounts.phase_in_rate_without_children
            };
            max_credit.min(earned * rate)
        } else {
            max_credit
        };

        CreditResult::fully_refundable(credit)
    }

    /// Education credit: the first tier of expenses in full, the second tier
    /// at the partial rate, capped. Nonrefundable.
    pub fn education_credit(
        &self,
        profile: &TaxpayerProfile,
        agi: Decimal,
    ) -> CreditResult {
        let amounts = &self.rates.education_credit;
        let expenses = profile.education_expenses;
        if expenses <= Decimal::ZERO || agi > amounts.agi_limit {
            return CreditResult::default();
        }

        let full = expenses.min(amounts.full_credit_expenses);
        let partial = (expenses - amounts.full_credit_expenses)
            .max(Decimal::ZERO)
            .min(amounts.partial_credit_expenses);
        let credit = (full + partial * amounts.partial_credit_rate).min(amounts.max_credit);

        CreditResult::nonrefundable(credit)
    }
}
