use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{RateTableError, ensure_non_negative, ensure_positive, ensure_rate};
use crate::models::ByFilingStatus;

/// Child tax credit constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildTaxCreditAmounts {
    /// Credit per qualifying child before the phase-out.
    pub per_child: Decimal,
    /// Most of the per-child credit that may be refundable.
    pub refundable_per_child: Decimal,
    /// AGI above which the credit phases out.
    pub phase_out_thresholds: ByFilingStatus<Decimal>,
    /// Size of each AGI step above the threshold (the IRS uses $1,000).
    pub phase_out_step: Decimal,
    /// Reduction per step (the IRS uses $50).
    pub phase_out_reduction: Decimal,
}

impl ChildTaxCreditAmounts {
    pub fn validate(&self) -> Result<(), RateTableError> {
        ensure_non_negative("child_tax_credit.per_child", self.per_child)?;
        ensure_non_negative(
            "child_tax_credit.refundable_per_child",
            self.refundable_per_child,
        )?;
        for (_, threshold) in self.phase_out_thresholds.iter() {
            ensure_non_negative("child_tax_credit.phase_out_thresholds", *threshold)?;
        }
        ensure_positive("child_tax_credit.phase_out_step", self.phase_out_step)?;
        ensure_non_negative(
            "child_tax_credit.phase_out_reduction",
            self.phase_out_reduction,
        )
    }
}

/// Earned income credit constants.
///
/// This is the simplified phase-in / cliff model: there is no gradual
/// phase-out above the plateau.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarnedIncomeCreditAmounts {
    /// AGI above which no credit is allowed.
    pub income_limits: ByFilingStatus<Decimal>,
    /// Maximum credit indexed by number of children; the last entry applies to
    /// every larger family.
    pub max_credit_by_children: Vec<Decimal>,
    /// Earned income below which the credit phases in.
    pub phase_in_threshold: Decimal,
    pub phase_in_rate_with_children: Decimal,
    pub phase_in_rate_without_children: Decimal,
}

impl EarnedIncomeCreditAmounts {
    /// Maximum credit for a family with `children` children.
    pub fn max_credit(
        &self,
        children: usize,
    ) -> Decimal {
        let index = children.min(self.max_credit_by_children.len().saturating_sub(1));
        self.max_credit_by_children
            .get(index)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn validate(&self) -> Result<(), RateTableError> {
        for (_, limit) in self.income_limits.iter() {
            ensure_non_negative("earned_income_credit.income_limits", *limit)?;
        }
        if self.max_credit_by_children.is_empty() {
            return Err(RateTableError::MissingValue(
                "earned_income_credit.max_credit_by_children",
            ));
        }
        for credit in &self.max_credit_by_children {
            ensure_non_negative("earned_income_credit.max_credit_by_children", *credit)?;
        }
        ensure_non_negative(
            "earned_income_credit.phase_in_threshold",
            self.phase_in_threshold,
        )?;
        ensure_rate(
            "earned_income_credit.phase_in_rate_with_children",
            self.phase_in_rate_with_children,
        )?;
        ensure_rate(
            "earned_income_credit.phase_in_rate_without_children",
            self.phase_in_rate_without_children,
        )
    }
}

/// Education credit constants (American Opportunity style tiers).
///
/// Only a single AGI limit exists; there is no separate married threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationCreditAmounts {
    /// Expenses credited at 100%.
    pub full_credit_expenses: Decimal,
    /// Expenses above the first tier credited at `partial_credit_rate`.
    pub partial_credit_expenses: Decimal,
    pub partial_credit_rate: Decimal,
    pub max_credit: Decimal,
    /// AGI above which no credit is allowed.
    pub agi_limit: Decimal,
}

impl EducationCreditAmounts {
    pub fn validate(&self) -> Result<(), RateTableError> {
        ensure_non_negative(
            "education_credit.full_credit_expenses",
            self.full_credit_expenses,
        )?;
        ensure_non_negative(
            "education_credit.partial_credit_expenses",
            self.partial_credit_expenses,
        )?;
        ensure_rate(
            "education_credit.partial_credit_rate",
            self.partial_credit_rate,
        )?;
        ensure_non_negative("education_credit.max_credit", self.max_credit)?;
        ensure_non_negative("education_credit.agi_limit", self.agi_limit)
    }
}
