//! Multi-state reciprocity and credit optimization.
//!
//! Each state is first calculated on its own. The optimizer then visits every
//! ordered pair of states `(a, b)` that share an agreement and re-derives
//! `a`'s result:
//!
//! - [`ReciprocityBenefit::Exemption`]: when `a` is a nonresident state and
//!   `b` the resident state, `a` does not tax the income.
//! - [`ReciprocityBenefit::Credit`]: when `a` is the resident state and `b` a
//!   nonresident state, `a` credits the tax `b` levies, up to `a`'s own
//!   liability.
//!
//! Any other residency combination leaves `a` unchanged. The credit always
//! uses the other state's liability before optimization, so the outcome does
//! not depend on visiting order.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::state::StateResult;
use crate::error::TaxError;
use crate::models::ResidencyStatus;
use crate::rates::{ReciprocityBenefit, TaxYearRates};

/// Totals across all states of a return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiStateSummary {
    pub total_state_tax: Decimal,
    pub states_with_tax_due: Vec<String>,
    pub number_of_states: usize,
    /// First state with the largest liability; `None` only without states.
    pub highest_tax_state: Option<String>,
}

impl MultiStateSummary {
    fn new(results: &[StateResult]) -> Self {
        let mut highest: Option<&StateResult> = None;
        for result in results {
            if highest.is_none_or(|h| result.state_tax_liability > h.state_tax_liability) {
                highest = Some(result);
            }
        }

        Self {
            total_state_tax: results.iter().map(|r| r.state_tax_liability).sum(),
            states_with_tax_due: results
                .iter()
                .filter(|r| r.state_tax_liability > Decimal::ZERO)
                .map(|r| r.state.clone())
                .collect(),
            number_of_states: results.len(),
            highest_tax_state: highest.map(|r| r.state.clone()),
        }
    }
}

/// Optimized per-state results in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiStateResult {
    pub individual_states: Vec<StateResult>,
    pub total_state_tax: Decimal,
    /// Whether any agreement changed a state's result.
    pub optimization_applied: bool,
    pub summary: MultiStateSummary,
}

#[derive(Debug, Clone, Copy)]
pub struct ReciprocityOptimizer<'a> {
    rates: &'a TaxYearRates,
}

impl<'a> ReciprocityOptimizer<'a> {
    pub fn new(rates: &'a TaxYearRates) -> Self {
        Self { rates }
    }

    /// Fails with [`TaxError::DuplicateState`] when a state appears twice.
    pub fn ensure_distinct(states: &[&str]) -> Result<(), TaxError> {
        let mut seen = BTreeSet::new();
        for state in states {
            if !seen.insert(*state) {
                return Err(TaxError::DuplicateState((*state).to_string()));
            }
        }
        Ok(())
    }

    pub fn optimize(
        &self,
        results: Vec<StateResult>,
    ) -> Result<MultiStateResult, TaxError> {
        let codes: Vec<&str> = results.iter().map(|r| r.state.as_str()).collect();
        Self::ensure_distinct(&codes)?;

        let mut optimized = results.clone();
        let mut optimization_applied = false;

        for (i, first) in results.iter().enumerate() {
            for (j, second) in results.iter().enumerate() {
                if i == j {
                    continue;
                }
                let Some(agreement) = self.rates.reciprocity_between(&first.state, &second.state)
                else {
                    continue;
                };
                if let Some(updated) = Self::apply(agreement.benefit, &optimized[i], second) {
                    debug!(
                        state = %first.state,
                        other = %second.state,
                        benefit = ?agreement.benefit,
                        liability = %updated.state_tax_liability,
                        "Reciprocity applied"
                    );
                    optimization_applied |= updated != optimized[i];
                    optimized[i] = updated;
                }
            }
        }

        let summary = MultiStateSummary::new(&optimized);
        Ok(MultiStateResult {
            total_state_tax: summary.total_state_tax,
            individual_states: optimized,
            optimization_applied,
            summary,
        })
    }

    /// `current`'s result after the agreement with `other`, or `None` when
    /// the residency combination is not covered.
    fn apply(
        benefit: ReciprocityBenefit,
        current: &StateResult,
        other: &StateResult,
    ) -> Option<StateResult> {
        match benefit {
            ReciprocityBenefit::Exemption
                if current.residency_status == ResidencyStatus::Nonresident
                    && other.residency_status == ResidencyStatus::Resident =>
            {
                Some(current.with_liability(Decimal::ZERO))
            }
            ReciprocityBenefit::Credit
                if current.residency_status == ResidencyStatus::Resident
                    && other.residency_status == ResidencyStatus::Nonresident =>
            {
                let credit = other.state_tax_liability.min(current.state_tax_liability);
                Some(current.with_liability(current.state_tax_liability - credit))
            }
            _ => None,
        }
    }
}
