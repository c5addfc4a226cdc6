//! Whole-return totals and quarterly estimated payment projections.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::{percent_of, round_half_up};
use crate::calculations::federal::FederalResult;
use crate::calculations::payroll::PayrollResult;
use crate::calculations::state::StateResult;
use crate::rates::TaxYearRates;

const QUARTERS: Decimal = dec!(4);

/// Months of the four estimated payment due dates, all on the 15th of the
/// year after the tax year.
const DUE_MONTHS: [u32; 4] = [1, 4, 6, 9];
const DUE_DAY: u32 = 15;

/// Due dates for estimated payments against `tax_year`.
pub fn quarterly_due_dates(tax_year: i32) -> Vec<NaiveDate> {
    DUE_MONTHS
        .iter()
        .filter_map(|&month| NaiveDate::from_ymd_opt(tax_year + 1, month, DUE_DAY))
        .collect()
}

/// Combined federal and state totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryBlock {
    pub total_tax_liability: Decimal,
    pub total_withholding: Decimal,
    pub total_refund: Decimal,
    pub total_owe: Decimal,
    /// Total liability as a percentage of federal AGI.
    pub effective_tax_rate: Decimal,
}

/// The complete result of one return calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnSummary {
    pub federal: FederalResult,
    #[serde(rename = "state")]
    pub states: Vec<StateResult>,
    pub payroll: PayrollResult,
    pub summary: SummaryBlock,
    pub tax_year: i32,
}

/// Federal safe-harbor projection of next year's estimated payments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterlyEstimate {
    pub estimated_annual_tax: Decimal,
    pub safe_harbor_amount: Decimal,
    pub quarterly_payment: Decimal,
    pub due_dates: Vec<NaiveDate>,
}

/// State projection: the state liability split evenly over four quarters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateQuarterlyEstimate {
    pub state: String,
    pub annual_tax: Decimal,
    pub quarterly_payment: Decimal,
    pub due_dates: Vec<NaiveDate>,
}

#[derive(Debug, Clone, Copy)]
pub struct SummaryAggregator<'a> {
    rates: &'a TaxYearRates,
}

impl<'a> SummaryAggregator<'a> {
    pub fn new(rates: &'a TaxYearRates) -> Self {
        Self { rates }
    }

    /// Combines the stage results. Refunds and amounts owed are summed per
    /// jurisdiction, not netted against each other.
    pub fn aggregate(
        &self,
        federal: FederalResult,
        states: Vec<StateResult>,
        payroll: PayrollResult,
    ) -> ReturnSummary {
        let state_liability: Decimal = states.iter().map(|s| s.state_tax_liability).sum();
        let state_withholding: Decimal = states.iter().map(|s| s.state_withholding).sum();
        let state_refund: Decimal = states.iter().map(|s| s.state_refund).sum();
        let state_owe: Decimal = states.iter().map(|s| s.state_owe).sum();

        let total_tax_liability = federal.total_tax_liability + state_liability;
        let summary = SummaryBlock {
            total_tax_liability: round_half_up(total_tax_liability),
            total_withholding: round_half_up(federal.total_payments + state_withholding),
            total_refund: round_half_up(federal.refund_amount + state_refund),
            total_owe: round_half_up(federal.owe_amount + state_owe),
            effective_tax_rate: round_half_up(percent_of(total_tax_liability, federal.agi)),
        };
        debug!(
            states = states.len(),
            total_tax_liability = %summary.total_tax_liability,
            "Return summarized"
        );

        ReturnSummary {
            federal,
            states,
            payroll,
            summary,
            tax_year: self.rates.tax_year,
        }
    }

    /// Next year's federal payments under the prior-year safe harbor: 110%
    /// of this year's liability above the high-income AGI, 100% otherwise.
    pub fn quarterly_estimate(
        &self,
        federal: &FederalResult,
    ) -> QuarterlyEstimate {
        let rules = &self.rates.estimated_tax;
        let multiplier = if federal.agi > rules.high_income_agi {
            rules.high_income_multiplier
        } else {
            rules.standard_multiplier
        };
        let safe_harbor = federal.total_tax_liability * multiplier;

        QuarterlyEstimate {
            estimated_annual_tax: federal.total_tax_liability,
            safe_harbor_amount: round_half_up(safe_harbor),
            quarterly_payment: round_half_up(safe_harbor / QUARTERS),
            due_dates: quarterly_due_dates(self.rates.tax_year),
        }
    }

    pub fn state_quarterly_estimate(
        &self,
        state: &StateResult,
    ) -> StateQuarterlyEstimate {
        StateQuarterlyEstimate {
            state: state.state.clone(),
            annual_tax: state.state_tax_liability,
            quarterly_payment: round_half_up(state.state_tax_liability / QUARTERS),
            due_dates: quarterly_due_dates(self.rates.tax_year),
        }
    }
}
