//! Entry points for complete and partial return calculations.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, error};

use crate::calculations::federal::{FederalLiabilityEngine, FederalResult};
use crate::calculations::payroll::{PayrollReconciliationEngine, PayrollResult};
use crate::calculations::reciprocity::{MultiStateResult, ReciprocityOptimizer};
use crate::calculations::state::{StateLiabilityEngine, StateResult};
use crate::calculations::summary::{
    QuarterlyEstimate, ReturnSummary, StateQuarterlyEstimate, SummaryAggregator,
};
use crate::error::TaxError;
use crate::models::{ResidencyStatus, StateScenario, TaxpayerInput, TaxpayerProfile};
use crate::rates::{RateTables, ReciprocityAgreement, TaxYearRates};

/// Calculates returns for one tax year against one rate-table snapshot.
///
/// The calculator holds no per-request state. It is `Send + Sync` and can be
/// shared between threads behind an `Arc`.
#[derive(Debug, Clone)]
pub struct TaxCalculator {
    tables: Arc<RateTables>,
    tax_year: i32,
}

impl TaxCalculator {
    /// Binds a calculator to `tax_year`, failing with
    /// [`TaxError::UnsupportedTaxYear`] when the tables do not cover it.
    pub fn new(
        tables: Arc<RateTables>,
        tax_year: i32,
    ) -> Result<Self, TaxError> {
        tables.year(tax_year)?;
        Ok(Self { tables, tax_year })
    }

    pub fn tax_year(&self) -> i32 {
        self.tax_year
    }

    fn rates(&self) -> Result<&TaxYearRates, TaxError> {
        self.tables.year(self.tax_year)
    }

    /// Validates a wire-form input and calculates the complete return.
    pub fn calculate_return_from_input(
        &self,
        input: TaxpayerInput,
    ) -> Result<ReturnSummary, TaxError> {
        let profile = TaxpayerProfile::try_from(input)
            .inspect_err(|err| error!(error = %err, "Invalid taxpayer input"))?;
        self.calculate_return(&profile)
    }

    /// Federal, state, payroll and summary results for a profile with at
    /// least one state scenario.
    pub fn calculate_return(
        &self,
        profile: &TaxpayerProfile,
    ) -> Result<ReturnSummary, TaxError> {
        self.try_calculate_return(profile)
            .inspect_err(|err| error!(error = %err, "Return calculation failed"))
    }

    fn try_calculate_return(
        &self,
        profile: &TaxpayerProfile,
    ) -> Result<ReturnSummary, TaxError> {
        if profile.state_scenarios.is_empty() {
            return Err(TaxError::MissingField("state"));
        }
        let rates = self.rates()?;
        Self::check_scenarios(rates, profile)?;

        let federal = FederalLiabilityEngine::new(rates).calculate(profile);
        let states = self.optimized_states(rates, profile, &federal)?;
        let payroll = PayrollReconciliationEngine::new(&rates.payroll).calculate(profile);

        debug!(
            tax_year = self.tax_year,
            states = states.individual_states.len(),
            "Return calculated"
        );
        Ok(SummaryAggregator::new(rates).aggregate(federal, states.individual_states, payroll))
    }

    pub fn calculate_federal(
        &self,
        profile: &TaxpayerProfile,
    ) -> Result<FederalResult, TaxError> {
        let rates = self.rates()?;
        Ok(FederalLiabilityEngine::new(rates).calculate(profile))
    }

    /// One state's liability, using the profile's own federal AGI.
    pub fn calculate_state(
        &self,
        profile: &TaxpayerProfile,
        state: &str,
        residency: ResidencyStatus,
    ) -> Result<StateResult, TaxError> {
        let state = state.trim().to_ascii_uppercase();
        let rates = self.rates()?;
        rates
            .state_rule(&state)
            .inspect_err(|err| error!(error = %err, "State calculation failed"))?;
        let federal_agi = FederalLiabilityEngine::new(rates).calculate(profile).agi;
        StateLiabilityEngine::new(rates)
            .calculate(profile, &state, residency, federal_agi)
            .inspect_err(|err| error!(error = %err, "State calculation failed"))
    }

    pub fn calculate_payroll(
        &self,
        profile: &TaxpayerProfile,
    ) -> Result<PayrollResult, TaxError> {
        let rates = self.rates()?;
        Ok(PayrollReconciliationEngine::new(&rates.payroll).calculate(profile))
    }

    /// Every state scenario of the profile, after reciprocity optimization.
    pub fn calculate_multistate(
        &self,
        profile: &TaxpayerProfile,
    ) -> Result<MultiStateResult, TaxError> {
        let rates = self.rates()?;
        Self::check_scenarios(rates, profile)
            .inspect_err(|err| error!(error = %err, "Multi-state calculation failed"))?;
        let federal = FederalLiabilityEngine::new(rates).calculate(profile);
        self.optimized_states(rates, profile, &federal)
            .inspect_err(|err| error!(error = %err, "Multi-state calculation failed"))
    }

    pub fn estimate_quarterly_payments(
        &self,
        profile: &TaxpayerProfile,
    ) -> Result<QuarterlyEstimate, TaxError> {
        let rates = self.rates()?;
        let federal = FederalLiabilityEngine::new(rates).calculate(profile);
        Ok(SummaryAggregator::new(rates).quarterly_estimate(&federal))
    }

    pub fn estimate_state_quarterly_payments(
        &self,
        profile: &TaxpayerProfile,
        state: &str,
    ) -> Result<StateQuarterlyEstimate, TaxError> {
        let result = self.calculate_state(profile, state, ResidencyStatus::Resident)?;
        let rates = self.rates()?;
        Ok(SummaryAggregator::new(rates).state_quarterly_estimate(&result))
    }

    /// The agreement between two states, in either order.
    pub fn check_reciprocity(
        &self,
        first: &str,
        second: &str,
    ) -> Result<Option<&ReciprocityAgreement>, TaxError> {
        let first = first.trim().to_ascii_uppercase();
        let second = second.trim().to_ascii_uppercase();
        Ok(self.rates()?.reciprocity_between(&first, &second))
    }

    pub fn no_income_tax_states(&self) -> Result<Vec<&str>, TaxError> {
        Ok(self.rates()?.no_income_tax_states())
    }

    /// Rejects duplicate and unknown state codes before any arithmetic runs.
    fn check_scenarios(
        rates: &TaxYearRates,
        profile: &TaxpayerProfile,
    ) -> Result<(), TaxError> {
        let codes: Vec<&str> = profile
            .state_scenarios
            .iter()
            .map(|scenario| scenario.state.as_str())
            .collect();
        ReciprocityOptimizer::ensure_distinct(&codes)?;
        for code in codes {
            rates.state_rule(code)?;
        }
        Ok(())
    }

    fn optimized_states(
        &self,
        rates: &TaxYearRates,
        profile: &TaxpayerProfile,
        federal: &FederalResult,
    ) -> Result<MultiStateResult, TaxError> {
        let results = profile
            .state_scenarios
            .iter()
            .map(|scenario| self.scenario_result(rates, profile, federal.agi, scenario))
            .collect::<Result<Vec<_>, _>>()?;
        ReciprocityOptimizer::new(rates).optimize(results)
    }

    /// A scenario with its own income is calculated entirely from that
    /// income, including its AGI.
    fn scenario_result(
        &self,
        rates: &TaxYearRates,
        profile: &TaxpayerProfile,
        federal_agi: Decimal,
        scenario: &StateScenario,
    ) -> Result<StateResult, TaxError> {
        let engine = StateLiabilityEngine::new(rates);
        match scenario.income.as_deref() {
            Some(income) => {
                let agi = FederalLiabilityEngine::new(rates).calculate(income).agi;
                engine.calculate(income, &scenario.state, scenario.residency, agi)
            }
            None => engine.calculate(profile, &scenario.state, scenario.residency, federal_agi),
        }
    }
}
