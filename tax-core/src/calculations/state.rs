//! State income tax liability.
//!
//! Every state is one of three calculator shapes, chosen from its
//! [`StateTaxRule`]. Taxed states apply their rate or brackets to federal AGI
//! and compare the result with W-2 state withholding.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::brackets::apply_brackets;
use crate::calculations::common::round_half_up;
use crate::error::TaxError;
use crate::models::{ResidencyStatus, TaxpayerProfile};
use crate::rates::{BracketTable, StateTaxRule, TaxYearRates, state_name};

/// Liability for one state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateResult {
    pub state: String,
    pub state_name: String,
    pub residency_status: ResidencyStatus,
    pub tax_year: i32,
    pub has_income_tax: bool,
    pub state_agi: Decimal,
    pub state_tax_liability: Decimal,
    pub state_withholding: Decimal,
    pub state_refund: Decimal,
    pub state_owe: Decimal,
    /// Flat rate as a percentage. `None` for graduated and untaxed states.
    pub state_tax_rate: Option<Decimal>,
}

impl StateResult {
    /// A copy with a new liability and refund/owe recomputed against the same
    /// withholding.
    pub fn with_liability(
        &self,
        liability: Decimal,
    ) -> Self {
        let liability = round_half_up(liability.max(Decimal::ZERO));
        Self {
            state_tax_liability: liability,
            state_refund: (self.state_withholding - liability).max(Decimal::ZERO),
            state_owe: (liability - self.state_withholding).max(Decimal::ZERO),
            ..self.clone()
        }
    }
}

/// How a state's liability is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateCalculator<'a> {
    NoIncomeTax,
    FlatRate { rate: Decimal },
    Graduated { brackets: &'a BracketTable },
}

impl<'a> StateCalculator<'a> {
    pub fn for_rule(rule: &'a StateTaxRule) -> Self {
        match rule {
            StateTaxRule::NoIncomeTax => Self::NoIncomeTax,
            StateTaxRule::Flat { rate } => Self::FlatRate { rate: *rate },
            StateTaxRule::Graduated { brackets } => Self::Graduated { brackets },
        }
    }

    pub fn has_income_tax(&self) -> bool {
        !matches!(self, Self::NoIncomeTax)
    }

    /// Unrounded tax on `state_agi`.
    pub fn tax_on(
        &self,
        state_agi: Decimal,
    ) -> Decimal {
        match self {
            Self::NoIncomeTax => Decimal::ZERO,
            Self::FlatRate { rate } => state_agi.max(Decimal::ZERO) * *rate,
            Self::Graduated { brackets } => apply_brackets(state_agi, brackets),
        }
    }

    fn rate_percent(&self) -> Option<Decimal> {
        match self {
            Self::FlatRate { rate } => Some(round_half_up(*rate * Decimal::ONE_HUNDRED)),
            Self::NoIncomeTax | Self::Graduated { .. } => None,
        }
    }

    /// Liability for `profile` in `state`, with federal AGI as the state base.
    ///
    /// Residency is recorded on the result; it only changes the outcome once
    /// the reciprocity optimizer compares states.
    pub fn calculate(
        &self,
        state: &str,
        tax_year: i32,
        profile: &TaxpayerProfile,
        residency: ResidencyStatus,
        federal_agi: Decimal,
    ) -> StateResult {
        let mut result = StateResult {
            state: state.to_string(),
            state_name: state_name(state).unwrap_or(state).to_string(),
            residency_status: residency,
            tax_year,
            has_income_tax: self.has_income_tax(),
            state_agi: Decimal::ZERO,
            state_tax_liability: Decimal::ZERO,
            state_withholding: Decimal::ZERO,
            state_refund: Decimal::ZERO,
            state_owe: Decimal::ZERO,
            state_tax_rate: self.rate_percent(),
        };
        if !self.has_income_tax() {
            debug!(state, "State has no income tax");
            return result;
        }

        result.state_agi = round_half_up(federal_agi);
        result.state_withholding = round_half_up(profile.state_withholding());
        let result = result.with_liability(self.tax_on(federal_agi));
        debug!(
            state,
            liability = %result.state_tax_liability,
            withholding = %result.state_withholding,
            "State liability calculated"
        );
        result
    }
}

/// Looks up state rules and runs the matching calculator.
#[derive(Debug, Clone, Copy)]
pub struct StateLiabilityEngine<'a> {
    rates: &'a TaxYearRates,
}

impl<'a> StateLiabilityEngine<'a> {
    pub fn new(rates: &'a TaxYearRates) -> Self {
        Self { rates }
    }

    /// Fails with [`TaxError::UnsupportedState`] when `state` has no rule.
    pub fn calculate(
        &self,
        profile: &TaxpayerProfile,
        state: &str,
        residency: ResidencyStatus,
        federal_agi: Decimal,
    ) -> Result<StateResult, TaxError> {
        let rule = self.rates.state_rule(state)?;
        Ok(StateCalculator::for_rule(rule).calculate(
            state,
            self.rates.tax_year,
            profile,
            residency,
            federal_agi,
        ))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{FilingStatus, WageRecord};
    use crate::rates::{Bracket, RateTables};

    fn rates() -> TaxYearRates {
        RateTables::builtin().year(2024).unwrap().clone()
    }

    fn profile_with_state_withholding(withheld: Decimal) -> TaxpayerProfile {
        let mut profile = TaxpayerProfile::new(FilingStatus::Single);
        profile.income_sources.w2_forms.push(WageRecord {
            wages_tips_compensation: dec!(50000),
            state_income_tax_withheld: withheld,
            ..WageRecord::default()
        });
        profile
    }

    // =========================================================================
    // StateCalculator tests
    // =========================================================================

    #[test]
    fn for_rule_picks_matching_variant() {
        let flat = StateTaxRule::Flat { rate: dec!(0.05) };

        assert_eq!(
            StateCalculator::for_rule(&flat),
            StateCalculator::FlatRate { rate: dec!(0.05) }
        );
        assert_eq!(
            StateCalculator::for_rule(&StateTaxRule::NoIncomeTax),
            StateCalculator::NoIncomeTax
        );
    }

    #[test]
    fn graduated_calculator_applies_brackets() {
        let brackets = BracketTable::new(vec![
            Bracket::new(dec!(0), Some(dec!(10000)), dec!(0.02)),
            Bracket::new(dec!(10000), None, dec!(0.05)),
        ])
        .unwrap();
        let calculator = StateCalculator::Graduated {
            brackets: &brackets,
        };

        assert_eq!(calculator.tax_on(dec!(30000)), dec!(1200.00));
    }

    // =========================================================================
    // StateLiabilityEngine tests
    // =========================================================================

    #[test]
    fn no_income_tax_state_is_all_zero() {
        let rates = rates();
        let engine = StateLiabilityEngine::new(&rates);
        let profile = profile_with_state_withholding(dec!(800));

        let result = engine
            .calculate(&profile, "TX", ResidencyStatus::Resident, dec!(50000))
            .unwrap();

        assert!(!result.has_income_tax);
        assert_eq!(result.state_name, "Texas");
        assert_eq!(result.state_tax_liability, dec!(0));
        assert_eq!(result.state_withholding, dec!(0));
        assert_eq!(result.state_refund, dec!(0));
        assert_eq!(result.state_owe, dec!(0));
        assert_eq!(result.state_tax_rate, None);
    }

    #[test]
    fn flat_rate_state_owes_difference() {
        let rates = rates();
        let engine = StateLiabilityEngine::new(&rates);
        let profile = profile_with_state_withholding(dec!(2000));

        let result = engine
            .calculate(&profile, "IL", ResidencyStatus::Resident, dec!(50000))
            .unwrap();

        assert_eq!(result.state_agi, dec!(50000));
        assert_eq!(result.state_tax_liability, dec!(2475.00));
        assert_eq!(result.state_owe, dec!(475.00));
        assert_eq!(result.state_refund, dec!(0));
        assert_eq!(result.state_tax_rate, Some(dec!(4.95)));
        assert_eq!(result.tax_year, 2024);
    }

    #[test]
    fn flat_rate_state_refunds_excess_withholding() {
        let rates = rates();
        let engine = StateLiabilityEngine::new(&rates);
        let profile = profile_with_state_withholding(dec!(5000));

        let result = engine
            .calculate(&profile, "CA", ResidencyStatus::Resident, dec!(50000))
            .unwrap();

        assert_eq!(result.state_tax_liability, dec!(4000.00));
        assert_eq!(result.state_refund, dec!(1000.00));
        assert_eq!(result.state_owe, dec!(0));
    }

    #[test]
    fn residency_is_recorded_on_result() {
        let rates = rates();
        let engine = StateLiabilityEngine::new(&rates);
        let profile = profile_with_state_withholding(dec!(0));

        let result = engine
            .calculate(&profile, "NY", ResidencyStatus::Nonresident, dec!(50000))
            .unwrap();

        assert_eq!(result.residency_status, ResidencyStatus::Nonresident);
        assert_eq!(result.state_tax_liability, dec!(3250.00));
    }

    #[test]
    fn unknown_state_is_rejected() {
        let rates = rates();
        let engine = StateLiabilityEngine::new(&rates);
        let profile = profile_with_state_withholding(dec!(0));

        let result = engine.calculate(&profile, "ZZ", ResidencyStatus::Resident, dec!(50000));

        assert_eq!(result, Err(TaxError::UnsupportedState("ZZ".to_string())));
    }

    // =========================================================================
    // StateResult tests
    // =========================================================================

    #[test]
    fn with_liability_recomputes_refund_and_owe() {
        let rates = rates();
        let engine = StateLiabilityEngine::new(&rates);
        let profile = profile_with_state_withholding(dec!(1000));
        let result = engine
            .calculate(&profile, "PA", ResidencyStatus::Nonresident, dec!(50000))
            .unwrap();
        assert_eq!(result.state_owe, dec!(535.00));

        let exempted = result.with_liability(Decimal::ZERO);

        assert_eq!(exempted.state_tax_liability, dec!(0));
        assert_eq!(exempted.state_refund, dec!(1000.00));
        assert_eq!(exempted.state_owe, dec!(0));
        assert_eq!(exempted.state_withholding, result.state_withholding);
    }
}
