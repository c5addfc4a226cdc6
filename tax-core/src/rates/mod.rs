//! Tax-year-indexed rate tables.
//!
//! Everything here is plain data. A [`RateTables`] value is validated once
//! when it is built (or deserialized) and is read-only afterwards, so it can
//! be shared between threads behind an `Arc` without locking.
//!
//! The wire form of [`RateTables`] is a mapping keyed by tax year:
//!
//! ```text
//! { "2024": { "tax_year": 2024, "brackets": { "single": [...], ... }, ... } }
//! ```

mod brackets;
mod credits;
mod payroll;
mod states;
mod tax_year_2024;

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use brackets::{Bracket, BracketTable};
pub use credits::{ChildTaxCreditAmounts, EarnedIncomeCreditAmounts, EducationCreditAmounts};
pub use payroll::{EstimatedTaxRules, PayrollRates};
pub use states::{ReciprocityAgreement, ReciprocityBenefit, StateTaxRule, state_name};

use crate::error::TaxError;
use crate::models::{ByFilingStatus, FilingStatus};

/// Violations of the rate-table invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RateTableError {
    #[error("bracket table is empty")]
    EmptyBracketTable,

    #[error("first bracket must start at 0, got {0}")]
    FirstBracketNotZero(Decimal),

    #[error("bracket {index} starts at {lower}, expected {expected}")]
    NonContiguousBracket {
        index: usize,
        lower: Decimal,
        expected: Decimal,
    },

    #[error("bracket {index} upper bound {upper} is not above its lower bound {lower}")]
    EmptyBracket {
        index: usize,
        lower: Decimal,
        upper: Decimal,
    },

    #[error("bracket {0} is unbounded but is not the top bracket")]
    UnboundedBracketBeforeTop(usize),

    #[error("top bracket must be unbounded")]
    BoundedTopBracket,

    #[error("bracket {index} rate {rate} is outside [0, 1]")]
    BracketRateOutOfRange { index: usize, rate: Decimal },

    #[error("bracket {index} rate {rate} is below the previous rate {previous}")]
    DecreasingBracketRate {
        index: usize,
        rate: Decimal,
        previous: Decimal,
    },

    #[error("{name} must be between 0 and 1, got {value}")]
    InvalidRate { name: &'static str, value: Decimal },

    #[error("{name} must be non-negative, got {value}")]
    NegativeAmount { name: &'static str, value: Decimal },

    #[error("{name} must be positive, got {value}")]
    NonPositiveAmount { name: &'static str, value: Decimal },

    #[error("{0} must not be empty")]
    MissingValue(&'static str),

    #[error("invalid rule for state {state}: {reason}")]
    InvalidStateRule { state: String, reason: String },

    #[error("reciprocity agreement {state_a}-{state_b} names a state without a tax rule")]
    UnknownReciprocityState { state_a: String, state_b: String },

    #[error("tables keyed under {key} describe tax year {tax_year}")]
    TaxYearMismatch { key: i32, tax_year: i32 },

    #[error("tax year {0} is defined more than once")]
    DuplicateTaxYear(i32),
}

pub(crate) fn ensure_rate(
    name: &'static str,
    value: Decimal,
) -> Result<(), RateTableError> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(RateTableError::InvalidRate { name, value });
    }
    Ok(())
}

pub(crate) fn ensure_non_negative(
    name: &'static str,
    value: Decimal,
) -> Result<(), RateTableError> {
    if value < Decimal::ZERO {
        return Err(RateTableError::NegativeAmount { name, value });
    }
    Ok(())
}

pub(crate) fn ensure_positive(
    name: &'static str,
    value: Decimal,
) -> Result<(), RateTableError> {
    if value <= Decimal::ZERO {
        return Err(RateTableError::NonPositiveAmount { name, value });
    }
    Ok(())
}

/// Every constant the engines need for one tax year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxYearRates {
    pub tax_year: i32,
    pub brackets: ByFilingStatus<BracketTable>,
    pub standard_deductions: ByFilingStatus<Decimal>,
    pub child_tax_credit: ChildTaxCreditAmounts,
    pub earned_income_credit: EarnedIncomeCreditAmounts,
    pub education_credit: EducationCreditAmounts,
    pub payroll: PayrollRates,
    pub estimated_tax: EstimatedTaxRules,
    /// Keyed by upper-case two-letter code.
    pub states: BTreeMap<String, StateTaxRule>,
    #[serde(default)]
    pub reciprocity: Vec<ReciprocityAgreement>,
}

impl TaxYearRates {
    pub fn bracket_table(
        &self,
        status: FilingStatus,
    ) -> &BracketTable {
        self.brackets.get(status)
    }

    pub fn standard_deduction(
        &self,
        status: FilingStatus,
    ) -> Decimal {
        *self.standard_deductions.get(status)
    }

    pub fn state_rule(
        &self,
        state: &str,
    ) -> Result<&StateTaxRule, TaxError> {
        self.states
            .get(state)
            .ok_or_else(|| TaxError::UnsupportedState(state.to_string()))
    }

    /// The agreement between two states, whichever order they are given in.
    pub fn reciprocity_between(
        &self,
        first: &str,
        second: &str,
    ) -> Option<&ReciprocityAgreement> {
        self.reciprocity.iter().find(|a| a.covers(first, second))
    }

    /// Codes of the states whose rule is [`StateTaxRule::NoIncomeTax`].
    pub fn no_income_tax_states(&self) -> Vec<&str> {
        self.states
            .iter()
            .filter(|(_, rule)| matches!(rule, StateTaxRule::NoIncomeTax))
            .map(|(code, _)| code.as_str())
            .collect()
    }

    pub fn validate(&self) -> Result<(), RateTableError> {
        for (_, table) in self.brackets.iter() {
            table.validate()?;
        }
        for (_, amount) in self.standard_deductions.iter() {
            ensure_non_negative("standard_deductions", *amount)?;
        }
        self.child_tax_credit.validate()?;
        self.earned_income_credit.validate()?;
        self.education_credit.validate()?;
        self.payroll.validate()?;
        self.estimated_tax.validate()?;
        for (state, rule) in &self.states {
            rule.validate(state)?;
        }
        for agreement in &self.reciprocity {
            if !self.states.contains_key(&agreement.state_a)
                || !self.states.contains_key(&agreement.state_b)
            {
                return Err(RateTableError::UnknownReciprocityState {
                    state_a: agreement.state_a.clone(),
                    state_b: agreement.state_b.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Validated rate tables for every loaded tax year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<i32, TaxYearRates>",
    into = "BTreeMap<i32, TaxYearRates>"
)]
pub struct RateTables {
    years: BTreeMap<i32, TaxYearRates>,
}

impl RateTables {
    /// Validates and indexes the given years.
    pub fn new(years: impl IntoIterator<Item = TaxYearRates>) -> Result<Self, RateTableError> {
        let mut indexed = BTreeMap::new();
        for rates in years {
            rates.validate()?;
            let tax_year = rates.tax_year;
            if indexed.insert(tax_year, rates).is_some() {
                return Err(RateTableError::DuplicateTaxYear(tax_year));
            }
        }
        Ok(Self { years: indexed })
    }

    /// Tables shipped with the crate.
    pub fn builtin() -> Self {
        let rates = tax_year_2024::rates();
        Self {
            years: BTreeMap::from([(rates.tax_year, rates)]),
        }
    }

    /// Returns a copy with `rates` added, replacing any table for the same year.
    pub fn with_year(
        &self,
        rates: TaxYearRates,
    ) -> Result<Self, RateTableError> {
        rates.validate()?;
        let mut years = self.years.clone();
        years.insert(rates.tax_year, rates);
        Ok(Self { years })
    }

    /// Tables for `tax_year`. There is no fallback to a neighbouring year.
    pub fn year(
        &self,
        tax_year: i32,
    ) -> Result<&TaxYearRates, TaxError> {
        self.years
            .get(&tax_year)
            .ok_or(TaxError::UnsupportedTaxYear(tax_year))
    }

    pub fn supported_years(&self) -> Vec<i32> {
        self.years.keys().copied().collect()
    }

    pub fn validate(&self) -> Result<(), RateTableError> {
        for (key, rates) in &self.years {
            if *key != rates.tax_year {
                return Err(RateTableError::TaxYearMismatch {
                    key: *key,
                    tax_year: rates.tax_year,
                });
            }
            rates.validate()?;
        }
        Ok(())
    }
}

impl TryFrom<BTreeMap<i32, TaxYearRates>> for RateTables {
    type Error = RateTableError;

    fn try_from(years: BTreeMap<i32, TaxYearRates>) -> Result<Self, Self::Error> {
        let tables = Self { years };
        tables.validate()?;
        Ok(tables)
    }
}

impl From<RateTables> for BTreeMap<i32, TaxYearRates> {
    fn from(tables: RateTables) -> Self {
        tables.years
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // builtin tables
    // =========================================================================

    #[test]
    fn builtin_tables_are_valid() {
        let tables = RateTables::builtin();

        assert_eq!(tables.validate(), Ok(()));
        assert_eq!(tables.supported_years(), vec![2024]);
    }

    #[test]
    fn builtin_2024_standard_deductions() {
        let tables = RateTables::builtin();
        let rates = tables.year(2024).unwrap();

        assert_eq!(rates.standard_deduction(FilingStatus::Single), dec!(14600));
        assert_eq!(
            rates.standard_deduction(FilingStatus::MarriedFilingJointly),
            dec!(29200)
        );
        assert_eq!(
            rates.standard_deduction(FilingStatus::HeadOfHousehold),
            dec!(21900)
        );
    }

    #[test]
    fn builtin_brackets_start_at_zero_and_end_unbounded_for_every_status() {
        let tables = RateTables::builtin();
        let rates = tables.year(2024).unwrap();

        for status in FilingStatus::ALL {
            let brackets = rates.bracket_table(status).brackets();
            assert_eq!(brackets[0].lower, dec!(0), "{status}");
            assert_eq!(brackets.last().unwrap().upper, None, "{status}");
            assert_eq!(brackets.len(), 7, "{status}");
        }
    }

    #[test]
    fn builtin_lists_nine_no_income_tax_states() {
        let tables = RateTables::builtin();
        let rates = tables.year(2024).unwrap();

        assert_eq!(
            rates.no_income_tax_states(),
            vec!["AK", "FL", "NH", "NV", "SD", "TN", "TX", "WA", "WY"]
        );
        assert_eq!(rates.states.len(), 51);
    }

    // =========================================================================
    // lookups
    // =========================================================================

    #[test]
    fn year_fails_closed_for_unloaded_year() {
        let tables = RateTables::builtin();

        assert_eq!(tables.year(2023), Err(TaxError::UnsupportedTaxYear(2023)));
    }

    #[test]
    fn state_rule_rejects_unknown_code() {
        let tables = RateTables::builtin();
        let rates = tables.year(2024).unwrap();

        assert_eq!(
            rates.state_rule("XX"),
            Err(TaxError::UnsupportedState("XX".to_string()))
        );
    }

    #[test]
    fn reciprocity_between_is_order_independent() {
        let tables = RateTables::builtin();
        let rates = tables.year(2024).unwrap();

        let forward = rates.reciprocity_between("PA", "NJ");
        let backward = rates.reciprocity_between("NJ", "PA");

        assert!(forward.is_some());
        assert_eq!(forward, backward);
        assert_eq!(rates.reciprocity_between("CA", "NY"), None);
    }

    // =========================================================================
    // construction
    // =========================================================================

    #[test]
    fn with_year_adds_a_new_year() {
        let tables = RateTables::builtin();
        let mut next = tables.year(2024).unwrap().clone();
        next.tax_year = 2025;

        let extended = tables.with_year(next).unwrap();

        assert_eq!(extended.supported_years(), vec![2024, 2025]);
        assert_eq!(tables.supported_years(), vec![2024]);
    }

    #[test]
    fn new_rejects_duplicate_years() {
        let rates = RateTables::builtin().year(2024).unwrap().clone();

        let result = RateTables::new([rates.clone(), rates]);

        assert_eq!(result, Err(RateTableError::DuplicateTaxYear(2024)));
    }

    #[test]
    fn new_rejects_invalid_payroll_rate() {
        let mut rates = RateTables::builtin().year(2024).unwrap().clone();
        rates.payroll.medicare_rate = dec!(1.45);

        let result = RateTables::new([rates]);

        assert_eq!(
            result,
            Err(RateTableError::InvalidRate {
                name: "payroll.medicare_rate",
                value: dec!(1.45),
            })
        );
    }

    #[test]
    fn new_rejects_agreement_with_unknown_state() {
        let mut rates = RateTables::builtin().year(2024).unwrap().clone();
        rates.reciprocity.push(ReciprocityAgreement::new(
            "PA",
            "ZZ",
            ReciprocityBenefit::Credit,
        ));

        let result = RateTables::new([rates]);

        assert_eq!(
            result,
            Err(RateTableError::UnknownReciprocityState {
                state_a: "PA".to_string(),
                state_b: "ZZ".to_string(),
            })
        );
    }

    #[test]
    fn deserialize_rejects_mismatched_year_key() {
        let rates = RateTables::builtin().year(2024).unwrap().clone();
        let json = serde_json::json!({ "2025": rates });

        let result: Result<RateTables, _> = serde_json::from_value(json);

        let err = result.expect_err("key and tax_year disagree");
        assert!(err.to_string().contains("describe tax year 2024"), "{err}");
    }

    #[test]
    fn serde_round_trip_preserves_tables() {
        let tables = RateTables::builtin();

        let json = serde_json::to_string(&tables).unwrap();
        let parsed: RateTables = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, tables);
    }
}
