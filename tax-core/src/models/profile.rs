use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TaxError;
use crate::models::{FilingStatus, ResidencyStatus};

/// Age below which a child qualifies for the child tax credit.
const CHILD_TAX_CREDIT_AGE_LIMIT: u32 = 17;

/// A W-2 wage record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WageRecord {
    /// Box 1.
    pub wages_tips_compensation: Decimal,
    /// Box 2.
    pub federal_income_tax_withheld: Decimal,
    /// Box 3.
    pub social_security_wages: Decimal,
    /// Box 4.
    pub social_security_tax_withheld: Decimal,
    /// Box 5.
    pub medicare_wages: Decimal,
    /// Box 6.
    pub medicare_tax_withheld: Decimal,
    /// Box 17.
    pub state_income_tax_withheld: Decimal,
}

/// A 1099 information return (any variant that reports a single amount).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Form1099Record {
    #[serde(alias = "amount_1")]
    pub amount: Decimal,
    pub federal_income_tax_withheld: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncomeSources {
    pub w2_forms: Vec<WageRecord>,
    #[serde(rename = "1099_forms")]
    pub forms_1099: Vec<Form1099Record>,
    pub other_income: Decimal,
}

/// Above-the-line adjustments to income.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Adjustments {
    pub student_loan_interest: Decimal,
    pub educator_expenses: Decimal,
    pub hsa_deduction: Decimal,
}

impl Adjustments {
    pub fn total(&self) -> Decimal {
        self.student_loan_interest + self.educator_expenses + self.hsa_deduction
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionType {
    #[default]
    Standard,
    Itemized,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    Child,
    Parent,
    Sibling,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dependent {
    pub relationship: Relationship,
    pub age: u32,
}

/// One state a return must be calculated for, as supplied on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateScenarioInput {
    pub state: String,
    #[serde(default)]
    pub residency: ResidencyStatus,
    /// Replacement taxpayer data for this state only (e.g. the income sourced
    /// to a nonresident state).
    #[serde(default)]
    pub income: Option<Box<TaxpayerInput>>,
}

/// Taxpayer data exactly as collaborators hand it over.
///
/// Every field is optional here; [`TaxpayerProfile::try_from`] enforces the
/// required ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxpayerInput {
    pub filing_status: Option<String>,
    pub income_sources: Option<IncomeSources>,
    pub adjustments: Adjustments,
    pub deduction_type: DeductionType,
    pub itemized_deductions: BTreeMap<String, Decimal>,
    pub dependents: Vec<Dependent>,
    pub earned_income: Decimal,
    pub education_expenses: Decimal,
    pub self_employment_income: Decimal,
    pub estimated_payments: Vec<Decimal>,
    pub state: Option<String>,
    pub state_scenarios: Vec<StateScenarioInput>,
}

/// A validated state scenario. The state code is upper-cased but not yet
/// checked against the rate tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateScenario {
    pub state: String,
    pub residency: ResidencyStatus,
    pub income: Option<Box<TaxpayerProfile>>,
}

impl StateScenario {
    pub fn resident(state: &str) -> Self {
        Self {
            state: state.trim().to_ascii_uppercase(),
            residency: ResidencyStatus::Resident,
            income: None,
        }
    }
}

/// A validated taxpayer profile. Immutable for the duration of a calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxpayerProfile {
    pub filing_status: FilingStatus,
    pub income_sources: IncomeSources,
    pub adjustments: Adjustments,
    pub deduction_type: DeductionType,
    pub itemized_deductions: BTreeMap<String, Decimal>,
    pub dependents: Vec<Dependent>,
    pub earned_income: Decimal,
    pub education_expenses: Decimal,
    pub self_employment_income: Decimal,
    pub estimated_payments: Vec<Decimal>,
    pub state_scenarios: Vec<StateScenario>,
}

impl TryFrom<TaxpayerInput> for TaxpayerProfile {
    type Error = TaxError;

    fn try_from(input: TaxpayerInput) -> Result<Self, Self::Error> {
        let raw_status = input
            .filing_status
            .ok_or(TaxError::MissingField("filing_status"))?;
        let filing_status = FilingStatus::parse(raw_status.trim())
            .ok_or(TaxError::UnsupportedFilingStatus(raw_status))?;
        let income_sources = input
            .income_sources
            .ok_or(TaxError::MissingField("income_sources"))?;

        let mut state_scenarios = Vec::with_capacity(input.state_scenarios.len().max(1));
        if input.state_scenarios.is_empty() {
            if let Some(state) = input.state.as_deref() {
                state_scenarios.push(StateScenario::resident(state));
            }
        } else {
            for scenario in input.state_scenarios {
                let income = match scenario.income {
                    Some(income) => Some(Box::new(TaxpayerProfile::try_from(*income)?)),
                    None => None,
                };
                state_scenarios.push(StateScenario {
                    state: scenario.state.trim().to_ascii_uppercase(),
                    residency: scenario.residency,
                    income,
                });
            }
        }

        Ok(Self {
            filing_status,
            income_sources,
            adjustments: input.adjustments,
            deduction_type: input.deduction_type,
            itemized_deductions: input.itemized_deductions,
            dependents: input.dependents,
            earned_income: input.earned_income,
            education_expenses: input.education_expenses,
            self_employment_income: input.self_employment_income,
            estimated_payments: input.estimated_payments,
            state_scenarios,
        })
    }
}

impl TaxpayerProfile {
    /// A profile with the given status and no income, adjustments or credits.
    pub fn new(filing_status: FilingStatus) -> Self {
        Self {
            filing_status,
            income_sources: IncomeSources::default(),
            adjustments: Adjustments::default(),
            deduction_type: DeductionType::Standard,
            itemized_deductions: BTreeMap::new(),
            dependents: Vec::new(),
            earned_income: Decimal::ZERO,
            education_expenses: Decimal::ZERO,
            self_employment_income: Decimal::ZERO,
            estimated_payments: Vec::new(),
            state_scenarios: Vec::new(),
        }
    }

    pub fn total_wages(&self) -> Decimal {
        self.income_sources
            .w2_forms
            .iter()
            .map(|w2| w2.wages_tips_compensation)
            .sum()
    }

    pub fn total_1099_income(&self) -> Decimal {
        self.income_sources.forms_1099.iter().map(|f| f.amount).sum()
    }

    /// Wages, 1099 amounts and other income.
    pub fn total_income(&self) -> Decimal {
        self.total_wages() + self.total_1099_income() + self.income_sources.other_income
    }

    pub fn total_medicare_wages(&self) -> Decimal {
        self.income_sources
            .w2_forms
            .iter()
            .map(|w2| w2.medicare_wages)
            .sum()
    }

    /// Federal income tax withheld across W-2 and 1099 records.
    pub fn federal_withholding(&self) -> Decimal {
        let w2: Decimal = self
            .income_sources
            .w2_forms
            .iter()
            .map(|w2| w2.federal_income_tax_withheld)
            .sum();
        let form_1099: Decimal = self
            .income_sources
            .forms_1099
            .iter()
            .map(|f| f.federal_income_tax_withheld)
            .sum();
        w2 + form_1099
    }

    pub fn total_estimated_payments(&self) -> Decimal {
        self.estimated_payments.iter().copied().sum()
    }

    pub fn state_withholding(&self) -> Decimal {
        self.income_sources
            .w2_forms
            .iter()
            .map(|w2| w2.state_income_tax_withheld)
            .sum()
    }

    /// The itemized total, or `None` when the standard deduction applies
    /// (standard elected, or itemized elected without any line items).
    pub fn itemized_total(&self) -> Option<Decimal> {
        match self.deduction_type {
            DeductionType::Itemized if !self.itemized_deductions.is_empty() => {
                Some(self.itemized_deductions.values().copied().sum())
            }
            _ => None,
        }
    }

    /// Children under 17, the ones that count toward the child tax credit.
    pub fn qualifying_children(&self) -> usize {
        self.dependents
            .iter()
            .filter(|d| d.relationship == Relationship::Child && d.age < CHILD_TAX_CREDIT_AGE_LIMIT)
            .count()
    }

    /// All dependents who are children, regardless of age.
    pub fn children(&self) -> usize {
        self.dependents
            .iter()
            .filter(|d| d.relationship == Relationship::Child)
            .count()
    }
}
