//! Built-in constants for tax year 2024.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{
    Bracket, BracketTable, ChildTaxCreditAmounts, EarnedIncomeCreditAmounts,
    EducationCreditAmounts, EstimatedTaxRules, PayrollRates, ReciprocityAgreement,
    ReciprocityBenefit, StateTaxRule, TaxYearRates,
};
use crate::models::ByFilingStatus;

const TAX_YEAR: i32 = 2024;

const RATES: [Decimal; 7] = [
    dec!(0.10),
    dec!(0.12),
    dec!(0.22),
    dec!(0.24),
    dec!(0.32),
    dec!(0.35),
    dec!(0.37),
];

/// Single (Schedule X) bracket starts.
const SINGLE: [Decimal; 7] = [
    dec!(0),
    dec!(11000),
    dec!(44725),
    dec!(95375),
    dec!(197050),
    dec!(250525),
    dec!(609350),
];

/// Married filing jointly and qualifying widow(er) (Schedule Y-1).
const JOINT: [Decimal; 7] = [
    dec!(0),
    dec!(22000),
    dec!(89450),
    dec!(190750),
    dec!(364200),
    dec!(462500),
    dec!(693750),
];

/// Married filing separately (Schedule Y-2).
const SEPARATE: [Decimal; 7] = [
    dec!(0),
    dec!(11000),
    dec!(44725),
    dec!(95375),
    dec!(182050),
    dec!(231250),
    dec!(346875),
];

/// Head of household (Schedule Z).
const HEAD_OF_HOUSEHOLD: [Decimal; 7] = [
    dec!(0),
    dec!(15700),
    dec!(59850),
    dec!(95350),
    dec!(197050),
    dec!(250525),
    dec!(609350),
];

const STATE_FLAT_RATES: [(&str, Decimal); 42] = [
    ("AL", dec!(0.05)),
    ("AZ", dec!(0.045)),
    ("AR", dec!(0.055)),
    ("CA", dec!(0.08)),
    ("CO", dec!(0.0463)),
    ("CT", dec!(0.065)),
    ("DE", dec!(0.055)),
    ("GA", dec!(0.055)),
    ("HI", dec!(0.085)),
    ("ID", dec!(0.058)),
    ("IL", dec!(0.0495)),
    ("IN", dec!(0.032)),
    ("IA", dec!(0.065)),
    ("KS", dec!(0.057)),
    ("KY", dec!(0.05)),
    ("LA", dec!(0.045)),
    ("ME", dec!(0.075)),
    ("MD", dec!(0.055)),
    ("MA", dec!(0.05)),
    ("MI", dec!(0.0425)),
    ("MN", dec!(0.0698)),
    ("MS", dec!(0.05)),
    ("MO", dec!(0.054)),
    ("MT", dec!(0.0675)),
    ("NE", dec!(0.0684)),
    ("NJ", dec!(0.0637)),
    ("NM", dec!(0.049)),
    ("NY", dec!(0.065)),
    ("NC", dec!(0.049)),
    ("ND", dec!(0.0295)),
    ("OH", dec!(0.04)),
    ("OK", dec!(0.05)),
    ("OR", dec!(0.075)),
    ("PA", dec!(0.0307)),
    ("RI", dec!(0.0599)),
    ("SC", dec!(0.07)),
    ("UT", dec!(0.0495)),
    ("VT", dec!(0.066)),
    ("VA", dec!(0.0575)),
    ("WV", dec!(0.065)),
    ("WI", dec!(0.0627)),
    ("DC", dec!(0.06)),
];

const NO_INCOME_TAX_STATES: [&str; 9] = ["AK", "FL", "NV", "NH", "SD", "TN", "TX", "WA", "WY"];

/// Wage-exemption reciprocity pairs.
const RECIPROCITY_PAIRS: [(&str, &str); 30] = [
    ("IL", "IA"),
    ("IL", "KY"),
    ("IL", "MI"),
    ("IL", "WI"),
    ("IN", "KY"),
    ("IN", "MI"),
    ("IN", "OH"),
    ("IN", "PA"),
    ("IN", "WI"),
    ("KY", "MI"),
    ("KY", "OH"),
    ("KY", "VA"),
    ("KY", "WV"),
    ("KY", "WI"),
    ("MD", "DC"),
    ("MD", "PA"),
    ("MD", "VA"),
    ("MD", "WV"),
    ("MI", "MN"),
    ("MI", "OH"),
    ("MI", "WI"),
    ("MN", "ND"),
    ("MT", "ND"),
    ("NJ", "PA"),
    ("OH", "PA"),
    ("OH", "WV"),
    ("PA", "VA"),
    ("PA", "WV"),
    ("VA", "DC"),
    ("VA", "WV"),
];

fn schedule(starts: &[Decimal; 7]) -> BracketTable {
    let brackets = starts
        .iter()
        .zip(RATES)
        .enumerate()
        .map(|(index, (&lower, rate))| Bracket::new(lower, starts.get(index + 1).copied(), rate))
        .collect();
    // The constants above satisfy every bracket invariant; the builtin-table
    // test in `rates` runs the full validation over them.
    BracketTable::from_trusted(brackets)
}

pub(super) fn rates() -> TaxYearRates {
    let joint = schedule(&JOINT);

    let mut states: BTreeMap<String, StateTaxRule> = STATE_FLAT_RATES
        .iter()
        .map(|&(code, rate)| (code.to_string(), StateTaxRule::Flat { rate }))
        .collect();
    for code in NO_INCOME_TAX_STATES {
        states.insert(code.to_string(), StateTaxRule::NoIncomeTax);
    }

    TaxYearRates {
        tax_year: TAX_YEAR,
        brackets: ByFilingStatus {
            single: schedule(&SINGLE),
            married_filing_jointly: joint.clone(),
            married_filing_separately: schedule(&SEPARATE),
            head_of_household: schedule(&HEAD_OF_HOUSEHOLD),
            qualifying_widow: joint,
        },
        standard_deductions: ByFilingStatus {
            single: dec!(14600),
            married_filing_jointly: dec!(29200),
            married_filing_separately: dec!(14600),
            head_of_household: dec!(21900),
            qualifying_widow: dec!(29200),
        },
        child_tax_credit: ChildTaxCreditAmounts {
            per_child: dec!(2000),
            refundable_per_child: dec!(1700),
            phase_out_thresholds: ByFilingStatus {
                single: dec!(200000),
                married_filing_jointly: dec!(400000),
                married_filing_separately: dec!(200000),
                head_of_household: dec!(200000),
                qualifying_widow: dec!(400000),
            },
            phase_out_step: dec!(1000),
            phase_out_reduction: dec!(50),
        },
        earned_income_credit: EarnedIncomeCreditAmounts {
            income_limits: ByFilingStatus::joint_or_other(dec!(60000), dec!(50000)),
            max_credit_by_children: vec![dec!(600), dec!(3800), dec!(6300), dec!(7100)],
            phase_in_threshold: dec!(10000),
            phase_in_rate_with_children: dec!(0.40),
            phase_in_rate_without_children: dec!(0.075),
        },
        education_credit: EducationCreditAmounts {
            full_credit_expenses: dec!(2000),
            partial_credit_expenses: dec!(2000),
            partial_credit_rate: dec!(0.25),
            max_credit: dec!(2500),
            agi_limit: dec!(80000),
        },
        payroll: PayrollRates {
            social_security_rate: dec!(0.062),
            medicare_rate: dec!(0.0145),
            social_security_wage_base: dec!(160200),
            additional_medicare_rate: dec!(0.009),
            additional_medicare_thresholds: ByFilingStatus::joint_or_other(
                dec!(250000),
                dec!(200000),
            ),
            self_employment_ss_rate: dec!(0.124),
            self_employment_medicare_rate: dec!(0.029),
            net_earnings_factor: dec!(0.9235),
        },
        estimated_tax: EstimatedTaxRules {
            high_income_agi: dec!(150000),
            high_income_multiplier: dec!(1.10),
            standard_multiplier: dec!(1.00),
        },
        states,
        reciprocity: RECIPROCITY_PAIRS
            .iter()
            .map(|&(a, b)| ReciprocityAgreement::new(a, b, ReciprocityBenefit::Exemption))
            .collect(),
    }
}
