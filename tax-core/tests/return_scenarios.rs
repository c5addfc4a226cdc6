//! End-to-end return calculations from wire-form taxpayer input.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use tax_core::{RateTables, ReturnSummary, TaxCalculator, TaxError, TaxpayerInput};

fn calculator() -> TaxCalculator {
    TaxCalculator::new(Arc::new(RateTables::builtin()), 2024).expect("2024 is built in")
}

fn calculate(input: serde_json::Value) -> Result<ReturnSummary, TaxError> {
    let input: TaxpayerInput = serde_json::from_value(input).expect("valid input JSON");
    calculator().calculate_return_from_input(input)
}

fn assert_refund_or_owe(
    refund: Decimal,
    owe: Decimal,
) {
    assert!(refund >= Decimal::ZERO && owe >= Decimal::ZERO);
    assert!(
        refund == Decimal::ZERO || owe == Decimal::ZERO,
        "refund {refund} and owe {owe} are both positive"
    );
}

#[test]
fn single_w2_filer_in_no_income_tax_state() {
    let summary = calculate(json!({
        "filing_status": "single",
        "income_sources": {
            "w2_forms": [{
                "wages_tips_compensation": "50000",
                "federal_income_tax_withheld": "5000"
            }]
        },
        "state": "TX"
    }))
    .unwrap();

    assert_eq!(summary.federal.agi, dec!(50000.00));
    assert_eq!(summary.federal.taxable_income, dec!(35400.00));
    assert_eq!(summary.federal.income_tax_before_credits, dec!(4028.00));
    assert_eq!(summary.federal.refund_amount, dec!(972.00));
    assert_eq!(summary.federal.owe_amount, dec!(0));

    let texas = &summary.states[0];
    assert_eq!(texas.state, "TX");
    assert!(!texas.has_income_tax);
    assert_eq!(texas.state_tax_liability, dec!(0));
    assert_eq!(texas.state_tax_rate, None);

    assert_eq!(summary.summary.total_tax_liability, dec!(4028.00));
    assert_eq!(summary.tax_year, 2024);
}

#[test]
fn high_income_joint_filers_lose_child_tax_credit() {
    let summary = calculate(json!({
        "filing_status": "married_filing_jointly",
        "income_sources": {
            "w2_forms": [{ "wages_tips_compensation": "500000" }]
        },
        "dependents": [
            { "relationship": "child", "age": 5 },
            { "relationship": "child", "age": 8 }
        ],
        "state": "FL"
    }))
    .unwrap();

    let credits = &summary.federal.credits_breakdown;
    assert_eq!(credits.child_tax_credit.total, dec!(0));
    assert_eq!(credits.earned_income_credit.total, dec!(0));
    assert_eq!(summary.federal.total_credits, dec!(0));
}

#[test]
fn states_without_agreement_are_taxed_independently() {
    let summary = calculate(json!({
        "filing_status": "single",
        "income_sources": {
            "w2_forms": [{
                "wages_tips_compensation": "50000",
                "state_income_tax_withheld": "2000"
            }]
        },
        "state_scenarios": [
            { "state": "CA", "residency": "resident" },
            { "state": "NY", "residency": "nonresident" }
        ]
    }))
    .unwrap();

    let liabilities: Vec<Decimal> = summary
        .states
        .iter()
        .map(|s| s.state_tax_liability)
        .collect();
    assert_eq!(liabilities, vec![dec!(4000.00), dec!(3250.00)]);
    assert_eq!(
        summary.summary.total_tax_liability,
        dec!(4028.00) + dec!(4000.00) + dec!(3250.00)
    );
}

#[test]
fn refund_and_owe_are_never_both_positive() {
    let inputs = [
        json!({
            "filing_status": "single",
            "income_sources": { "w2_forms": [{ "wages_tips_compensation": "50000" }] },
            "state": "IL"
        }),
        json!({
            "filing_status": "head_of_household",
            "income_sources": {
                "w2_forms": [{
                    "wages_tips_compensation": "25000",
                    "federal_income_tax_withheld": "2000",
                    "state_income_tax_withheld": "5000"
                }]
            },
            "dependents": [{ "relationship": "child", "age": 3 }],
            "state": "PA"
        }),
        json!({
            "filing_status": "married_filing_separately",
            "income_sources": { "1099_forms": [{ "amount": "80000" }] },
            "self_employment_income": "80000",
            "estimated_payments": ["3000", "3000"],
            "state": "CO"
        }),
    ];

    for input in inputs {
        let summary = calculate(input).unwrap();

        assert_refund_or_owe(summary.federal.refund_amount, summary.federal.owe_amount);
        for state in &summary.states {
            assert_refund_or_owe(state.state_refund, state.state_owe);
        }
    }
}

#[test]
fn summary_serializes_with_section_keys() {
    let summary = calculate(json!({
        "filing_status": "single",
        "income_sources": { "w2_forms": [{ "wages_tips_compensation": "50000" }] },
        "state": "NJ"
    }))
    .unwrap();

    let value = serde_json::to_value(&summary).unwrap();
    let mut keys: Vec<&str> = value
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    keys.sort_unstable();

    assert_eq!(keys, vec!["federal", "payroll", "state", "summary", "tax_year"]);
    assert_eq!(value["state"][0]["state"], "NJ");
}

#[test]
fn missing_filing_status_is_rejected() {
    let result = calculate(json!({
        "income_sources": { "w2_forms": [] },
        "state": "CA"
    }));

    assert_eq!(result.unwrap_err(), TaxError::MissingField("filing_status"));
}

#[test]
fn unsupported_state_is_rejected() {
    let result = calculate(json!({
        "filing_status": "single",
        "income_sources": {},
        "state": "ZZ"
    }));

    assert_eq!(result.unwrap_err(), TaxError::UnsupportedState("ZZ".to_string()));
}
