//! Progressive bracket arithmetic.

use rust_decimal::Decimal;
use tracing::warn;

use crate::rates::BracketTable;

/// Tax on `taxable_income` under a progressive schedule.
///
/// Each bracket taxes the slice of income between its lower bound and the
/// smaller of its upper bound and the income. Negative income is taxed as
/// zero. The result is unrounded.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::brackets::apply_brackets;
/// use tax_core::rates::BracketTable;
///
/// let table = BracketTable::from_thresholds(&[
///     (dec!(0), dec!(0.10)),
///     (dec!(11000), dec!(0.12)),
/// ])
/// .unwrap();
///
/// assert_eq!(apply_brackets(dec!(35400), &table), dec!(4028.00));
/// ```
pub fn apply_brackets(
    taxable_income: Decimal,
    table: &BracketTable,
) -> Decimal {
    if taxable_income < Decimal::ZERO {
        warn!(
            taxable_income = %taxable_income,
            "Negative taxable income; no bracket tax applies"
        );
        return Decimal::ZERO;
    }

    let mut tax = Decimal::ZERO;
    for bracket in table.brackets() {
        if taxable_income <= bracket.lower {
            break;
        }
        let top = bracket
            .upper
            .map_or(taxable_income, |upper| taxable_income.min(upper));
        tax += (top - bracket.lower) * bracket.rate;

        if bracket.upper.is_none_or(|upper| taxable_income <= upper) {
            break;
        }
    }
    tax
}

/// Rate of the bracket containing `taxable_income`, as a fraction.
///
/// Containment is inclusive at both ends and the first matching bracket wins,
/// so income exactly on a boundary reports the lower bracket's rate. Income
/// outside every bracket (only possible for negative input) falls back to the
/// top rate.
pub fn marginal_rate(
    taxable_income: Decimal,
    table: &BracketTable,
) -> Decimal {
    table
        .brackets()
        .iter()
        .find(|bracket| bracket.contains(taxable_income))
        .map_or_else(|| table.top_rate(), |bracket| bracket.rate)
}
