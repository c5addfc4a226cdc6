//! Helpers shared by every engine: cent rounding and the zero floors.

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, warn};

/// Rounds a value to the cent using half-up rounding (midpoints move away
/// from zero).
///
/// Engines carry full precision through their intermediate steps and call
/// this only when a result record is assembled. Rounding an already rounded
/// value returns it unchanged.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a value to the nearest whole number, midpoints away from zero.
pub(crate) fn round_whole(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Clamps `value` at zero, logging when the clamp was needed.
///
/// `field` names the quantity in the log line so a forced floor can be traced
/// back to the input that caused it.
pub(crate) fn floor_at_zero(
    field: &'static str,
    value: Decimal,
) -> Decimal {
    if value < Decimal::ZERO {
        warn!(field, value = %value, "Negative amount clamped to zero");
        return Decimal::ZERO;
    }
    value
}

/// Clamps `value` at zero without flagging the input.
///
/// For quantities that routinely go negative on valid returns, such as
/// taxable income when the deduction exceeds AGI.
pub(crate) fn clamp_at_zero(
    field: &'static str,
    value: Decimal,
) -> Decimal {
    if value < Decimal::ZERO {
        debug!(field, value = %value, "Amount clamped to zero");
        return Decimal::ZERO;
    }
    value
}

/// `part / whole` as a percentage, or zero when `whole` is not positive.
pub(crate) fn percent_of(
    part: Decimal,
    whole: Decimal,
) -> Decimal {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    part / whole * Decimal::ONE_HUNDRED
}
