use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::RateTableError;

/// One marginal-rate band. `upper` of `None` means the band is unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    pub lower: Decimal,
    pub upper: Option<Decimal>,
    pub rate: Decimal,
}

impl Bracket {
    pub fn new(
        lower: Decimal,
        upper: Option<Decimal>,
        rate: Decimal,
    ) -> Self {
        Self { lower, upper, rate }
    }

    /// Whether `income` falls in `[lower, upper]`.
    pub fn contains(
        &self,
        income: Decimal,
    ) -> bool {
        income >= self.lower && self.upper.is_none_or(|upper| income <= upper)
    }
}

/// A progressive rate schedule.
///
/// Construction checks that the brackets are contiguous and non-overlapping,
/// start at zero, end with an unbounded bracket, and have rates in `[0, 1]`
/// that never decrease. Deserialization goes through the same checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Bracket>", into = "Vec<Bracket>")]
pub struct BracketTable {
    brackets: Vec<Bracket>,
}

impl BracketTable {
    pub fn new(brackets: Vec<Bracket>) -> Result<Self, RateTableError> {
        let table = Self { brackets };
        table.validate()?;
        Ok(table)
    }

    /// Builds a table from `(lower, rate)` pairs: each bracket ends where the
    /// next one starts and the last one is unbounded.
    pub fn from_thresholds(thresholds: &[(Decimal, Decimal)]) -> Result<Self, RateTableError> {
        let brackets = thresholds
            .iter()
            .enumerate()
            .map(|(index, &(lower, rate))| {
                let upper = thresholds.get(index + 1).map(|&(next, _)| next);
                Bracket::new(lower, upper, rate)
            })
            .collect();
        Self::new(brackets)
    }

    /// Wraps brackets without validating them. Only for compiled-in tables.
    pub(crate) fn from_trusted(brackets: Vec<Bracket>) -> Self {
        Self { brackets }
    }

    pub fn brackets(&self) -> &[Bracket] {
        &self.brackets
    }

    /// Rate of the last (unbounded) bracket.
    pub fn top_rate(&self) -> Decimal {
        self.brackets.last().map_or(Decimal::ZERO, |b| b.rate)
    }

    pub fn validate(&self) -> Result<(), RateTableError> {
        let first = self.brackets.first().ok_or(RateTableError::EmptyBracketTable)?;
        if first.lower != Decimal::ZERO {
            return Err(RateTableError::FirstBracketNotZero(first.lower));
        }

        let last_index = self.brackets.len() - 1;
        let mut previous: Option<&Bracket> = None;

        for (index, bracket) in self.brackets.iter().enumerate() {
            if bracket.rate < Decimal::ZERO || bracket.rate > Decimal::ONE {
                return Err(RateTableError::BracketRateOutOfRange {
                    index,
                    rate: bracket.rate,
                });
            }

            if let Some(prev) = previous {
                // `prev.upper` is always bounded here: an unbounded bracket
                // before the last one is rejected below on its own iteration.
                let expected = prev.upper.unwrap_or(bracket.lower);
                if bracket.lower != expected {
                    return Err(RateTableError::NonContiguousBracket {
                        index,
                        lower: bracket.lower,
                        expected,
                    });
                }
                if bracket.rate < prev.rate {
                    return Err(RateTableError::DecreasingBracketRate {
                        index,
                        rate: bracket.rate,
                        previous: prev.rate,
                    });
                }
            }

            match bracket.upper {
                Some(upper) if upper <= bracket.lower => {
                    return Err(RateTableError::EmptyBracket {
                        index,
                        lower: bracket.lower,
                        upper,
                    });
                }
                Some(_) if index == last_index => return Err(RateTableError::BoundedTopBracket),
                None if index != last_index => {
                    return Err(RateTableError::UnboundedBracketBeforeTop(index));
                }
                _ => {}
            }

            previous = Some(bracket);
        }

        Ok(())
    }
}

impl TryFrom<Vec<Bracket>> for BracketTable {
    type Error = RateTableError;

    fn try_from(brackets: Vec<Bracket>) -> Result<Self, Self::Error> {
        Self::new(brackets)
    }
}

impl From<BracketTable> for Vec<Bracket> {
    fn from(table: BracketTable) -> Self {
        table.brackets
    }
}
