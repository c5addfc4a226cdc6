use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{BracketTable, RateTableError, ensure_rate};

/// How a state taxes individual income.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateTaxRule {
    NoIncomeTax,
    Flat { rate: Decimal },
    Graduated { brackets: BracketTable },
}

impl StateTaxRule {
    pub fn validate(
        &self,
        state: &str,
    ) -> Result<(), RateTableError> {
        match self {
            Self::NoIncomeTax => Ok(()),
            Self::Flat { rate } => ensure_rate("states.flat.rate", *rate).map_err(|_| {
                RateTableError::InvalidStateRule {
                    state: state.to_string(),
                    reason: format!("flat rate {rate} is outside [0, 1]"),
                }
            }),
            Self::Graduated { brackets } => {
                brackets
                    .validate()
                    .map_err(|err| RateTableError::InvalidStateRule {
                        state: state.to_string(),
                        reason: err.to_string(),
                    })
            }
        }
    }
}

/// What a reciprocity agreement grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReciprocityBenefit {
    /// Wages a resident of one state earns in the other are exempt there.
    Exemption,
    /// The resident state credits tax paid to the other state.
    Credit,
}

/// A bilateral agreement between two states.
///
/// The pair is unordered: neither state "owns" the agreement, and
/// [`ReciprocityAgreement::covers`] matches either ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReciprocityAgreement {
    pub state_a: String,
    pub state_b: String,
    pub benefit: ReciprocityBenefit,
}

impl ReciprocityAgreement {
    pub fn new(
        state_a: &str,
        state_b: &str,
        benefit: ReciprocityBenefit,
    ) -> Self {
        Self {
            state_a: state_a.to_string(),
            state_b: state_b.to_string(),
            benefit,
        }
    }

    pub fn covers(
        &self,
        first: &str,
        second: &str,
    ) -> bool {
        (self.state_a == first && self.state_b == second)
            || (self.state_a == second && self.state_b == first)
    }
}

/// Full name for a two-letter state code (50 states plus DC).
pub fn state_name(code: &str) -> Option<&'static str> {
    let name = match code {
        "AL" => "Alabama",
        "AK" => "Alaska",
        "AZ" => "Arizona",
        "AR" => "Arkansas",
        "CA" => "California",
        "CO" => "Colorado",
        "CT" => "Connecticut",
        "DE" => "Delaware",
        "FL" => "Florida",
        "GA" => "Georgia",
        "HI" => "Hawaii",
        "ID" => "Idaho",
        "IL" => "Illinois",
        "IN" => "Indiana",
        "IA" => "Iowa",
        "KS" => "Kansas",
        "KY" => "Kentucky",
        "LA" => "Louisiana",
        "ME" => "Maine",
        "MD" => "Maryland",
        "MA" => "Massachusetts",
        "MI" => "Michigan",
        "MN" => "Minnesota",
        "MS" => "Mississippi",
        "MO" => "Missouri",
        "MT" => "Montana",
        "NE" => "Nebraska",
        "NV" => "Nevada",
        "NH" => "New Hampshire",
        "NJ" => "New Jersey",
        "NM" => "New Mexico",
        "NY" => "New York",
        "NC" => "North Carolina",
        "ND" => "North Dakota",
        "OH" => "Ohio",
        "OK" => "Oklahoma",
        "OR" => "Oregon",
        "PA" => "Pennsylvania",
        "RI" => "Rhode Island",
        "SC" => "South Carolina",
        "SD" => "South Dakota",
        "TN" => "Tennessee",
        "TX" => "Texas",
        "UT" => "Utah",
        "VT" => "Vermont",
        "VA" => "Virginia",
        "WA" => "Washington",
        "WV" => "West Virginia",
        "WI" => "Wisconsin",
        "WY" => "Wyoming",
        "DC" => "District of Columbia",
        _ => return None,
    };
    Some(name)
}
