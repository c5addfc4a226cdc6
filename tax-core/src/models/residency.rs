use serde::{Deserialize, Serialize};

/// How the taxpayer relates to a state for the year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResidencyStatus {
    #[default]
    Resident,
    Nonresident,
    PartYear,
}

impl ResidencyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resident => "resident",
            Self::Nonresident => "nonresident",
            Self::PartYear => "part_year",
        }
    }
}
