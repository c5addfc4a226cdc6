use serde::{Deserialize, Serialize};

/// Federal filing status.
///
/// The wire form is the snake_case name (`"married_filing_jointly"`), which is
/// also what [`FilingStatus::as_str`] returns and [`FilingStatus::parse`]
/// accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    Single,
    MarriedFilingJointly,
    MarriedFilingSeparately,
    HeadOfHousehold,
    QualifyingWidow,
}

impl FilingStatus {
    /// Every filing status, in the order the IRS lists them.
    pub const ALL: [FilingStatus; 5] = [
        Self::Single,
        Self::MarriedFilingJointly,
        Self::MarriedFilingSeparately,
        Self::HeadOfHousehold,
        Self::QualifyingWidow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::MarriedFilingJointly => "married_filing_jointly",
            Self::MarriedFilingSeparately => "married_filing_separately",
            Self::HeadOfHousehold => "head_of_household",
            Self::QualifyingWidow => "qualifying_widow",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "single" => Some(Self::Single),
            "married_filing_jointly" => Some(Self::MarriedFilingJointly),
            "married_filing_separately" => Some(Self::MarriedFilingSeparately),
            "head_of_household" => Some(Self::HeadOfHousehold),
            "qualifying_widow" => Some(Self::QualifyingWidow),
            _ => None,
        }
    }
}

impl std::fmt::Display for FilingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per filing status.
///
/// Every per-status constant in the rate tables is stored this way, so a table
/// that deserializes successfully always has an entry for every status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByFilingStatus<T> {
    pub single: T,
    pub married_filing_jointly: T,
    pub married_filing_separately: T,
    pub head_of_household: T,
    pub qualifying_widow: T,
}

impl<T> ByFilingStatus<T> {
    pub fn get(&self, status: FilingStatus) -> &T {
        match status {
            FilingStatus::Single => &self.single,
            FilingStatus::MarriedFilingJointly => &self.married_filing_jointly,
            FilingStatus::MarriedFilingSeparately => &self.married_filing_separately,
            FilingStatus::HeadOfHousehold => &self.head_of_household,
            FilingStatus::QualifyingWidow => &self.qualifying_widow,
        }
    }

    /// Pairs each status with its value, in [`FilingStatus::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (FilingStatus, &T)> {
        FilingStatus::ALL.into_iter().map(move |status| (status, self.get(status)))
    }

    /// Builds a table by asking `f` for each status, stopping at the first
    /// error.
    pub fn try_from_fn<E>(mut f: impl FnMut(FilingStatus) -> Result<T, E>) -> Result<Self, E> {
        Ok(Self {
            single: f(FilingStatus::Single)?,
            married_filing_jointly: f(FilingStatus::MarriedFilingJointly)?,
            married_filing_separately: f(FilingStatus::MarriedFilingSeparately)?,
            head_of_household: f(FilingStatus::HeadOfHousehold)?,
            qualifying_widow: f(FilingStatus::QualifyingWidow)?,
        })
    }

    /// Builds a table where joint filers get `joint` and everyone else gets
    /// `other`.
    pub fn joint_or_other(
        joint: T,
        other: T,
    ) -> Self
    where
        T: Clone,
    {
        Self {
            single: other.clone(),
            married_filing_jointly: joint,
            married_filing_separately: other.clone(),
            head_of_household: other.clone(),
            qualifying_widow: other,
        }
    }
}
