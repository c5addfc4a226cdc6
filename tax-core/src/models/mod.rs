mod filing_status;
mod profile;
mod residency;

pub use filing_status::{ByFilingStatus, FilingStatus};
pub use profile::{
    Adjustments, DeductionType, Dependent, Form1099Record, IncomeSources, Relationship,
    StateScenario, StateScenarioInput, TaxpayerInput, TaxpayerProfile, WageRecord,
};
pub use residency::ResidencyStatus;
