use std::collections::BTreeMap;
use std::io::Read;

use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::calculations::brackets::apply_brackets;
use tax_core::calculations::common::round_half_up;
use tax_core::rates::{Bracket, BracketTable};
use tax_core::{ByFilingStatus, FilingStatus, RateTableError, RateTables, TaxError, TaxYearRates};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur when loading tax bracket data.
#[derive(Debug, Error, PartialEq)]
pub enum TaxBracketLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Tax year {tax_year} has no brackets for schedule {schedule}")]
    MissingSchedule {
        tax_year: i32,
        schedule: &'static str,
    },

    #[error(
        "Schedule {schedule} ({tax_year}) bracket at {min_income} lists base tax {found}, brackets give {expected}"
    )]
    BaseTaxMismatch {
        tax_year: i32,
        schedule: String,
        min_income: Decimal,
        expected: Decimal,
        found: Decimal,
    },

    #[error("Schedule {schedule} ({tax_year}): {source}")]
    InvalidBrackets {
        tax_year: i32,
        schedule: String,
        source: RateTableError,
    },

    #[error("Rate table error: {0}")]
    RateTable(#[from] RateTableError),

    #[error("Tax error: {0}")]
    Tax(#[from] TaxError),
}

impl From<csv::Error> for TaxBracketLoaderError {
    fn from(err: csv::Error) -> Self {
        TaxBracketLoaderError::CsvParse(err.to_string())
    }
}

const SCHEDULES: [&str; 4] = ["X", "Y-1", "Y-2", "Z"];

/// Maps filing statuses to IRS schedule codes.
///
/// - Schedule X → Single
/// - Schedule Y-1 → Married Filing Jointly and Qualifying Widow(er)
/// - Schedule Y-2 → Married Filing Separately
/// - Schedule Z → Head of Household
fn schedule_for(status: FilingStatus) -> &'static str {
    match status {
        FilingStatus::Single => "X",
        FilingStatus::MarriedFilingJointly | FilingStatus::QualifyingWidow => "Y-1",
        FilingStatus::MarriedFilingSeparately => "Y-2",
        FilingStatus::HeadOfHousehold => "Z",
    }
}

fn parse_schedule(schedule: &str) -> Result<&'static str, TaxBracketLoaderError> {
    SCHEDULES
        .into_iter()
        .find(|s| *s == schedule)
        .ok_or_else(|| TaxBracketLoaderError::InvalidSchedule(schedule.to_string()))
}

/// A single record from the tax brackets CSV file.
///
/// The CSV format uses IRS schedule designations:
/// - `tax_year`: The tax year (e.g., 2024)
/// - `schedule`: The IRS schedule code (X, Y-1, Y-2, Z)
/// - `min_income`: The minimum income for this bracket
/// - `max_income`: The maximum income for this bracket (empty for unlimited)
/// - `base_tax`: Tax owed on `min_income`, checked against the brackets
/// - `rate`: The marginal tax rate as a decimal (e.g., 0.10 for 10%)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TaxBracketRecord {
    pub tax_year: i32,
    pub schedule: String,
    pub min_income: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub max_income: Option<Decimal>,
    pub base_tax: Decimal,
    pub rate: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Builds rate tables from bracket CSV data.
///
/// The CSV only carries income tax brackets. Every other constant of a loaded
/// year (deductions, credits, payroll, states) is copied from a template year.
pub struct TaxBracketLoader;

impl TaxBracketLoader {
    /// Parse tax bracket records from a CSV reader.
    ///
    /// The reader can be any type that implements `Read`, such as a file or a
    /// string slice.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<TaxBracketRecord>, TaxBracketLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: TaxBracketRecord = result?;
            records.push(record);
        }

        debug!(records = records.len(), "Parsed bracket CSV");
        Ok(records)
    }

    /// Builds one validated [`TaxYearRates`] per tax year in `records`.
    ///
    /// Each year must provide all four schedules. Records within a schedule
    /// may appear in any order. Y-1 brackets feed both joint statuses.
    pub fn load(
        records: &[TaxBracketRecord],
        template: &TaxYearRates,
    ) -> Result<Vec<TaxYearRates>, TaxBracketLoaderError> {
        let mut years: BTreeMap<i32, BTreeMap<&str, Vec<&TaxBracketRecord>>> = BTreeMap::new();
        for record in records {
            let schedule = parse_schedule(&record.schedule)?;
            years
                .entry(record.tax_year)
                .or_default()
                .entry(schedule)
                .or_default()
                .push(record);
        }

        let mut loaded = Vec::with_capacity(years.len());
        for (tax_year, schedules) in years {
            let mut tables: BTreeMap<&str, BracketTable> = BTreeMap::new();
            for schedule in SCHEDULES {
                let group = schedules
                    .get(schedule)
                    .ok_or(TaxBracketLoaderError::MissingSchedule { tax_year, schedule })?;
                tables.insert(schedule, Self::bracket_table(tax_year, schedule, group)?);
            }

            let mut rates = template.clone();
            rates.tax_year = tax_year;
            rates.brackets = ByFilingStatus::try_from_fn(|status| {
                let schedule = schedule_for(status);
                tables
                    .get(schedule)
                    .cloned()
                    .ok_or(TaxBracketLoaderError::MissingSchedule { tax_year, schedule })
            })?;
            rates.validate()?;

            info!(tax_year, template_year = template.tax_year, "Loaded bracket tables");
            loaded.push(rates);
        }

        Ok(loaded)
    }

    /// Returns `tables` extended with every year in `records`, using
    /// `template_year` from `tables` for the non-bracket constants.
    pub fn extend(
        tables: &RateTables,
        records: &[TaxBracketRecord],
        template_year: i32,
    ) -> Result<RateTables, TaxBracketLoaderError> {
        let template = tables.year(template_year)?;
        let mut extended = tables.clone();
        for rates in Self::load(records, template)? {
            extended = extended.with_year(rates)?;
        }
        Ok(extended)
    }

    fn bracket_table(
        tax_year: i32,
        schedule: &str,
        group: &[&TaxBracketRecord],
    ) -> Result<BracketTable, TaxBracketLoaderError> {
        let mut sorted = group.to_vec();
        sorted.sort_by(|a, b| a.min_income.cmp(&b.min_income));

        let brackets = sorted
            .iter()
            .map(|r| Bracket::new(r.min_income, r.max_income, r.rate))
            .collect();
        let table = BracketTable::new(brackets).map_err(|source| {
            TaxBracketLoaderError::InvalidBrackets {
                tax_year,
                schedule: schedule.to_string(),
                source,
            }
        })?;

        for record in sorted {
            let expected = round_half_up(apply_brackets(record.min_income, &table));
            if expected != round_half_up(record.base_tax) {
                return Err(TaxBracketLoaderError::BaseTaxMismatch {
                    tax_year,
                    schedule: schedule.to_string(),
                    min_income: record.min_income,
                    expected,
                    found: record.base_tax,
                });
            }
        }

        Ok(table)
    }
}
