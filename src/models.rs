use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

/// One spreadsheet row. The typed fields are parsed out of `cells`, which
/// keeps the full raw row in sheet order so extra columns pass through to
/// views and exports untouched. Identity is row position.
#[derive(Debug, Clone)]
pub struct IssueRecord {
    pub status: String,
    pub area: String,
    pub rating: String,
    pub soft_target: Option<NaiveDate>,
    pub hard_target: Option<NaiveDate>,
    pub revised_target: Option<NaiveDate>,
    pub owner: Option<String>,
    pub cells: Vec<String>,
}

/// Loaded table: header names in sheet order plus one record per data row.
#[derive(Debug, Clone)]
pub struct IssueTable {
    pub columns: Vec<String>,
    pub records: Vec<IssueRecord>,
    pub has_owner: bool,
}

/// A record that survived preprocessing, with the two derived dates.
/// Both are always present: rows where all three target dates are null are
/// dropped before this type is built.
#[derive(Debug, Clone)]
pub struct CleanIssue {
    pub record: IssueRecord,
    pub latest_date: NaiveDate,
    pub final_date: NaiveDate,
}

impl CleanIssue {
    /// Signed days from `reference` to the latest target date. Negative
    /// means overdue.
    pub fn days_to_deadline(&self, reference: NaiveDate) -> i64 {
        (self.latest_date - reference).num_days()
    }
}

/// Time bucket width for the aggregated series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Day,
    Week,
    Month,
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(format!(
                "unknown granularity: {other} (expected day, week or month)"
            )),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        };
        f.write_str(name)
    }
}

/// Which derived date drives the time bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateColumn {
    Latest,
    Final,
}

impl DateColumn {
    pub fn of(self, issue: &CleanIssue) -> NaiveDate {
        match self {
            Self::Latest => issue.latest_date,
            Self::Final => issue.final_date,
        }
    }
}

impl FromStr for DateColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "latest" => Ok(Self::Latest),
            "final" => Ok(Self::Final),
            other => Err(format!(
                "unknown date column: {other} (expected latest or final)"
            )),
        }
    }
}

impl fmt::Display for DateColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Latest => "latest",
            Self::Final => "final",
        };
        f.write_str(name)
    }
}

/// Filter selections. Empty vectors are no-ops. `locked_area` is the
/// single-area dashboard configuration and composes with `areas`.
#[derive(Debug, Clone, Default)]
pub struct FilterParams {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub areas: Vec<String>,
    pub statuses: Vec<String>,
    pub ratings: Vec<String>,
    pub locked_area: Option<String>,
}
