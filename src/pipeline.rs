use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::aggregate::{self, LongRow, WideTable};
use crate::bucket::DeadlineBucket;
use crate::filter;
use crate::models::{CleanIssue, DateColumn, FilterParams, Granularity, IssueTable};
use crate::prep;

/// Everything one render pass needs. The pipeline is recomputed from
/// scratch per call; nothing is carried between interactions.
#[derive(Debug, Clone)]
pub struct DashboardParams {
    pub filters: FilterParams,
    pub granularity: Granularity,
    pub date_column: DateColumn,
    pub cumulative: bool,
    pub reference_date: NaiveDate,
}

/// Headline numbers shown above the charts.
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total: usize,
    pub overdue: usize,
    pub overdue_pct: f64,
    pub top_rating: Option<String>,
    pub chart_points: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountRow {
    pub label: String,
    pub count: usize,
}

/// Aggregates and summaries for every dashboard view.
pub struct DashboardData {
    pub filtered: Vec<CleanIssue>,
    pub wide: WideTable,
    pub series: Vec<LongRow>,
    pub metrics: Metrics,
    pub status_counts: Vec<CountRow>,
    pub rating_counts: Vec<CountRow>,
    pub rating_series: Vec<LongRow>,
    pub bucket_counts: Vec<CountRow>,
    pub top_owners: Option<Vec<CountRow>>,
}

/// Filter result. Aggregation never runs over an empty selection; the
/// no-data case is a value, not an error.
pub enum Outcome {
    NoData,
    Data(Box<DashboardData>),
}

/// The whole dashboard as one pure function: preprocess, filter, guard the
/// empty case, then aggregate and summarize. Callers re-run it per
/// interaction.
pub fn run(table: &IssueTable, params: &DashboardParams) -> Outcome {
    let cleaned = prep::preprocess(table);
    let filtered = filter::apply(&cleaned, &params.filters);
    if filtered.is_empty() {
        return Outcome::NoData;
    }

    let (wide, mut series) = aggregate::aggregate(
        &filtered,
        params.granularity,
        params.date_column,
        |issue| issue.record.status.as_str(),
    );
    if params.cumulative {
        aggregate::accumulate(&mut series);
    }
    let (_, rating_series) = aggregate::aggregate(
        &filtered,
        params.granularity,
        params.date_column,
        |issue| issue.record.rating.as_str(),
    );

    let metrics = compute_metrics(&filtered, params.reference_date);
    let status_counts = value_counts(filtered.iter().map(|i| i.record.status.as_str()));
    let rating_counts = value_counts(filtered.iter().map(|i| i.record.rating.as_str()));
    let bucket_counts = bucket_distribution(&filtered, params.reference_date);
    let top_owners = table
        .has_owner
        .then(|| owner_counts(&filtered, 10));

    Outcome::Data(Box::new(DashboardData {
        filtered,
        wide,
        series,
        metrics,
        status_counts,
        rating_counts,
        rating_series,
        bucket_counts,
        top_owners,
    }))
}

fn compute_metrics(filtered: &[CleanIssue], reference: NaiveDate) -> Metrics {
    let total = filtered.len();
    let overdue = filtered
        .iter()
        .filter(|issue| issue.days_to_deadline(reference) < 0)
        .count();
    let overdue_pct = if total == 0 {
        0.0
    } else {
        overdue as f64 / total as f64 * 100.0
    };
    let top_rating = value_counts(filtered.iter().map(|i| i.record.rating.as_str()))
        .into_iter()
        .next()
        .map(|row| row.label);
    let chart_points = filtered
        .iter()
        .map(|issue| issue.latest_date)
        .collect::<BTreeSet<_>>()
        .len();

    Metrics {
        total,
        overdue,
        overdue_pct,
        top_rating,
        chart_points,
    }
}

/// Counts per distinct value, most frequent first, ties broken by label.
fn value_counts<'a>(values: impl Iterator<Item = &'a str>) -> Vec<CountRow> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    let mut rows: Vec<CountRow> = counts
        .into_iter()
        .map(|(label, count)| CountRow {
            label: label.to_string(),
            count,
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    rows
}

/// All seven deadline buckets in their fixed order, zeros included.
fn bucket_distribution(filtered: &[CleanIssue], reference: NaiveDate) -> Vec<CountRow> {
    let mut counts: BTreeMap<DeadlineBucket, usize> =
        DeadlineBucket::ALL.iter().map(|b| (*b, 0)).collect();
    for issue in filtered {
        let bucket = DeadlineBucket::from_days(Some(issue.days_to_deadline(reference)));
        *counts.entry(bucket).or_insert(0) += 1;
    }
    DeadlineBucket::ALL
        .iter()
        .map(|bucket| CountRow {
            label: bucket.label().to_string(),
            count: counts.get(bucket).copied().unwrap_or(0),
        })
        .collect()
}

/// Rows without an owner are excluded, as in the source view.
fn owner_counts(filtered: &[CleanIssue], limit: usize) -> Vec<CountRow> {
    let mut rows = value_counts(filtered.iter().filter_map(|i| i.record.owner.as_deref()));
    rows.truncate(limit);
    rows
}
