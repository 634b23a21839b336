use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::models::{CleanIssue, DateColumn, Granularity};

/// Pivoted aggregate: one count column per category value plus a Total
/// column, bucket rows ascending.
#[derive(Debug, Clone)]
pub struct WideTable {
    pub categories: Vec<String>,
    pub rows: Vec<WideRow>,
}

#[derive(Debug, Clone)]
pub struct WideRow {
    pub bucket: NaiveDate,
    pub counts: Vec<u64>,
    pub total: u64,
}

/// Unpivoted aggregate cell.
#[derive(Debug, Clone, Serialize)]
pub struct LongRow {
    pub bucket: NaiveDate,
    pub series: String,
    pub count: u64,
}

/// Start of the bucket containing `date`. Weeks start on Monday, months on
/// the 1st; a date already on a boundary maps to itself.
pub fn bucket_start(date: NaiveDate, granularity: Granularity) -> NaiveDate {
    match granularity {
        Granularity::Day => date,
        Granularity::Week => {
            date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
        }
        Granularity::Month => date.with_day(1).unwrap_or(date),
    }
}

/// Counts rows per (time bucket, category value), pivots to a zero-filled
/// wide table with a Total column, then unpivots to long form. Cells with
/// no rows appear as 0 in both shapes, never missing, because the long
/// form is derived from the filled pivot.
pub fn aggregate<F>(
    issues: &[CleanIssue],
    granularity: Granularity,
    date_column: DateColumn,
    category: F,
) -> (WideTable, Vec<LongRow>)
where
    F: Fn(&CleanIssue) -> &str,
{
    let mut counts: BTreeMap<NaiveDate, BTreeMap<String, u64>> = BTreeMap::new();
    let mut categories: BTreeSet<String> = BTreeSet::new();
    for issue in issues {
        let bucket = bucket_start(date_column.of(issue), granularity);
        let value = category(issue).to_string();
        categories.insert(value.clone());
        *counts.entry(bucket).or_default().entry(value).or_insert(0) += 1;
    }

    let categories: Vec<String> = categories.into_iter().collect();
    let mut rows = Vec::with_capacity(counts.len());
    for (bucket, by_category) in &counts {
        let cells: Vec<u64> = categories
            .iter()
            .map(|c| by_category.get(c).copied().unwrap_or(0))
            .collect();
        let total = cells.iter().sum();
        rows.push(WideRow {
            bucket: *bucket,
            counts: cells,
            total,
        });
    }

    let wide = WideTable { categories, rows };
    let long = unpivot(&wide);
    (wide, long)
}

/// Long form of the wide table, grouped by series with buckets ascending.
fn unpivot(wide: &WideTable) -> Vec<LongRow> {
    let mut long = Vec::with_capacity(wide.categories.len() * wide.rows.len());
    for (index, series) in wide.categories.iter().enumerate() {
        for row in &wide.rows {
            long.push(LongRow {
                bucket: row.bucket,
                series: series.clone(),
                count: row.counts[index],
            });
        }
    }
    long
}

/// Replaces each count with the running sum of its series. Expects rows
/// grouped by series with buckets ascending, which `aggregate` guarantees;
/// each resulting per-series sequence is non-decreasing.
pub fn accumulate(long: &mut [LongRow]) {
    let mut current: Option<String> = None;
    let mut running = 0u64;
    for row in long.iter_mut() {
        if current.as_deref() != Some(row.series.as_str()) {
            current = Some(row.series.clone());
            running = 0;
        }
        running += row.count;
        row.count = running;
    }
}
