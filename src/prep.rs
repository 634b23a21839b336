use chrono::NaiveDate;

use crate::models::{CleanIssue, IssueRecord, IssueTable};

const CANCELLED_STATUS: &str = "Cancelled";

/// Drops cancelled rows, trims the categorical fields and derives the two
/// date columns. Rows where all three target dates are null are dropped.
/// Output rows are a strict subset of input rows, in input order.
pub fn preprocess(table: &IssueTable) -> Vec<CleanIssue> {
    let mut cleaned = Vec::new();
    for record in &table.records {
        let mut record = record.clone();
        record.status = record.status.trim().to_string();
        record.area = record.area.trim().to_string();
        record.rating = record.rating.trim().to_string();
        if record.status == CANCELLED_STATUS {
            continue;
        }
        let Some(latest_date) = latest_target(&record) else {
            continue;
        };
        let Some(final_date) = final_target(&record) else {
            continue;
        };
        cleaned.push(CleanIssue {
            record,
            latest_date,
            final_date,
        });
    }
    cleaned
}

/// Null-safe row-wise maximum of the three target dates.
fn latest_target(record: &IssueRecord) -> Option<NaiveDate> {
    [record.soft_target, record.hard_target, record.revised_target]
        .into_iter()
        .flatten()
        .max()
}

/// Coalesce priority: revised, then hard, then soft.
fn final_target(record: &IssueRecord) -> Option<NaiveDate> {
    record
        .revised_target
        .or(record.hard_target)
        .or(record.soft_target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(
        status: &str,
        soft: Option<NaiveDate>,
        hard: Option<NaiveDate>,
        revised: Option<NaiveDate>,
    ) -> IssueRecord {
        IssueRecord {
            status: status.to_string(),
            area: "MOVA".to_string(),
            rating: "High".to_string(),
            soft_target: soft,
            hard_target: hard,
            revised_target: revised,
            owner: None,
            cells: Vec::new(),
        }
    }

    fn table(records: Vec<IssueRecord>) -> IssueTable {
        IssueTable {
            columns: Vec::new(),
            records,
            has_owner: false,
        }
    }

    #[test]
    fn latest_date_is_rowwise_max_of_non_null_dates() {
        let cleaned = preprocess(&table(vec![record(
            "Open",
            Some(date(2026, 1, 10)),
            Some(date(2026, 3, 5)),
            Some(date(2026, 2, 20)),
        )]));
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].latest_date, date(2026, 3, 5));
    }

    #[test]
    fn final_date_coalesces_revised_then_hard_then_soft() {
        let cleaned = preprocess(&table(vec![
            record(
                "Open",
                Some(date(2026, 1, 1)),
                Some(date(2026, 2, 1)),
                Some(date(2026, 3, 1)),
            ),
            record("Open", Some(date(2026, 1, 1)), Some(date(2026, 2, 1)), None),
            record("Open", Some(date(2026, 1, 1)), None, None),
        ]));
        assert_eq!(cleaned[0].final_date, date(2026, 3, 1));
        assert_eq!(cleaned[1].final_date, date(2026, 2, 1));
        assert_eq!(cleaned[2].final_date, date(2026, 1, 1));
    }

    #[test]
    fn rows_without_any_target_date_are_dropped() {
        let cleaned = preprocess(&table(vec![
            record("Open", None, None, None),
            record("Open", None, Some(date(2026, 5, 1)), None),
        ]));
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].latest_date, date(2026, 5, 1));
    }

    #[test]
    fn cancelled_rows_are_dropped_after_trimming() {
        let mut padded = record("  Cancelled ", Some(date(2026, 1, 1)), None, None);
        padded.rating = " High ".to_string();
        let cleaned = preprocess(&table(vec![
            padded,
            record("Open", Some(date(2026, 1, 1)), None, None),
        ]));
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].record.status, "Open");
        assert_eq!(cleaned[0].record.rating, "High");
    }

    #[test]
    fn ten_rows_with_two_cancelled_keep_eight() {
        let mut records = Vec::new();
        for i in 0..8 {
            records.push(record("Open", Some(date(2026, 1, 1 + i)), None, None));
        }
        records.push(record("Cancelled", Some(date(2026, 1, 1)), None, None));
        records.push(record("Cancelled", Some(date(2026, 1, 2)), None, None));
        assert_eq!(preprocess(&table(records)).len(), 8);
    }
}
