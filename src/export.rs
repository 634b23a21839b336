use anyhow::Context;
use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook};

use crate::bucket::DeadlineBucket;
use crate::models::CleanIssue;

/// Appended after the raw columns; the raw headers are untouched.
pub const DERIVED_COLUMNS: [&str; 4] =
    ["latest_date", "final_date", "days_to_deadline", "bucket"];

/// Filtered view as xlsx bytes: raw columns in sheet order, then the
/// derived columns.
pub fn to_xlsx_bytes(
    columns: &[String],
    issues: &[CleanIssue],
    reference: NaiveDate,
) -> anyhow::Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Filtered Issues")?;

    let header_format = Format::new().set_bold();
    for (index, name) in header_row(columns).iter().enumerate() {
        worksheet.write_string_with_format(0, index as u16, name, &header_format)?;
    }
    for (row_index, issue) in issues.iter().enumerate() {
        let row = row_index as u32 + 1;
        for (index, value) in row_values(columns, issue, reference).iter().enumerate() {
            worksheet.write_string(row, index as u16, value)?;
        }
    }

    workbook
        .save_to_buffer()
        .context("failed to serialize workbook")
}

/// Same view as csv bytes.
pub fn to_csv_bytes(
    columns: &[String],
    issues: &[CleanIssue],
    reference: NaiveDate,
) -> anyhow::Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header_row(columns))?;
    for issue in issues {
        writer.write_record(row_values(columns, issue, reference))?;
    }
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("failed to take csv buffer: {err}"))
}

fn header_row(columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .cloned()
        .chain(DERIVED_COLUMNS.iter().map(|name| name.to_string()))
        .collect()
}

fn row_values(columns: &[String], issue: &CleanIssue, reference: NaiveDate) -> Vec<String> {
    let mut values: Vec<String> = (0..columns.len())
        .map(|index| issue.record.cells.get(index).cloned().unwrap_or_default())
        .collect();
    let days = issue.days_to_deadline(reference);
    values.push(issue.latest_date.to_string());
    values.push(issue.final_date.to_string());
    values.push(days.to_string());
    values.push(DeadlineBucket::from_days(Some(days)).label().to_string());
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{self, SheetFormat};
    use crate::prep;

    fn fixture() -> (Vec<String>, Vec<CleanIssue>) {
        let csv = "\
Issue Status,Functional Area,Issue Rating,Soft Target Date,Hard Target Date,Revised Hard Target Date,Notes
Open,MOVA,High,01/03/2026,15/03/2026,,keep me
Closed,Finance,Low,,10/02/2026,20/02/2026,and me
";
        let table = loader::parse_bytes(csv.as_bytes(), SheetFormat::Csv).unwrap();
        let cleaned = prep::preprocess(&table);
        (table.columns, cleaned)
    }

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    #[test]
    fn csv_export_carries_raw_and_derived_columns() {
        let (columns, cleaned) = fixture();
        let bytes = to_csv_bytes(&columns, &cleaned, reference()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();

        let header = lines.next().unwrap();
        assert!(header.starts_with("Issue Status,"));
        assert!(header.ends_with("latest_date,final_date,days_to_deadline,bucket"));

        let first = lines.next().unwrap();
        assert!(first.contains("keep me"));
        assert!(first.contains("2026-03-15"));
        assert!(first.contains("8-30 dias"));
    }

    #[test]
    fn xlsx_export_reloads_through_the_loader() {
        let (columns, cleaned) = fixture();
        let bytes = to_xlsx_bytes(&columns, &cleaned, reference()).unwrap();

        let reloaded = loader::parse_bytes(&bytes, SheetFormat::Excel).unwrap();
        assert_eq!(reloaded.records.len(), cleaned.len());
        assert_eq!(
            reloaded.columns.len(),
            columns.len() + DERIVED_COLUMNS.len()
        );
        assert_eq!(reloaded.records[0].status, "Open");
        assert_eq!(
            reloaded.records[0].hard_target,
            NaiveDate::from_ymd_opt(2026, 3, 15)
        );
    }

    #[test]
    fn overdue_rows_are_labelled_in_the_export() {
        let (columns, cleaned) = fixture();
        let late = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let bytes = to_csv_bytes(&columns, &cleaned, late).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("Em atraso"));
    }
}
