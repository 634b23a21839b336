use std::fmt::Write;

use crate::pipeline::{CountRow, DashboardData, DashboardParams, Outcome};

/// Markdown report covering every dashboard view. The no-data outcome
/// renders a short message instead of empty sections.
pub fn build_report(source: &str, params: &DashboardParams, outcome: &Outcome) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Issues Dashboard Report");
    let _ = writeln!(output, "Source: {source}");
    let _ = writeln!(
        output,
        "Window: {} to {}; granularity {}; date column {}; reference date {}",
        bound(params.filters.from),
        bound(params.filters.to),
        params.granularity,
        params.date_column,
        params.reference_date
    );

    let data = match outcome {
        Outcome::NoData => {
            let _ = writeln!(output);
            let _ = writeln!(output, "No rows match the current filters.");
            return output;
        }
        Outcome::Data(data) => data,
    };

    write_headline(&mut output, data);
    write_series(&mut output, data, params.cumulative);
    write_counts(&mut output, "Status distribution", &data.status_counts);
    write_counts(&mut output, "Priority distribution", &data.rating_counts);
    write_rating_series(&mut output, data);
    write_counts(&mut output, "Deadline buckets", &data.bucket_counts);
    if let Some(owners) = &data.top_owners {
        write_counts(&mut output, "Top owners", owners);
    }

    output
}

fn bound(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "open".to_string())
}

fn write_headline(output: &mut String, data: &DashboardData) {
    let metrics = &data.metrics;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Headline");
    let _ = writeln!(output, "- Total issues: {}", metrics.total);
    let _ = writeln!(
        output,
        "- Overdue: {} ({:.1}%)",
        metrics.overdue, metrics.overdue_pct
    );
    let _ = writeln!(
        output,
        "- Most common priority: {}",
        metrics.top_rating.as_deref().unwrap_or("n/a")
    );
    let _ = writeln!(output, "- Chart points: {}", metrics.chart_points);
}

fn write_series(output: &mut String, data: &DashboardData, cumulative: bool) {
    let wide = &data.wide;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Time series");

    let mut header = String::from("| Bucket |");
    let mut divider = String::from("|---|");
    for category in &wide.categories {
        let _ = write!(header, " {category} |");
        divider.push_str("---|");
    }
    header.push_str(" Total |");
    divider.push_str("---|");
    let _ = writeln!(output, "{header}");
    let _ = writeln!(output, "{divider}");
    for row in &wide.rows {
        let _ = write!(output, "| {} |", row.bucket);
        for count in &row.counts {
            let _ = write!(output, " {count} |");
        }
        let _ = writeln!(output, " {} |", row.total);
    }

    if cumulative {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Cumulative series");
        let _ = writeln!(output, "| Bucket | Series | Running total |");
        let _ = writeln!(output, "|---|---|---|");
        for row in &data.series {
            let _ = writeln!(output, "| {} | {} | {} |", row.bucket, row.series, row.count);
        }
    }
}

fn write_rating_series(output: &mut String, data: &DashboardData) {
    let _ = writeln!(output);
    let _ = writeln!(output, "## Priority over time");
    let _ = writeln!(output, "| Bucket | Priority | Count |");
    let _ = writeln!(output, "|---|---|---|");
    for row in &data.rating_series {
        let _ = writeln!(output, "| {} | {} | {} |", row.bucket, row.series, row.count);
    }
}

fn write_counts(output: &mut String, title: &str, rows: &[CountRow]) {
    let _ = writeln!(output);
    let _ = writeln!(output, "## {title}");
    if rows.is_empty() {
        let _ = writeln!(output, "Nothing to show for this view.");
        return;
    }
    for row in rows {
        let _ = writeln!(output, "- {}: {}", row.label, row.count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DateColumn, FilterParams, Granularity, IssueRecord, IssueTable};
    use crate::pipeline;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn table() -> IssueTable {
        let record = IssueRecord {
            status: "Open".to_string(),
            area: "MOVA".to_string(),
            rating: "High".to_string(),
            soft_target: Some(date(2026, 3, 2)),
            hard_target: None,
            revised_target: None,
            owner: None,
            cells: Vec::new(),
        };
        IssueTable {
            columns: Vec::new(),
            records: vec![record],
            has_owner: false,
        }
    }

    fn params() -> DashboardParams {
        DashboardParams {
            filters: FilterParams::default(),
            granularity: Granularity::Week,
            date_column: DateColumn::Latest,
            cumulative: false,
            reference_date: date(2026, 3, 1),
        }
    }

    #[test]
    fn report_lists_every_section_for_data() {
        let outcome = pipeline::run(&table(), &params());
        let report = build_report("issues.xlsx", &params(), &outcome);
        assert!(report.contains("# Issues Dashboard Report"));
        assert!(report.contains("## Headline"));
        assert!(report.contains("## Time series"));
        assert!(report.contains("## Status distribution"));
        assert!(report.contains("## Priority over time"));
        assert!(report.contains("## Deadline buckets"));
        assert!(report.contains("- Em atraso: 0"));
        assert!(!report.contains("## Top owners"));
    }

    #[test]
    fn no_data_renders_the_explicit_message() {
        let mut p = params();
        p.filters.from = Some(date(2030, 1, 1));
        let outcome = pipeline::run(&table(), &p);
        let report = build_report("issues.xlsx", &p, &outcome);
        assert!(report.contains("No rows match the current filters."));
        assert!(!report.contains("## Headline"));
    }

    #[test]
    fn cumulative_section_appears_only_when_requested() {
        let mut p = params();
        p.cumulative = true;
        let outcome = pipeline::run(&table(), &p);
        let report = build_report("issues.xlsx", &p, &outcome);
        assert!(report.contains("## Cumulative series"));
    }
}
