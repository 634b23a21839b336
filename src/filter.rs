use crate::models::{CleanIssue, FilterParams};

/// Sequentially narrows the cleaned rows: inclusive date range on the
/// latest target date, then set membership on area, status and rating.
/// An empty selection set is a no-op. The result may be empty; callers
/// must treat that as the no-data state, not an error.
pub fn apply(issues: &[CleanIssue], params: &FilterParams) -> Vec<CleanIssue> {
    issues
        .iter()
        .filter(|issue| matches(issue, params))
        .cloned()
        .collect()
}

fn matches(issue: &CleanIssue, params: &FilterParams) -> bool {
    if let Some(from) = params.from {
        if issue.latest_date < from {
            return false;
        }
    }
    if let Some(to) = params.to {
        if issue.latest_date > to {
            return false;
        }
    }
    if let Some(locked) = &params.locked_area {
        if issue.record.area != *locked {
            return false;
        }
    }
    if !params.areas.is_empty() && !params.areas.contains(&issue.record.area) {
        return false;
    }
    if !params.statuses.is_empty() && !params.statuses.contains(&issue.record.status) {
        return false;
    }
    if !params.ratings.is_empty() && !params.ratings.contains(&issue.record.rating) {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IssueRecord;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn issue(status: &str, area: &str, rating: &str, latest: NaiveDate) -> CleanIssue {
        CleanIssue {
            record: IssueRecord {
                status: status.to_string(),
                area: area.to_string(),
                rating: rating.to_string(),
                soft_target: Some(latest),
                hard_target: None,
                revised_target: None,
                owner: None,
                cells: Vec::new(),
            },
            latest_date: latest,
            final_date: latest,
        }
    }

    fn sample() -> Vec<CleanIssue> {
        vec![
            issue("Open", "MOVA", "High", date(2026, 1, 10)),
            issue("Closed", "MOVA", "Low", date(2026, 2, 10)),
            issue("Open", "Finance", "High", date(2026, 3, 10)),
        ]
    }

    #[test]
    fn empty_selections_keep_everything() {
        let kept = apply(&sample(), &FilterParams::default());
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn date_range_is_inclusive_on_both_ends() {
        let params = FilterParams {
            from: Some(date(2026, 1, 10)),
            to: Some(date(2026, 2, 10)),
            ..FilterParams::default()
        };
        let kept = apply(&sample(), &params);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn set_membership_narrows_each_dimension() {
        let params = FilterParams {
            areas: vec!["MOVA".to_string()],
            statuses: vec!["Open".to_string()],
            ratings: vec!["High".to_string()],
            ..FilterParams::default()
        };
        let kept = apply(&sample(), &params);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].record.area, "MOVA");
    }

    #[test]
    fn locked_area_composes_with_area_selection() {
        let params = FilterParams {
            locked_area: Some("MOVA".to_string()),
            areas: vec!["Finance".to_string(), "MOVA".to_string()],
            ..FilterParams::default()
        };
        let kept = apply(&sample(), &params);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|i| i.record.area == "MOVA"));
    }

    #[test]
    fn exhaustive_range_yields_empty_not_panic() {
        let params = FilterParams {
            from: Some(date(2030, 1, 1)),
            ..FilterParams::default()
        };
        assert!(apply(&sample(), &params).is_empty());
    }
}
