//! Reporting and output generation
//!
//! Global invariants enforced:
//! - Rows are listed in document order
//! - Byte-for-byte identical output across runs for the same input and date

use crate::alert::AlertLevel;
use crate::annotate::TableAnnotation;

/// Render an annotation as a text table
pub fn render_text(annotation: &TableAnnotation) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Table: {}  Today: {}\n",
        annotation.table_id,
        annotation.today.format("%Y-%m-%d")
    ));
    output.push_str(&format!(
        "{:<6} {:<10} {:<20} {}\n",
        "ROW", "LEVEL", "DATE", "DAYS"
    ));

    for row in &annotation.rows {
        let days = match row.level {
            AlertLevel::Critical => row
                .days_overdue
                .map(|d| format!("{} overdue", d))
                .unwrap_or_else(|| "-".to_string()),
            AlertLevel::Warning => row
                .days_remaining
                .map(|d| format!("{} remaining", d))
                .unwrap_or_else(|| "-".to_string()),
            AlertLevel::Normal => "-".to_string(),
        };
        output.push_str(&format!(
            "{:<6} {:<10} {:<20} {}\n",
            row.row,
            row.level.as_str(),
            truncate_or_pad(&row.date_text, 20),
            days
        ));
    }

    output.push_str(&format!(
        "\n{} critical, {} warning\n",
        annotation.counts.critical, annotation.counts.warning
    ));

    output
}

/// Render an annotation as JSON
pub fn render_json(annotation: &TableAnnotation) -> String {
    serde_json::to_string_pretty(annotation).unwrap_or_else(|_| "{}".to_string())
}

/// Truncate or pad string to fixed width (counted in characters)
fn truncate_or_pad(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let kept: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        format!("{:<width$}", s, width = width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::{AlertCounts, RowAlert};
    use chrono::NaiveDate;

    fn sample() -> TableAnnotation {
        TableAnnotation {
            table_id: "supplierTable".to_string(),
            today: NaiveDate::from_ymd_opt(2025, 11, 20).unwrap(),
            counts: AlertCounts {
                critical: 1,
                warning: 1,
            },
            rows: vec![
                RowAlert {
                    row: 0,
                    date_text: "2025-11-15".to_string(),
                    level: AlertLevel::Critical,
                    days_overdue: Some(5),
                    days_remaining: None,
                },
                RowAlert {
                    row: 2,
                    date_text: "2025-12-10".to_string(),
                    level: AlertLevel::Warning,
                    days_overdue: None,
                    days_remaining: Some(20),
                },
            ],
        }
    }

    #[test]
    fn test_render_text() {
        let text = render_text(&sample());
        assert!(text.starts_with("Table: supplierTable  Today: 2025-11-20\n"));
        assert!(text.contains("critical   2025-11-15           5 overdue"));
        assert!(text.contains("warning    2025-12-10           20 remaining"));
        assert!(text.ends_with("1 critical, 1 warning\n"));
    }

    #[test]
    fn test_render_json() {
        let json = render_json(&sample());
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["today"], "2025-11-20");
        assert_eq!(value["counts"]["critical"], 1);
        assert_eq!(value["rows"][0]["level"], "critical");
        assert_eq!(value["rows"][0]["days_overdue"], 5);
        assert!(value["rows"][0].get("days_remaining").is_none());
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate_or_pad("2025年11月15日", 20).chars().count(), 20);
        assert_eq!(truncate_or_pad("abcdefghij", 6), "abc...");
    }
}
