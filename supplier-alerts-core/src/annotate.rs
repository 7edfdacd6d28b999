//! Supplier table annotation
//!
//! Scans the body rows of a table, classifies the date in a fixed column,
//! colors each row and writes a badge into the cell after the date column.
//!
//! Global invariants enforced:
//! - Table and body are both resolved before the first mutation
//! - Only the date column is read; badge cells are always overwritten
//! - Re-running over an annotated table yields identical styles and counts

use crate::alert::{
    calculate_days_overdue, calculate_days_remaining, classify, AlertLevel, AlertPolicy,
};
use crate::date::ReviewDate;
use crate::dom::Dom;
use crate::html::html_escape;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

/// Placeholder written in date cells that have no review date
pub const EMPTY_DATE_PLACEHOLDER: &str = "-";

/// Recognized annotation failures; neither mutates the document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnotateError {
    #[error("Table not found: {table_id}")]
    MissingTable { table_id: String },

    #[error("Table body not found: {table_id}")]
    MissingTableBody { table_id: String },
}

/// Which table to scan and where its date column is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub table_id: String,
    /// Zero-based index of the date cell within each row
    pub date_column: usize,
}

impl TableSpec {
    pub const DEFAULT_TABLE_ID: &'static str = "supplierTable";
    pub const DEFAULT_DATE_COLUMN: usize = 5;

    pub fn new(table_id: impl Into<String>, date_column: usize) -> Self {
        TableSpec {
            table_id: table_id.into(),
            date_column,
        }
    }
}

impl Default for TableSpec {
    fn default() -> Self {
        TableSpec::new(Self::DEFAULT_TABLE_ID, Self::DEFAULT_DATE_COLUMN)
    }
}

/// Language used for badge and tooltip text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ja,
    En,
}

impl Locale {
    fn overdue_label(&self, days: i64) -> String {
        match self {
            Locale::Ja => format!("★期限超過 ({}日経過)★", days),
            Locale::En => format!("Overdue ({} days)", days),
        }
    }

    fn due_soon_label(&self, days: i64) -> String {
        match self {
            Locale::Ja => format!("期限間近 (残り{}日)", days),
            Locale::En => format!("Due soon ({} days left)", days),
        }
    }

    fn tooltip(&self, date: NaiveDate) -> String {
        match self {
            Locale::Ja => format!("次回審査予定日: {}", date.format("%Y-%m-%d")),
            Locale::En => format!("Next review: {}", date.format("%Y-%m-%d")),
        }
    }
}

/// Knobs for one annotation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnnotateOptions {
    pub policy: AlertPolicy,
    pub locale: Locale,
    /// Add a `title` tooltip with the review date to each badge cell
    pub tooltips: bool,
}

/// Overdue and due-soon totals for one scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlertCounts {
    pub critical: usize,
    pub warning: usize,
}

impl AlertCounts {
    pub fn record(&mut self, level: AlertLevel) {
        match level {
            AlertLevel::Critical => self.critical += 1,
            AlertLevel::Warning => self.warning += 1,
            AlertLevel::Normal => {}
        }
    }
}

/// Classification of one annotated row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowAlert {
    /// Zero-based position among the table body's rows
    pub row: usize,
    pub date_text: String,
    pub level: AlertLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_overdue: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_remaining: Option<i64>,
}

/// Result of annotating a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableAnnotation {
    pub table_id: String,
    pub today: NaiveDate,
    pub counts: AlertCounts,
    pub rows: Vec<RowAlert>,
}

/// Apply the four row decorations for `level`
pub fn apply_alert_style<D: Dom>(dom: &mut D, row: D::Node, level: AlertLevel) {
    let style = level.style();
    dom.set_style_property(row, "background-color", style.background_color);
    dom.set_style_property(row, "color", style.text_color);
    dom.set_style_property(row, "border-left", style.border_accent);
    dom.set_style_property(row, "font-weight", style.emphasis);
}

/// Badge markup for a classified date
///
/// Critical and Warning badges carry a day count; without a date to count
/// from (or for Normal) the neutral placeholder is rendered.
pub fn generate_alert_badge(
    level: AlertLevel,
    date: Option<NaiveDate>,
    today: NaiveDate,
    locale: Locale,
) -> String {
    match (level, date) {
        (AlertLevel::Critical, Some(date)) => format!(
            r#"<span class="alert-badge alert-critical">{}</span>"#,
            html_escape(&locale.overdue_label(calculate_days_overdue(date, today)))
        ),
        (AlertLevel::Warning, Some(date)) => format!(
            r#"<span class="alert-badge alert-warning">{}</span>"#,
            html_escape(&locale.due_soon_label(calculate_days_remaining(date, today)))
        ),
        _ => format!(
            r#"<span class="alert-badge alert-normal">{}</span>"#,
            EMPTY_DATE_PLACEHOLDER
        ),
    }
}

/// Attach a hover tooltip to an element
pub fn show_tooltip<D: Dom>(dom: &mut D, node: D::Node, message: &str) {
    dom.set_attribute(node, "title", message);
    dom.set_style_property(node, "cursor", "help");
}

/// Annotate every qualifying row of the table named by `spec`
///
/// Rows are skipped when they have no cell at the date column, or when that
/// cell is empty or holds the `-` placeholder. Skipped rows are not styled.
pub fn apply_alerts_to_table<D: Dom>(
    dom: &mut D,
    spec: &TableSpec,
    today: NaiveDate,
    options: &AnnotateOptions,
) -> Result<TableAnnotation, AnnotateError> {
    let table = dom.element_by_id(&spec.table_id).ok_or_else(|| {
        error!("Table not found: {}", spec.table_id);
        AnnotateError::MissingTable {
            table_id: spec.table_id.clone(),
        }
    })?;

    let tbody = dom.first_descendant_by_tag(table, "tbody").ok_or_else(|| {
        error!("Table body not found: {}", spec.table_id);
        AnnotateError::MissingTableBody {
            table_id: spec.table_id.clone(),
        }
    })?;

    let mut annotation = TableAnnotation {
        table_id: spec.table_id.clone(),
        today,
        counts: AlertCounts::default(),
        rows: Vec::new(),
    };

    for (index, row) in dom.descendants_by_tag(tbody, "tr").into_iter().enumerate() {
        let cells = dom.descendants_by_tag(row, "td");
        let Some(&date_cell) = cells.get(spec.date_column) else {
            debug!("row {}: only {} cell(s), skipping", index, cells.len());
            continue;
        };

        let date_text = dom.text_content(date_cell).trim().to_string();
        if date_text.is_empty() || date_text == EMPTY_DATE_PLACEHOLDER {
            continue;
        }

        let date = ReviewDate::parse(&date_text);
        if let ReviewDate::Invalid(text) = &date {
            warn!("row {}: unrecognized date {:?}, treating as normal", index, text);
        }
        let level = classify(&date, options.policy, today);

        apply_alert_style(dom, row, level);

        if let Some(&badge_cell) = cells.get(spec.date_column + 1) {
            let badge = generate_alert_badge(level, date.date(), today, options.locale);
            dom.set_inner_html(badge_cell, &badge);
            if options.tooltips {
                if let Some(d) = date.date() {
                    show_tooltip(dom, badge_cell, &options.locale.tooltip(d));
                }
            }
        }

        annotation.counts.record(level);
        annotation.rows.push(RowAlert {
            row: index,
            date_text,
            level,
            days_overdue: match level {
                AlertLevel::Critical => date.date().map(|d| calculate_days_overdue(d, today)),
                _ => None,
            },
            days_remaining: match level {
                AlertLevel::Warning => date.date().map(|d| calculate_days_remaining(d, today)),
                _ => None,
            },
        });
    }

    Ok(annotation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::html::parse_document;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        ymd(2025, 11, 20)
    }

    fn table(rows: &[(&str, &str)]) -> Document {
        let body: String = rows
            .iter()
            .map(|(date, badge)| format!("<tr><td>{}</td><td>{}</td></tr>", date, badge))
            .collect();
        parse_document(&format!(
            r#"<table id="t"><thead><tr><th>Date</th><th>Alert</th></tr></thead><tbody>{}</tbody></table>"#,
            body
        ))
        .unwrap()
    }

    #[test]
    fn test_badge_markup_japanese() {
        assert_eq!(
            generate_alert_badge(
                AlertLevel::Critical,
                Some(ymd(2025, 11, 15)),
                today(),
                Locale::Ja,
            ),
            r#"<span class="alert-badge alert-critical">★期限超過 (5日経過)★</span>"#
        );
        assert_eq!(
            generate_alert_badge(
                AlertLevel::Warning,
                Some(ymd(2025, 12, 10)),
                today(),
                Locale::Ja,
            ),
            r#"<span class="alert-badge alert-warning">期限間近 (残り20日)</span>"#
        );
        assert_eq!(
            generate_alert_badge(
                AlertLevel::Normal,
                Some(ymd(2026, 3, 1)),
                today(),
                Locale::Ja,
            ),
            r#"<span class="alert-badge alert-normal">-</span>"#
        );
    }

    #[test]
    fn test_badge_markup_english() {
        assert_eq!(
            generate_alert_badge(
                AlertLevel::Critical,
                Some(ymd(2025, 11, 15)),
                today(),
                Locale::En,
            ),
            r#"<span class="alert-badge alert-critical">Overdue (5 days)</span>"#
        );
    }

    #[test]
    fn test_badge_without_date_is_neutral() {
        assert_eq!(
            generate_alert_badge(AlertLevel::Critical, None, today(), Locale::Ja),
            r#"<span class="alert-badge alert-normal">-</span>"#
        );
    }

    #[test]
    fn test_missing_table() {
        let mut doc = table(&[("2025-11-15", "")]);
        let before = doc.to_html();
        let err = apply_alerts_to_table(
            &mut doc,
            &TableSpec::new("nope", 0),
            today(),
            &AnnotateOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            AnnotateError::MissingTable {
                table_id: "nope".to_string()
            }
        );
        assert_eq!(doc.to_html(), before);
    }

    #[test]
    fn test_missing_table_body() {
        let mut doc =
            parse_document(r#"<table id="t"><tr><td>2025-11-15</td><td></td></tr></table>"#)
                .unwrap();
        let before = doc.to_html();
        let err = apply_alerts_to_table(
            &mut doc,
            &TableSpec::new("t", 0),
            today(),
            &AnnotateOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnnotateError::MissingTableBody { .. }));
        assert_eq!(doc.to_html(), before);
    }

    #[test]
    fn test_counts_and_styles() {
        let mut doc = table(&[
            ("2025-11-15", ""),
            ("2025-12-10", ""),
            ("2026-03-01", ""),
            ("-", "keep"),
            ("", "keep"),
        ]);
        let result = apply_alerts_to_table(
            &mut doc,
            &TableSpec::new("t", 0),
            today(),
            &AnnotateOptions::default(),
        )
        .unwrap();

        assert_eq!(
            result.counts,
            AlertCounts {
                critical: 1,
                warning: 1
            }
        );
        assert_eq!(result.rows.len(), 3);
        assert_eq!(result.rows[0].days_overdue, Some(5));
        assert_eq!(result.rows[1].days_remaining, Some(20));
        assert_eq!(result.rows[2].level, AlertLevel::Normal);

        let t = doc.element_by_id("t").unwrap();
        let tbody = doc.first_descendant_by_tag(t, "tbody").unwrap();
        let rows = doc.descendants_by_tag(tbody, "tr");
        assert_eq!(
            doc.style_property(rows[0], "background-color").as_deref(),
            Some("#ffebee")
        );
        assert_eq!(
            doc.style_property(rows[1], "border-left").as_deref(),
            Some("4px solid #ef6c00")
        );
        assert_eq!(
            doc.style_property(rows[2], "font-weight").as_deref(),
            Some("normal")
        );
        assert!(doc.attribute(rows[3], "style").is_none());
        assert!(doc.attribute(rows[4], "style").is_none());

        let badge_cells = doc.descendants_by_tag(rows[3], "td");
        assert_eq!(doc.text_content(badge_cells[1]), "keep");
    }

    #[test]
    fn test_header_rows_outside_body_are_ignored() {
        let mut doc = table(&[("2025-11-15", "")]);
        apply_alerts_to_table(
            &mut doc,
            &TableSpec::new("t", 0),
            today(),
            &AnnotateOptions::default(),
        )
        .unwrap();
        let t = doc.element_by_id("t").unwrap();
        let header = doc.first_descendant_by_tag(t, "thead").unwrap();
        let header_row = doc.first_descendant_by_tag(header, "tr").unwrap();
        assert!(doc.attribute(header_row, "style").is_none());
    }

    #[test]
    fn test_rows_without_date_column_are_skipped() {
        let mut doc = table(&[("2025-11-15", "")]);
        let result = apply_alerts_to_table(
            &mut doc,
            &TableSpec::new("t", 5),
            today(),
            &AnnotateOptions::default(),
        )
        .unwrap();
        assert_eq!(result.counts, AlertCounts::default());
        assert!(result.rows.is_empty());
    }

    #[test]
    fn test_last_column_date_gets_no_badge() {
        let mut doc = table(&[("x", "2025-11-15")]);
        let result = apply_alerts_to_table(
            &mut doc,
            &TableSpec::new("t", 1),
            today(),
            &AnnotateOptions::default(),
        )
        .unwrap();
        assert_eq!(result.counts.critical, 1);
        assert!(!doc.to_html().contains("alert-badge"));
    }

    #[test]
    fn test_invalid_date_is_normal() {
        let mut doc = table(&[("someday", "")]);
        let result = apply_alerts_to_table(
            &mut doc,
            &TableSpec::new("t", 0),
            today(),
            &AnnotateOptions::default(),
        )
        .unwrap();
        assert_eq!(result.counts, AlertCounts::default());
        assert_eq!(result.rows[0].level, AlertLevel::Normal);
        assert!(doc.to_html().contains("alert-normal"));
    }

    #[test]
    fn test_browser_date_forms_are_classified() {
        let mut doc = table(&[("11/15/2025", ""), ("Dec 10, 2025", "")]);
        let result = apply_alerts_to_table(
            &mut doc,
            &TableSpec::new("t", 0),
            today(),
            &AnnotateOptions::default(),
        )
        .unwrap();
        assert_eq!(result.rows[0].level, AlertLevel::Critical);
        assert_eq!(result.rows[0].days_overdue, Some(5));
        assert_eq!(result.rows[1].level, AlertLevel::Warning);
        assert_eq!(result.rows[1].days_remaining, Some(20));
    }

    #[test]
    fn test_existing_row_style_survives() {
        let mut doc = parse_document(
            r#"<table id="t"><tbody><tr style="font-family: &quot;Meiryo&quot;"><td>2025-11-15</td><td></td></tr></tbody></table>"#,
        )
        .unwrap();
        apply_alerts_to_table(
            &mut doc,
            &TableSpec::new("t", 0),
            today(),
            &AnnotateOptions::default(),
        )
        .unwrap();
        assert!(doc.to_html().contains(
            r#"<tr style="font-family: &quot;Meiryo&quot;; background-color: #ffebee; color: #c62828; border-left: 4px solid #c62828; font-weight: bold">"#
        ));
    }

    #[test]
    fn test_tooltips() {
        let mut doc = table(&[("2025-11-15", "")]);
        let options = AnnotateOptions {
            tooltips: true,
            ..AnnotateOptions::default()
        };
        apply_alerts_to_table(&mut doc, &TableSpec::new("t", 0), today(), &options).unwrap();
        let html = doc.to_html();
        assert!(html.contains(r#"title="次回審査予定日: 2025-11-15""#));
        assert!(html.contains("cursor: help"));
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let mut doc = table(&[("2025-11-15", ""), ("2025-12-20", ""), ("2030-01-01", "")]);
        let spec = TableSpec::new("t", 0);
        let options = AnnotateOptions::default();

        let first = apply_alerts_to_table(&mut doc, &spec, today(), &options).unwrap();
        let after_first = doc.to_html();
        let second = apply_alerts_to_table(&mut doc, &spec, today(), &options).unwrap();

        assert_eq!(first, second);
        assert_eq!(doc.to_html(), after_first);
    }
}
