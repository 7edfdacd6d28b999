//! Supplier alerts core library - review-date alerts for supplier master tables

// Global invariants enforced in this crate:
// - "Today" is always passed in; only `clock::today` reads the wall clock
// - Lookup tables are immutable statics
// - A failed table lookup never mutates the document
// - Identical input and date yield byte-for-byte identical output

pub mod alert;
pub mod annotate;
pub mod clock;
pub mod config;
pub mod date;
pub mod dom;
pub mod html;
pub mod report;
pub mod style;
pub mod summary;

pub use alert::{
    calculate_days_overdue, calculate_days_remaining, determine_alert_level,
    determine_iso_expiry_alert, AlertLevel, AlertPolicy,
};
pub use annotate::{
    apply_alert_style, apply_alerts_to_table, generate_alert_badge, AlertCounts, AnnotateError,
    TableAnnotation, TableSpec,
};
pub use config::ResolvedConfig;
pub use dom::{Document, Dom};
pub use report::{render_json, render_text};
pub use style::{get_rating_style, get_status_style};
pub use summary::update_summary_counts;

use anyhow::Result;
use chrono::NaiveDate;
use tracing::info;

/// Annotate the configured table and refresh the summary counts
///
/// This is the entry point an embedding page calls once its content is ready.
/// On `MissingTable`/`MissingTableBody` nothing is mutated, including the
/// summary elements.
pub fn apply_default_alerts<D: Dom>(
    dom: &mut D,
    config: &ResolvedConfig,
    today: NaiveDate,
) -> Result<TableAnnotation, AnnotateError> {
    let annotation = apply_alerts_to_table(dom, &config.table, today, &config.options)?;
    update_summary_counts(dom, &annotation.counts, &config.summary);

    info!(
        "Alerts applied: {} critical, {} warning",
        annotation.counts.critical, annotation.counts.warning
    );

    Ok(annotation)
}

/// A parsed document after an annotation pass
#[derive(Debug)]
pub struct AnnotatedDocument {
    pub document: Document,
    pub outcome: Result<TableAnnotation, AnnotateError>,
}

impl AnnotatedDocument {
    pub fn to_html(&self) -> String {
        self.document.to_html()
    }
}

/// Parse an HTML document, annotate it, and keep the result for serialization
///
/// Parse failures are errors; annotation failures are carried in `outcome`
/// with the document left as parsed.
pub fn annotate_html(
    source: &str,
    config: &ResolvedConfig,
    today: NaiveDate,
) -> Result<AnnotatedDocument> {
    let mut document = html::parse_document(source)?;
    let outcome = apply_default_alerts(&mut document, config, today);
    Ok(AnnotatedDocument { document, outcome })
}
