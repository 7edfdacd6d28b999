//! Summary count display
//!
//! Writes the overdue and due-soon totals into two designated elements.

use crate::alert::AlertLevel;
use crate::annotate::AlertCounts;
use crate::dom::Dom;
use tracing::debug;

/// Element ids of the two summary displays
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryTargets {
    pub overdue_id: String,
    pub due_soon_id: String,
}

impl SummaryTargets {
    pub const DEFAULT_OVERDUE_ID: &'static str = "overdueCount";
    pub const DEFAULT_DUE_SOON_ID: &'static str = "dueSoonCount";
}

impl Default for SummaryTargets {
    fn default() -> Self {
        SummaryTargets {
            overdue_id: Self::DEFAULT_OVERDUE_ID.to_string(),
            due_soon_id: Self::DEFAULT_DUE_SOON_ID.to_string(),
        }
    }
}

/// Write both counts; positive counts take the matching alert color
///
/// A zero count removes any color left by an earlier pass. Missing target
/// elements are skipped.
pub fn update_summary_counts<D: Dom>(dom: &mut D, counts: &AlertCounts, targets: &SummaryTargets) {
    write_count(dom, &targets.overdue_id, counts.critical, AlertLevel::Critical);
    write_count(dom, &targets.due_soon_id, counts.warning, AlertLevel::Warning);
}

fn write_count<D: Dom>(dom: &mut D, element_id: &str, count: usize, level: AlertLevel) {
    let Some(node) = dom.element_by_id(element_id) else {
        debug!("summary element {} not present", element_id);
        return;
    };

    dom.set_text_content(node, &count.to_string());
    if count > 0 {
        dom.set_style_property(node, "color", level.style().text_color);
    } else {
        dom.remove_style_property(node, "color");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_document;

    const PAGE: &str = r#"<p>Overdue: <span id="overdueCount">?</span> Due soon: <span id="dueSoonCount">?</span></p>"#;

    #[test]
    fn test_positive_counts_are_colored() {
        let mut doc = parse_document(PAGE).unwrap();
        update_summary_counts(
            &mut doc,
            &AlertCounts {
                critical: 3,
                warning: 2,
            },
            &SummaryTargets::default(),
        );

        let overdue = doc.element_by_id("overdueCount").unwrap();
        let due_soon = doc.element_by_id("dueSoonCount").unwrap();
        assert_eq!(doc.text_content(overdue), "3");
        assert_eq!(doc.text_content(due_soon), "2");
        assert_eq!(doc.style_property(overdue, "color").as_deref(), Some("#c62828"));
        assert_eq!(doc.style_property(due_soon, "color").as_deref(), Some("#ef6c00"));
    }

    #[test]
    fn test_zero_counts_use_default_color() {
        let mut doc = parse_document(PAGE).unwrap();
        let targets = SummaryTargets::default();
        update_summary_counts(
            &mut doc,
            &AlertCounts {
                critical: 1,
                warning: 1,
            },
            &targets,
        );
        update_summary_counts(&mut doc, &AlertCounts::default(), &targets);

        let overdue = doc.element_by_id("overdueCount").unwrap();
        assert_eq!(doc.text_content(overdue), "0");
        assert!(doc.style_property(overdue, "color").is_none());
        assert!(doc.to_html().contains(r#"<span id="overdueCount">0</span>"#));
    }

    #[test]
    fn test_missing_targets_are_skipped() {
        let mut doc = parse_document("<p>no summary here</p>").unwrap();
        update_summary_counts(
            &mut doc,
            &AlertCounts {
                critical: 1,
                warning: 0,
            },
            &SummaryTargets::default(),
        );
        assert_eq!(doc.to_html(), "<p>no summary here</p>");
    }
}
