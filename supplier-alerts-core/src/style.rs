//! Static presentation tables for alert levels, supplier status and rating
//!
//! All tables are compile-time constants. Unknown keys resolve through an
//! explicit fallback branch rather than a failed lookup.

use crate::alert::AlertLevel;
use serde::Serialize;

/// Row decoration applied for an alert level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AlertStyle {
    pub background_color: &'static str,
    pub text_color: &'static str,
    pub border_accent: &'static str,
    pub emphasis: &'static str,
}

const CRITICAL_STYLE: AlertStyle = AlertStyle {
    background_color: "#ffebee",
    text_color: "#c62828",
    border_accent: "4px solid #c62828",
    emphasis: "bold",
};

const WARNING_STYLE: AlertStyle = AlertStyle {
    background_color: "#fff3e0",
    text_color: "#ef6c00",
    border_accent: "4px solid #ef6c00",
    emphasis: "bold",
};

const NORMAL_STYLE: AlertStyle = AlertStyle {
    background_color: "#ffffff",
    text_color: "#333333",
    border_accent: "none",
    emphasis: "normal",
};

impl AlertLevel {
    pub fn style(&self) -> &'static AlertStyle {
        match self {
            AlertLevel::Critical => &CRITICAL_STYLE,
            AlertLevel::Warning => &WARNING_STYLE,
            AlertLevel::Normal => &NORMAL_STYLE,
        }
    }
}

/// Supplier registration status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SupplierStatus {
    Active,
    Suspended,
    Inactive,
}

impl SupplierStatus {
    /// Parse an exact status code (`ACTIVE`, `SUSPENDED`, `INACTIVE`)
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "ACTIVE" => Some(SupplierStatus::Active),
            "SUSPENDED" => Some(SupplierStatus::Suspended),
            "INACTIVE" => Some(SupplierStatus::Inactive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SupplierStatus::Active => "ACTIVE",
            SupplierStatus::Suspended => "SUSPENDED",
            SupplierStatus::Inactive => "INACTIVE",
        }
    }

    pub fn style(&self) -> &'static StatusStyle {
        match self {
            SupplierStatus::Active => &ACTIVE_STYLE,
            SupplierStatus::Suspended => &SUSPENDED_STYLE,
            SupplierStatus::Inactive => &INACTIVE_STYLE,
        }
    }
}

/// Color, icon and label shown for a supplier status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusStyle {
    pub color: &'static str,
    pub icon: &'static str,
    pub label: &'static str,
}

const ACTIVE_STYLE: StatusStyle = StatusStyle {
    color: "#4caf50",
    icon: "●",
    label: "有効",
};

const SUSPENDED_STYLE: StatusStyle = StatusStyle {
    color: "#f44336",
    icon: "■",
    label: "停止",
};

const INACTIVE_STYLE: StatusStyle = StatusStyle {
    color: "#9e9e9e",
    icon: "○",
    label: "無効",
};

/// Look up the display style for a status code
///
/// Codes are matched exactly. Anything unrecognized (including lowercase
/// spellings and `PENDING`) is shown with the ACTIVE style.
pub fn get_status_style(code: &str) -> &'static StatusStyle {
    match SupplierStatus::parse(code) {
        Some(status) => status.style(),
        None => SupplierStatus::Active.style(),
    }
}

/// Badge colors and label for a supplier rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RatingStyle {
    pub background_color: &'static str,
    pub color: &'static str,
    pub label: &'static str,
}

const RATING_EXCELLENT: RatingStyle = RatingStyle {
    background_color: "#4caf50",
    color: "#ffffff",
    label: "優良",
};

const RATING_GOOD: RatingStyle = RatingStyle {
    background_color: "#2196f3",
    color: "#ffffff",
    label: "良好",
};

const RATING_STANDARD: RatingStyle = RatingStyle {
    background_color: "#ff9800",
    color: "#ffffff",
    label: "標準",
};

const RATING_UNRATED: RatingStyle = RatingStyle {
    background_color: "#9e9e9e",
    color: "#ffffff",
    label: "未評価",
};

/// Look up the badge style for a rating (1 = best)
pub fn get_rating_style(rating: Option<i64>) -> &'static RatingStyle {
    match rating {
        Some(1) => &RATING_EXCELLENT,
        Some(2) => &RATING_GOOD,
        Some(3) => &RATING_STANDARD,
        _ => &RATING_UNRATED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_styles() {
        let critical = AlertLevel::Critical.style();
        assert_eq!(critical.background_color, "#ffebee");
        assert_eq!(critical.text_color, "#c62828");
        assert_eq!(critical.border_accent, "4px solid #c62828");
        assert_eq!(critical.emphasis, "bold");

        let normal = AlertLevel::Normal.style();
        assert_eq!(normal.border_accent, "none");
        assert_eq!(normal.emphasis, "normal");
    }

    #[test]
    fn test_known_statuses() {
        assert_eq!(get_status_style("SUSPENDED").icon, "■");
        assert_eq!(get_status_style("INACTIVE").label, "無効");
        assert_eq!(get_status_style("ACTIVE").color, "#4caf50");
    }

    #[test]
    fn test_unknown_status_falls_back_to_active() {
        let pending = get_status_style("PENDING");
        let active = get_status_style("ACTIVE");
        assert_eq!(pending, active);
        assert_eq!(
            (pending.color, pending.icon, pending.label),
            ("#4caf50", "●", "有効")
        );
        assert_eq!(get_status_style("suspended"), active);
        assert_eq!(get_status_style(""), active);
    }

    #[test]
    fn test_known_ratings() {
        assert_eq!(get_rating_style(Some(1)).label, "優良");
        assert_eq!(get_rating_style(Some(2)).background_color, "#2196f3");
        assert_eq!(get_rating_style(Some(3)).background_color, "#ff9800");
    }

    #[test]
    fn test_unknown_rating_is_unrated() {
        for rating in [Some(0), Some(-1), Some(4), Some(5), None] {
            let style = get_rating_style(rating);
            assert_eq!(style.label, "未評価");
            assert_eq!(style.background_color, "#9e9e9e");
        }
    }
}
