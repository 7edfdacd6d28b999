//! Configuration file support for supplier alerts
//!
//! Loads project-specific configuration from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.supplieralertsrc.json` in project root
//! 3. `supplier-alerts.config.json` in project root
//! 4. `"supplierAlerts"` key in `package.json`
//!
//! All fields are optional. CLI flags take precedence over config file values.

use crate::alert::AlertPolicy;
use crate::annotate::{AnnotateOptions, Locale, TableSpec};
use crate::summary::SummaryTargets;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Upper bound for either warning window
const MAX_WINDOW_MONTHS: u32 = 120;

/// Supplier alerts configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlertsConfig {
    /// Id of the table to annotate (default: "supplierTable")
    #[serde(default)]
    pub table_id: Option<String>,

    /// Zero-based index of the review date column (default: 5)
    #[serde(default)]
    pub date_column: Option<usize>,

    /// Warning window for review dates in months (default: 1)
    #[serde(default)]
    pub review_window_months: Option<u32>,

    /// Warning window for ISO certificate expiry in months (default: 3)
    #[serde(default)]
    pub iso_window_months: Option<u32>,

    /// Summary display element ids
    #[serde(default)]
    pub summary: Option<SummaryConfig>,

    /// Badge language (default: "ja")
    #[serde(default)]
    pub locale: Option<Locale>,

    /// Add review-date tooltips to badge cells (default: false)
    #[serde(default)]
    pub tooltips: Option<bool>,
}

/// Summary element ids
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SummaryConfig {
    /// Element receiving the overdue count (default: "overdueCount")
    pub overdue_id: Option<String>,
    /// Element receiving the due-soon count (default: "dueSoonCount")
    pub due_soon_id: Option<String>,
}

/// Resolved configuration with defaults filled in
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub table: TableSpec,
    pub options: AnnotateOptions,
    pub iso_policy: AlertPolicy,
    pub summary: SummaryTargets,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

impl AlertsConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        if let Some(ref id) = self.table_id {
            if id.trim().is_empty() {
                anyhow::bail!("table_id must not be empty");
            }
        }

        for (name, val) in [
            ("review_window_months", self.review_window_months),
            ("iso_window_months", self.iso_window_months),
        ] {
            if let Some(v) = val {
                if v == 0 {
                    anyhow::bail!("{} must be at least 1 (got {})", name, v);
                }
                if v > MAX_WINDOW_MONTHS {
                    anyhow::bail!(
                        "{} must be at most {} (got {})",
                        name,
                        MAX_WINDOW_MONTHS,
                        v
                    );
                }
            }
        }

        if let Some(ref s) = self.summary {
            let overdue = s
                .overdue_id
                .as_deref()
                .unwrap_or(SummaryTargets::DEFAULT_OVERDUE_ID);
            let due_soon = s
                .due_soon_id
                .as_deref()
                .unwrap_or(SummaryTargets::DEFAULT_DUE_SOON_ID);

            if overdue.trim().is_empty() {
                anyhow::bail!("summary.overdue_id must not be empty");
            }
            if due_soon.trim().is_empty() {
                anyhow::bail!("summary.due_soon_id must not be empty");
            }
            if overdue == due_soon {
                anyhow::bail!(
                    "summary.overdue_id and summary.due_soon_id must differ (both {:?})",
                    overdue
                );
            }
        }

        Ok(())
    }

    /// Resolve config into the form the annotator consumes
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;

        let table = TableSpec::new(
            self.table_id
                .clone()
                .unwrap_or_else(|| TableSpec::DEFAULT_TABLE_ID.to_string()),
            self.date_column.unwrap_or(TableSpec::DEFAULT_DATE_COLUMN),
        );

        let options = AnnotateOptions {
            policy: self
                .review_window_months
                .map(AlertPolicy::new)
                .unwrap_or(AlertPolicy::REVIEW),
            locale: self.locale.unwrap_or_default(),
            tooltips: self.tooltips.unwrap_or(false),
        };

        let summary = match &self.summary {
            Some(s) => SummaryTargets {
                overdue_id: s
                    .overdue_id
                    .clone()
                    .unwrap_or_else(|| SummaryTargets::DEFAULT_OVERDUE_ID.to_string()),
                due_soon_id: s
                    .due_soon_id
                    .clone()
                    .unwrap_or_else(|| SummaryTargets::DEFAULT_DUE_SOON_ID.to_string()),
            },
            None => SummaryTargets::default(),
        };

        Ok(ResolvedConfig {
            table,
            options,
            iso_policy: self
                .iso_window_months
                .map(AlertPolicy::new)
                .unwrap_or(AlertPolicy::ISO_EXPIRY),
            summary,
            config_path: None,
        })
    }
}

impl ResolvedConfig {
    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Result<Self> {
        AlertsConfig::default().resolve()
    }
}

/// Discover and load a config file from the project root
///
/// Search order:
/// 1. `.supplieralertsrc.json`
/// 2. `supplier-alerts.config.json`
/// 3. `"supplierAlerts"` key in `package.json`
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(project_root: &Path) -> Result<Option<(AlertsConfig, PathBuf)>> {
    // 1. .supplieralertsrc.json
    let rc_path = project_root.join(".supplieralertsrc.json");
    if rc_path.exists() {
        let config = load_config_file(&rc_path)?;
        return Ok(Some((config, rc_path)));
    }

    // 2. supplier-alerts.config.json
    let config_path = project_root.join("supplier-alerts.config.json");
    if config_path.exists() {
        let config = load_config_file(&config_path)?;
        return Ok(Some((config, config_path)));
    }

    // 3. package.json "supplierAlerts" key
    let pkg_path = project_root.join("package.json");
    if pkg_path.exists() {
        if let Some(config) = load_from_package_json(&pkg_path)? {
            return Ok(Some((config, pkg_path)));
        }
    }

    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<AlertsConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: AlertsConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    Ok(config)
}

/// Load config from the "supplierAlerts" key in package.json
fn load_from_package_json(path: &Path) -> Result<Option<AlertsConfig>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let pkg: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    match pkg.get("supplierAlerts") {
        Some(value) => {
            let config: AlertsConfig = serde_json::from_value(value.clone())
                .with_context(|| format!("invalid supplierAlerts config in {}", path.display()))?;
            config
                .validate()
                .with_context(|| format!("invalid supplierAlerts config in {}", path.display()))?;
            Ok(Some(config))
        }
        None => Ok(None),
    }
}

/// Load and resolve config for a project
///
/// If `config_path` is provided, loads from that file.
/// Otherwise, discovers config from the project root.
/// Returns default config if nothing is found.
pub fn load_and_resolve(project_root: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(project_root)? {
            Some((config, path)) => (config, Some(path)),
            None => (AlertsConfig::default(), None),
        }
    };

    let mut resolved = config.resolve()?;
    resolved.config_path = source_path;
    Ok(resolved)
}
