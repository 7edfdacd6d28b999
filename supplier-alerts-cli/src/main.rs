//! Supplier alerts CLI - review-date alerts for supplier master tables

// Global invariants enforced:
// - Deterministic output for a given input file and --today
// - A missing table never prevents the document from being written

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use supplier_alerts_core::alert::{calculate_days_overdue, calculate_days_remaining, classify};
use supplier_alerts_core::annotate::Locale;
use supplier_alerts_core::config::{self, ResolvedConfig};
use supplier_alerts_core::date::ReviewDate;
use supplier_alerts_core::style::SupplierStatus;
use supplier_alerts_core::{
    annotate_html, clock, get_rating_style, get_status_style, render_json, render_text, AlertLevel,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "supplier-alerts")]
#[command(about = "Color-code supplier master tables by review-date alerts")]
#[command(version = env!("SUPPLIER_ALERTS_VERSION"))]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides per target)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Annotate the supplier table in an HTML file
    Annotate {
        /// Path to the HTML file
        path: PathBuf,

        /// Output format
        #[arg(long, default_value = "html")]
        format: OutputFormat,

        /// Write output to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Id of the table to annotate (overrides config file)
        #[arg(long)]
        table_id: Option<String>,

        /// Zero-based date column index (overrides config file)
        #[arg(long)]
        date_column: Option<usize>,

        /// Date to classify against, YYYY-MM-DD (default: local today)
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Badge language (overrides config file)
        #[arg(long)]
        locale: Option<LocaleArg>,

        /// Add review-date tooltips to badge cells
        #[arg(long)]
        tooltips: bool,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Classify one or more dates without touching any document
    Classify {
        /// Dates to classify (free text, e.g. 2025-12-10)
        #[arg(required = true)]
        dates: Vec<String>,

        /// Which warning window to apply
        #[arg(long, default_value = "review")]
        policy: PolicyArg,

        /// Date to classify against, YYYY-MM-DD (default: local today)
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: ReportFormat,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Look up status or rating display styles
    Style {
        #[command(subcommand)]
        lookup: StyleLookup,
    },
    /// Validate a configuration file
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum StyleLookup {
    /// Style for a supplier status code (unknown codes fall back to ACTIVE)
    Status { code: String },
    /// Style for a supplier rating (anything but 1-3 is unrated)
    Rating {
        #[arg(allow_hyphen_values = true)]
        rating: Option<i64>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file without annotating anything
    Validate {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the resolved configuration (merged defaults + config file)
    Show {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, PartialEq, Debug, clap::ValueEnum)]
enum OutputFormat {
    Html,
    Text,
    Json,
}

#[derive(Clone, Copy, PartialEq, Debug, clap::ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, PartialEq, Debug, clap::ValueEnum)]
enum PolicyArg {
    Review,
    Iso,
}

#[derive(Clone, Copy, PartialEq, Debug, clap::ValueEnum)]
enum LocaleArg {
    Ja,
    En,
}

impl From<LocaleArg> for Locale {
    fn from(arg: LocaleArg) -> Self {
        match arg {
            LocaleArg::Ja => Locale::Ja,
            LocaleArg::En => Locale::En,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Annotate {
            path,
            format,
            output,
            table_id,
            date_column,
            today,
            locale,
            tooltips,
            config: config_path,
        } => {
            let normalized_path = if path.is_relative() {
                std::env::current_dir()?.join(&path)
            } else {
                path
            };

            if !normalized_path.is_file() {
                anyhow::bail!("File does not exist: {}", normalized_path.display());
            }

            let project_root = find_project_root(&normalized_path)?;
            let mut resolved = config::load_and_resolve(&project_root, config_path.as_deref())
                .context("failed to load configuration")?;

            if let Some(config_path) = &resolved.config_path {
                info!("Using config: {}", config_path.display());
            }

            // CLI flags override config file values
            if let Some(id) = table_id {
                resolved.table.table_id = id;
            }
            if let Some(column) = date_column {
                resolved.table.date_column = column;
            }
            if let Some(locale) = locale {
                resolved.options.locale = locale.into();
            }
            if tooltips {
                resolved.options.tooltips = true;
            }

            let today = today.unwrap_or_else(clock::today);
            let source = std::fs::read_to_string(&normalized_path)
                .with_context(|| format!("failed to read {}", normalized_path.display()))?;

            let annotated = annotate_html(&source, &resolved, today)
                .with_context(|| format!("failed to parse {}", normalized_path.display()))?;

            let rendered = match format {
                OutputFormat::Html => {
                    if let Err(e) = &annotated.outcome {
                        error!("{}; writing document unchanged", e);
                    }
                    annotated.to_html()
                }
                OutputFormat::Text | OutputFormat::Json => {
                    let annotation = annotated.outcome.as_ref().map_err(|e| {
                        anyhow::anyhow!("{} in {}", e, normalized_path.display())
                    })?;
                    if format == OutputFormat::Text {
                        render_text(annotation)
                    } else {
                        format!("{}\n", render_json(annotation))
                    }
                }
            };

            write_output(output.as_deref(), &rendered)?;
        }
        Commands::Classify {
            dates,
            policy,
            today,
            format,
            config: config_path,
        } => {
            let project_root = std::env::current_dir()?;
            let resolved = config::load_and_resolve(&project_root, config_path.as_deref())
                .context("failed to load configuration")?;

            let policy = match policy {
                PolicyArg::Review => resolved.options.policy,
                PolicyArg::Iso => resolved.iso_policy,
            };
            let today = today.unwrap_or_else(clock::today);

            let results: Vec<DateClassification> = dates
                .iter()
                .map(|input| {
                    let date = ReviewDate::parse(input);
                    let level = classify(&date, policy, today);
                    DateClassification {
                        input: input.clone(),
                        level,
                        days_overdue: date
                            .date()
                            .filter(|_| level == AlertLevel::Critical)
                            .map(|d| calculate_days_overdue(d, today)),
                        days_remaining: date
                            .date()
                            .filter(|_| level == AlertLevel::Warning)
                            .map(|d| calculate_days_remaining(d, today)),
                    }
                })
                .collect();

            match format {
                ReportFormat::Text => print!("{}", render_classifications(&results)),
                ReportFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&results)
                        .context("failed to serialize classifications")?
                ),
            }
        }
        Commands::Style { lookup } => {
            let json = match lookup {
                StyleLookup::Status { code } => {
                    if SupplierStatus::parse(&code).is_none() {
                        info!("Unknown status {:?}, showing ACTIVE style", code);
                    }
                    serde_json::to_string_pretty(get_status_style(&code))
                }
                StyleLookup::Rating { rating } => {
                    serde_json::to_string_pretty(get_rating_style(rating))
                }
            }
            .context("failed to serialize style")?;
            println!("{}", json);
        }
        Commands::Config { action } => match action {
            ConfigAction::Validate { path } => {
                let project_root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&project_root, path.as_deref());

                match resolved {
                    Ok(config) => {
                        if let Some(ref p) = config.config_path {
                            println!("Config valid: {}", p.display());
                        } else {
                            println!("No config file found. Using defaults.");
                        }
                    }
                    Err(e) => {
                        eprintln!("Config validation failed: {:#}", e);
                        std::process::exit(1);
                    }
                }
            }
            ConfigAction::Show { path } => {
                let project_root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&project_root, path.as_deref())
                    .context("failed to load configuration")?;
                print!("{}", render_config(&resolved));
            }
        },
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    // Logs go to stderr; stdout carries the annotated document or report
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_target(false),
        )
        .with(EnvFilter::from_default_env().add_directive(default_level.into()))
        .init();
}

#[derive(Debug, serde::Serialize)]
struct DateClassification {
    input: String,
    level: AlertLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    days_overdue: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    days_remaining: Option<i64>,
}

fn render_classifications(results: &[DateClassification]) -> String {
    let mut output = String::new();
    for r in results {
        let days = match (r.days_overdue, r.days_remaining) {
            (Some(d), _) => format!("{} days overdue", d),
            (_, Some(d)) => format!("{} days remaining", d),
            _ => "-".to_string(),
        };
        output.push_str(&format!("{:<20} {:<10} {}\n", r.input, r.level.as_str(), days));
    }
    output
}

fn render_config(resolved: &ResolvedConfig) -> String {
    let mut out = String::new();
    out.push_str("Configuration:\n");
    match &resolved.config_path {
        Some(p) => out.push_str(&format!("  Source: {}\n", p.display())),
        None => out.push_str("  Source: defaults (no config file found)\n"),
    }
    out.push('\n');
    out.push_str("Table:\n");
    out.push_str(&format!("  table_id: {}\n", resolved.table.table_id));
    out.push_str(&format!("  date_column: {}\n", resolved.table.date_column));
    out.push('\n');
    out.push_str("Windows:\n");
    out.push_str(&format!(
        "  review_window_months: {}\n",
        resolved.options.policy.window_months
    ));
    out.push_str(&format!(
        "  iso_window_months: {}\n",
        resolved.iso_policy.window_months
    ));
    out.push('\n');
    out.push_str("Summary:\n");
    out.push_str(&format!("  overdue_id: {}\n", resolved.summary.overdue_id));
    out.push_str(&format!("  due_soon_id: {}\n", resolved.summary.due_soon_id));
    out.push('\n');
    out.push_str("Badges:\n");
    out.push_str(&format!(
        "  locale: {}\n",
        match resolved.options.locale {
            Locale::Ja => "ja",
            Locale::En => "en",
        }
    ));
    out.push_str(&format!("  tooltips: {}\n", resolved.options.tooltips));
    out
}

fn write_output(path: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("failed to create directory {}", parent.display())
                    })?;
                }
            }
            std::fs::write(path, content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}

/// Directory config discovery starts from: the enclosing git root if any,
/// otherwise the input file's directory
fn find_project_root(file: &Path) -> anyhow::Result<PathBuf> {
    let start = file
        .parent()
        .ok_or_else(|| anyhow::anyhow!("invalid file path"))?
        .to_path_buf();

    let mut current = start.clone();
    loop {
        if current.join(".git").exists() {
            return Ok(current);
        }
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return Ok(start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_annotate_flags() {
        let cli = Cli::try_parse_from([
            "supplier-alerts",
            "annotate",
            "list.html",
            "--format",
            "json",
            "--today",
            "2025-11-20",
            "--date-column",
            "4",
            "--locale",
            "en",
        ])
        .unwrap();

        match cli.command {
            Commands::Annotate {
                format,
                today,
                date_column,
                locale,
                tooltips,
                ..
            } => {
                assert_eq!(format, OutputFormat::Json);
                assert_eq!(today, NaiveDate::from_ymd_opt(2025, 11, 20));
                assert_eq!(date_column, Some(4));
                assert_eq!(locale, Some(LocaleArg::En));
                assert!(!tooltips);
            }
            _ => panic!("expected annotate"),
        }
    }

    #[test]
    fn test_reject_bad_today() {
        let result = Cli::try_parse_from([
            "supplier-alerts",
            "classify",
            "2025-12-01",
            "--today",
            "20/11/2025",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_classify_requires_dates() {
        let result = Cli::try_parse_from(["supplier-alerts", "classify"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_render_classifications() {
        let rows = vec![
            DateClassification {
                input: "2025-11-15".to_string(),
                level: AlertLevel::Critical,
                days_overdue: Some(5),
                days_remaining: None,
            },
            DateClassification {
                input: "bogus".to_string(),
                level: AlertLevel::Normal,
                days_overdue: None,
                days_remaining: None,
            },
        ];
        let text = render_classifications(&rows);
        assert!(text.contains("critical   5 days overdue"));
        assert!(text.lines().nth(1).unwrap().ends_with(" -"));
    }

    #[test]
    fn test_render_default_config() {
        let resolved = ResolvedConfig::defaults().unwrap();
        let text = render_config(&resolved);
        assert!(text.contains("table_id: supplierTable"));
        assert!(text.contains("date_column: 5"));
        assert!(text.contains("iso_window_months: 3"));
        assert!(text.contains("locale: ja"));
    }

    #[test]
    fn test_project_root_falls_back_to_file_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("list.html");
        std::fs::write(&file, "<p></p>").unwrap();
        let root = find_project_root(&file).unwrap();
        assert!(root == dir.path() || root.join(".git").exists());
    }
}
