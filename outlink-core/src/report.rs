// Report persistence for finished runs

use crate::crawl::CrawlOutcome;
use chrono::{DateTime, Local};
use outlink_scanner::AuditMode;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Csv,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Some(ReportFormat::Csv),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Json => "json",
        }
    }
}

pub fn mode_folder(mode: AuditMode) -> &'static str {
    match mode {
        AuditMode::AllExternal => "external_links",
        AuditMode::Broken => "broken_links",
        AuditMode::Redirected => "redirected_links",
    }
}

/// Folder name for a site: the seed without its scheme, `/` replaced by `-`
/// and `:` by `_`
pub fn site_folder(seed: &str) -> String {
    let seed = seed.trim().trim_end_matches('/');
    let without_scheme = seed.rsplit("//").next().unwrap_or(seed);
    without_scheme.replace('/', "-").replace(':', "_")
}

/// `<root>/<site>/<mode>/<timestamp>.<ext>`
pub fn report_path(
    output_root: &Path,
    seed: &str,
    mode: AuditMode,
    format: ReportFormat,
    timestamp: DateTime<Local>,
) -> PathBuf {
    output_root
        .join(site_folder(seed))
        .join(mode_folder(mode))
        .join(format!(
            "{}.{}",
            timestamp.format("%Y-%m-%d-%H-%M-%S"),
            format.extension()
        ))
}

/// Escapes a field for CSV according to RFC 4180
fn escape_csv(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
    {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub fn generate_csv_report(outcome: &CrawlOutcome) -> String {
    let mut report = String::new();

    let header: Vec<String> = outcome.columns.iter().map(|c| escape_csv(c)).collect();
    report.push_str(&header.join(","));
    report.push('\n');

    for row in &outcome.rows {
        let cells: Vec<String> = row
            .cells(outcome.mode)
            .iter()
            .map(|c| escape_csv(c))
            .collect();
        report.push_str(&cells.join(","));
        report.push('\n');
    }

    report
}

pub fn generate_json_report(outcome: &CrawlOutcome) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "outlink",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "site": outcome.seed,
            "mode": {
                "number": outcome.mode.number(),
                "name": outcome.mode.to_string()
            },
            "summary": outcome.summary,
            "columns": outcome.columns,
            "rows": outcome.rows,
            "errors": outcome.errors
        }
    });

    serde_json::to_string_pretty(&json_report)
}

/// Writes `content` to `path`, creating parent directories. An existing
/// file is left alone and reported as `AlreadyExists`.
pub fn save_report(content: &str, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create_new(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Renders and saves the outcome under `output_root`. Returns the written path.
pub fn write_report(
    outcome: &CrawlOutcome,
    output_root: &Path,
    format: ReportFormat,
) -> io::Result<PathBuf> {
    let path = report_path(output_root, &outcome.seed, outcome.mode, format, Local::now());
    let content = match format {
        ReportFormat::Csv => generate_csv_report(outcome),
        ReportFormat::Json => generate_json_report(outcome)?,
    };

    save_report(&content, &path)?;
    info!(
        "Report with {} rows saved to {}",
        outcome.rows.len(),
        path.display()
    );
    Ok(path)
}
