use crate::aggregate::{ResultRow, aggregate, columns_for};
use crate::seed::validate_seed_url;
use outlink_scanner::config::MAX_WORKERS;
use outlink_scanner::http::FetchClient;
use outlink_scanner::{
    AuditMode, Crawler, ErrorLog, LinkAuditor, ProgressCallback, ScanError, ScannerConfig,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Options for configuring a crawl-and-audit run
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub url: String,
    pub mode: AuditMode,
    pub threads: usize,
    pub timeout_secs: u64,
}

impl CrawlOptions {
    pub fn new(url: impl Into<String>, mode: AuditMode) -> Self {
        let defaults = ScannerConfig::default();
        Self {
            url: url.into(),
            mode,
            threads: defaults.max_workers,
            timeout_secs: defaults.timeout.as_secs(),
        }
    }

    /// Rejects worker counts outside `1..=MAX_WORKERS` and a zero timeout.
    pub fn validate(&self) -> Result<(), ScanError> {
        if !(1..=MAX_WORKERS).contains(&self.threads) {
            return Err(ScanError::InvalidOption(format!(
                "thread count must be between 1 and {}, got {}",
                MAX_WORKERS, self.threads
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ScanError::InvalidOption(
                "timeout must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }

    fn scanner_config(&self) -> ScannerConfig {
        ScannerConfig::default()
            .with_max_workers(self.threads)
            .with_timeout_secs(self.timeout_secs)
    }
}

/// Counters describing a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub pages_visited: usize,
    pub external_links: usize,
    pub links_checked: usize,
    pub rows: usize,
    pub cancelled: bool,
}

/// Rows, headers and the error log of one run
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub seed: String,
    pub mode: AuditMode,
    pub columns: Vec<String>,
    pub rows: Vec<ResultRow>,
    pub errors: Vec<String>,
    pub summary: CrawlSummary,
}

impl CrawlOutcome {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Crawls the whole site, audits its external links when the mode asks for
/// it, and returns the aggregated table.
///
/// The seed and options are validated before anything touches the network;
/// those are the only errors this returns. Per-page and per-link failures end
/// up in [`CrawlOutcome::errors`].
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<ProgressCallback>,
    cancel: Option<CancellationToken>,
) -> Result<CrawlOutcome, ScanError> {
    options.validate()?;
    let seed = validate_seed_url(&options.url)?;
    let config = options.scanner_config();
    let cancel = cancel.unwrap_or_default();
    let client = FetchClient::new(&config)?;
    let errors = ErrorLog::new();

    info!(
        "Running outlink on {} in {} mode (mode {})",
        seed,
        options.mode,
        options.mode.number()
    );

    let mut crawler =
        Crawler::with_client(client.clone(), config.clone()).with_cancellation(cancel.clone());
    let mut auditor = LinkAuditor::with_client(client, config).with_cancellation(cancel);
    if let Some(callback) = progress_callback {
        crawler = crawler.with_progress_callback(callback.clone());
        auditor = auditor.with_progress_callback(callback);
    }

    let crawl = crawler.crawl(seed.as_str(), &errors).await?;
    let external_links = crawl.external_links.len();

    // The audit phase only starts once the crawl has fully drained
    let audit = auditor
        .audit(crawl.external_links, options.mode, &errors)
        .await;

    let rows = aggregate(audit.selected);
    let summary = CrawlSummary {
        pages_visited: crawl.visited.len(),
        external_links,
        links_checked: audit.checked,
        rows: rows.len(),
        cancelled: crawl.cancelled || audit.cancelled,
    };

    Ok(CrawlOutcome {
        seed: options.url.trim().to_string(),
        mode: options.mode,
        columns: columns_for(options.mode),
        rows,
        errors: errors.snapshot().await,
        summary,
    })
}

/// Plain-text rendering of a finished run for terminals
pub fn generate_crawl_report(outcome: &CrawlOutcome) -> String {
    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Site: {}\n", outcome.seed));
    report.push_str(&format!(
        "  Mode: {} ({})\n",
        outcome.mode.number(),
        outcome.mode
    ));
    report.push_str(&format!("  Pages crawled: {}\n", outcome.summary.pages_visited));
    report.push_str(&format!(
        "  External links found: {}\n",
        outcome.summary.external_links
    ));
    if outcome.mode.requires_audit() {
        report.push_str(&format!(
            "  Distinct links checked: {}\n",
            outcome.summary.links_checked
        ));
    }
    report.push_str(&format!("  Rows: {}\n", outcome.summary.rows));
    report.push_str(&format!("  Errors: {}\n", outcome.errors.len()));
    if outcome.summary.cancelled {
        report.push_str("  Cancelled before completion\n");
    }

    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    if outcome.rows.is_empty() {
        report.push_str("No links found. No report will be generated.\n");
        return report;
    }

    report.push_str(&outcome.columns.join(" | "));
    report.push('\n');
    for row in &outcome.rows {
        report.push_str(&row.cells(outcome.mode).join(" | "));
        report.push('\n');
    }

    report
}
