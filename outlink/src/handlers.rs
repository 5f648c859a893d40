use anyhow::Context;
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use outlink_core::crawl::{CrawlOptions, CrawlOutcome, execute_crawl, generate_crawl_report};
use outlink_core::report::{ReportFormat, write_report};
use outlink_scanner::config::MAX_WORKERS;
use outlink_scanner::{AuditMode, ProgressCallback};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

// Helper functions for the audit handler

/// Parses `-m/--mode`: a mode number or its name
pub fn parse_mode(value: &str) -> Result<AuditMode, String> {
    value.parse::<AuditMode>()
}

/// Parses `-t/--threads`, which must be between 1 and the worker ceiling
pub fn parse_threads(value: &str) -> Result<usize, String> {
    let threads: usize = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if !(1..=MAX_WORKERS).contains(&threads) {
        return Err(format!(
            "thread count must be between 1 and {}, got {}",
            MAX_WORKERS, threads
        ));
    }
    Ok(threads)
}

/// Expands `~` in the output directory
pub fn resolve_output_dir(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

pub fn print_banner() {
    println!(
        "{} {}",
        "outlink".bright_cyan().bold(),
        env!("CARGO_PKG_VERSION").dimmed()
    );
    println!("{}", "external, broken and redirected link audits".dimmed());
    println!();
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

/// Logs go to stderr so they never mix with the table on stdout.
fn init_logging(quiet: bool) {
    let filter = if quiet { "error" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_errors(errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    println!("{}", format!("Errors ({}):", errors.len()).red().bold());
    for error in errors {
        println!("  {} {}", "✗".red(), error);
    }
    println!();
}

fn progress_spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Cancels the run on the first Ctrl-C. In-flight requests finish, nothing new starts.
fn cancel_on_ctrl_c(cancel: CancellationToken, spinner: ProgressBar) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            spinner.println(format!(
                "{}",
                "Interrupted, waiting for in-flight requests...".yellow()
            ));
            cancel.cancel();
        }
    });
}

fn save_outcome(outcome: &CrawlOutcome, output_dir: &str, format: ReportFormat) -> anyhow::Result<()> {
    let output_root = resolve_output_dir(output_dir);
    match write_report(outcome, &output_root, format) {
        Ok(path) => {
            println!("{} Report saved to {}", "✓".green(), path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            warn!("Report file already exists, leaving it untouched");
            println!(
                "{} A report for this second already exists, nothing was overwritten",
                "⚠".yellow()
            );
            Ok(())
        }
        Err(e) => Err(e).with_context(|| {
            format!("Failed to save report under {}", output_root.display())
        }),
    }
}

pub async fn handle_audit(sub_matches: &ArgMatches, quiet: bool) -> anyhow::Result<()> {
    init_logging(quiet);

    let url = sub_matches
        .get_one::<String>("url")
        .context("--url is required")?;
    let mode = sub_matches
        .get_one::<AuditMode>("mode")
        .copied()
        .unwrap_or(AuditMode::AllExternal);
    let threads = sub_matches.get_one::<usize>("threads").copied().unwrap_or(5);
    let timeout_secs = sub_matches.get_one::<u64>("timeout").copied().unwrap_or(5);
    let output_dir = sub_matches
        .get_one::<String>("output")
        .map(String::as_str)
        .unwrap_or("output");
    let format = sub_matches
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Csv);
    let no_save = sub_matches.get_flag("no-save");

    if !quiet {
        print_divider();
        println!("Site:    {}", url.bright_white().bold());
        println!("Mode:    {} ({})", mode.number(), mode);
        println!("Workers: {}", threads);
        println!("Timeout: {}s", timeout_secs);
        print_divider();
        println!();
    }

    let spinner = progress_spinner(quiet);
    spinner.set_message("Crawling...");

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone(), spinner.clone());

    let progress_bar = spinner.clone();
    let progress_callback: ProgressCallback = Arc::new(move |message: String| {
        progress_bar.println(&message);
    });

    let options = CrawlOptions {
        threads,
        timeout_secs,
        ..CrawlOptions::new(url.as_str(), mode)
    };

    let result = execute_crawl(options, Some(progress_callback), Some(cancel)).await;
    spinner.finish_and_clear();
    let outcome = result.context("Audit could not start")?;

    print_errors(&outcome.errors);
    print!("{}", generate_crawl_report(&outcome));

    if outcome.is_empty() || no_save {
        return Ok(());
    }

    println!();
    save_outcome(&outcome, output_dir, format)
}
