#[path = "handlers.rs"]
pub mod handlers;

pub use handlers::{parse_mode, parse_threads, resolve_output_dir};

// Re-export the pipeline from outlink-core
pub use outlink_core::crawl::{
    CrawlOptions, CrawlOutcome, execute_crawl, generate_crawl_report,
};
pub use outlink_core::report::{ReportFormat, write_report};
