pub mod aggregate;
pub mod crawl;
pub mod report;
pub mod seed;

pub use aggregate::{ResultRow, aggregate, columns_for};
pub use crawl::{CrawlOptions, CrawlOutcome, CrawlSummary, execute_crawl, generate_crawl_report};
pub use report::{ReportFormat, write_report};
pub use seed::validate_seed_url;
