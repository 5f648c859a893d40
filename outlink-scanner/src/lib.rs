pub mod auditor;
pub mod config;
pub mod crawler;
pub mod error;
pub mod extract;
pub mod frontier;
pub mod http;
pub mod pool;
pub mod result;

pub use auditor::{AuditCache, AuditReport, LinkAuditor};
pub use config::ScannerConfig;
pub use crawler::{CrawlReport, Crawler, ProgressCallback};
pub use error::{ErrorLog, ScanError};
pub use result::{AuditMode, AuditResult, AuditedLink, ExternalLink, PageLinks};
