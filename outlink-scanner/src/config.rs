use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_WORKERS: usize = 5;
pub const MAX_WORKERS: usize = 50;

/// Settings shared by the crawl and audit phases.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub timeout: Duration,
    pub user_agent: String,
    pub max_workers: usize,
}

impl ScannerConfig {
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Clamped to `1..=MAX_WORKERS`
    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers.clamp(1, MAX_WORKERS);
        self
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_workers: DEFAULT_WORKERS,
        }
    }
}
