use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Failed to scan page {url}: {source}")]
    FetchFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Page {url} is not an HTML document (Content-Type: {content_type})")]
    NonHtmlContent { url: String, content_type: String },

    #[error("Failed to scan page {url}, status code: {status}")]
    NonOkStatus { url: String, status: u16 },

    #[error("Failed to check link {url}: {source}")]
    AuditFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ScanError>;

/// Append-only list of failure descriptions collected during one run.
///
/// Cloning is cheap and every clone appends to the same list, so it can be
/// handed to worker tasks directly.
#[derive(Debug, Clone, Default)]
pub struct ErrorLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, message: impl Into<String>) {
        self.entries.lock().await.push(message.into());
    }

    pub async fn record(&self, error: &ScanError) {
        self.push(error.to_string()).await;
    }

    pub async fn snapshot(&self) -> Vec<String> {
        self.entries.lock().await.clone()
    }
}
