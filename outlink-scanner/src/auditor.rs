use crate::config::ScannerConfig;
use crate::crawler::ProgressCallback;
use crate::error::{ErrorLog, Result, ScanError};
use crate::http::FetchClient;
use crate::pool::WorkerPool;
use crate::result::{AuditMode, AuditResult, AuditedLink, ExternalLink};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Write-once audit results keyed by target URL.
///
/// Each URL gets one cell; the first worker to reach it performs the check
/// and any other worker asking for the same URL waits for that result.
#[derive(Clone, Default)]
pub struct AuditCache {
    entries: Arc<Mutex<HashMap<String, Arc<OnceCell<AuditResult>>>>>,
}

impl AuditCache {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, url: &str) -> Arc<OnceCell<AuditResult>> {
        let mut entries = self.entries.lock().await;
        entries.entry(url.to_string()).or_default().clone()
    }

    /// Number of URLs with a stored result
    pub async fn len(&self) -> usize {
        let entries = self.entries.lock().await;
        entries.values().filter(|cell| cell.initialized()).count()
    }
}

/// Result of the audit phase.
#[derive(Debug, Clone, Default)]
pub struct AuditReport {
    pub selected: HashSet<AuditedLink>,
    /// Distinct external URLs that were checked over the network
    pub checked: usize,
    pub cancelled: bool,
}

/// Checks the external links collected by a crawl.
pub struct LinkAuditor {
    client: FetchClient,
    config: ScannerConfig,
    cache: AuditCache,
    progress_callback: Option<ProgressCallback>,
    cancel: CancellationToken,
}

impl LinkAuditor {
    pub fn new(config: ScannerConfig) -> Result<Self> {
        let client = FetchClient::new(&config)?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: FetchClient, config: ScannerConfig) -> Self {
        Self {
            client,
            config,
            cache: AuditCache::new(),
            progress_callback: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Audits every pair and keeps those matching `mode`.
    ///
    /// In [`AuditMode::AllExternal`] nothing is checked and every pair is kept.
    pub async fn audit<I>(&self, links: I, mode: AuditMode, errors: &ErrorLog) -> AuditReport
    where
        I: IntoIterator<Item = ExternalLink>,
    {
        if !mode.requires_audit() {
            let selected = links
                .into_iter()
                .map(|link| AuditedLink {
                    page: link.page,
                    target: link.target,
                    redirect: None,
                })
                .collect();
            return AuditReport {
                selected,
                ..AuditReport::default()
            };
        }

        let mut queue: Vec<ExternalLink> = links.into_iter().collect();
        queue.sort();
        info!(
            "Auditing {} external links in {} mode with {} workers",
            queue.len(),
            mode,
            self.config.max_workers
        );

        let mut queue = queue.into_iter();
        let mut pool: WorkerPool<Option<AuditedLink>> =
            WorkerPool::new(self.config.max_workers, self.cancel.clone());
        let mut selected = HashSet::new();

        loop {
            while pool.has_capacity() {
                let Some(link) = queue.next() else {
                    break;
                };
                let client = self.client.clone();
                let cache = self.cache.clone();
                let progress = self.progress_callback.clone();
                let errors = errors.clone();
                pool.spawn(async move {
                    let result =
                        check_cached(&client, &cache, &link.target, progress, &errors).await;
                    mode.select(&link, &result)
                });
            }

            let Some(joined) = pool.join_next().await else {
                break;
            };

            match joined {
                Ok(Some(link)) => {
                    selected.insert(link);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("Audit worker failed: {}", e);
                    errors.record(&ScanError::Join(e)).await;
                }
            }
        }

        let checked = self.cache.len().await;
        info!(
            "Audit complete. Checked {} distinct links, kept {}",
            checked,
            selected.len()
        );

        AuditReport {
            selected,
            checked,
            cancelled: pool.is_cancelled(),
        }
    }
}

/// Returns the cached result for `url`, checking it over the network on first use.
async fn check_cached(
    client: &FetchClient,
    cache: &AuditCache,
    url: &str,
    progress: Option<ProgressCallback>,
    errors: &ErrorLog,
) -> AuditResult {
    let slot = cache.slot(url).await;
    slot.get_or_init(|| async move {
        if let Some(ref callback) = progress {
            callback(format!("\tVisiting link: {} ...", url));
        }
        match client.fetch_link_status(url).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Link check failed for {}: {}", url, e);
                errors.record(&e).await;
                AuditResult::failed()
            }
        }
    })
    .await
    .clone()
}
