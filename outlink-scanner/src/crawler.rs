use crate::config::ScannerConfig;
use crate::error::{ErrorLog, Result, ScanError};
use crate::extract::{extract_links, normalize_page_url};
use crate::frontier::Frontier;
use crate::http::FetchClient;
use crate::pool::WorkerPool;
use crate::result::{ExternalLink, PageLinks};
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

/// Receives human-readable progress lines from any worker.
pub type ProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Everything the crawl phase found.
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Normalized URLs of every page that was fetched (or attempted)
    pub visited: HashSet<String>,
    pub external_links: HashSet<ExternalLink>,
    pub cancelled: bool,
}

/// Breadth-first crawler over a single site.
pub struct Crawler {
    client: FetchClient,
    config: ScannerConfig,
    progress_callback: Option<ProgressCallback>,
    cancel: CancellationToken,
}

impl Crawler {
    pub fn new(config: ScannerConfig) -> Result<Self> {
        let client = FetchClient::new(&config)?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: FetchClient, config: ScannerConfig) -> Self {
        Self {
            client,
            config,
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

    /// Crawls every page reachable from `start_url` inside its site.
    ///
    /// Per-page failures land in `errors`; only an unparsable start URL fails
    /// the call.
    pub async fn crawl(&self, start_url: &str, errors: &ErrorLog) -> Result<CrawlReport> {
        let parsed = Url::parse(start_url)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", start_url, e)))?;
        if parsed.host_str().is_none() {
            return Err(ScanError::InvalidUrl(format!("{}: missing host", start_url)));
        }

        info!(
            "Starting crawl of {} with {} workers",
            start_url, self.config.max_workers
        );

        let mut frontier = Frontier::new();
        frontier.push(normalize_page_url(start_url));

        let mut pool: WorkerPool<(String, Result<PageLinks>)> =
            WorkerPool::new(self.config.max_workers, self.cancel.clone());
        let mut external_links = HashSet::new();

        loop {
            while pool.has_capacity() {
                let Some(url) = frontier.claim() else {
                    break;
                };
                self.report_progress(format!("Scanning page: {} ...", url));

                let client = self.client.clone();
                pool.spawn(async move {
                    let links = client.fetch_page(&url).await.map(|page| {
                        debug!("Parsing {} ({})", url, page.content_type);
                        extract_links(&url, &page.body)
                    });
                    (url, links)
                });
            }

            let Some(joined) = pool.join_next().await else {
                break;
            };

            match joined {
                Ok((url, Ok(links))) => {
                    let added = frontier.extend(links.internal);
                    debug!(
                        "{}: {} new pages, {} external links",
                        url,
                        added,
                        links.external.len()
                    );
                    external_links.extend(links.external);
                }
                Ok((url, Err(e))) => {
                    warn!("Crawl error for {}: {}", url, e);
                    errors.record(&e).await;
                }
                Err(e) => {
                    warn!("Crawl worker failed: {}", e);
                    errors.record(&ScanError::Join(e)).await;
                }
            }
        }

        let cancelled = pool.is_cancelled();
        if cancelled {
            info!(
                "Crawl cancelled with {} pages still pending",
                frontier.pending_len()
            );
        }
        info!(
            "Crawl complete. Visited {} pages, found {} external links",
            frontier.visited_len(),
            external_links.len()
        );

        Ok(CrawlReport {
            visited: frontier.into_visited(),
            external_links,
            cancelled,
        })
    }

    fn report_progress(&self, message: String) {
        if let Some(ref callback) = self.progress_callback {
            callback(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    async fn mount_html(server: &MockServer, route: &str, html: String) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
            .expect(1)
            .mount(server)
            .await;
    }

    /// Pages link to each other in a cycle; each must be fetched exactly once
    #[tokio::test]
    async fn test_each_page_fetched_once() {
        let mock_server = MockServer::start().await;
        let base = mock_server.uri();

        mount_html(
            &mock_server,
            "/",
            format!(
                r#"<a href="{base}/a">A</a><a href="/b/">B</a><a href="https://external.invalid/x">X</a>"#
            ),
        )
        .await;
        mount_html(
            &mock_server,
            "/a",
            format!(r#"<a href="{base}/">Home</a><a href="/b#section">B</a>"#),
        )
        .await;
        mount_html(
            &mock_server,
            "/b",
            r#"<a href="/a">A</a><a href="/">Home</a>"#.to_string(),
        )
        .await;

        let crawler = Crawler::new(ScannerConfig::default().with_max_workers(4)).unwrap();
        let errors = ErrorLog::new();
        let report = crawler.crawl(&base, &errors).await.unwrap();

        assert_eq!(report.visited.len(), 3);
        assert!(report.visited.contains(&base));
        assert!(report.visited.contains(&format!("{base}/a")));
        assert!(report.visited.contains(&format!("{base}/b")));
        assert_eq!(
            report.external_links,
            HashSet::from([ExternalLink::new(base.clone(), "https://external.invalid/x")])
        );
        assert!(errors.snapshot().await.is_empty());
        assert!(!report.cancelled);
    }

    #[tokio::test]
    async fn test_failed_pages_are_logged_and_skipped() {
        let mock_server = MockServer::start().await;

        mount_html(
            &mock_server,
            "/",
            r#"<a href="/missing">Missing</a><a href="/data.json">Data</a>"#.to_string(),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(r#"{"href": "/nope"}"#, "application/json"),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let crawler = Crawler::new(ScannerConfig::default()).unwrap();
        let errors = ErrorLog::new();
        let report = crawler.crawl(&mock_server.uri(), &errors).await.unwrap();

        assert_eq!(report.visited.len(), 3);
        let logged = errors.snapshot().await;
        assert_eq!(logged.len(), 2);
        assert!(logged.iter().any(|e| e.contains("status code: 404")));
        assert!(logged.iter().any(|e| e.contains("application/json")));
    }

    #[tokio::test]
    async fn test_progress_reports_each_page() {
        let mock_server = MockServer::start().await;
        mount_html(
            &mock_server,
            "/",
            r#"<a href="/one">1</a><a href="/two">2</a>"#.to_string(),
        )
        .await;
        mount_html(&mock_server, "/one", "<p>one</p>".to_string()).await;
        mount_html(&mock_server, "/two", "<p>two</p>".to_string()).await;

        let messages = Arc::new(StdMutex::new(Vec::new()));
        let sink = messages.clone();
        let crawler = Crawler::new(ScannerConfig::default().with_max_workers(2))
            .unwrap()
            .with_progress_callback(Arc::new(move |msg: String| sink.lock().unwrap().push(msg)));

        crawler
            .crawl(&mock_server.uri(), &ErrorLog::new())
            .await
            .unwrap();

        let messages = messages.lock().unwrap();
        assert_eq!(messages.len(), 3);
        assert!(messages.iter().all(|m| m.starts_with("Scanning page: ")));
    }

    #[tokio::test]
    async fn test_cancellation_mid_crawl_drains_in_flight_pages() {
        let mock_server = MockServer::start().await;
        let links: String = (0..10)
            .map(|i| format!(r#"<a href="/page/{i}">{i}</a>"#))
            .collect();
        mount_html(&mock_server, "/", links).await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<p>slow</p>", "text/html")
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&mock_server)
            .await;

        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            canceller.cancel();
        });

        let crawler = Crawler::new(ScannerConfig::default().with_max_workers(2))
            .unwrap()
            .with_cancellation(token);
        let errors = ErrorLog::new();
        let report = crawler.crawl(&mock_server.uri(), &errors).await.unwrap();

        assert!(report.cancelled);
        assert!(report.visited.len() < 11);
        assert!(errors.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_crawl_dispatches_nothing() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let token = CancellationToken::new();
        token.cancel();
        let crawler = Crawler::new(ScannerConfig::default())
            .unwrap()
            .with_cancellation(token);

        let report = crawler
            .crawl(&mock_server.uri(), &ErrorLog::new())
            .await
            .unwrap();
        assert!(report.cancelled);
        assert!(report.visited.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_start_url() {
        let crawler = Crawler::new(ScannerConfig::default()).unwrap();
        let result = crawler.crawl("example.com", &ErrorLog::new()).await;
        assert!(matches!(result, Err(ScanError::InvalidUrl(_))));
    }
}
