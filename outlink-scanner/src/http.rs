use crate::config::ScannerConfig;
use crate::error::{Result, ScanError};
use crate::result::AuditResult;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{Client, StatusCode};
use tracing::debug;

/// An HTML page body fetched for link extraction
#[derive(Debug, Clone)]
pub struct Page {
    pub body: String,
    pub content_type: String,
}

/// HTTP client pair used by the engine.
///
/// Pages are fetched with redirects followed transparently; external links are
/// checked with redirects disabled so the first response is what gets judged.
#[derive(Clone)]
pub struct FetchClient {
    page_client: Client,
    link_client: Client,
}

impl FetchClient {
    pub fn new(config: &ScannerConfig) -> Result<Self> {
        let page_client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .pool_max_idle_per_host(config.max_workers)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        let link_client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            page_client,
            link_client,
        })
    }

    /// Fetches a page for crawling. Anything but a 200 HTML response is an error.
    pub async fn fetch_page(&self, url: &str) -> Result<Page> {
        debug!("Fetching page {}", url);

        let response = self
            .page_client
            .get(url)
            .send()
            .await
            .map_err(|source| ScanError::FetchFailed {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ScanError::NonOkStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.contains("text/html") {
            return Err(ScanError::NonHtmlContent {
                url: url.to_string(),
                content_type,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| ScanError::FetchFailed {
                url: url.to_string(),
                source,
            })?;

        Ok(Page { body, content_type })
    }

    /// Checks an external link. `Location` is only captured for a 301.
    pub async fn fetch_link_status(&self, url: &str) -> Result<AuditResult> {
        debug!("Checking link {}", url);

        let response = self
            .link_client
            .get(url)
            .send()
            .await
            .map_err(|source| ScanError::AuditFailed {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let location = if status == StatusCode::MOVED_PERMANENTLY {
            response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        } else {
            None
        };

        Ok(AuditResult::status(status.as_u16(), location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header_regex, method, path},
    };

    fn client() -> FetchClient {
        FetchClient::new(&ScannerConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_page_returns_html() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(header_regex("user-agent", "Chrome/91"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(
                    "<html><body>hi</body></html>",
                    "text/html; charset=utf-8",
                ),
            )
            .mount(&mock_server)
            .await;

        let page = client().fetch_page(&mock_server.uri()).await.unwrap();
        assert!(page.body.contains("hi"));
        assert!(page.content_type.starts_with("text/html"));
    }

    #[tokio::test]
    async fn test_fetch_page_follows_redirects() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(301)
                    .insert_header("location", format!("{}/new", mock_server.uri()).as_str()),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("<html>moved</html>", "text/html"),
            )
            .mount(&mock_server)
            .await;

        let page = client()
            .fetch_page(&format!("{}/old", mock_server.uri()))
            .await
            .unwrap();
        assert!(page.body.contains("moved"));
    }

    #[tokio::test]
    async fn test_fetch_page_rejects_non_ok_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).insert_header("content-type", "text/html"))
            .mount(&mock_server)
            .await;

        let err = client().fetch_page(&mock_server.uri()).await.unwrap_err();
        assert!(matches!(err, ScanError::NonOkStatus { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_fetch_page_rejects_non_html() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("{}", "application/json"),
            )
            .mount(&mock_server)
            .await;

        let err = client().fetch_page(&mock_server.uri()).await.unwrap_err();
        match err {
            ScanError::NonHtmlContent { content_type, .. } => {
                assert_eq!(content_type, "application/json")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_page_times_out() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let config = ScannerConfig::default().with_timeout_secs(1);
        let err = FetchClient::new(&config)
            .unwrap()
            .fetch_page(&mock_server.uri())
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::FetchFailed { .. }));
    }

    #[tokio::test]
    async fn test_link_status_captures_permanent_redirect_only() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/moved"))
            .respond_with(
                ResponseTemplate::new(301).insert_header("location", "https://dest.example.com/"),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/found"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("location", "https://dest.example.com/"),
            )
            .mount(&mock_server)
            .await;

        let client = client();
        let moved = client
            .fetch_link_status(&format!("{}/moved", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(
            moved,
            AuditResult::status(301, Some("https://dest.example.com/".to_string()))
        );

        let found = client
            .fetch_link_status(&format!("{}/found", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(found, AuditResult::status(302, None));
    }

    #[tokio::test]
    async fn test_link_status_connection_refused() {
        // Bind then drop a listener so the port is very likely closed
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client()
            .fetch_link_status(&format!("http://{}/", addr))
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::AuditFailed { .. }));
    }
}
