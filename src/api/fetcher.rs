use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;
use tracing::{debug, info, warn};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Anything that can produce the raw target page
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Returns the page body, or `None` once every route has failed
    async fn fetch_page(&self) -> Option<String>;
}

/// One way of reaching the target page, usually a relay that takes the
/// target URL appended to its own
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRoute {
    pub base: String,

    /// Percent-encode the target URL before appending it
    pub encode_target: bool,
}

impl AccessRoute {
    pub fn encoded(base: &str) -> Self {
        Self {
            base: base.to_string(),
            encode_target: true,
        }
    }

    pub fn raw(base: &str) -> Self {
        Self {
            base: base.to_string(),
            encode_target: false,
        }
    }

    /// Full request URL for the given target
    pub fn url_for(&self, target_url: &str) -> String {
        if self.encode_target {
            format!("{}{}", self.base, urlencoding::encode(target_url))
        } else {
            format!("{}{}", self.base, target_url)
        }
    }
}

/// Fetches the target page through an ordered list of access routes
pub struct PageFetcher {
    client: Client,
    target_url: String,
    routes: Vec<AccessRoute>,
}

impl PageFetcher {
    /// Create a fetcher; `timeout` bounds each route attempt
    pub fn new(target_url: &str, routes: Vec<AccessRoute>, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            target_url: target_url.to_string(),
            routes,
        })
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    /// Single attempt through one route
    async fn fetch_via(&self, route: &AccessRoute) -> Result<String> {
        let url = route.url_for(&self.target_url);
        let started = Instant::now();

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Request via {} failed", route.base))?;

        let status = response.status();
        debug!(
            "Route {} answered {} in {}ms",
            route.base,
            status,
            started.elapsed().as_millis()
        );

        if !status.is_success() {
            anyhow::bail!("Route {} returned status {}", route.base, status);
        }

        response
            .text()
            .await
            .with_context(|| format!("Failed to read body via {}", route.base))
    }
}

#[async_trait]
impl PageSource for PageFetcher {
    async fn fetch_page(&self) -> Option<String> {
        for route in &self.routes {
            info!("Trying route: {}", route.base);

            match self.fetch_via(route).await {
                Ok(body) => {
                    info!(
                        "Fetched {} bytes using route: {}",
                        body.len(),
                        route.base
                    );
                    return Some(body);
                }
                Err(e) => {
                    warn!("Route {} failed: {:#}", route.base, e);
                }
            }
        }

        warn!("All {} routes failed for {}", self.routes.len(), self.target_url);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve a single canned HTTP response on a random local port
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        format!("http://{}/fetch/", addr)
    }

    /// A port that refuses connections
    async fn closed_route() -> AccessRoute {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        AccessRoute::raw(&format!("http://{}/", addr))
    }

    /// Accepts connections and never answers
    async fn silent_route() -> AccessRoute {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        AccessRoute::encoded(&format!("http://{}/fetch/", addr))
    }

    #[test]
    fn test_url_for_encodes_target() {
        let target = "https://fbref.com/en/squads/dee3bbc8/Racing-Santander-Stats";

        let encoded = AccessRoute::encoded("https://relay.example/raw?url=").url_for(target);
        assert_eq!(
            encoded,
            "https://relay.example/raw?url=https%3A%2F%2Ffbref.com%2Fen%2Fsquads%2Fdee3bbc8%2FRacing-Santander-Stats"
        );

        let raw = AccessRoute::raw("https://relay.example/").url_for(target);
        assert_eq!(raw, format!("https://relay.example/{}", target));
    }

    #[tokio::test]
    async fn test_first_successful_route_wins() {
        let refused = closed_route().await;
        let erroring = AccessRoute::encoded(&serve_once("500 Internal Server Error", "oops").await);
        let working = AccessRoute::encoded(&serve_once("200 OK", "<html>ok</html>").await);

        let fetcher = PageFetcher::new(
            "https://fbref.com/en/squads/x/Stats",
            vec![refused, erroring, working],
            Duration::from_secs(5),
        )
        .unwrap();

        assert_eq!(fetcher.fetch_page().await.as_deref(), Some("<html>ok</html>"));
    }

    #[tokio::test]
    async fn test_hanging_route_times_out_and_next_route_answers() {
        let hanging = silent_route().await;
        let working = AccessRoute::encoded(&serve_once("200 OK", "<html>late</html>").await);

        let fetcher = PageFetcher::new(
            "https://fbref.com/en/squads/x/Stats",
            vec![hanging, working],
            Duration::from_millis(200),
        )
        .unwrap();

        let started = Instant::now();
        let body = tokio::time::timeout(Duration::from_secs(5), fetcher.fetch_page())
            .await
            .expect("fetch should not hang past the route timeout");

        assert_eq!(body.as_deref(), Some("<html>late</html>"));
        assert!(started.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_all_routes_failing_returns_none() {
        let fetcher = PageFetcher::new(
            "https://fbref.com/en/squads/x/Stats",
            vec![closed_route().await, closed_route().await],
            Duration::from_secs(2),
        )
        .unwrap();

        assert!(fetcher.fetch_page().await.is_none());
    }

    #[tokio::test]
    async fn test_no_routes_returns_none() {
        let fetcher =
            PageFetcher::new("https://example.com", Vec::new(), Duration::from_secs(1)).unwrap();
        assert!(fetcher.fetch_page().await.is_none());
    }
}
