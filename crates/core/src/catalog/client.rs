//! Catalog API client.
//!
//! Every request is a GET against the configured base URL with the API key
//! attached as the `key` query parameter. Responses are decoded from JSON;
//! failures are returned to the caller as-is, without retries or caching.

use std::future::Future;
use std::pin::Pin;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::error::CatalogError;
use super::gather::DetailSource;
use super::query::{GameQuery, ReleaseWindows};
use crate::config::AppConfig;
use crate::models::{GameDetail, GameId, GamePage, Genre, Page, Platform};

const GAMES_ENDPOINT: &str = "/games";
const GENRES_ENDPOINT: &str = "/genres";
const PLATFORMS_ENDPOINT: &str = "/platforms";

/// Games catalog client.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    windows: ReleaseWindows,
}

impl CatalogClient {
    /// Creates a client for `base_url` authenticating with `api_key`.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, CatalogError> {
        let windows = ReleaseWindows::current()
            .ok_or_else(|| CatalogError::InvalidQuery("local date out of range".into()))?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("gamedex/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            windows,
        })
    }

    /// Creates a client from application configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, CatalogError> {
        Self::new(config.api_base_url.clone(), config.api_key.clone())
    }

    /// Replaces the trending/upcoming date windows.
    pub fn with_windows(mut self, windows: ReleaseWindows) -> Self {
        self.windows = windows;
        self
    }

    /// Base URL requests are issued against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Date windows used by trending and upcoming listings.
    pub fn windows(&self) -> ReleaseWindows {
        self.windows
    }

    /// Performs an authenticated GET request and decodes the body.
    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&'static str, String)],
    ) -> Result<T, CatalogError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(endpoint, ?params, "catalog request");

        let resp = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(|err| {
                warn!(endpoint, error = %err, "catalog request failed");
                CatalogError::Http(err)
            })?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_else(|err| {
                debug!(endpoint, error = %err, "failed to read error body");
                String::new()
            });
            warn!(endpoint, status = status.as_u16(), "catalog returned error status");
            return Err(CatalogError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Lists games matching `query`.
    pub async fn list_games(&self, query: &GameQuery) -> Result<GamePage, CatalogError> {
        let params = query.to_params()?;
        self.get(GAMES_ENDPOINT, &params).await
    }

    /// Fetches the full record for one game.
    pub async fn game_details(&self, id: GameId) -> Result<GameDetail, CatalogError> {
        self.get(&format!("{GAMES_ENDPOINT}/{id}"), &[]).await
    }

    /// Text search, twenty results per page.
    pub async fn search_games(&self, query: &str, page: u32) -> Result<GamePage, CatalogError> {
        self.list_games(&GameQuery::text_search(query, page)).await
    }

    /// Most-added games released in the trending window.
    pub async fn trending_games(&self, page: u32) -> Result<GamePage, CatalogError> {
        self.list_games(&GameQuery::released_within(self.windows.trending, page))
            .await
    }

    /// Most-added games releasing in the upcoming window.
    pub async fn upcoming_games(&self, page: u32) -> Result<GamePage, CatalogError> {
        self.list_games(&GameQuery::released_within(self.windows.upcoming, page))
            .await
    }

    /// Genres known to the catalog.
    pub async fn genres(&self) -> Result<Page<Genre>, CatalogError> {
        self.get(GENRES_ENDPOINT, &[]).await
    }

    /// Platforms known to the catalog.
    pub async fn platforms(&self) -> Result<Page<Platform>, CatalogError> {
        self.get(PLATFORMS_ENDPOINT, &[]).await
    }
}

impl DetailSource for CatalogClient {
    fn fetch_detail(
        &self,
        id: GameId,
    ) -> Pin<Box<dyn Future<Output = Result<GameDetail, CatalogError>> + Send + '_>> {
        Box::pin(self.game_details(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::query::DateRange;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one response and yields the request line it received.
    async fn mock_server(status: u16, body: &str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{port}/api");
        let body = body.to_string();

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let n = stream.read(&mut buf).await.unwrap_or(0);
            let request = String::from_utf8_lossy(&buf[..n]).to_string();

            let resp = format!(
                "HTTP/1.1 {status} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(resp.as_bytes()).await;
            let _ = stream.shutdown().await;

            request.lines().next().unwrap_or_default().to_string()
        });

        (url, handle)
    }

    fn client(url: String) -> CatalogClient {
        CatalogClient::new(url, "test-key")
            .unwrap()
            .with_windows(ReleaseWindows::for_year(2024).unwrap())
    }

    const PAGE: &str = r#"{"count":1,"next":null,"previous":null,"results":[
        {"id":42,"name":"Portal 2","rating":4.6,"genres":[{"id":2,"name":"Puzzle"}]}
    ]}"#;

    #[tokio::test]
    async fn list_games_without_search_omits_param() {
        let (url, handle) = mock_server(200, PAGE).await;

        let query = GameQuery::new().page(1).page_size(20).ordering("-rating");
        let page = client(url).list_games(&query).await.unwrap();
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].name, "Portal 2");

        let request_line = handle.await.unwrap();
        assert!(request_line.starts_with("GET /api/games?"), "{request_line}");
        assert!(request_line.contains("key=test-key"));
        assert!(request_line.contains("page=1"));
        assert!(request_line.contains("page_size=20"));
        assert!(request_line.contains("ordering=-rating"));
        assert!(!request_line.contains("search"), "{request_line}");
    }

    #[tokio::test]
    async fn search_sends_query_and_fixed_page_size() {
        let (url, handle) = mock_server(200, PAGE).await;

        client(url).search_games("portal", 2).await.unwrap();

        let request_line = handle.await.unwrap();
        assert!(request_line.contains("search=portal"));
        assert!(request_line.contains("page=2"));
        assert!(request_line.contains("page_size=20"));
        assert!(request_line.contains("key=test-key"));
    }

    #[tokio::test]
    async fn trending_and_upcoming_use_their_windows() {
        let (url, handle) = mock_server(200, PAGE).await;
        client(url).trending_games(1).await.unwrap();
        let request_line = handle.await.unwrap();
        assert!(request_line.contains("dates=2024-01-01%2C2024-12-31"), "{request_line}");
        assert!(request_line.contains("ordering=-added"));

        let (url, handle) = mock_server(200, PAGE).await;
        client(url).upcoming_games(1).await.unwrap();
        let request_line = handle.await.unwrap();
        assert!(request_line.contains("dates=2025-01-01%2C2025-12-31"), "{request_line}");
    }

    #[tokio::test]
    async fn custom_windows_are_respected() {
        let (url, handle) = mock_server(200, PAGE).await;
        let windows = ReleaseWindows {
            trending: DateRange::calendar_year(2030).unwrap(),
            upcoming: DateRange::calendar_year(2031).unwrap(),
        };
        client(url).with_windows(windows).trending_games(1).await.unwrap();
        let request_line = handle.await.unwrap();
        assert!(request_line.contains("2030-01-01"));
    }

    #[tokio::test]
    async fn game_details_hits_id_path() {
        let body = r#"{"id":42,"name":"Portal 2","description_raw":"Think with portals.","ratings_count":10}"#;
        let (url, handle) = mock_server(200, body).await;

        let detail = client(url).game_details(42).await.unwrap();
        assert_eq!(detail.id(), 42);
        assert_eq!(detail.description, "Think with portals.");

        let request_line = handle.await.unwrap();
        assert!(request_line.starts_with("GET /api/games/42?key=test-key"), "{request_line}");
    }

    #[tokio::test]
    async fn error_status_is_surfaced() {
        let (url, handle) = mock_server(404, r#"{"detail":"Not found."}"#).await;

        let err = client(url).game_details(9).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        match err {
            CatalogError::Api { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("Not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn malformed_body_is_a_json_error() {
        let (url, handle) = mock_server(200, r#"{"results": "nope"}"#).await;

        let err = client(url).trending_games(1).await.unwrap_err();
        assert!(matches!(err, CatalogError::Json(_)), "{err}");
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn transport_failure_is_an_http_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = client(format!("http://127.0.0.1:{port}"))
            .game_details(1)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Http(_)), "{err}");
        assert_eq!(err.status(), None);
    }

    #[tokio::test]
    async fn zero_page_fails_without_request() {
        let err = client("http://127.0.0.1:9".into())
            .search_games("x", 0)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn genres_endpoint() {
        let body = r#"{"count":1,"next":null,"previous":null,"results":[{"id":4,"name":"Action"}]}"#;
        let (url, handle) = mock_server(200, body).await;

        let genres = client(url).genres().await.unwrap();
        assert_eq!(genres.results[0].name, "Action");
        assert!(handle.await.unwrap().starts_with("GET /api/genres?key=test-key"));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = CatalogClient::new("https://api.rawg.io/api/", "k").unwrap();
        assert_eq!(client.base_url(), "https://api.rawg.io/api");
    }
}
