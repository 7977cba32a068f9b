//! HTTP client for the Airly sensor network API.
//!
//! [`AirlyClient`] implements [`SensorApi`] over the two v2 endpoints the
//! query service needs: the nearest-installation search and the measurement
//! lookup for one installation. Requests carry the API key in the `apikey`
//! header.
//!
//! # Example
//!
//! ```no_run
//! use airq_core::airly::AirlyClient;
//! use airq_core::SensorApi;
//! use airq_types::Coordinate;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AirlyClient::new("https://airapi.airly.eu", "my-api-key")?;
//!
//! let here = Coordinate::new(50.0614, 19.9366);
//! let nearest = client.nearest_installations(here, 30.0, 1).await?;
//! if let Some(installation) = nearest.first() {
//!     let data = client.installation_measurements(installation.id).await?;
//!     println!("{} values", data.current.values.len());
//! }
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use airq_types::{Coordinate, Installation, InstallationId, MeasurementPayload};

use crate::api::SensorApi;
use crate::error::{Error, Result};

/// Public Airly API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://airapi.airly.eu";

/// Request timeout used by [`AirlyClient::new`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the Airly API.
#[derive(Clone)]
pub struct AirlyClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for AirlyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Omits the API key
        f.debug_struct("AirlyClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl AirlyClient {
    /// Create a client with the default 10 second timeout.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        Self::with_timeout(base_url, api_key, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("cannot build HTTP client: {e}")))?;

        Self::with_client(base_url, api_key, client)
    }

    /// Create a client with a custom reqwest Client.
    pub fn with_client(base_url: &str, api_key: &str, client: Client) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;

        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(Error::InvalidConfig("API key is empty".to_string()));
        }

        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn nearest_url(&self, coords: Coordinate, radius_km: f64, limit: u32) -> String {
        format!(
            "{}/v2/installations/nearest?lat={}&lng={}&maxDistanceKM={}&maxResults={}",
            self.base_url, coords.latitude, coords.longitude, radius_km, limit
        )
    }

    fn measurements_url(&self, id: InstallationId) -> String {
        format!(
            "{}/v2/measurements/installation?installationId={}",
            self.base_url, id
        )
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header("apikey", &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| Error::remote(format!("request to {url} failed: {e}")))?;

        self.handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
                .unwrap_or_else(|| status.to_string());

            return Err(Error::RemoteApi {
                message,
                status: Some(status.as_u16()),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::remote(format!("failed to read response body: {e}")))?;

        serde_json::from_slice(&body).map_err(|e| Error::MalformedResponse(e.to_string()))
    }
}

fn normalize_base_url(base_url: &str) -> Result<String> {
    let base_url = base_url.trim().trim_end_matches('/').to_string();

    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(Error::InvalidConfig(format!(
            "URL must start with http:// or https://, got: {}",
            base_url
        )));
    }

    Ok(base_url)
}

#[async_trait]
impl SensorApi for AirlyClient {
    async fn nearest_installations(
        &self,
        coords: Coordinate,
        radius_km: f64,
        limit: u32,
    ) -> Result<Vec<Installation>> {
        self.get(&self.nearest_url(coords, radius_km, limit)).await
    }

    async fn installation_measurements(&self, id: InstallationId) -> Result<MeasurementPayload> {
        self.get(&self.measurements_url(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve a single canned HTTP response and return the base URL plus a
    /// handle yielding the raw request text.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).to_string();

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request
        });

        (format!("http://{addr}"), handle)
    }

    #[test]
    fn test_client_creation() {
        let client = AirlyClient::new(DEFAULT_BASE_URL, "key").unwrap();
        assert_eq!(client.base_url(), "https://airapi.airly.eu");
    }

    #[test]
    fn test_client_normalizes_url() {
        let client = AirlyClient::new("https://airapi.airly.eu/", "key").unwrap();
        assert_eq!(client.base_url(), "https://airapi.airly.eu");
    }

    #[test]
    fn test_client_invalid_url() {
        let result = AirlyClient::new("airapi.airly.eu", "key");
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_client_requires_api_key() {
        let result = AirlyClient::new(DEFAULT_BASE_URL, "   ");
        assert!(matches!(result, Err(Error::InvalidConfig(ref m)) if m.contains("API key")));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = AirlyClient::new(DEFAULT_BASE_URL, "secret-key").unwrap();
        assert!(!format!("{client:?}").contains("secret-key"));
    }

    #[test]
    fn test_endpoint_urls() {
        let client = AirlyClient::new("http://localhost:9000", "key").unwrap();

        assert_eq!(
            client.nearest_url(Coordinate::new(50.06, 19.94), 30.0, 1),
            "http://localhost:9000/v2/installations/nearest?lat=50.06&lng=19.94&maxDistanceKM=30&maxResults=1"
        );
        assert_eq!(
            client.measurements_url(8077),
            "http://localhost:9000/v2/measurements/installation?installationId=8077"
        );
    }

    #[tokio::test]
    async fn test_nearest_installations_decodes_and_sends_key() {
        let body = r#"[{
            "id": 8077,
            "location": {"latitude": 50.062006, "longitude": 19.940984},
            "address": {"country": "Poland", "city": "Kraków", "street": "Mikołajska"},
            "elevation": 220.38,
            "airly": true
        }]"#;
        let (base, request) = serve_once("200 OK", body).await;
        let client = AirlyClient::new(&base, "test-key").unwrap();

        let found = client
            .nearest_installations(Coordinate::new(50.06, 19.94), 30.0, 1)
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 8077);
        assert_eq!(found[0].address.city, "Kraków");

        let request = request.await.unwrap().to_lowercase();
        assert!(request.starts_with("get /v2/installations/nearest?"));
        assert!(request.contains("apikey: test-key"));
    }

    #[tokio::test]
    async fn test_error_status_carries_api_message() {
        let body = r#"{"errorCode": "INSTALLATION_NOT_FOUND", "message": "Installation not found"}"#;
        let (base, _request) = serve_once("404 Not Found", body).await;
        let client = AirlyClient::new(&base, "key").unwrap();

        let err = client.installation_measurements(1).await.unwrap_err();

        match err {
            Error::RemoteApi { message, status } => {
                assert_eq!(message, "Installation not found");
                assert_eq!(status, Some(404));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_status_without_body() {
        let (base, _request) = serve_once("401 Unauthorized", "").await;
        let client = AirlyClient::new(&base, "key").unwrap();

        let err = client.installation_measurements(1).await.unwrap_err();
        assert!(matches!(err, Error::RemoteApi { status: Some(401), .. }));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_malformed() {
        let (base, _request) = serve_once("200 OK", r#"{"current": 42}"#).await;
        let client = AirlyClient::new(&base, "key").unwrap();

        let err = client.installation_measurements(1).await.unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_remote_error() {
        // Bind then drop to get a port with nothing listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = AirlyClient::new(&format!("http://{addr}"), "key").unwrap();
        let err = client.installation_measurements(1).await.unwrap_err();
        assert!(matches!(err, Error::RemoteApi { status: None, .. }));
    }
}
