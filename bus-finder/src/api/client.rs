//! HTTP client for the bus backend.
//!
//! Every call is a plain GET returning JSON. Failures surface the
//! backend's `detail` message when it sends one.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::domain::{AddressMatches, ArrivalBoard, Coordinate, NearbyStations};

use super::convert::{convert_addresses, convert_board, convert_stations, error_detail};
use super::error::ApiError;
use super::gateway::{BoardSource, BusApi};
use super::types::{AddressSearchResponse, BusStationResponse, NearbyStationsResponse};

/// Default backend address.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration for the bus API client.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Backend base URL, without a trailing slash
    pub base_url: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    /// Set the backend base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Bus backend HTTP client.
///
/// Cheap to clone; clones share the connection pool and concurrency limit.
#[derive(Debug, Clone)]
pub struct BusApiClient {
    http: reqwest::Client,
    base_url: String,
    semaphore: Arc<Semaphore>,
}

impl BusApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        if config.max_concurrent == 0 {
            return Err(ApiError::NotConfigured(
                "max_concurrent must be at least 1".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| ApiError::NotConfigured("client is shut down".to_string()))?;

        let url = format!("{}{}", self.base_url, path);
        debug!(%url, ?query, "GET");

        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: error_detail(&body),
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| ApiError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })
    }
}

impl BusApi for BusApiClient {
    async fn arrivals(&self, source: BoardSource) -> Result<ArrivalBoard, ApiError> {
        let path = match source {
            BoardSource::Station(key) => format!("/api/buses/{key}"),
            BoardSource::Default => "/api/buses".to_string(),
        };

        let response: BusStationResponse = self.get_json(&path, &[]).await?;
        Ok(convert_board(response)?)
    }

    async fn search_addresses(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<AddressMatches, ApiError> {
        let response: AddressSearchResponse = self
            .get_json(
                "/api/address/search",
                &[("q", query.to_string()), ("limit", limit.to_string())],
            )
            .await?;

        Ok(convert_addresses(response))
    }

    async fn nearby_stations(
        &self,
        center: Coordinate,
        radius: u32,
    ) -> Result<NearbyStations, ApiError> {
        let response: NearbyStationsResponse = self
            .get_json(
                "/api/stations/nearby",
                &[
                    ("lat", center.latitude().to_string()),
                    ("lng", center.longitude().to_string()),
                    ("radius", radius.to_string()),
                ],
            )
            .await?;

        Ok(convert_stations(response)?)
    }
}
