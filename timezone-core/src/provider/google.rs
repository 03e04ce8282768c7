use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::{TimezoneError, TimezoneResponse, params::PathParams};

use super::TimezoneProvider;

pub const GOOGLE_HOST: &str = "maps.googleapis.com";
pub const GOOGLE_PATH: &str = "/maps/api/timezone/json";

/// Fixed connection descriptor for the time zone service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    path: String,
    port: u16,
    tls: bool,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, path: impl Into<String>, port: u16, tls: bool) -> Self {
        Self { host: host.into(), path: path.into(), port, tls }
    }

    pub fn google() -> Self {
        Self::new(GOOGLE_HOST, GOOGLE_PATH, 443, true)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// URL without a query, e.g. `https://maps.googleapis.com:443/maps/api/timezone/json`.
    pub fn base_url(&self) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        format!("{}://{}:{}{}", scheme, self.host, self.port, self.path)
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::google()
    }
}

#[derive(Debug, Clone)]
pub struct GoogleTimezoneProvider {
    endpoint: Endpoint,
    http: Client,
}

impl GoogleTimezoneProvider {
    pub fn new() -> Self {
        Self::with_endpoint(Endpoint::google())
    }

    pub fn with_endpoint(endpoint: Endpoint) -> Self {
        Self::with_client(endpoint, Client::new())
    }

    pub fn with_client(endpoint: Endpoint, http: Client) -> Self {
        Self { endpoint, http }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Full request target: the endpoint path followed by the encoded parameters.
    pub fn request_url(&self, params: &PathParams) -> Result<Url, TimezoneError> {
        let mut url = Url::parse(&self.endpoint.base_url())?;
        url.set_query(Some(&params.to_query_string()));
        Ok(url)
    }
}

impl Default for GoogleTimezoneProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TimezoneProvider for GoogleTimezoneProvider {
    #[instrument(skip_all, fields(location = params.get("location").unwrap_or_default()))]
    async fn fetch(&self, params: &PathParams) -> Result<TimezoneResponse, TimezoneError> {
        let url = self.request_url(params)?;

        debug!(host = %self.endpoint.host, "Sending time zone request");
        let res = self.http.get(url).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            warn!(%status, "Time zone service returned a non-success status");
        }

        let value: Value = serde_json::from_str(&body).map_err(|source| TimezoneError::Parse {
            status: status.as_u16(),
            body: truncate_body(&body),
            source,
        })?;

        let response = TimezoneResponse::new(value);
        debug!(api_status = response.status().unwrap_or("<none>"), "Time zone response parsed");

        Ok(response)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
