//! HTTP client for the Autopilot API: endpoint table, retry with backoff,
//! and bookmark-based pagination.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Result, TapError};
use crate::observability::metrics;

static ENDPOINTS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("contacts", "/contacts"),
        ("lists_contacts", "/list/{list_id}/contacts"),
        ("lists", "/lists"),
        ("smart_segments", "/smart_segments"),
        ("smart_segments_contacts", "/smart_segments/{segment_id}/contacts"),
    ])
});

/// The response key rows are nested under for a given endpoint.
///
/// Contact-bearing endpoints nest rows under `contacts`, smart-segment
/// endpoints under `segments`; the rest use the endpoint name itself.
pub fn envelope_key(endpoint: &str) -> &str {
    if endpoint.contains("contact") {
        "contacts"
    } else if endpoint.contains("smart_segments") {
        "segments"
    } else {
        endpoint
    }
}

pub struct AutopilotClient {
    http: reqwest::Client,
    base_url: String,
    per_page: usize,
    max_retries: u32,
}

impl AutopilotClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "autopilotapikey",
            HeaderValue::from_str(&config.api_key)
                .map_err(|e| TapError::Config(format!("invalid api_key header value: {}", e)))?,
        );
        headers.insert(
            "user-agent",
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| TapError::Config(format!("invalid user_agent header value: {}", e)))?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            per_page: config.per_page,
            max_retries: config.max_retries.max(1),
        })
    }

    /// Full URL for a named endpoint, substituting path parameters.
    pub fn endpoint_url(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String> {
        let template = ENDPOINTS
            .get(endpoint)
            .ok_or_else(|| TapError::InvalidEndpoint(endpoint.to_string()))?;
        let mut path = template.to_string();
        for (name, value) in params {
            path = path.replace(&format!("{{{}}}", name), value);
        }
        if path.contains('{') {
            return Err(TapError::InvalidEndpoint(format!(
                "{} is missing a path parameter: {}",
                endpoint, path
            )));
        }
        Ok(format!("{}{}", self.base_url, path))
    }

    /// GET a URL, retrying transient failures with exponential backoff.
    ///
    /// Client errors (4xx) are returned immediately; server errors and
    /// transport failures are retried up to `max_retries` attempts.
    async fn get_json(&self, endpoint: &str, url: &str) -> Result<Value> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            info!("GET {}", url);
            let started = Instant::now();

            match self.http.get(url).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        metrics::http::request_success(endpoint, started.elapsed().as_secs_f64());
                        return Ok(resp.json::<Value>().await?);
                    }
                    metrics::http::request_error(endpoint);
                    if status.is_client_error() {
                        let body = resp.text().await.unwrap_or_default();
                        return Err(TapError::Api {
                            message: format!("{} returned {}: {}", url, status, body),
                        });
                    }
                    if attempt >= self.max_retries {
                        return Err(TapError::Api {
                            message: format!(
                                "{} returned {} after {} attempts",
                                url, status, attempt
                            ),
                        });
                    }
                    warn!(
                        "GET {} returned {}; retrying (attempt {}/{})",
                        url, status, attempt, self.max_retries
                    );
                }
                Err(e) => {
                    metrics::http::request_error(endpoint);
                    if attempt >= self.max_retries {
                        return Err(e.into());
                    }
                    warn!(
                        "GET {} failed: {}; retrying (attempt {}/{})",
                        url, e, attempt, self.max_retries
                    );
                }
            }

            metrics::http::request_retried(endpoint);
            let backoff = Duration::from_millis(500 * 2u64.pow(attempt.min(6)));
            tokio::time::sleep(backoff).await;
        }
    }

    /// Fetch every row from a paginated endpoint.
    ///
    /// Contact-bearing endpoints return a `bookmark` token which is appended
    /// as a path segment on the next request; iteration stops when a page
    /// comes back smaller than `per_page` or carries no bookmark.
    pub async fn fetch_rows(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Vec<Value>> {
        let url = self.endpoint_url(endpoint, params)?;
        let key = envelope_key(endpoint);

        let mut rows = Vec::new();
        let mut bookmark: Option<String> = None;
        loop {
            let page_url = match &bookmark {
                Some(b) => format!("{}/{}", url, b),
                None => url.clone(),
            };
            let body = self.get_json(endpoint, &page_url).await?;

            let page = body
                .get(key)
                .and_then(Value::as_array)
                .ok_or_else(|| TapError::Api {
                    message: format!("{} response is missing the '{}' key", page_url, key),
                })?
                .clone();
            bookmark = body
                .get("bookmark")
                .and_then(Value::as_str)
                .map(str::to_string);

            let page_len = page.len();
            debug!(
                "fetched {} rows from {} (total {})",
                page_len,
                page_url,
                rows.len() + page_len
            );
            rows.extend(page);

            if page_len < self.per_page || bookmark.is_none() {
                return Ok(rows);
            }
        }
    }
}
