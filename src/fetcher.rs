//! Listing retrieval: HTTP transport, envelope decoding, and per-consumer
//! feed state with a staleness guard.
//!
//! # Architecture
//!
//! - [`Transport`]: Core trait performing one GET and returning status + body
//! - [`HttpTransport`]: `reqwest`-backed implementation used by the binary
//! - [`fetch_listing`]: GET a URL and decode its envelope into `Vec<T>`
//! - [`Feed`]: Loading/error/items state for one consumer (sources or
//!   articles), owned by the session
//!
//! # Staleness guard
//!
//! Each [`Feed::begin`] hands out a [`Ticket`] carrying a generation number.
//! [`Feed::complete`] only applies a result whose ticket is still the latest,
//! so a slow response to a superseded filter state can never overwrite the
//! answer to the current one.
//!
//! # Failure policy
//!
//! A failed fetch records its error and keeps the previously fetched items,
//! so the view can show stale-but-present data beneath the error banner.

use crate::error::{ConfigError, FetchError};
use crate::models::Listing;
use crate::pagination::{PageSlice, Pagination};
use crate::utils::truncate_for_log;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use serde_json::Value;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Raw HTTP outcome handed to the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Performs a single GET request.
///
/// Implementors only report transport failures as errors; non-2xx statuses
/// come back as an [`HttpResponse`] so the decoder can read the API's error
/// envelope.
pub trait Transport {
    fn get(&self, url: &Url) -> impl Future<Output = Result<HttpResponse, FetchError>> + Send;
}

/// `reqwest`-backed transport.
///
/// The API key, when configured, is attached as the `X-Api-Key` header on
/// every request and never appears in a URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(
        api_key: Option<&str>,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key.map(str::trim).filter(|k| !k.is_empty()) {
            let mut value =
                HeaderValue::from_str(key).map_err(|e| ConfigError::Client(e.to_string()))?;
            value.set_sensitive(true);
            headers.insert(HeaderName::from_static("x-api-key"), value);
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;
        Ok(HttpTransport { client })
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(FetchError::transport)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(FetchError::transport)?;
        Ok(HttpResponse { status, body })
    }
}

/// NewsAPI error envelope: `{"status":"error","code":"...","message":"..."}`.
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ApiErrorEnvelope {
    fn describe(&self) -> Option<String> {
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => Some(format!("{} ({})", message, code)),
            (None, Some(message)) => Some(message.clone()),
            (Some(code), None) => Some(code.clone()),
            (None, None) => None,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Decode one response into the listing it carries.
///
/// # Errors
///
/// - [`FetchError::RequestFailed`] for a non-2xx status, carrying the API's
///   error message when the body has one
/// - [`FetchError::InvalidFormat`] when the body is not JSON, the list field
///   is missing or not an array, or an element does not decode
pub fn decode_listing<T: Listing>(status: u16, body: &str) -> Result<Vec<T>, FetchError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<ApiErrorEnvelope>(body)
            .ok()
            .and_then(|e| e.describe())
            .unwrap_or_else(|| match body.trim() {
                "" => "empty response body".to_string(),
                text => truncate_for_log(text, 200),
            });
        return Err(FetchError::RequestFailed {
            status: Some(status),
            message,
        });
    }

    let mut envelope: Value = serde_json::from_str(body)
        .map_err(|e| FetchError::InvalidFormat(format!("body is not valid JSON: {}", e)))?;

    let list = envelope.get_mut(T::FIELD).map(Value::take);
    match list {
        Some(list @ Value::Array(_)) => serde_json::from_value::<Vec<T>>(list)
            .map(T::normalize)
            .map_err(|e| FetchError::InvalidFormat(format!("malformed {} entry: {}", T::LABEL, e))),
        Some(other) => Err(FetchError::InvalidFormat(format!(
            "field `{}` is {}, expected an array",
            T::FIELD,
            json_kind(&other)
        ))),
        None => {
            let hint = serde_json::from_value::<ApiErrorEnvelope>(envelope)
                .ok()
                .and_then(|e| e.describe())
                .map(|d| format!(" (api said: {})", d))
                .unwrap_or_default();
            Err(FetchError::InvalidFormat(format!(
                "missing field `{}`{}",
                T::FIELD,
                hint
            )))
        }
    }
}

/// GET `url` and decode the listing it returns.
#[instrument(level = "info", skip_all, fields(%url, kind = T::LABEL))]
pub async fn fetch_listing<T, R>(transport: &R, url: &Url) -> Result<Vec<T>, FetchError>
where
    T: Listing,
    R: Transport,
{
    let t0 = Instant::now();
    let response = transport.get(url).await;
    let elapsed_ms = t0.elapsed().as_millis();

    let response = match response {
        Ok(r) => r,
        Err(e) => {
            warn!(elapsed_ms, error = %e, "Request failed");
            return Err(e);
        }
    };

    let result = decode_listing::<T>(response.status, &response.body);
    match &result {
        Ok(items) => info!(
            count = items.len(),
            status = response.status,
            elapsed_ms,
            "Fetched listing"
        ),
        Err(e) => warn!(
            status = response.status,
            elapsed_ms,
            error = %e,
            body_preview = %truncate_for_log(&response.body, 300),
            "Listing request did not yield items"
        ),
    }
    result
}

/// Identifies one issued request. Only the latest ticket of a feed counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    url: Url,
}

impl Ticket {
    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// Whether a completion was applied or discarded as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Stale,
}

/// What the view should show for a feed. Exactly one holds at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus<'a> {
    Loading,
    Failed(&'a FetchError),
    Empty,
    Ready,
}

/// Items, loading flag and last error for one logical consumer.
#[derive(Debug)]
pub struct Feed<T> {
    items: Vec<T>,
    loading: bool,
    error: Option<FetchError>,
    generation: u64,
    pagination: Pagination,
}

impl<T> Default for Feed<T> {
    fn default() -> Self {
        Feed::new(Pagination::default())
    }
}

impl<T> Feed<T> {
    pub fn new(pagination: Pagination) -> Self {
        Feed {
            items: Vec::new(),
            loading: false,
            error: None,
            generation: 0,
            pagination,
        }
    }

    /// Start a request for `url`, superseding any request still in flight.
    pub fn begin(&mut self, url: Url) -> Ticket {
        self.generation += 1;
        self.loading = true;
        self.error = None;
        debug!(generation = self.generation, %url, "Request issued");
        Ticket {
            generation: self.generation,
            url,
        }
    }

    /// Apply the outcome of a request, unless a newer one has been issued.
    pub fn complete(&mut self, ticket: &Ticket, result: Result<Vec<T>, FetchError>) -> Completion {
        if ticket.generation != self.generation {
            debug!(
                stale = ticket.generation,
                current = self.generation,
                url = %ticket.url,
                "Discarding superseded response"
            );
            return Completion::Stale;
        }
        self.loading = false;
        match result {
            Ok(items) => {
                self.items = items;
                self.error = None;
                self.pagination.reset();
            }
            Err(e) => self.error = Some(e),
        }
        Completion::Applied
    }

    /// Record an error for a request that was never sent. Any request still
    /// in flight becomes stale.
    pub fn fail_fast(&mut self, error: FetchError) {
        self.generation += 1;
        self.loading = false;
        self.error = Some(error);
    }

    pub fn status(&self) -> FeedStatus<'_> {
        if self.is_loading() {
            FeedStatus::Loading
        } else if let Some(e) = &self.error {
            FeedStatus::Failed(e)
        } else if self.items.is_empty() {
            FeedStatus::Empty
        } else {
            FeedStatus::Ready
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn page(&self) -> PageSlice<'_, T> {
        self.pagination.slice(&self.items)
    }

    pub fn go_to_page(&mut self, page: usize) -> usize {
        self.pagination.go_to(page, self.items.len())
    }

    pub fn next_page(&mut self) -> usize {
        self.pagination.next(self.items.len())
    }

    pub fn prev_page(&mut self) -> usize {
        self.pagination.prev(self.items.len())
    }
}
