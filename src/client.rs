//! Page Fetcher: one bounded GET against a catalog page, classified.
//!
//! Nothing here returns `Err`. Every outcome, including network failure,
//! is a `PageResult` so callers can decide between "skip" and "stop".

use crate::api::CatalogItem;
use crate::errors::{HarvestError, TransportKind};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum PageResult {
    /// 200 with a non-empty JSON array, every element kept
    Items(Vec<CatalogItem>),
    /// 200 with `[]` or any JSON value that is not an array
    Empty,
    /// Any status other than 200
    HttpError(u16),
    /// No usable response: network failure or a body that is not JSON
    TransportError(TransportKind),
}

impl PageResult {
    pub fn describe(&self) -> String {
        match self {
            PageResult::Items(items) => format!("{} items", items.len()),
            PageResult::Empty => "empty page".to_string(),
            PageResult::HttpError(status) => format!("HTTP {}", status),
            PageResult::TransportError(kind) => format!("{} failure", kind),
        }
    }

    /// 200 response with valid JSON, whatever it contained
    pub fn is_reachable(&self) -> bool {
        matches!(self, PageResult::Items(_) | PageResult::Empty)
    }
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> PageResult;
}

/// reqwest-backed fetcher. The user agent and timeout are fixed at
/// construction and apply to every request.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: reqwest::Client,
}

impl CatalogClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, HarvestError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| HarvestError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for CatalogClient {
    async fn fetch(&self, url: &str) -> PageResult {
        debug!("GET {}", url);

        let resp = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                let kind = TransportKind::from_reqwest(&e);
                debug!("Request to {} failed ({}): {}", url, kind, e);
                return PageResult::TransportError(kind);
            }
        };

        let status = resp.status();
        if status != StatusCode::OK {
            return PageResult::HttpError(status.as_u16());
        }

        match resp.bytes().await {
            Ok(body) => classify_body(&body),
            Err(e) => {
                let kind = TransportKind::from_reqwest(&e);
                debug!("Reading body of {} failed ({}): {}", url, kind, e);
                PageResult::TransportError(kind)
            }
        }
    }
}

/// Classify the body of a 200 response.
pub fn classify_body(body: &[u8]) -> PageResult {
    match serde_json::from_slice::<Value>(body) {
        Ok(value) => decode_page(value),
        Err(e) => {
            debug!("Body is not JSON: {}", e);
            PageResult::TransportError(TransportKind::Parse)
        }
    }
}

/// Decode a parsed page. Any non-empty array is a page of items: an
/// element that is not a catalog object becomes an all-default item rather
/// than costing the rest of the page.
pub fn decode_page(value: Value) -> PageResult {
    let elements = match value {
        Value::Array(elements) if !elements.is_empty() => elements,
        _ => return PageResult::Empty,
    };

    let items = elements
        .into_iter()
        .enumerate()
        .map(|(idx, element)| {
            serde_json::from_value(element).unwrap_or_else(|e| {
                warn!("Catalog entry #{} is not an object, using defaults: {}", idx, e);
                CatalogItem::default()
            })
        })
        .collect();

    PageResult::Items(items)
}
