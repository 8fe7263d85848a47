//! Price fetch client
//!
//! Talks either to a hosted price endpoint (JSON `{title, price}`) or, when
//! no endpoint is configured, fetches the product page itself and runs the
//! extractors over the HTML.

use crate::error::{Result, TrackerError};
use crate::extract;
use crate::parser;
use serde::Deserialize;

/// Placeholder stored when the remote source provides no price text
pub const UNAVAILABLE: &str = "Unavailable";

/// Sent when scraping product pages directly; a plain library User-Agent
/// gets served the robot check far more often.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// One successful fetch+parse of a product page
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSnapshot {
    pub title: String,
    pub price_text: String,
    pub price_value: Option<f64>,
}

/// Per-item fetch result. Failures are data, not errors, so a refresh batch
/// keeps going after one item goes wrong.
#[derive(Debug)]
pub enum FetchOutcome {
    Success(PriceSnapshot),
    Failure(String),
}

/// Raw response from the hosted price endpoint; extra fields are ignored
#[derive(Debug, Deserialize)]
struct PriceResponse {
    title: Option<String>,
    price: Option<String>,
}

/// HTTP client for product price lookups
#[derive(Debug, Clone)]
pub struct PriceClient {
    http: reqwest::Client,
    api_url: Option<String>,
    api_key: Option<String>,
}

impl PriceClient {
    /// Client backed by a hosted price endpoint
    pub fn with_api(api_url: impl Into<String>, api_key: Option<String>) -> Self {
        let mut api_url = api_url.into();
        while api_url.ends_with('/') {
            api_url.pop();
        }
        Self {
            http: reqwest::Client::new(),
            api_url: Some(api_url),
            api_key,
        }
    }

    /// Client that fetches and extracts product pages directly
    pub fn direct() -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: None,
            api_key: None,
        }
    }

    /// Fetch the current title and price for a product URL.
    ///
    /// Transport and upstream problems come back as [`FetchOutcome::Failure`]
    /// with a human-readable message. An unparsable price is still a
    /// success: the raw text is kept and the numeric value is absent.
    pub async fn fetch_price(&self, url: &str, fallback_title: &str) -> FetchOutcome {
        let result = match &self.api_url {
            Some(base) => self.fetch_via_api(base, url).await,
            None => self.fetch_via_scrape(url).await,
        };

        match result {
            Ok(response) => {
                let title = parser::normalize_title(response.title.as_deref(), fallback_title);
                let price_value = parser::parse_price_value(response.price.as_deref());
                let price_text = match response.price.as_deref().map(str::trim) {
                    Some(text) if !text.is_empty() => text.to_string(),
                    _ => UNAVAILABLE.to_string(),
                };
                FetchOutcome::Success(PriceSnapshot {
                    title,
                    price_text,
                    price_value,
                })
            }
            Err(e) => FetchOutcome::Failure(e.to_string()),
        }
    }

    async fn fetch_via_api(&self, base: &str, url: &str) -> Result<PriceResponse> {
        let endpoint = format!("{}/price?url={}", base, urlencoding::encode(url));
        log::debug!("Fetching price from endpoint: {}", endpoint);

        let mut request = self
            .http
            .get(&endpoint)
            .header("User-Agent", "price_tracker/1.0");
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(TrackerError::HttpStatus(response.status()));
        }
        Ok(response.json::<PriceResponse>().await?)
    }

    async fn fetch_via_scrape(&self, url: &str) -> Result<PriceResponse> {
        let normalized =
            extract::normalize_url(url).ok_or_else(|| TrackerError::InvalidUrl(url.to_string()))?;
        if !extract::is_allowed_product_url(&normalized) {
            return Err(TrackerError::InvalidUrl(normalized));
        }

        log::debug!("Fetching product page: {}", normalized);
        let response = self
            .http
            .get(&normalized)
            .header("User-Agent", BROWSER_USER_AGENT)
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Accept", "text/html,application/xhtml+xml")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(TrackerError::HttpStatus(response.status()));
        }

        let body = response.text().await?;
        response_from_html(&body)
    }
}

/// Turn a fetched product page into a raw title/price response.
fn response_from_html(body: &str) -> Result<PriceResponse> {
    if extract::looks_like_captcha(body) {
        return Err(TrackerError::Blocked);
    }
    Ok(PriceResponse {
        title: extract::extract_title(body),
        price: extract::extract_price(body),
    })
}

#[cfg(test)]
#[path = "fetch_tests.rs"]
mod tests;
