//! Page acquisition and product extraction tools.
//!
//! `fetch_page` downloads a page and keeps its markup in a [`PageCache`];
//! `extract_info` runs the [`ExtractionPipeline`] over a cached page (or over
//! markup passed inline). Both tools of one registry share the same cache,
//! which holds at most [`FetchConfig::max_cached_pages`] pages.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use lru::LruCache;
use rig::completion::ToolDefinition;
use rig::tool::Tool;
use rig_scrape_extract::{Extraction, ExtractionPipeline};
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::registry::{RegistryError, ToolRegistry};

/// Error type for the product tools.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum ToolError {
    /// The HTTP request could not be completed.
    #[error("request to {url} failed: {message}")]
    Request {
        /// Requested URL.
        url: String,
        /// Transport error.
        message: String,
    },
    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// Response status code.
        status: u16,
    },
    /// The response body is larger than [`FetchConfig::max_bytes`].
    #[error("{url} is larger than the {limit} byte limit")]
    TooLarge {
        /// Requested URL.
        url: String,
        /// Configured limit in bytes.
        limit: usize,
    },
    /// `extract_info` named a page that was never fetched (or was evicted).
    #[error("no page has been fetched for {0}; call fetch_page first")]
    PageNotFetched(String),
    /// `extract_info` was called before any page was fetched.
    #[error("no page has been fetched yet; call fetch_page first")]
    NothingFetched,
    /// The page markup could not be parsed at all.
    #[error("page could not be parsed: {0}")]
    Document(String),
}

/// HTTP and cache settings for `fetch_page`.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Whole-request timeout (default: 90 seconds).
    pub timeout: Duration,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// Largest response body accepted (default: 10 MiB).
    pub max_bytes: usize,
    /// Pages kept for `extract_info`; the least recently used is evicted (default: 8).
    pub max_cached_pages: NonZeroUsize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(90),
            user_agent: concat!("rig-scrape/", env!("CARGO_PKG_VERSION")).to_string(),
            max_bytes: 10 * 1024 * 1024,
            max_cached_pages: PageCache::DEFAULT_CAPACITY,
        }
    }
}

impl FetchConfig {
    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the largest accepted response body.
    #[must_use]
    pub const fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Set how many pages the cache keeps.
    #[must_use]
    pub const fn with_max_cached_pages(mut self, pages: NonZeroUsize) -> Self {
        self.max_cached_pages = pages;
        self
    }
}

#[derive(Debug)]
struct PageStore {
    pages: LruCache<String, String>,
    latest: Option<String>,
}

/// Fetched pages keyed by URL, shared between the tools of one registry.
///
/// Bounded: inserting past the capacity evicts the least recently used page.
/// The most recently inserted page is never the one evicted.
#[derive(Debug, Clone)]
pub struct PageCache {
    inner: Arc<Mutex<PageStore>>,
}

impl Default for PageCache {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

impl PageCache {
    /// Capacity used by [`PageCache::new`].
    pub const DEFAULT_CAPACITY: NonZeroUsize = NonZeroUsize::MIN.saturating_add(7);

    /// Creates an empty cache holding up to [`Self::DEFAULT_CAPACITY`] pages.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty cache holding up to `capacity` pages.
    #[must_use]
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PageStore {
                pages: LruCache::new(capacity),
                latest: None,
            })),
        }
    }

    /// Stores `html` for `url`, replacing any earlier copy, and marks it latest.
    pub async fn insert(&self, url: impl Into<String>, html: String) {
        let url = url.into();
        let mut store = self.inner.lock().await;
        let evicted = store
            .pages
            .push(url.clone(), html)
            .filter(|(evicted, _)| *evicted != url);
        if let Some((evicted, _)) = evicted {
            tracing::debug!(event = "page_evicted", url = %evicted, "page_evicted");
        }
        store.latest = Some(url);
    }

    /// Returns the markup stored for `url`.
    pub async fn get(&self, url: &str) -> Option<String> {
        self.inner.lock().await.pages.get(url).cloned()
    }

    /// Returns the most recently stored URL and its markup.
    pub async fn latest(&self) -> Option<(String, String)> {
        let mut store = self.inner.lock().await;
        let url = store.latest.clone()?;
        let html = store.pages.get(&url)?.clone();
        Some((url, html))
    }

    /// Number of cached pages.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.pages.len()
    }

    /// True if nothing has been cached.
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.pages.is_empty()
    }

    /// Most pages held at once.
    pub async fn capacity(&self) -> NonZeroUsize {
        self.inner.lock().await.pages.cap()
    }

    /// Drops every cached page.
    pub async fn clear(&self) {
        let mut store = self.inner.lock().await;
        store.pages.clear();
        store.latest = None;
    }
}

fn args_schema<T: JsonSchema>() -> Value {
    serde_json::to_value(schema_for!(T)).unwrap_or_else(|_| json!({"type": "object"}))
}

/// Arguments for the `fetch_page` tool.
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct FetchPageArgs {
    /// Absolute URL of the product page to fetch.
    pub url: String,
}

/// Downloads a product page and stores its markup for `extract_info`.
#[derive(Debug, Clone)]
pub struct FetchPageTool {
    http: reqwest::Client,
    max_bytes: usize,
    cache: PageCache,
}

impl FetchPageTool {
    /// Creates the tool with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (for example when
    /// the TLS backend fails to initialize).
    pub fn new(config: &FetchConfig, cache: PageCache) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            http,
            max_bytes: config.max_bytes,
            cache,
        })
    }
}

impl Tool for FetchPageTool {
    const NAME: &'static str = "fetch_page";
    type Error = ToolError;
    type Args = FetchPageArgs;
    type Output = String;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Fetches the HTML of a product page by URL and keeps it for \
                          extract_info. Returns a short status message, not the HTML."
                .to_string(),
            parameters: args_schema::<FetchPageArgs>(),
        }
    }

    #[tracing::instrument(skip(self, args), fields(url = %args.url))]
    async fn call(&self, args: FetchPageArgs) -> Result<String, ToolError> {
        let request_error = |e: reqwest::Error| ToolError::Request {
            url: args.url.clone(),
            message: e.to_string(),
        };

        let mut response = self.http.get(&args.url).send().await.map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(event = "fetch_rejected", status = status.as_u16(), "fetch_rejected");
            return Err(ToolError::Status {
                url: args.url.clone(),
                status: status.as_u16(),
            });
        }

        let too_large = || {
            tracing::warn!(event = "fetch_too_large", limit = self.max_bytes, "fetch_too_large");
            ToolError::TooLarge {
                url: args.url.clone(),
                limit: self.max_bytes,
            }
        };
        if response
            .content_length()
            .is_some_and(|length| !usize::try_from(length).is_ok_and(|n| n <= self.max_bytes))
        {
            return Err(too_large());
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(request_error)? {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }
        let html = String::from_utf8_lossy(&body).into_owned();
        let bytes = html.len();
        tracing::info!(event = "page_fetched", bytes, "page_fetched");

        self.cache.insert(args.url.clone(), html).await;
        Ok(format!(
            "Fetched {} ({bytes} bytes). Call extract_info to read the product details.",
            args.url
        ))
    }
}

/// Arguments for the `extract_info` tool.
#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct ExtractInfoArgs {
    /// URL previously passed to fetch_page. Defaults to the most recently fetched page.
    #[serde(default)]
    pub url: Option<String>,
    /// Raw HTML to extract from instead of a fetched page.
    #[serde(default)]
    pub html: Option<String>,
}

/// Extracts a product record from a fetched page.
#[derive(Debug, Clone)]
pub struct ExtractInfoTool {
    pipeline: ExtractionPipeline,
    cache: PageCache,
}

impl ExtractInfoTool {
    /// Creates the tool over `cache` using the default selector table.
    #[must_use]
    pub fn new(cache: PageCache) -> Self {
        Self::with_pipeline(ExtractionPipeline::new(), cache)
    }

    /// Creates the tool with a custom pipeline.
    #[must_use]
    pub const fn with_pipeline(pipeline: ExtractionPipeline, cache: PageCache) -> Self {
        Self { pipeline, cache }
    }
}

impl Tool for ExtractInfoTool {
    const NAME: &'static str = "extract_info";
    type Error = ToolError;
    type Args = ExtractInfoArgs;
    type Output = Extraction;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Extracts title, price, original price, discount, rating, review \
                          count, feature bullets and availability from a page fetched with \
                          fetch_page. Fields that could not be read are listed in field_errors."
                .to_string(),
            parameters: args_schema::<ExtractInfoArgs>(),
        }
    }

    async fn call(&self, args: ExtractInfoArgs) -> Result<Extraction, ToolError> {
        let html = match (args.html, args.url) {
            (Some(html), _) => html,
            (None, Some(url)) => match self.cache.get(&url).await {
                Some(html) => html,
                None => return Err(ToolError::PageNotFetched(url)),
            },
            (None, None) => match self.cache.latest().await {
                Some((_, html)) => html,
                None => return Err(ToolError::NothingFetched),
            },
        };

        // The parsed document is not Send; keep it out of any await.
        self.pipeline
            .run_html(&html)
            .map_err(|e| ToolError::Document(e.to_string()))
    }
}

/// Builds the product registry: `fetch_page` then `extract_info`, sharing one cache.
///
/// Every call creates a new cache, so registries never see each other's pages.
///
/// # Errors
///
/// Returns [`RegistryError::Construction`] if the HTTP client cannot be built.
pub async fn product_tools(config: &FetchConfig) -> Result<ToolRegistry, RegistryError> {
    let cache = PageCache::with_capacity(config.max_cached_pages);
    let fetch = FetchPageTool::new(config, cache.clone()).map_err(|e| {
        RegistryError::Construction {
            name: FetchPageTool::NAME.to_string(),
            message: e.to_string(),
        }
    })?;

    ToolRegistry::new()
        .with_tool(fetch)
        .await?
        .with_tool(ExtractInfoTool::new(cache))
        .await
}
