//! Render client implementation
//!
//! Pages on the target site only make sense after JavaScript has run, so the
//! crawler never fetches HTML directly. It asks a headless-browser render
//! service to load the URL, perform the interaction steps, and hand back the
//! resulting DOM. This module holds:
//! - The `RenderClient` trait the coordinator depends on
//! - `HttpRenderClient`, which talks to a render service over HTTP
//! - Politeness spacing, user-agent rotation and the optional render cache

use crate::config::{CacheMode, RenderConfig};
use crate::crawler::request::InteractionStep;
use crate::{FetchError, SieveError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use url::Url;

/// HTML after JavaScript execution and all interaction steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub url: Url,
    pub html: String,
}

/// Anything that can turn a URL plus interaction steps into rendered HTML
#[async_trait]
pub trait RenderClient: Send + Sync {
    async fn fetch(
        &self,
        url: &Url,
        steps: &[InteractionStep],
    ) -> Result<RenderedDocument, FetchError>;
}

/// Request body sent to the render service
#[derive(Debug, Serialize)]
struct RenderRequest<'a> {
    url: &'a str,
    steps: &'a [InteractionStep],
    timeout_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_agent: Option<&'a str>,
}

/// Response body returned by the render service
#[derive(Debug, Deserialize)]
struct RenderResponse {
    html: String,
}

type CacheKey = (String, Vec<InteractionStep>);

/// Render client backed by an HTTP render service
///
/// Every call is a `POST {endpoint}/render` with a JSON body
/// `{ "url", "steps", "timeout_ms", "user_agent" }`; the service answers
/// with `{ "html": "..." }`.
pub struct HttpRenderClient {
    client: Client,
    render_url: Url,
    timeout: Duration,
    politeness_delay: Duration,
    cache_mode: CacheMode,
    user_agents: Vec<String>,
    next_agent: AtomicUsize,
    last_request: tokio::sync::Mutex<Option<Instant>>,
    cache: Mutex<HashMap<CacheKey, String>>,
}

impl HttpRenderClient {
    /// Creates a render client from configuration
    ///
    /// # Returns
    ///
    /// * `Ok(HttpRenderClient)` - Client ready to use
    /// * `Err(SieveError)` - Invalid endpoint or HTTP client setup failure
    pub fn new(config: &RenderConfig) -> Result<Self, SieveError> {
        let timeout = Duration::from_secs(config.timeout_secs);

        // The render service itself may take the full page timeout plus
        // its own overhead before answering
        let client = Client::builder()
            .timeout(timeout + Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()?;

        let mut endpoint = Url::parse(&config.endpoint)?;
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }
        let render_url = endpoint.join("render")?;

        Ok(Self {
            client,
            render_url,
            timeout,
            politeness_delay: Duration::from_millis(config.politeness_delay_ms),
            cache_mode: config.cache_mode,
            user_agents: config.user_agents.clone(),
            next_agent: AtomicUsize::new(0),
            last_request: tokio::sync::Mutex::new(None),
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Picks the next user agent, round-robin
    fn next_user_agent(&self) -> Option<&str> {
        if self.user_agents.is_empty() {
            return None;
        }
        let index = self.next_agent.fetch_add(1, Ordering::Relaxed) % self.user_agents.len();
        Some(self.user_agents[index].as_str())
    }

    /// Waits until the politeness delay since the previous render has passed
    async fn wait_for_turn(&self) {
        if self.politeness_delay.is_zero() {
            return;
        }

        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.politeness_delay {
                tokio::time::sleep(self.politeness_delay - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    fn cached(&self, key: &CacheKey) -> Option<String> {
        if self.cache_mode != CacheMode::Enabled {
            return None;
        }
        self.cache.lock().ok()?.get(key).cloned()
    }

    fn store(&self, key: CacheKey, html: &str) {
        if self.cache_mode != CacheMode::Enabled {
            return;
        }
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, html.to_string());
        }
    }
}

#[async_trait]
impl RenderClient for HttpRenderClient {
    async fn fetch(
        &self,
        url: &Url,
        steps: &[InteractionStep],
    ) -> Result<RenderedDocument, FetchError> {
        let key: CacheKey = (url.to_string(), steps.to_vec());
        if let Some(html) = self.cached(&key) {
            tracing::debug!("Render cache hit for {}", url);
            return Ok(RenderedDocument {
                url: url.clone(),
                html,
            });
        }

        self.wait_for_turn().await;

        let body = RenderRequest {
            url: url.as_str(),
            steps,
            timeout_ms: self.timeout.as_millis() as u64,
            user_agent: self.next_user_agent(),
        };

        tracing::trace!("Rendering {} with {} steps", url, steps.len());

        let response = self
            .client
            .post(self.render_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| FetchError::new(url.as_str(), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                url.as_str(),
                format!("render service returned HTTP {}", status.as_u16()),
            ));
        }

        let rendered: RenderResponse = response
            .json()
            .await
            .map_err(|e| FetchError::new(url.as_str(), format!("invalid render response: {}", e)))?;

        self.store(key, &rendered.html);

        Ok(RenderedDocument {
            url: url.clone(),
            html: rendered.html,
        })
    }
}
