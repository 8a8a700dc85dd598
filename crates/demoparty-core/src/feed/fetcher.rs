//! Feed retrieval with relay fallback.
//!
//! The feed is requested directly first. When that yields nothing the relay
//! proxies are tried one after another, in order, until one returns a
//! non-empty body.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::FeedError;
use crate::config::Config;

/// Accept header sent on the direct request
const FEED_ACCEPT: &str = "application/rss+xml, application/xml, text/xml";

/// Canonical location of the demoparty.net feed
pub const DEFAULT_FEED_URL: &str = "https://www.demoparty.net/demoparties.xml";

/// HTTP GET capability the fetcher is written against.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// GET `url` and return the body of a successful response
    async fn get_text(&self, url: &str, accept: Option<&str>) -> Result<String, FeedError>;
}

/// Production transport. Clone is cheap - reqwest::Client uses Arc internally.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Every request made through this transport gives up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, FeedError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(FeedError::from_status(status, &body))
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get_text(&self, url: &str, accept: Option<&str>) -> Result<String, FeedError> {
        let mut request = self.client.get(url);
        if let Some(accept) = accept {
            request = request.header(header::ACCEPT, accept);
        }
        let response = Self::check_response(request.send().await?).await?;
        Ok(response.text().await?)
    }
}

/// A CORS relay able to proxy the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Relay {
    /// Target goes percent-encoded into `query_param`; the response is a JSON
    /// object whose `contents` field holds the feed.
    JsonEnvelope { base: String, query_param: String },
    /// Target is appended verbatim to `prefix`; the response is the feed.
    RawText { prefix: String },
}

#[derive(Debug, Deserialize)]
struct RelayEnvelope {
    #[serde(default)]
    contents: Option<String>,
}

impl Relay {
    pub fn default_relays() -> Vec<Relay> {
        vec![
            Relay::JsonEnvelope {
                base: "https://api.allorigins.win/get".to_string(),
                query_param: "url".to_string(),
            },
            Relay::RawText {
                prefix: "https://cors-anywhere.herokuapp.com/".to_string(),
            },
            Relay::RawText {
                prefix: "https://corsproxy.io/?".to_string(),
            },
        ]
    }

    /// URL to request from this relay to obtain `target`
    pub fn request_url(&self, target: &str) -> Result<String, FeedError> {
        match self {
            Relay::JsonEnvelope { base, query_param } => {
                reqwest::Url::parse_with_params(base, &[(query_param.as_str(), target)])
                    .map(|url| url.to_string())
                    .map_err(|e| FeedError::Config(format!("invalid relay {}: {}", base, e)))
            }
            Relay::RawText { prefix } => Ok(format!("{}{}", prefix, target)),
        }
    }

    fn name(&self) -> &str {
        match self {
            Relay::JsonEnvelope { base, .. } => base,
            Relay::RawText { prefix } => prefix,
        }
    }

    /// Pull the feed text out of a relay response body
    fn extract(&self, body: String) -> Result<String, FeedError> {
        match self {
            Relay::JsonEnvelope { .. } => {
                let envelope: RelayEnvelope = serde_json::from_str(&body).map_err(|e| {
                    FeedError::InvalidDocument(format!("relay envelope: {}", e))
                })?;
                envelope
                    .contents
                    .ok_or_else(|| FeedError::EmptyResponse(self.name().to_string()))
            }
            Relay::RawText { .. } => Ok(body),
        }
    }
}

fn non_empty(body: String, source: &str) -> Result<String, FeedError> {
    if body.trim().is_empty() {
        Err(FeedError::EmptyResponse(source.to_string()))
    } else {
        Ok(body)
    }
}

/// Retrieves the raw feed text.
#[derive(Clone)]
pub struct FeedFetcher {
    transport: Arc<dyn HttpTransport>,
    feed_url: String,
    relays: Vec<Relay>,
}

impl FeedFetcher {
    /// Fetcher over HTTP using the feed URL, relays and timeout from `config`
    pub fn new(config: &Config) -> Result<Self, FeedError> {
        let transport = ReqwestTransport::new(config.request_timeout())?;
        Ok(Self::with_transport(
            Arc::new(transport),
            config.feed_url.clone(),
            config.relays.clone(),
        ))
    }

    pub fn with_transport(
        transport: Arc<dyn HttpTransport>,
        feed_url: String,
        relays: Vec<Relay>,
    ) -> Self {
        Self {
            transport,
            feed_url,
            relays,
        }
    }

    pub fn feed_url(&self) -> &str {
        &self.feed_url
    }

    async fn fetch_direct(&self) -> Result<String, FeedError> {
        let body = self
            .transport
            .get_text(&self.feed_url, Some(FEED_ACCEPT))
            .await?;
        non_empty(body, &self.feed_url)
    }

    async fn fetch_via_relay(&self, relay: &Relay) -> Result<String, FeedError> {
        let url = relay.request_url(&self.feed_url)?;
        let body = self.transport.get_text(&url, None).await?;
        non_empty(relay.extract(body)?, relay.name())
    }

    /// Raw feed text from the first source that returns any.
    ///
    /// Per-source failures are logged and skipped; only total exhaustion (or
    /// an unusable feed URL) is reported.
    pub async fn fetch(&self) -> Result<String, FeedError> {
        reqwest::Url::parse(&self.feed_url)
            .map_err(|e| FeedError::Config(format!("invalid feed url {}: {}", self.feed_url, e)))?;

        match self.fetch_direct().await {
            Ok(body) => {
                debug!(url = %self.feed_url, bytes = body.len(), "Fetched feed directly");
                return Ok(body);
            }
            Err(e) => debug!(url = %self.feed_url, error = %e, "Direct feed fetch failed"),
        }

        for (attempt, relay) in self.relays.iter().enumerate() {
            match self.fetch_via_relay(relay).await {
                Ok(body) => {
                    info!(relay = relay.name(), bytes = body.len(), "Fetched feed via relay");
                    return Ok(body);
                }
                Err(e) => {
                    warn!(relay = relay.name(), attempt = attempt + 1, error = %e, "Relay failed");
                }
            }
        }

        Err(FeedError::Exhausted)
    }
}
