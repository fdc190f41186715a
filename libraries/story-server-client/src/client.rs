//! Main story backend client.

use crate::download::HttpMediaFetcher;
use crate::error::{Result, ServerClientError};
use crate::signing::HttpSigningService;
use crate::types::ServerConfig;
use crate::views::HttpViewBackend;
use reqwest::{Client, RequestBuilder};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Client for the story backend's storage and REST APIs.
///
/// Cheap to clone. The collaborator handles returned by `signing()`,
/// `media_fetcher()` and `view_backend()` share the underlying HTTP
/// connection pool.
///
/// # Example
///
/// ```ignore
/// use story_server_client::{ServerConfig, StoryServerClient};
/// use std::sync::Arc;
///
/// let config = ServerConfig::new("https://project.example.co", "public-anon-key")
///     .with_access_token(session_token);
/// let client = StoryServerClient::new(config)?;
///
/// let resolver = CacheResolver::new(
///     Arc::new(client.signing()),
///     Arc::new(client.media_fetcher()),
///     Arc::new(store),
/// );
/// let views = ViewGuard::new(Arc::new(client.view_backend()));
/// ```
#[derive(Clone)]
pub struct StoryServerClient {
    http: Client,
    config: Arc<ServerConfig>,
}

impl StoryServerClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ServerConfig) -> Result<Self> {
        if config.url.is_empty() {
            return Err(ServerClientError::InvalidUrl("URL cannot be empty".into()));
        }

        let url = config.url.trim_end_matches('/').to_string();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ServerClientError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }
        Url::parse(&url).map_err(|e| ServerClientError::InvalidUrl(e.to_string()))?;

        if config.media_bucket.is_empty() {
            return Err(ServerClientError::InvalidUrl(
                "media bucket cannot be empty".into(),
            ));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("StoryViewer/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ServerClientError::Request)?;

        Ok(Self {
            http,
            config: Arc::new(ServerConfig { url, ..config }),
        })
    }

    /// Get the normalized base URL.
    pub fn url(&self) -> &str {
        &self.config.url
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Signing service backed by the storage API
    pub fn signing(&self) -> HttpSigningService {
        HttpSigningService::new(self.clone())
    }

    /// Media fetcher for signed URLs
    pub fn media_fetcher(&self) -> HttpMediaFetcher {
        HttpMediaFetcher::new(self.clone())
    }

    /// View-tracking backend backed by the REST API
    pub fn view_backend(&self) -> HttpViewBackend {
        HttpViewBackend::new(self.clone())
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// Attach the project key and bearer credential
    pub(crate) fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.config.api_key)
            .bearer_auth(self.config.bearer())
    }

    /// Build `{base}/{prefix}/{segments...}`, percent-encoding each segment
    pub(crate) fn endpoint<'a>(
        &self,
        prefix: &str,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{}", self.config.url, prefix))
            .map_err(|e| ServerClientError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| ServerClientError::InvalidUrl(self.config.url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}
