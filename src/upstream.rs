//! Upstream HTTP Origin
//!
//! Resource accessor that downloads resources from an HTTP origin, used by
//! the caching proxy server.

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use crate::error::UpstreamError;
use crate::proxy::ResourceAccessor;

// == HTTP Accessor ==
/// Fetches `{base_url}/{key}` from an HTTP origin.
#[derive(Debug, Clone)]
pub struct HttpAccessor {
    client: Client,
    base_url: String,
}

impl HttpAccessor {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL a key is fetched from and written to.
    ///
    /// The key becomes a single percent-encoded path segment, so `#`, `?`
    /// and `/` inside it never change which resource is addressed.
    pub fn resource_url(&self, key: &str) -> Result<Url, UpstreamError> {
        let invalid = || UpstreamError::InvalidUrl(self.base_url.clone());
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .push(key);
        Ok(url)
    }

    // == Upload ==
    /// Writes `body` to the origin with `PUT {base_url}/{key}`.
    pub async fn upload(&self, key: &str, body: String) -> Result<(), UpstreamError> {
        let url = self.resource_url(key)?;
        debug!("PUT {}", url);

        let response = self.client.put(url.clone()).body(body).send().await?;
        if !response.status().is_success() {
            return Err(UpstreamError::Status {
                status: response.status().as_u16(),
                url: url.into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ResourceAccessor for HttpAccessor {
    type Key = String;
    type Value = String;
    type Error = UpstreamError;

    async fn fetch(&self, key: &String) -> Result<String, UpstreamError> {
        let url = self.resource_url(key)?;
        debug!("GET {}", url);

        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(UpstreamError::Status {
                status: response.status().as_u16(),
                url: url.into(),
            });
        }
        Ok(response.text().await?)
    }
}
