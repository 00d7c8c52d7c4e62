//! Provider JWKS retrieval with a TTL cache.
//!
//! `GET <api_url>/v1/jwks` authenticated with the provider secret key.
//!
//! Fetches are single-flight: concurrent callers wait on one request and
//! reuse its result. A `kid` miss refetches at most once per refresh
//! cooldown.

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::JwkSet;
use reqwest::header::USER_AGENT;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use url::Url;

#[derive(Debug, Error)]
pub enum JwksError {
    #[error("invalid jwks url: {0}")]
    Url(#[from] url::ParseError),
    #[error("jwks request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("jwks endpoint returned {0}")]
    Status(reqwest::StatusCode),
    #[error("jwks contains no keys")]
    Empty,
}

pub const DEFAULT_REFRESH_COOLDOWN: Duration = Duration::from_secs(30);

struct Cached {
    keys: Arc<JwkSet>,
    fetched_at: Instant,
}

pub struct JwksClient {
    http: reqwest::Client,
    url: Url,
    ttl: Duration,
    refresh_cooldown: Duration,
    cache: RwLock<Option<Cached>>,
    // Held for the duration of a fetch. Holds when the last kid-miss refresh ran.
    fetching: Mutex<Option<Instant>>,
}

impl std::fmt::Debug for JwksClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwksClient")
            .field("url", &self.url.as_str())
            .field("ttl", &self.ttl)
            .field("refresh_cooldown", &self.refresh_cooldown)
            .finish_non_exhaustive()
    }
}

impl JwksClient {
    pub fn new(api_url: &str, ttl: Duration) -> Result<Self, JwksError> {
        let mut base = Url::parse(api_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let url = base.join("v1/jwks")?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            http,
            url,
            ttl,
            refresh_cooldown: DEFAULT_REFRESH_COOLDOWN,
            cache: RwLock::new(None),
            fetching: Mutex::new(None),
        })
    }

    /// Minimum interval between refetches triggered by a `kid` miss.
    pub fn with_refresh_cooldown(mut self, cooldown: Duration) -> Self {
        self.refresh_cooldown = cooldown;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Cached key set, if one was fetched within the TTL.
    pub async fn cached(&self) -> Option<Arc<JwkSet>> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .filter(|c| c.fetched_at.elapsed() < self.ttl)
            .map(|c| Arc::clone(&c.keys))
    }

    /// Key set for a lookup: the cached set when fresh, else one fetch shared
    /// by every caller waiting on it.
    pub async fn keys(&self, secret_key: &str) -> Result<Arc<JwkSet>, JwksError> {
        if let Some(keys) = self.cached().await {
            return Ok(keys);
        }

        let _fetching = self.fetching.lock().await;
        // Filled by another task while this one waited.
        if let Some(keys) = self.cached().await {
            return Ok(keys);
        }

        self.fetch(secret_key).await
    }

    /// Refetch after a `kid` miss. Within the cooldown of the previous miss
    /// refresh, the cached set is returned unchanged.
    pub async fn refresh(&self, secret_key: &str) -> Result<Arc<JwkSet>, JwksError> {
        let mut last_refresh = self.fetching.lock().await;

        if let Some(at) = *last_refresh {
            if at.elapsed() < self.refresh_cooldown {
                if let Some(keys) = self.cached().await {
                    tracing::debug!("jwks refresh skipped, within cooldown");
                    return Ok(keys);
                }
            }
        }

        // Stamped before the fetch: a failed attempt also starts the cooldown.
        *last_refresh = Some(Instant::now());
        self.fetch(secret_key).await
    }

    async fn fetch(&self, secret_key: &str) -> Result<Arc<JwkSet>, JwksError> {
        tracing::debug!(url = %self.url, "fetching jwks");

        let response = self
            .http
            .get(self.url.clone())
            .bearer_auth(secret_key)
            .header(USER_AGENT, concat!("session-gate/", env!("CARGO_PKG_VERSION")))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(JwksError::Status(status));
        }

        let keys: JwkSet = response.json().await?;
        if keys.keys.is_empty() {
            return Err(JwksError::Empty);
        }

        tracing::debug!(count = keys.keys.len(), "jwks fetched");

        let keys = Arc::new(keys);
        *self.cache.write().await = Some(Cached {
            keys: Arc::clone(&keys),
            fetched_at: Instant::now(),
        });

        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jwks_url_is_appended_to_base() {
        let client = JwksClient::new("https://api.clerk.com", Duration::from_secs(60)).unwrap();
        assert_eq!(client.url().as_str(), "https://api.clerk.com/v1/jwks");

        let client =
            JwksClient::new("http://127.0.0.1:9000/proxy", Duration::from_secs(60)).unwrap();
        assert_eq!(client.url().as_str(), "http://127.0.0.1:9000/proxy/v1/jwks");
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(matches!(
            JwksClient::new("not a url", Duration::from_secs(60)),
            Err(JwksError::Url(_))
        ));
    }

    #[tokio::test]
    async fn empty_cache_yields_nothing() {
        let client = JwksClient::new("https://api.clerk.com", Duration::from_secs(60)).unwrap();
        assert!(client.cached().await.is_none());
    }
}
