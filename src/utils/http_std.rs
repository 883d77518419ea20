use std::collections::HashMap;
use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use reqwest::StatusCode;

use crate::error::{Error, Result};

/// Default timeout for HTTP requests in seconds
pub const DEFAULT_TIMEOUT: u64 = 15;
pub const DEFAULT_USER_AGENT: &str = "subconv/0.1";

/// Retrieves raw bytes for a URL. Callers always pass an explicit timeout.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>>;
}

/// Blocking HTTP fetcher backed by reqwest. The client (and its
/// connection pool) is built once and shared by every request.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    user_agent: String,
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> Result<Self> {
        let user_agent = if user_agent.is_empty() {
            DEFAULT_USER_AGENT
        } else {
            user_agent
        };
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(HttpFetcher {
            user_agent: user_agent.to_string(),
            client,
        })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>> {
        let fail = |reason: String| Error::Fetch {
            url: url.to_string(),
            reason,
        };

        debug!("Fetching {} (timeout {:?})", url, timeout);
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .map_err(|e| fail(format!("failed to send request: {}", e)))?;

        if response.status() != StatusCode::OK {
            return Err(fail(format!("HTTP error: {}", response.status())));
        }

        let body = response
            .bytes()
            .map_err(|e| fail(format!("failed to read response body: {}", e)))?;
        Ok(body.to_vec())
    }
}

/// Serves fixed bodies from memory, for tests and offline runs.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    bodies: HashMap<String, Vec<u8>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        StaticFetcher::default()
    }

    pub fn with(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.bodies.insert(url.to_string(), body.into());
        self
    }
}

impl Fetcher for StaticFetcher {
    fn fetch(&self, url: &str, _timeout: Duration) -> Result<Vec<u8>> {
        self.bodies.get(url).cloned().ok_or_else(|| Error::Fetch {
            url: url.to_string(),
            reason: "HTTP error: 404 Not Found".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_fetcher() {
        let fetcher = StaticFetcher::new().with("http://sub", "body");
        let timeout = Duration::from_secs(DEFAULT_TIMEOUT);
        assert_eq!(fetcher.fetch("http://sub", timeout).unwrap(), b"body".to_vec());
        assert!(matches!(
            fetcher.fetch("http://other", timeout),
            Err(Error::Fetch { .. })
        ));
    }

    #[test]
    fn test_http_fetcher_default_agent() {
        assert_eq!(HttpFetcher::new("").unwrap().user_agent(), DEFAULT_USER_AGENT);
        assert_eq!(HttpFetcher::new("custom").unwrap().user_agent(), "custom");
    }

    #[test]
    fn test_http_fetcher_reused_across_requests() {
        let fetcher = HttpFetcher::new("custom").unwrap();
        let timeout = Duration::from_secs(1);
        for _ in 0..2 {
            assert!(matches!(
                fetcher.fetch("http://127.0.0.1:1/sub", timeout),
                Err(Error::Fetch { .. })
            ));
        }
    }
}
