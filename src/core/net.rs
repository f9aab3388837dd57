// src/core/net.rs
// Blocking HTTP GETs with a fixed pause between requests.

use std::{thread, time::{Duration, Instant}};

use reqwest::blocking::Client;
use tracing::debug;

use crate::config::options::FetchOptions;
use crate::error::FetchError;

/// One fetched episode page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageResponse {
    /// The URL we asked for.
    pub url: String,
    /// Where we ended up after redirects.
    pub final_url: String,
    pub text: String,
}

/// Source of remote documents. `HttpFetcher` in production, fakes in tests.
pub trait Fetch {
    fn fetch_page(&mut self, num: u32) -> Result<PageResponse, FetchError>;
    fn fetch_feed(&mut self) -> Result<String, FetchError>;
}

/// Enforces a minimum gap between consecutive calls to `wait`.
/// Fixed, not adaptive.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last: Option<Instant>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self { min_interval, last: None }
    }

    /// Block until `min_interval` has passed since the previous call.
    pub fn wait(&mut self) {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                thread::sleep(self.min_interval - elapsed);
            }
        }
        self.last = Some(Instant::now());
    }
}

pub struct HttpFetcher {
    client: Client,
    limiter: RateLimiter,
    opts: FetchOptions,
}

impl HttpFetcher {
    pub fn new(opts: FetchOptions) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(opts.user_agent.clone())
            .timeout(opts.timeout)
            .build()
            .map_err(|source| FetchError::Http { url: s!("<client>"), source })?;

        Ok(Self { client, limiter: RateLimiter::new(opts.request_pause), opts })
    }

    fn get(&mut self, url: &str) -> Result<(String, String), FetchError> {
        self.limiter.wait();

        let t = Instant::now();
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|source| FetchError::Http { url: s!(url), source })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status { url: s!(url), status: status.as_u16() });
        }

        let final_url = resp.url().to_string();
        let text = resp
            .text()
            .map_err(|source| FetchError::Http { url: s!(url), source })?;
        debug!(%url, %final_url, bytes = text.len(), elapsed = ?t.elapsed(), "GET ok");
        Ok((final_url, text))
    }
}

impl Fetch for HttpFetcher {
    fn fetch_page(&mut self, num: u32) -> Result<PageResponse, FetchError> {
        let url = self.opts.episode_url_for(num);
        let (final_url, text) = self.get(&url)?;
        Ok(PageResponse { url, final_url, text })
    }

    fn fetch_feed(&mut self) -> Result<String, FetchError> {
        let url = self.opts.feed_url.clone();
        self.get(&url).map(|(_, text)| text)
    }
}
