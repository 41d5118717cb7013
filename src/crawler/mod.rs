//! Remote access to the Ergast-compatible API, mirrored through a local
//! on-disk cache.

pub mod cache;

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serenity::async_trait;

use crate::error::{Error, Result};

pub use cache::ResourceCache;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Result rows per page; the API rejects larger limits.
pub const RESULTS_PAGE_LIMIT: usize = 100;

/// Fetches a raw document by URL.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<Vec<u8>>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;

        if response.status() != StatusCode::OK {
            return Err(Error::Status {
                url: url.to_owned(),
                status: response.status().as_u16(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// The four documents the season is assembled from. Results are paged, see
/// [`Endpoints::results_page`].
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub calendar: String,
    pub results: String,
    pub driver_standings: String,
    pub constructor_standings: String,
}

impl Endpoints {
    pub fn new(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            calendar: format!("{base}/current.json"),
            results: format!("{base}/current/results.json"),
            driver_standings: format!("{base}/current/driverStandings.json"),
            constructor_standings: format!(
                "{base}/current/constructorStandings.json"
            ),
        }
    }

    pub fn results_page(&self, offset: usize) -> String {
        format!("{}?limit={RESULTS_PAGE_LIMIT}&offset={offset}", self.results)
    }
}
