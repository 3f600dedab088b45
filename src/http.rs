use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::utils::Timing;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest_middleware::Error,
    },

    #[error("request to {url} returned {status}")]
    Status { url: String, status: StatusCode },

    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Issues GET requests and hands back the raw payload.
///
/// Any non-success status is an error; retrying against another url is left
/// to the caller.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// GETs `url` and decodes the body as JSON into `T`.
pub async fn get_json<F, T>(fetcher: &F, url: &str) -> Result<T, FetchError>
where
    F: Fetch + ?Sized,
    T: DeserializeOwned,
{
    let body = fetcher.get_bytes(url).await?;
    serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
        url: url.to_owned(),
        source,
    })
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: ClientWithMiddleware,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = HttpClient::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::Client)?;

        Ok(HttpFetcher {
            client: ClientBuilder::new(client)
                .with(TracingMiddleware::default())
                .build(),
        })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let _timing = Timing::new(url);
        debug!("fetching {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_owned(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_owned(),
                status,
            });
        }

        let body = response.bytes().await.map_err(|source| FetchError::Body {
            url: url.to_owned(),
            source,
        })?;

        Ok(body.to_vec())
    }
}
