use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use shared::{
    domain::{Region, SubRegion},
    error::DirectoryError,
    protocol::{decode_regions, decode_sub_regions},
};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

pub mod handoff;
pub mod screen;
pub mod selection;

pub use handoff::{confirm, Navigator};
pub use screen::{DirectoryEvent, EventOutcome, LocationScreen};
pub use selection::{
    RegionStatus, ResponseOutcome, SelectionError, SelectionState, SubRegionStatus,
    SubRegionTicket,
};

/// Read-only view of the remote region directory.
///
/// Implementations are stateless; calls for different regions may overlap.
/// An unknown region code yields `Ok(vec![])`, not an error.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    async fn fetch_regions(&self) -> Result<Vec<Region>, DirectoryError>;
    async fn fetch_sub_regions(&self, region: &Region) -> Result<Vec<SubRegion>, DirectoryError>;
}

/// Paths of the two directory resources relative to the base url.
/// `{code}` in `sub_regions_path` is replaced by the region code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEndpoints {
    pub regions_path: String,
    pub sub_regions_path: String,
}

impl DirectoryEndpoints {
    pub const CODE_PLACEHOLDER: &'static str = "{code}";

    pub fn generic() -> Self {
        Self {
            regions_path: "/regions".into(),
            sub_regions_path: "/regions/{code}/subregions".into(),
        }
    }

    /// IBGE localities API (states and their municipalities).
    pub fn ibge() -> Self {
        Self {
            regions_path: "/estados".into(),
            sub_regions_path: "/estados/{code}/municipios".into(),
        }
    }
}

impl Default for DirectoryEndpoints {
    fn default() -> Self {
        Self::generic()
    }
}

#[derive(Debug, Error)]
pub enum DirectoryClientBuildError {
    #[error("invalid directory base url {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("directory base url {0} cannot carry a path")]
    CannotBeABase(String),
    #[error("failed to build http client: {0}")]
    Http(#[from] reqwest::Error),
}

pub struct HttpDirectoryClient {
    http: Client,
    base_url: Url,
    endpoints: DirectoryEndpoints,
}

impl HttpDirectoryClient {
    pub fn new(
        base_url: &str,
        endpoints: DirectoryEndpoints,
        request_timeout: Option<Duration>,
    ) -> Result<Self, DirectoryClientBuildError> {
        let mut builder = Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        Self::with_builder(base_url, endpoints, builder)
    }

    pub(crate) fn with_builder(
        base_url: &str,
        endpoints: DirectoryEndpoints,
        builder: ClientBuilder,
    ) -> Result<Self, DirectoryClientBuildError> {
        let parsed = Url::parse(base_url).map_err(|source| {
            DirectoryClientBuildError::InvalidBaseUrl {
                url: base_url.to_string(),
                source,
            }
        })?;
        if parsed.cannot_be_a_base() {
            return Err(DirectoryClientBuildError::CannotBeABase(
                base_url.to_string(),
            ));
        }

        Ok(Self {
            http: builder.build()?,
            base_url: parsed,
            endpoints,
        })
    }

    fn endpoint_url(&self, template: &str, region: Option<&Region>) -> Result<Url, DirectoryError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                DirectoryError::network(format!("unusable directory base url {}", self.base_url))
            })?;
            segments.pop_if_empty();
            for segment in template.split('/').filter(|s| !s.is_empty()) {
                match region {
                    Some(region) if segment == DirectoryEndpoints::CODE_PLACEHOLDER => {
                        segments.push(region.as_str());
                    }
                    _ => {
                        segments.push(segment);
                    }
                }
            }
        }
        Ok(url)
    }

    async fn get_body(&self, url: Url) -> Result<Vec<u8>, DirectoryError> {
        debug!(%url, "directory request");
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|err| transport_error(&url, err))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "directory returned non-success status");
            return Err(DirectoryError::network(format!("{url} returned {status}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| transport_error(&url, err))?;
        Ok(body.to_vec())
    }
}

fn transport_error(url: &Url, err: reqwest::Error) -> DirectoryError {
    if err.is_timeout() {
        warn!(%url, "directory request timed out");
        DirectoryError::network(format!("request to {url} timed out"))
    } else {
        warn!(%url, "directory request failed: {err}");
        DirectoryError::network(format!("request to {url} failed: {err}"))
    }
}

#[async_trait]
impl DirectoryClient for HttpDirectoryClient {
    async fn fetch_regions(&self) -> Result<Vec<Region>, DirectoryError> {
        let url = self.endpoint_url(&self.endpoints.regions_path, None)?;
        let body = self.get_body(url).await?;
        decode_regions(&body)
    }

    async fn fetch_sub_regions(&self, region: &Region) -> Result<Vec<SubRegion>, DirectoryError> {
        let url = self.endpoint_url(&self.endpoints.sub_regions_path, Some(region))?;
        let body = self.get_body(url).await?;
        decode_sub_regions(&body)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
