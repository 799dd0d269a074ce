//! Where reservation payloads come from.
//!
//! A source only hands back raw JSON. Decoding into records, normalisation
//! and installing the result are the refresh cycle's job.

use serde_json::Value;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub mod fixture;
pub mod http;
pub mod mock;

use fixture::FixtureSource;
use http::HttpSource;

/// Used when no source URL is configured.
pub const DEFAULT_SOURCE: &str = "/reservations.json";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid source configuration: {0}")]
    InvalidConfiguration(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected http status {0}")]
    Status(u16),
    #[error("failed to read fixture: {0}")]
    Io(#[from] std::io::Error),
    #[error("payload is not valid json: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("payload is not an array of records")]
    MalformedPayload,
    #[error("retrieval timed out after {0:?}")]
    Timeout(Duration),
}

pub trait ReservationSource: Send + Sync {
    fn fetch(&self) -> impl Future<Output = Result<Value, FetchError>> + Send;

    /// Short description for logs.
    fn describe(&self) -> String;
}

impl<S: ReservationSource> ReservationSource for Arc<S> {
    fn fetch(&self) -> impl Future<Output = Result<Value, FetchError>> + Send {
        (**self).fetch()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// A validated source setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Remote(reqwest::Url),
    /// Root-relative path into the bundled fixture directory.
    Bundled(String),
}

impl SourceLocation {
    /// Accepts an absolute `http(s)` URL or a root-relative path.
    pub fn parse(setting: &str) -> Result<Self, FetchError> {
        let setting = setting.trim();
        if setting.starts_with('/') && !setting.starts_with("//") {
            if setting.split('/').any(|segment| segment == "..") {
                return Err(FetchError::InvalidConfiguration(format!(
                    "path escapes fixture directory: {setting}"
                )));
            }
            return Ok(Self::Bundled(setting.to_string()));
        }

        let url = reqwest::Url::parse(setting)
            .map_err(|err| FetchError::InvalidConfiguration(format!("{setting:?}: {err}")))?;
        match url.scheme() {
            "http" | "https" => Ok(Self::Remote(url)),
            other => Err(FetchError::InvalidConfiguration(format!(
                "unsupported scheme {other:?} in {setting:?}"
            ))),
        }
    }
}

/// The source the service actually runs with.
#[derive(Debug)]
pub enum FeedSource {
    Http(HttpSource),
    Fixture(FixtureSource),
    /// Configuration was rejected; every fetch fails without doing any I/O.
    Invalid(String),
}

impl FeedSource {
    pub fn from_setting(setting: Option<&str>, fixture_dir: &Path) -> Self {
        let setting = setting
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_SOURCE);

        match SourceLocation::parse(setting) {
            Ok(SourceLocation::Remote(url)) => match HttpSource::new(url) {
                Ok(source) => Self::Http(source),
                Err(err) => Self::Invalid(err.to_string()),
            },
            Ok(SourceLocation::Bundled(path)) => {
                Self::Fixture(FixtureSource::new(fixture_dir, &path))
            }
            Err(err) => Self::Invalid(err.to_string()),
        }
    }
}

impl ReservationSource for FeedSource {
    async fn fetch(&self) -> Result<Value, FetchError> {
        match self {
            Self::Http(source) => source.fetch().await,
            Self::Fixture(source) => source.fetch().await,
            Self::Invalid(reason) => Err(FetchError::InvalidConfiguration(reason.clone())),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Http(source) => source.describe(),
            Self::Fixture(source) => source.describe(),
            Self::Invalid(reason) => format!("invalid ({reason})"),
        }
    }
}
