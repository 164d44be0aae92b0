//! Serving an agenda for a remote feed.
//!
//! The caller passes an [`AgendaRequest`] and something that can fetch feed text. Failures
//! stay a typed [`FetchError`] until [`response_body`] renders them.

use crate::{agenda::Occurrence, parse_agenda, parser::ParserOptions};
use serde::Deserialize;
use std::future::Future;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Missing url parameter")]
    MissingUrl,
    #[error("Could not fetch calendar: {0}")]
    Transport(String),
    #[error("Calendar source answered with HTTP status {0}")]
    Status(u16),
}

#[cfg(feature = "fetch")]
impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AgendaRequest {
    pub url: Option<String>,
}

impl AgendaRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
        }
    }
}

/// Anything that can return the text of a calendar feed.
pub trait CalendarSource {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// `webcal://` is plain HTTPS for fetching purposes.
pub fn normalize_feed_url(url: &str) -> String {
    let url = url.trim();
    match url.get(..9) {
        Some(scheme) if scheme.eq_ignore_ascii_case("webcal://") => {
            format!("https://{}", &url[9..])
        }
        _ => url.to_owned(),
    }
}

/// Fetch the requested feed and compute its agenda.
///
/// Nothing is parsed when the URL is missing or the fetch fails.
pub async fn handle_request<S: CalendarSource>(
    request: &AgendaRequest,
    source: &S,
    options: &ParserOptions,
) -> Result<Vec<Occurrence>, FetchError> {
    let url = request
        .url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or(FetchError::MissingUrl)?;
    let url = normalize_feed_url(url);
    tracing::debug!(url = url.as_str(), "fetching calendar");
    let body = source
        .fetch(&url)
        .await
        .inspect_err(|err| tracing::warn!(url = url.as_str(), error = %err, "fetch failed"))?;
    Ok(parse_agenda(&body, options))
}

/// The response body: a JSON array on success, a readable message otherwise.
pub fn response_body(result: &Result<Vec<Occurrence>, FetchError>) -> String {
    match result {
        Ok(occurrences) => serde_json::to_string(occurrences)
            .unwrap_or_else(|err| format!("Could not serialize agenda: {err}")),
        Err(err) => err.to_string(),
    }
}

#[cfg(feature = "fetch")]
pub use http::HttpSource;

#[cfg(feature = "fetch")]
mod http {
    use super::{CalendarSource, FetchError};
    use reqwest::Client;

    /// Fetches feeds over HTTP(S).
    #[derive(Debug, Clone, Default)]
    pub struct HttpSource {
        client: Client,
    }

    impl HttpSource {
        pub fn new(client: Client) -> Self {
            Self { client }
        }
    }

    impl CalendarSource for HttpSource {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }
            Ok(response.text().await?)
        }
    }
}
