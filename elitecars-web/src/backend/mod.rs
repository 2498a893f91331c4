//! Outbound clients for the EliteCars backend API.
//!
//! All clients share one pooled `reqwest::Client` and return the same result
//! type. Admin context travels with each call as an explicit
//! [`BackendCredential`]; nothing about a caller is stored on the client.

mod admin;
mod cars;
mod inquiries;
pub mod problem;

#[cfg(test)]
pub(crate) mod test_support;

use reqwest::header::COOKIE;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::BackendConfig;

pub use admin::AdminApiClient;
pub use cars::CarApiClient;
pub use inquiries::InquiryApiClient;

pub type BackendResult<T> = Result<T, BackendError>;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Unable to reach the backend service. Please try again later.")]
    Transport(#[source] reqwest::Error),
    #[error("{message}")]
    Status { status: StatusCode, message: String },
    #[error("Unexpected response from the backend service.")]
    Decode(#[source] serde_json::Error),
}

impl BackendError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Cookies presented to the backend on behalf of one inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendCredential {
    cookies: Vec<(String, String)>,
}

impl BackendCredential {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        if name.is_empty() || value.is_empty() {
            return self;
        }
        self.cookies.retain(|(existing, _)| *existing != name);
        self.cookies.push((name, value));
        self
    }

    #[cfg(test)]
    pub fn is_anonymous(&self) -> bool {
        self.cookies.is_empty()
    }

    /// `Cookie` header value, `None` when there is nothing to send.
    pub fn header_value(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Builds the shared HTTP client used by every API client.
pub fn http_client(config: &BackendConfig) -> BackendResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.request_timeout)
        .user_agent(concat!("elitecars-web/", env!("CARGO_PKG_VERSION")))
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .build()
        .map_err(BackendError::Transport)
}

/// One backend resource root, e.g. `https://host/api/cars`.
#[derive(Debug, Clone)]
pub(crate) struct Endpoint {
    http: reqwest::Client,
    root: String,
}

impl Endpoint {
    pub(crate) fn new(http: reqwest::Client, base_url: &str, resource: &str) -> Self {
        Self {
            http,
            root: format!("{}/api/{resource}", base_url.trim_end_matches('/')),
        }
    }

    pub(crate) fn request(
        &self,
        method: Method,
        path: &str,
        credential: &BackendCredential,
    ) -> RequestBuilder {
        let url = format!("{}/{}", self.root, path.trim_start_matches('/'));
        let builder = self.http.request(method, url);
        match credential.header_value() {
            Some(cookie) => builder.header(COOKIE, cookie),
            None => builder,
        }
    }
}

/// Sends the request; non-success statuses become [`BackendError::Status`] with
/// a message extracted from the body.
pub(crate) async fn send(builder: RequestBuilder) -> BackendResult<Response> {
    let response = builder.send().await.map_err(|error| {
        warn!(error = %error, "backend request failed");
        BackendError::Transport(error)
    })?;

    let status = response.status();
    if status.is_success() {
        debug!(status = %status, url = %response.url(), "backend request succeeded");
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    let message = problem::extract_error_message(&body);
    warn!(status = %status, url = %url, message = %message, "backend returned an error");
    Err(BackendError::Status { status, message })
}

pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> BackendResult<T> {
    let body = response.text().await.map_err(BackendError::Transport)?;
    serde_json::from_str(&body).map_err(BackendError::Decode)
}

/// Collections tolerate an empty body or `null`.
pub(crate) async fn read_list<T: DeserializeOwned>(response: Response) -> BackendResult<Vec<T>> {
    let body = response.text().await.map_err(BackendError::Transport)?;
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let parsed: Option<Vec<T>> = serde_json::from_str(trimmed).map_err(BackendError::Decode)?;
    Ok(parsed.unwrap_or_default())
}
