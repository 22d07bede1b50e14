//! One HTTP exchange per call on top of a reqwest client.
//!
//! The transport never retries and never interprets status codes: every
//! completed exchange comes back as an [`ApiResponse`], and only failures to
//! complete it (connect, TLS, timeout, body read) become
//! [`KrmPesanError::Transport`](crate::error::KrmPesanError::Transport).

use std::path::Path;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_LENGTH};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use strum::{Display, EnumString};
use tracing::debug;

use crate::error::Result;

/// HTTP verbs the remote API accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Parse a verb name; anything unrecognized is treated as GET.
    pub fn from_name(name: &str) -> Self {
        name.trim().parse().unwrap_or_default()
    }

    fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Request payload.
#[derive(Debug)]
pub enum RequestBody {
    /// Serialized as-is; the `Content-Type` comes from the request headers.
    Json(serde_json::Value),
    /// Streamed body with a known length (file uploads).
    Stream {
        body: reqwest::Body,
        content_length: u64,
    },
}

impl RequestBody {
    /// Stream a file from disk.
    pub async fn from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = tokio::fs::File::open(path.as_ref()).await?;
        let content_length = file.metadata().await?.len();
        Ok(Self::Stream {
            body: reqwest::Body::from(file),
            content_length,
        })
    }
}

/// A fully described HTTP exchange.
#[derive(Debug)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<RequestBody>,
}

impl TransportRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: Option<RequestBody>) -> Self {
        self.body = body;
        self
    }
}

/// Raw outcome of an exchange. Non-2xx statuses are not errors here.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    body: String,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    pub fn into_text(self) -> String {
        self.body
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Executes single requests. Cloning shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport with a per-request `timeout`.
    ///
    /// `accept_invalid_certs` turns off TLS certificate verification and
    /// should only be used against hosts you already trust.
    pub fn new(timeout: Duration, accept_invalid_certs: bool) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;
        Ok(Self { client })
    }

    pub async fn execute(&self, request: TransportRequest) -> Result<ApiResponse> {
        let TransportRequest {
            method,
            url,
            mut headers,
            body,
        } = request;

        debug!(%method, url = strip_query(&url), "HTTP request");

        let mut builder = self.client.request(method.as_reqwest(), &url);
        match body {
            Some(RequestBody::Json(value)) => {
                builder = builder.body(serde_json::to_vec(&value)?);
            }
            Some(RequestBody::Stream {
                body,
                content_length,
            }) => {
                headers.insert(CONTENT_LENGTH, HeaderValue::from(content_length));
                builder = builder.body(body);
            }
            None => {}
        }

        let response = builder.headers(headers).send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), "HTTP response");
        Ok(ApiResponse::new(status, body))
    }
}

/// Drop everything from the first `?`, leaving the bare resource URL.
pub fn strip_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KrmPesanError;

    #[test]
    fn known_methods_parse_case_insensitively() {
        assert_eq!(HttpMethod::from_name("POST"), HttpMethod::Post);
        assert_eq!(HttpMethod::from_name("put"), HttpMethod::Put);
        assert_eq!(HttpMethod::from_name(" Delete "), HttpMethod::Delete);
    }

    #[test]
    fn unknown_methods_fall_back_to_get() {
        assert_eq!(HttpMethod::from_name("PATCH"), HttpMethod::Get);
        assert_eq!(HttpMethod::from_name(""), HttpMethod::Get);
    }

    #[test]
    fn method_displays_upper_case() {
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
    }

    #[test]
    fn strip_query_keeps_base() {
        assert_eq!(
            strip_query("https://bucket.example/a/b.png?X-Sig=1&y=2"),
            "https://bucket.example/a/b.png"
        );
        assert_eq!(strip_query("https://x.example/plain"), "https://x.example/plain");
    }

    #[test]
    fn response_json_decodes_body() {
        let response = ApiResponse::new(StatusCode::OK, r#"{"IdToken":"abc"}"#);
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["IdToken"], "abc");
        assert!(response.is_success());
    }

    #[test]
    fn response_json_reports_malformed_body() {
        let response = ApiResponse::new(StatusCode::BAD_GATEWAY, "<html>");
        let err = response.json::<serde_json::Value>().unwrap_err();
        assert!(matches!(err, KrmPesanError::Serialization(_)));
        assert!(!response.is_success());
    }
}
