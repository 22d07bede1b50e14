//! Two-step media upload through a presigned URL.

use std::path::Path;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dispatch::RequestDispatcher;
use crate::error::{KrmPesanError, Result};
use crate::transport::{
    strip_query, HttpMethod, HttpTransport, RequestBody, TransportRequest,
};

pub const PRESIGN_PATH: &str = "files/generate";

/// Lifetime requested for presigned URLs, in seconds.
pub const PRESIGN_EXPIRY_SECS: u64 = 30;

#[derive(Debug, Serialize)]
struct PresignRequest<'a> {
    filename: &'a str,
    mime: &'a str,
    expired: u64,
}

#[derive(Debug, Deserialize)]
struct PresignResponse {
    data: Option<PresignData>,
}

#[derive(Debug, Deserialize)]
struct PresignData {
    url: Option<String>,
}

/// Uploads local files and hands back their public URL.
#[derive(Clone)]
pub struct FileUploader {
    dispatcher: Arc<RequestDispatcher>,
    transport: HttpTransport,
}

impl FileUploader {
    pub fn new(dispatcher: Arc<RequestDispatcher>, transport: HttpTransport) -> Self {
        Self {
            dispatcher,
            transport,
        }
    }

    /// Request a presigned URL, PUT the file to it, and return the URL
    /// without its query string.
    ///
    /// The PUT goes straight to storage with only a `Content-Type` header;
    /// the bearer token is never sent there.
    pub async fn upload(&self, path: impl AsRef<Path>) -> Result<String> {
        let path = tokio::fs::canonicalize(path.as_ref()).await.map_err(|err| {
            KrmPesanError::upload_caused_by(
                format!("cannot resolve {}", path.as_ref().display()),
                err,
            )
        })?;
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| KrmPesanError::upload(format!("{} has no file name", path.display())))?;
        let mime = mime_guess::from_path(&path).first_or_octet_stream();

        let presigned_url = self.presign(filename, mime.as_ref()).await?;
        let public_url = strip_query(&presigned_url).to_string();
        debug!(filename, mime = %mime, url = %public_url, "Presigned upload URL issued");

        let body = RequestBody::from_file(&path).await.map_err(|err| {
            KrmPesanError::upload_caused_by(format!("cannot read {}", path.display()), err)
        })?;
        let mut headers = HeaderMap::new();
        let content_type = HeaderValue::from_str(mime.as_ref())
            .map_err(|err| KrmPesanError::upload_caused_by("invalid MIME type", err))?;
        headers.insert(CONTENT_TYPE, content_type);

        let request = TransportRequest::new(HttpMethod::Put, presigned_url)
            .with_headers(headers)
            .with_body(Some(body));
        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|err| KrmPesanError::upload_caused_by("file PUT failed", err))?;
        if !response.is_success() {
            return Err(KrmPesanError::upload(format!(
                "storage rejected file with status {}: {}",
                response.status(),
                response.text()
            )));
        }

        Ok(public_url)
    }

    async fn presign(&self, filename: &str, mime: &str) -> Result<String> {
        let payload = serde_json::to_value(PresignRequest {
            filename,
            mime,
            expired: PRESIGN_EXPIRY_SECS,
        })?;
        let response = self
            .dispatcher
            .dispatch(HttpMethod::Post, PRESIGN_PATH, Some(RequestBody::Json(payload)))
            .await
            .map_err(|err| KrmPesanError::upload_caused_by("presign request failed", err))?;

        if !response.is_success() {
            return Err(KrmPesanError::upload(format!(
                "Failed to generate presign url: status {}: {}",
                response.status(),
                response.text()
            )));
        }
        let presign = response.json::<PresignResponse>().map_err(|err| {
            KrmPesanError::upload_caused_by(
                format!("Failed to generate presign url: malformed response (status {})", response.status()),
                err,
            )
        })?;

        presign
            .data
            .and_then(|data| data.url)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| KrmPesanError::upload("Failed to generate presign url"))
    }
}
