//! The public client.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::auth::{Credentials, TokenLifecycle, TokenResponse, TokenState};
use crate::config::ClientConfig;
use crate::dispatch::{HeaderPolicy, RequestDispatcher};
use crate::error::{KrmPesanError, Result};
use crate::transport::{ApiResponse, HttpMethod, HttpTransport, RequestBody};
use crate::upload::FileUploader;

/// Client for the KrmPesan REST API.
///
/// Construction validates the credentials and may already perform a token
/// refresh. Each call afterwards is at most two sequential round trips: an
/// inline refresh when the token has expired, then the call itself.
///
/// # Example
/// ```no_run
/// use krmpesan::config::{ClientConfig, DirectCredentials};
/// use krmpesan::KrmPesanClient;
///
/// # async fn example() -> krmpesan::Result<()> {
/// let config = ClientConfig::direct(DirectCredentials::new("device-1", "refresh-1"));
/// let client = KrmPesanClient::new(config).await?;
/// let response = client.send_reply_text("6281234", "hi").await?;
/// println!("{}", response.text());
/// # Ok(())
/// # }
/// ```
pub struct KrmPesanClient {
    dispatcher: Arc<RequestDispatcher>,
    uploader: FileUploader,
}

impl KrmPesanClient {
    pub async fn new(config: ClientConfig) -> Result<Self> {
        reqwest::Url::parse(&config.base_url).map_err(|err| {
            KrmPesanError::configuration(format!("Invalid base URL '{}': {err}", config.base_url))
        })?;

        let transport = HttpTransport::new(config.timeout, config.accept_invalid_certs)?;
        let lifecycle = TokenLifecycle::initialize(&config, transport.clone()).await?;
        let dispatcher = Arc::new(RequestDispatcher::new(
            transport.clone(),
            config.base_url.clone(),
            HeaderPolicy::from_config(&config),
            lifecycle,
        ));
        let uploader = FileUploader::new(dispatcher.clone(), transport);

        Ok(Self {
            dispatcher,
            uploader,
        })
    }

    /// Build from `KRMPESAN_*` environment variables.
    pub async fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?).await
    }

    /// Raw authenticated call. Unknown method names are sent as GET.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<ApiResponse> {
        self.dispatch(HttpMethod::from_name(method), path, body.map(RequestBody::Json))
            .await
    }

    pub async fn dispatch(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<RequestBody>,
    ) -> Result<ApiResponse> {
        self.dispatcher.dispatch(method, path, body).await
    }

    /// Upload a local file and return its public URL.
    pub async fn upload(&self, path: impl AsRef<Path>) -> Result<String> {
        self.uploader.upload(path).await
    }

    /// Snapshot of the current credentials.
    pub async fn credentials(&self) -> Credentials {
        self.dispatcher.lifecycle().lock().await.credentials().clone()
    }

    pub async fn token_state(&self) -> TokenState {
        self.dispatcher.lifecycle().lock().await.state()
    }

    /// Re-read persisted credentials (file mode).
    pub async fn load_token(&self) -> Result<Credentials> {
        self.dispatcher.lifecycle().lock().await.load().await
    }

    /// Refresh if expired; failures are logged, not returned.
    pub async fn validate_token(&self) {
        self.dispatcher.lifecycle().lock().await.validate().await
    }

    pub async fn refresh_token(&self) -> Result<TokenResponse> {
        self.dispatcher.lifecycle().lock().await.refresh().await
    }

    pub async fn store_token(&self) -> Result<()> {
        self.dispatcher.lifecycle().lock().await.store()
    }

    pub(crate) async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.dispatch(HttpMethod::Get, path, None).await
    }

    pub(crate) async fn post_json<T: Serialize>(&self, path: &str, payload: &T) -> Result<ApiResponse> {
        let body = serde_json::to_value(payload)?;
        self.dispatch(HttpMethod::Post, path, Some(RequestBody::Json(body)))
            .await
    }
}
