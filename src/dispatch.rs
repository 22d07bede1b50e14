//! Authenticated request dispatch.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tokio::sync::Mutex;
use tracing::debug;

use crate::auth::TokenLifecycle;
use crate::config::{ClientConfig, HeaderMode};
use crate::error::Result;
use crate::transport::{ApiResponse, HttpMethod, HttpTransport, RequestBody, TransportRequest};

/// Builds the header set for every API call.
#[derive(Debug, Clone, Default)]
pub struct HeaderPolicy {
    custom: Option<HeaderMap>,
    mode: HeaderMode,
}

impl HeaderPolicy {
    pub fn new(custom: Option<HeaderMap>, mode: HeaderMode) -> Self {
        Self { custom, mode }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.headers.clone(), config.header_mode)
    }

    /// `Content-Type: application/json` plus the bearer token when one is
    /// known, combined with the custom set according to the mode.
    pub fn headers_for(&self, id_token: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = id_token {
            if let Ok(mut val) = HeaderValue::from_str(&format!("Bearer {token}")) {
                val.set_sensitive(true);
                headers.insert(AUTHORIZATION, val);
            }
        }

        let Some(custom) = &self.custom else {
            return headers;
        };
        match self.mode {
            HeaderMode::ReplaceDefaults => custom.clone(),
            HeaderMode::MergeWithDefaults => {
                for name in custom.keys() {
                    headers.remove(name);
                }
                for (name, value) in custom {
                    headers.append(name.clone(), value.clone());
                }
                headers
            }
        }
    }
}

/// Join a relative API path onto the base URL.
pub fn endpoint_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Sends authenticated calls, validating the token first.
pub struct RequestDispatcher {
    transport: HttpTransport,
    base_url: String,
    headers: HeaderPolicy,
    lifecycle: Mutex<TokenLifecycle>,
}

impl RequestDispatcher {
    pub fn new(
        transport: HttpTransport,
        base_url: impl Into<String>,
        headers: HeaderPolicy,
        lifecycle: TokenLifecycle,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            headers,
            lifecycle: Mutex::new(lifecycle),
        }
    }

    /// Perform one call against `path`.
    ///
    /// Token validation is best-effort: a failed refresh is logged and the
    /// call still goes out with whatever token is current, so an auth
    /// failure surfaces as the remote service's response.
    pub async fn dispatch(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<RequestBody>,
    ) -> Result<ApiResponse> {
        let id_token = {
            let mut lifecycle = self.lifecycle.lock().await;
            lifecycle.validate().await;
            lifecycle.credentials().id_token.clone()
        };

        debug!(%method, path, "Dispatching API call");
        let request = TransportRequest::new(method, endpoint_url(&self.base_url, path))
            .with_headers(self.headers.headers_for(id_token.as_deref()))
            .with_body(body);
        self.transport.execute(request).await
    }

    pub fn lifecycle(&self) -> &Mutex<TokenLifecycle> {
        &self.lifecycle
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderName;

    use super::*;

    fn custom() -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        map.insert(
            HeaderName::from_static("x-tenant"),
            HeaderValue::from_static("acme"),
        );
        map
    }

    #[test]
    fn defaults_carry_json_and_bearer() {
        let headers = HeaderPolicy::default().headers_for(Some("tok"));
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(headers[AUTHORIZATION], "Bearer tok");
    }

    #[test]
    fn no_token_means_no_authorization_header() {
        let headers = HeaderPolicy::default().headers_for(None);
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn replace_mode_sends_only_custom_headers() {
        let policy = HeaderPolicy::new(Some(custom()), HeaderMode::ReplaceDefaults);
        let headers = policy.headers_for(Some("tok"));
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[CONTENT_TYPE], "text/plain");
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn merge_mode_overrides_conflicts_and_keeps_bearer() {
        let policy = HeaderPolicy::new(Some(custom()), HeaderMode::MergeWithDefaults);
        let headers = policy.headers_for(Some("tok"));
        assert_eq!(headers[CONTENT_TYPE], "text/plain");
        assert_eq!(headers["x-tenant"], "acme");
        assert_eq!(headers[AUTHORIZATION], "Bearer tok");
        assert_eq!(headers.get_all(CONTENT_TYPE).iter().count(), 1);
    }

    #[test]
    fn endpoint_url_joins_with_single_slash() {
        assert_eq!(
            endpoint_url("https://api.krmpesan.app/", "/messages"),
            "https://api.krmpesan.app/messages"
        );
        assert_eq!(
            endpoint_url("http://127.0.0.1:9000", "messages/template"),
            "http://127.0.0.1:9000/messages/template"
        );
    }
}
