use std::fmt;
use std::sync::Arc;

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::credentials::{
    expiry_from, format_expiry, now_in, parse_expiry, Credentials, TokenState,
};
use super::store::{FileTokenStore, TokenStore};
use crate::config::{ClientConfig, CredentialSource};
use crate::dispatch::{endpoint_url, HeaderPolicy};
use crate::error::{KrmPesanError, Result};
use crate::transport::{HttpMethod, HttpTransport, TransportRequest};

/// Path of the token exchange endpoint.
pub const REFRESH_PATH: &str = "tokens";

/// Body returned by the token exchange endpoint.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(rename = "IdToken")]
    pub id_token: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("id_token", &"..")
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Keeps a usable bearer token for outgoing calls.
///
/// Refreshes happen inline, right before the call that needs them. With a
/// [`TokenStore`] attached ("file mode") every refreshed token is written
/// back to the store.
pub struct TokenLifecycle {
    credentials: Credentials,
    store: Option<Arc<dyn TokenStore>>,
    transport: HttpTransport,
    base_url: String,
    headers: HeaderPolicy,
    timezone: Tz,
    state: TokenState,
}

impl TokenLifecycle {
    /// Build from configuration, load persisted state if any, then validate.
    ///
    /// A token directory that does not exist or direct credentials without a
    /// device id or refresh token fail with [`KrmPesanError::Configuration`].
    pub async fn initialize(config: &ClientConfig, transport: HttpTransport) -> Result<Self> {
        let timezone = config.tz()?;
        let (credentials, store): (Credentials, Option<Arc<dyn TokenStore>>) =
            match &config.credentials {
                CredentialSource::Direct(direct) => {
                    (direct.clone().into_credentials(timezone)?, None)
                }
                CredentialSource::TokenDirectory(dir) => (
                    Credentials::new("", ""),
                    Some(Arc::new(FileTokenStore::in_dir(dir)?) as Arc<dyn TokenStore>),
                ),
                CredentialSource::Store(store) => (Credentials::new("", ""), Some(store.clone())),
            };

        let mut lifecycle = Self {
            credentials,
            store,
            transport,
            base_url: config.base_url.clone(),
            headers: HeaderPolicy::from_config(config),
            timezone,
            state: TokenState::Uninitialized,
        };

        if lifecycle.store.is_some() {
            lifecycle.load().await?;
        } else {
            lifecycle.state = lifecycle.state_from_clock();
        }
        lifecycle.validate().await;
        Ok(lifecycle)
    }

    /// Read persisted credentials (file mode only) and return a snapshot.
    ///
    /// The stored id token is adopted only when it comes with a parseable
    /// `expiredAt`; any other combination triggers a refresh.
    pub async fn load(&mut self) -> Result<Credentials> {
        let Some(store) = self.store.clone() else {
            return Ok(self.credentials.clone());
        };

        let persisted = store.load()?;
        let refresh_token = persisted
            .refresh_token()
            .ok_or_else(|| KrmPesanError::MissingCredential {
                field: "refreshToken",
                location: store.location(),
            })?;
        self.credentials.refresh_token = refresh_token.to_string();

        let device_id = persisted
            .device_id()
            .ok_or_else(|| KrmPesanError::MissingCredential {
                field: "deviceId",
                location: store.location(),
            })?;
        self.credentials.device_id = device_id.to_string();

        let stored_expiry = persisted
            .expired_at()
            .and_then(|raw| parse_expiry(raw, self.timezone));
        match (persisted.id_token(), stored_expiry) {
            (Some(id_token), Some(expired_at)) => {
                self.credentials.id_token = Some(id_token.to_string());
                self.credentials.expired_at = Some(expired_at);
                self.state = self.state_from_clock();
                debug!(location = %store.location(), "Loaded stored token");
            }
            _ => {
                debug!(location = %store.location(), "Stored token incomplete, refreshing");
                self.refresh().await?;
            }
        }
        Ok(self.credentials.clone())
    }

    /// Refresh when the token is missing or past its expiry.
    ///
    /// Best-effort: a failed refresh is logged at `warn` and swallowed.
    pub async fn validate(&mut self) {
        if !self.credentials.is_expired_at(self.now()) {
            self.state = TokenState::Valid;
            return;
        }
        self.state = TokenState::Expired;
        if let Err(err) = self.refresh().await {
            warn!(error = %err, "Token refresh failed; continuing with current token");
        }
    }

    /// Exchange the refresh token for a new id token.
    pub async fn refresh(&mut self) -> Result<TokenResponse> {
        self.state = TokenState::Refreshing;
        let payload = match self.exchange_refresh_token().await {
            Ok(payload) => payload,
            Err(err) => {
                self.state = TokenState::Expired;
                return Err(err);
            }
        };

        self.credentials.id_token = Some(payload.id_token.clone());
        self.credentials.expired_at = Some(expiry_from(self.now()));
        self.state = TokenState::Valid;
        debug!(device_id = %self.credentials.device_id, "Token refreshed");

        self.store()?;
        Ok(payload)
    }

    /// Persist the current id token with a fresh one-day expiry.
    ///
    /// No-op unless a store is attached.
    pub fn store(&mut self) -> Result<()> {
        let Some(store) = self.store.clone() else {
            return Ok(());
        };
        let Some(id_token) = self.credentials.id_token.clone() else {
            debug!("No id token to persist");
            return Ok(());
        };
        let expired_at = expiry_from(self.now());
        self.credentials.expired_at = Some(expired_at);
        store.store(&id_token, &format_expiry(expired_at))?;
        info!(location = %store.location(), "Persisted refreshed token");
        Ok(())
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn state(&self) -> TokenState {
        match self.state {
            TokenState::Valid => self.state_from_clock(),
            other => other,
        }
    }

    pub fn is_file_mode(&self) -> bool {
        self.store.is_some()
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    fn now(&self) -> DateTime<Tz> {
        now_in(self.timezone)
    }

    fn state_from_clock(&self) -> TokenState {
        if self.credentials.is_expired_at(self.now()) {
            TokenState::Expired
        } else {
            TokenState::Valid
        }
    }

    async fn exchange_refresh_token(&self) -> Result<TokenResponse> {
        let mut url = reqwest::Url::parse(&endpoint_url(&self.base_url, REFRESH_PATH))
            .map_err(|err| KrmPesanError::refresh_caused_by("invalid token endpoint URL", err))?;
        url.query_pairs_mut()
            .append_pair("refresh_token", &self.credentials.refresh_token)
            .append_pair("device_key", &self.credentials.device_id);

        let request = TransportRequest::new(HttpMethod::Get, url.as_str())
            .with_headers(self.headers.headers_for(self.credentials.id_token.as_deref()));
        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|err| KrmPesanError::refresh_caused_by("token endpoint unreachable", err))?;

        response.json::<TokenResponse>().map_err(|err| {
            KrmPesanError::refresh_caused_by(
                format!("unexpected token response (status {})", response.status()),
                err,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::DirectCredentials;

    fn unreachable_config(direct: DirectCredentials) -> ClientConfig {
        ClientConfig::builder()
            .credentials(CredentialSource::Direct(direct))
            .base_url("http://127.0.0.1:9")
            .timeout(Duration::from_millis(200))
            .build()
    }

    fn transport() -> HttpTransport {
        HttpTransport::new(Duration::from_millis(200), false).unwrap()
    }

    #[tokio::test]
    async fn fresh_direct_token_is_valid_without_network() {
        let direct = DirectCredentials::new("d1", "r1")
            .with_id_token("i1")
            .with_expired_at(chrono::Utc::now() + chrono::Duration::hours(2));
        let lifecycle = TokenLifecycle::initialize(&unreachable_config(direct), transport())
            .await
            .unwrap();
        assert_eq!(lifecycle.state(), TokenState::Valid);
        assert_eq!(lifecycle.credentials().id_token.as_deref(), Some("i1"));
        assert!(!lifecycle.is_file_mode());
    }

    #[tokio::test]
    async fn failed_refresh_during_validation_is_swallowed() {
        let direct = DirectCredentials::new("d1", "r1").with_id_token("stale");
        let lifecycle = TokenLifecycle::initialize(&unreachable_config(direct), transport())
            .await
            .expect("validation errors never fail construction");
        assert_eq!(lifecycle.state(), TokenState::Expired);
        assert_eq!(lifecycle.credentials().id_token.as_deref(), Some("stale"));
    }

    #[tokio::test]
    async fn explicit_refresh_reports_failure() {
        let direct = DirectCredentials::new("d1", "r1")
            .with_id_token("i1")
            .with_expired_at(chrono::Utc::now() + chrono::Duration::hours(2));
        let mut lifecycle = TokenLifecycle::initialize(&unreachable_config(direct), transport())
            .await
            .unwrap();
        let err = lifecycle.refresh().await.unwrap_err();
        assert!(matches!(err, KrmPesanError::Refresh { .. }));
        assert_eq!(lifecycle.state(), TokenState::Expired);
    }

    #[test]
    fn token_response_requires_id_token() {
        let ok: TokenResponse =
            serde_json::from_str(r#"{"IdToken":"abc","ExpiresIn":3600}"#).unwrap();
        assert_eq!(ok.id_token, "abc");
        assert!(ok.extra.contains_key("ExpiresIn"));
        assert!(serde_json::from_str::<TokenResponse>(r#"{"message":"denied"}"#).is_err());
    }
}
