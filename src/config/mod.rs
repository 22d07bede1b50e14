//! Client configuration (builder in code, or environment + `.env`).

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bon::Builder;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use reqwest::header::HeaderMap;

use crate::auth::credentials::Credentials;
use crate::auth::store::TokenStore;
use crate::error::{KrmPesanError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.krmpesan.app/";
pub const DEFAULT_TIMEZONE: &str = "Asia/Jakarta";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const ENV_TOKEN_DIR: &str = "KRMPESAN_TOKEN_DIR";
const ENV_ID_TOKEN: &str = "KRMPESAN_ID_TOKEN";
const ENV_DEVICE_ID: &str = "KRMPESAN_DEVICE_ID";
const ENV_REFRESH_TOKEN: &str = "KRMPESAN_REFRESH_TOKEN";
const ENV_TIMEZONE: &str = "KRMPESAN_TIMEZONE";
const ENV_BASE_URL: &str = "KRMPESAN_BASE_URL";
const ENV_TIMEOUT_SECS: &str = "KRMPESAN_TIMEOUT_SECS";
const ENV_INSECURE: &str = "KRMPESAN_INSECURE";

/// How a caller-supplied header set combines with the default
/// `Content-Type` and `Authorization` headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderMode {
    /// Custom headers are added on top of the defaults, winning on conflicts.
    MergeWithDefaults,
    /// Custom headers are sent instead of the defaults, bearer token included.
    #[default]
    ReplaceDefaults,
}

/// Credentials supplied directly by the caller.
#[derive(Clone, Default)]
pub struct DirectCredentials {
    pub id_token: Option<String>,
    pub device_id: String,
    pub refresh_token: String,
    /// Known expiry of `id_token`. Without it the token is refreshed right away.
    pub expired_at: Option<DateTime<Utc>>,
}

impl DirectCredentials {
    pub fn new(device_id: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            id_token: None,
            device_id: device_id.into(),
            refresh_token: refresh_token.into(),
            expired_at: None,
        }
    }

    pub fn with_id_token(mut self, id_token: impl Into<String>) -> Self {
        self.id_token = Some(id_token.into());
        self
    }

    pub fn with_expired_at(mut self, expired_at: DateTime<Utc>) -> Self {
        self.expired_at = Some(expired_at);
        self
    }

    pub(crate) fn into_credentials(self, timezone: Tz) -> Result<Credentials> {
        let device_id = self.device_id.trim();
        if device_id.is_empty() {
            return Err(KrmPesanError::configuration("DeviceId is required"));
        }
        let refresh_token = self.refresh_token.trim();
        if refresh_token.is_empty() {
            return Err(KrmPesanError::configuration("Refresh token is required"));
        }
        let mut credentials = Credentials::new(refresh_token, device_id);
        credentials.id_token = self.id_token.filter(|t| !t.trim().is_empty());
        credentials.expired_at = self.expired_at.map(|at| at.with_timezone(&timezone));
        Ok(credentials)
    }
}

impl fmt::Debug for DirectCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectCredentials")
            .field("id_token", &self.id_token.as_ref().map(|_| ".."))
            .field("device_id", &self.device_id)
            .field("refresh_token", &"..")
            .field("expired_at", &self.expired_at)
            .finish()
    }
}

/// Where the client gets its credentials from.
#[derive(Clone)]
pub enum CredentialSource {
    /// Caller-supplied tokens, kept in memory only.
    Direct(DirectCredentials),
    /// `<dir>/token.json`; the directory must exist.
    TokenDirectory(PathBuf),
    /// Any other persistent store.
    Store(Arc<dyn TokenStore>),
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(direct) => f.debug_tuple("Direct").field(direct).finish(),
            Self::TokenDirectory(dir) => f.debug_tuple("TokenDirectory").field(dir).finish(),
            Self::Store(store) => f.debug_tuple("Store").field(&store.location()).finish(),
        }
    }
}

/// Construction options for [`KrmPesanClient`](crate::KrmPesanClient).
///
/// # Example
/// ```
/// use std::time::Duration;
/// use krmpesan::config::{ClientConfig, CredentialSource, DirectCredentials};
///
/// let config = ClientConfig::builder()
///     .credentials(CredentialSource::Direct(DirectCredentials::new("device-1", "refresh-1")))
///     .timezone("Asia/Makassar")
///     .timeout(Duration::from_secs(10))
///     .build();
/// assert_eq!(config.base_url, krmpesan::config::DEFAULT_BASE_URL);
/// ```
#[derive(Debug, Clone, Builder)]
pub struct ClientConfig {
    pub credentials: CredentialSource,
    /// IANA zone used for `expiredAt` timestamps.
    #[builder(into, default = DEFAULT_TIMEZONE.to_string())]
    pub timezone: String,
    #[builder(into, default = DEFAULT_BASE_URL.to_string())]
    pub base_url: String,
    pub headers: Option<HeaderMap>,
    #[builder(default)]
    pub header_mode: HeaderMode,
    #[builder(default = DEFAULT_TIMEOUT)]
    pub timeout: Duration,
    /// Skip TLS certificate verification.
    #[builder(default)]
    pub accept_invalid_certs: bool,
}

impl ClientConfig {
    pub fn direct(credentials: DirectCredentials) -> Self {
        Self::builder()
            .credentials(CredentialSource::Direct(credentials))
            .build()
    }

    pub fn token_directory(dir: impl Into<PathBuf>) -> Self {
        Self::builder()
            .credentials(CredentialSource::TokenDirectory(dir.into()))
            .build()
    }

    /// Load from `KRMPESAN_*` environment variables, reading `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    ///
    /// `KRMPESAN_TOKEN_DIR` selects file mode; otherwise the direct
    /// credentials are read and validated when the client is built.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let credentials = match get(ENV_TOKEN_DIR) {
            Some(dir) => CredentialSource::TokenDirectory(PathBuf::from(dir)),
            None => {
                let mut direct = DirectCredentials::new(
                    get(ENV_DEVICE_ID).unwrap_or_default(),
                    get(ENV_REFRESH_TOKEN).unwrap_or_default(),
                );
                direct.id_token = get(ENV_ID_TOKEN);
                CredentialSource::Direct(direct)
            }
        };

        let timeout = match get(ENV_TIMEOUT_SECS) {
            Some(raw) => Duration::from_secs(raw.parse().map_err(|_| {
                KrmPesanError::configuration(format!("{ENV_TIMEOUT_SECS} must be whole seconds, got '{raw}'"))
            })?),
            None => DEFAULT_TIMEOUT,
        };

        let accept_invalid_certs = get(ENV_INSECURE)
            .map(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            credentials,
            timezone: get(ENV_TIMEZONE).unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
            base_url: get(ENV_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            headers: None,
            header_mode: HeaderMode::default(),
            timeout,
            accept_invalid_certs,
        })
    }

    /// Resolve the configured IANA zone.
    pub fn tz(&self) -> Result<Tz> {
        self.timezone.parse::<Tz>().map_err(|err| {
            KrmPesanError::configuration(format!("Unknown timezone '{}': {err}", self.timezone))
        })
    }
}
