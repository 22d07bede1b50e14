use std::fmt;

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Layout of `expiredAt` in the persisted token file.
pub const EXPIRY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Lifetime granted to a freshly refreshed id token, in days.
pub const TOKEN_LIFETIME_DAYS: i64 = 1;

/// In-memory credential state owned by a [`TokenLifecycle`](super::TokenLifecycle).
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub id_token: Option<String>,
    pub refresh_token: String,
    pub device_id: String,
    pub expired_at: Option<DateTime<Tz>>,
}

impl Credentials {
    pub fn new(refresh_token: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            id_token: None,
            refresh_token: refresh_token.into(),
            device_id: device_id.into(),
            expired_at: None,
        }
    }

    /// True when the id token is missing, has no known expiry, or `now` is past the expiry.
    pub fn is_expired_at(&self, now: DateTime<Tz>) -> bool {
        if self.id_token.is_none() {
            return true;
        }
        match self.expired_at {
            Some(expired_at) => now > expired_at,
            None => true,
        }
    }

    /// `expiredAt` rendered the way the token file stores it.
    pub fn expired_at_string(&self) -> Option<String> {
        self.expired_at.map(format_expiry)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("id_token", &self.id_token.as_ref().map(|_| ".."))
            .field("refresh_token", &"..")
            .field("device_id", &self.device_id)
            .field("expired_at", &self.expired_at)
            .finish()
    }
}

/// Observable position of the token lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Uninitialized,
    Valid,
    Expired,
    Refreshing,
}

/// Contents of `token.json`.
///
/// Keys other than the four known ones are kept in `extra` so a
/// read-merge-write cycle never drops them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedToken {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expired_at: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PersistedToken {
    pub fn id_token(&self) -> Option<&str> {
        non_empty(self.id_token.as_deref())
    }

    pub fn refresh_token(&self) -> Option<&str> {
        non_empty(self.refresh_token.as_deref())
    }

    pub fn device_id(&self) -> Option<&str> {
        non_empty(self.device_id.as_deref())
    }

    pub fn expired_at(&self) -> Option<&str> {
        non_empty(self.expired_at.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Expiry assigned to a token minted at `now`.
pub fn expiry_from(now: DateTime<Tz>) -> DateTime<Tz> {
    now + Duration::days(TOKEN_LIFETIME_DAYS)
}

/// Current wall-clock time in `tz`.
pub fn now_in(tz: Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(&tz)
}

pub fn format_expiry(at: DateTime<Tz>) -> String {
    at.format(EXPIRY_FORMAT).to_string()
}

/// Parse an `expiredAt` string as local time in `tz`.
///
/// Ambiguous local times (DST fold) resolve to the earlier instant; gaps and
/// malformed input yield `None`.
pub fn parse_expiry(raw: &str, tz: Tz) -> Option<DateTime<Tz>> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), EXPIRY_FORMAT).ok()?;
    tz.from_local_datetime(&naive).earliest()
}
