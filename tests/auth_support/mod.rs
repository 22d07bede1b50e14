#![allow(dead_code)]

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use krmpesan::auth::credentials::{format_expiry, parse_expiry};
use krmpesan::auth::{PersistedToken, TokenStore};
use krmpesan::config::{ClientConfig, CredentialSource, DirectCredentials};
use krmpesan::Result;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Token store that keeps the record in memory.
#[derive(Default)]
pub struct InMemoryTokenStore {
    record: Mutex<PersistedToken>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(refresh_token: &str, device_id: &str) -> Self {
        let store = Self::default();
        {
            let mut record = store.record.lock().expect("store lock poisoned");
            record.refresh_token = Some(refresh_token.to_string());
            record.device_id = Some(device_id.to_string());
        }
        store
    }

    pub fn snapshot(&self) -> PersistedToken {
        self.record.lock().expect("store lock poisoned").clone()
    }
}

impl TokenStore for InMemoryTokenStore {
    fn load(&self) -> Result<PersistedToken> {
        Ok(self.snapshot())
    }

    fn store(&self, id_token: &str, expired_at: &str) -> Result<()> {
        let mut record = self.record.lock().expect("store lock poisoned");
        record.id_token = Some(id_token.to_string());
        record.expired_at = Some(expired_at.to_string());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

pub const JAKARTA: Tz = chrono_tz::Asia::Jakarta;

/// Mount the token exchange endpoint, expecting exactly `times` calls.
pub async fn mount_refresh(server: &MockServer, id_token: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path("/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "IdToken": id_token })))
        .expect(times)
        .mount(server)
        .await;
}

pub fn config_for(server: &MockServer, credentials: CredentialSource) -> ClientConfig {
    ClientConfig::builder()
        .credentials(credentials)
        .base_url(server.uri())
        .build()
}

/// Direct credentials with a token valid for two more hours.
pub fn fresh_direct() -> DirectCredentials {
    DirectCredentials::new("d1", "r1")
        .with_id_token("i1")
        .with_expired_at(Utc::now() + Duration::hours(2))
}

/// `expiredAt` string `offset` from now, in Jakarta time.
pub fn expiry_string(offset: Duration) -> String {
    format_expiry((Utc::now() + offset).with_timezone(&JAKARTA))
}

/// Assert a stored `expiredAt` is one day from now, give or take two minutes.
pub fn assert_one_day_out(raw: &str, tz: Tz) {
    let parsed: DateTime<Tz> = parse_expiry(raw, tz).expect("parseable expiredAt");
    let expected = Utc::now() + Duration::days(1);
    let drift = (parsed.with_timezone(&Utc) - expected).num_seconds().abs();
    assert!(drift <= 120, "expiredAt {raw} is {drift}s away from now + 1 day");
}
