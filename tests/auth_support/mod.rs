#![allow(dead_code)]

use chrono::{Duration, Utc};
use serde_json::{json, Value};
use sheaf::auth::{TokenBundle, TokenStore};
use sheaf::config::SheafConfig;
use wiremock::MockServer;

pub const CLIENT_ID: &str = "1234567890-test.apps.googleusercontent.com";

/// Config pointed at a mock relay. Exchange, refresh, audience-token,
/// and document endpoints all resolve under the server's URI.
pub fn relay_config(server: &MockServer) -> SheafConfig {
    SheafConfig::new(CLIENT_ID)
        .with_relay_url(server.uri())
        .with_profile_url(format!("{}/userinfo", server.uri()))
}

pub fn bundle(access: &str, refresh: Option<&str>, ttl_secs: i64) -> TokenBundle {
    TokenBundle {
        access_token: access.to_string(),
        id_token: format!("id-{access}"),
        refresh_token: refresh.map(str::to_string),
        expires_at: Utc::now() + Duration::seconds(ttl_secs),
        token_type: "Bearer".to_string(),
        scope: "openid email profile".to_string(),
    }
}

pub fn fresh_bundle() -> TokenBundle {
    bundle("access-1", Some("refresh-1"), 3600)
}

pub fn expired_bundle() -> TokenBundle {
    bundle("access-stale", Some("refresh-1"), -60)
}

pub fn seeded_store(bundle: &TokenBundle) -> TokenStore {
    let store = TokenStore::in_memory();
    store.save_bundle(bundle).expect("seed bundle");
    store
}

pub fn token_response_body(access: &str, refresh: Option<&str>) -> Value {
    let mut body = json!({
        "access_token": access,
        "id_token": format!("id-{access}"),
        "expires_in": 3600,
        "token_type": "Bearer",
        "scope": "openid email profile"
    });
    if let Some(refresh) = refresh {
        body["refresh_token"] = json!(refresh);
    }
    body
}

pub fn profile_body() -> Value {
    json!({
        "id": "user-1",
        "email": "dev@example.com",
        "name": "Dev Example",
        "picture": "https://example.com/p.png"
    })
}
