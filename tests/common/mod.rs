//! Common test utilities and helpers for integration tests

#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use directory_sync::config::Config;

pub const LIST_PATH: &str = "/rest/api/3/users/search";
pub const EMAIL_PATH: &str = "/rest/api/3/user/email";
pub const SYNC_PATH: &str = "/integrations/jira/sync-users";
pub const BOOST_PATH: &str = "/integrations/jira/boosts";
pub const TOKEN: &str = "integration-secret";

/// Configuration pointing both sides at mock servers, with no pacing
pub fn create_test_config(upstream: &MockServer, downstream_url: &str) -> Config {
    let mut config = Config::default();
    config.upstream.base_url = upstream.uri();
    config.upstream.credential = Some("upstream-token".to_string());
    config.retry.retry_delay_ms = 1;
    config.pacing.enrichment_delay_ms = 0;
    config.downstream.base_url = downstream_url.to_string();
    config.downstream.integration_token = TOKEN.to_string();
    config.downstream.sync_timeout_secs = 5;
    config
}

/// Listing entry for an active human account
pub fn human(id: &str) -> Value {
    json!({
        "accountId": id,
        "displayName": format!("User {}", id),
        "accountType": "atlassian",
        "active": true,
        "avatarUrls": {"48x48": format!("https://avatars.example.com/{}", id)}
    })
}

/// Listing entry for a non-human account
pub fn app(id: &str) -> Value {
    json!({
        "accountId": id,
        "displayName": format!("App {}", id),
        "accountType": "app",
        "active": true
    })
}

/// Listing entry for a deactivated human account
pub fn inactive(id: &str) -> Value {
    json!({
        "accountId": id,
        "displayName": format!("Former {}", id),
        "accountType": "atlassian",
        "active": false
    })
}

/// Mount a listing page served at `start_at`
pub async fn mount_page(server: &MockServer, start_at: usize, accounts: Vec<Value>, expected: u64) {
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .and(query_param("startAt", start_at.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(accounts)))
        .expect(expected)
        .mount(server)
        .await;
}

/// Mount a successful email lookup for `account_id`
pub async fn mount_email(server: &MockServer, account_id: &str) {
    Mock::given(method("GET"))
        .and(path(EMAIL_PATH))
        .and(query_param("accountId", account_id))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accountId": account_id,
            "email": format!("{}@example.com", account_id)
        })))
        .mount(server)
        .await;
}

/// JSON bodies of every request the server received on `request_path`
pub async fn received_bodies(server: &MockServer, request_path: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == request_path)
        .map(|r| serde_json::from_slice(&r.body).expect("request body is JSON"))
        .collect()
}
