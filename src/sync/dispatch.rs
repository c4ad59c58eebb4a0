//! Downstream dispatch
//!
//! Every downstream call runs under a hard wall-clock deadline. When the
//! deadline elapses the in-flight request future is dropped and the call
//! reports [`SyncError::Timeout`]. Nothing here retries.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::DownstreamConfig;
use crate::error::SyncError;
use crate::models::{BoostRequest, DirectoryRecord, Outcome, RunMetadata, SyncPayload};

/// Header carrying the shared integration secret
pub const INTEGRATION_TOKEN_HEADER: &str = "X-Integration-Token";

/// Authenticated JSON poster for the downstream backend
#[derive(Debug, Clone)]
pub struct DownstreamClient {
    client: Client,
    base_url: String,
    token: String,
}

impl DownstreamClient {
    pub fn new(client: Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    pub fn from_config(client: Client, config: &DownstreamConfig) -> Self {
        Self::new(client, &config.base_url, &config.integration_token)
    }

    /// POST `body` as JSON to `path` and return the acknowledgment
    ///
    /// Non-2xx maps to `RemoteRejected`, no response at all to
    /// `RemoteCallFailed`, an elapsed deadline to `Timeout`. An empty
    /// success body acknowledges as `null`.
    pub async fn post_with_deadline<B>(
        &self,
        path: &str,
        body: &B,
        deadline: Duration,
    ) -> Result<Value, SyncError>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, deadline_ms = deadline.as_millis(), "Posting to downstream");

        let request = self
            .client
            .post(&url)
            .header(INTEGRATION_TOKEN_HEADER, &self.token)
            .json(body);

        let call = async {
            let response = request.send().await.map_err(SyncError::transport)?;
            let status = response.status();
            let text = response.text().await.map_err(SyncError::transport)?;

            if !status.is_success() {
                return Err(SyncError::RemoteRejected {
                    status: status.as_u16(),
                    body: text,
                });
            }
            parse_acknowledgment(&text)
        };

        match tokio::time::timeout(deadline, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(url = %url, deadline_ms = deadline.as_millis(), "Downstream call timed out");
                Err(SyncError::Timeout(deadline))
            }
        }
    }
}

fn parse_acknowledgment(text: &str) -> Result<Value, SyncError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text)
        .map_err(|e| SyncError::InvalidInput(format!("Malformed acknowledgment: {}", e)))
}

/// Hands an enriched collection to the downstream sync endpoint
#[derive(Debug, Clone)]
pub struct SyncDispatcher {
    downstream: DownstreamClient,
    path: String,
    deadline: Duration,
}

impl SyncDispatcher {
    pub fn new(downstream: DownstreamClient, path: impl Into<String>, deadline: Duration) -> Self {
        Self {
            downstream,
            path: path.into(),
            deadline,
        }
    }

    pub fn from_config(client: Client, config: &DownstreamConfig) -> Self {
        Self::new(
            DownstreamClient::from_config(client, config),
            &config.sync_path,
            config.sync_timeout(),
        )
    }

    /// Send the whole collection in one request
    pub async fn dispatch(
        &self,
        records: &[DirectoryRecord],
        metadata: &RunMetadata,
    ) -> Result<Value, SyncError> {
        let payload = SyncPayload::new(records, metadata);
        info!(
            records = records.len(),
            source_tag = %metadata.source_tag,
            correlation_id = metadata.correlation_id.as_deref().unwrap_or(""),
            "Dispatching directory"
        );
        self.downstream
            .post_with_deadline(&self.path, &payload, self.deadline)
            .await
    }
}

/// Sends boost reward events downstream
#[derive(Debug, Clone)]
pub struct BoostDispatcher {
    downstream: DownstreamClient,
    path: String,
    deadline: Duration,
}

impl BoostDispatcher {
    pub fn new(downstream: DownstreamClient, path: impl Into<String>, deadline: Duration) -> Self {
        Self {
            downstream,
            path: path.into(),
            deadline,
        }
    }

    pub fn from_config(client: Client, config: &DownstreamConfig) -> Self {
        Self::new(
            DownstreamClient::from_config(client, config),
            &config.boost_path,
            config.boost_timeout(),
        )
    }

    /// Validate and send one boost; failures come back as `Outcome::Failed`
    pub async fn give_boost(&self, request: BoostRequest) -> Outcome {
        let payload = match request.into_payload() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Rejected boost request");
                return e.into();
            }
        };
        let names = payload.receiver_names();

        match self
            .downstream
            .post_with_deadline(&self.path, &payload, self.deadline)
            .await
        {
            Ok(acknowledgment) => {
                info!(
                    team_id = %payload.team_id,
                    receivers = payload.receivers.len(),
                    amount = payload.boost_amount,
                    "Boost sent"
                );
                Outcome::Succeeded {
                    message: format!("Boost sent to {}!", names),
                    acknowledgment,
                    records_synced: None,
                }
            }
            Err(e) => {
                warn!(team_id = %payload.team_id, error = %e, "Boost dispatch failed");
                e.into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::BoostReceiver;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SYNC_PATH: &str = "/integrations/jira/sync-users";
    const BOOST_PATH: &str = "/integrations/jira/boosts";

    fn records() -> Vec<DirectoryRecord> {
        vec![DirectoryRecord {
            account_id: "a1".to_string(),
            display_name: "Ada".to_string(),
            account_type: "atlassian".to_string(),
            active: true,
            avatar_url: None,
            email_address: Some(Some("ada@example.com".to_string())),
        }]
    }

    fn metadata() -> RunMetadata {
        RunMetadata {
            collected_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            source_tag: "forge-app".to_string(),
            correlation_id: Some("run-42".to_string()),
        }
    }

    fn sync_dispatcher(server: &MockServer, deadline: Duration) -> SyncDispatcher {
        SyncDispatcher::new(
            DownstreamClient::new(Client::new(), server.uri(), "secret-token"),
            SYNC_PATH,
            deadline,
        )
    }

    fn boost_dispatcher(server: &MockServer, deadline: Duration) -> BoostDispatcher {
        BoostDispatcher::new(
            DownstreamClient::new(Client::new(), server.uri(), "secret-token"),
            BOOST_PATH,
            deadline,
        )
    }

    fn boost_request() -> BoostRequest {
        BoostRequest::single(
            "team-1",
            "actor-1",
            BoostReceiver {
                account_id: "acc-2".to_string(),
                display_name: "Grace".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SYNC_PATH))
            .and(header(INTEGRATION_TOKEN_HEADER, "secret-token"))
            .and(body_partial_json(json!({
                "sourceTag": "forge-app",
                "collectedAt": "2024-03-01T12:00:00.000Z",
                "correlationId": "run-42",
                "records": [{"accountId": "a1", "emailAddress": "ada@example.com"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"received": 1})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let ack = sync_dispatcher(&mock_server, Duration::from_secs(5))
            .dispatch(&records(), &metadata())
            .await
            .unwrap();

        assert_eq!(ack, json!({"received": 1}));
    }

    #[tokio::test]
    async fn test_dispatch_rejected() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SYNC_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = sync_dispatcher(&mock_server, Duration::from_secs(5))
            .dispatch(&records(), &metadata())
            .await;

        assert_eq!(
            result,
            Err(SyncError::RemoteRejected {
                status: 401,
                body: "bad token".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_dispatch_timeout() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SYNC_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"received": 1}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;

        let result = sync_dispatcher(&mock_server, Duration::from_millis(100))
            .dispatch(&records(), &metadata())
            .await;

        assert_eq!(result, Err(SyncError::Timeout(Duration::from_millis(100))));
    }

    #[tokio::test]
    async fn test_dispatch_network_failure() {
        let dispatcher = SyncDispatcher::new(
            DownstreamClient::new(Client::new(), "http://127.0.0.1:1", "secret-token"),
            SYNC_PATH,
            Duration::from_secs(5),
        );

        let result = dispatcher.dispatch(&records(), &metadata()).await;

        assert!(matches!(
            result,
            Err(SyncError::RemoteCallFailed { status: None, .. })
        ));
    }

    #[tokio::test]
    async fn test_dispatch_empty_and_malformed_acknowledgment() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SYNC_PATH))
            .respond_with(ResponseTemplate::new(204))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path(SYNC_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&mock_server)
            .await;

        let dispatcher = sync_dispatcher(&mock_server, Duration::from_secs(5));

        let first = dispatcher.dispatch(&records(), &metadata()).await;
        assert_eq!(first, Ok(Value::Null));

        let second = dispatcher.dispatch(&records(), &metadata()).await;
        assert!(matches!(second, Err(SyncError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_give_boost_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(BOOST_PATH))
            .and(header(INTEGRATION_TOKEN_HEADER, "secret-token"))
            .and(body_partial_json(json!({
                "teamId": "team-1",
                "actorAccountId": "actor-1",
                "receivers": [{"accountId": "acc-2", "displayName": "Grace"}],
                "boostAmount": 1,
                "message": "🚀 Boost sent!",
                "context": {"triggerType": "manual_boost"}
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "boost-9"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let outcome = boost_dispatcher(&mock_server, Duration::from_secs(5))
            .give_boost(boost_request())
            .await;

        assert_eq!(
            outcome,
            Outcome::Succeeded {
                message: "Boost sent to Grace!".to_string(),
                acknowledgment: json!({"id": "boost-9"}),
                records_synced: None,
            }
        );
    }

    #[tokio::test]
    async fn test_give_boost_invalid_request_not_sent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let mut request = boost_request();
        request.team_id = String::new();
        let outcome = boost_dispatcher(&mock_server, Duration::from_secs(5))
            .give_boost(request)
            .await;

        assert_eq!(outcome.error_kind(), Some(ErrorKind::InvalidInput));
    }

    #[tokio::test]
    async fn test_give_boost_timeout() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(BOOST_PATH))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&mock_server)
            .await;

        let outcome = boost_dispatcher(&mock_server, Duration::from_millis(100))
            .give_boost(boost_request())
            .await;

        assert_eq!(outcome.error_kind(), Some(ErrorKind::Timeout));
    }

    #[tokio::test]
    async fn test_give_boost_rejected() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(BOOST_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_string("unknown team"))
            .mount(&mock_server)
            .await;

        let outcome = boost_dispatcher(&mock_server, Duration::from_secs(5))
            .give_boost(boost_request())
            .await;

        match outcome {
            Outcome::Failed { error_kind, detail } => {
                assert_eq!(error_kind, ErrorKind::RemoteRejected);
                assert!(detail.contains("unknown team"));
            }
            other => panic!("Expected failure, got {:?}", other),
        }
    }
}
