//! Boost event models
//!
//! A boost is a reward event sent downstream on behalf of an actor.

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::SyncError;

/// Message used when the caller does not supply one
pub const DEFAULT_BOOST_MESSAGE: &str = "🚀 Boost sent!";

/// Trigger recorded in the boost context
const MANUAL_BOOST_TRIGGER: &str = "manual_boost";

/// One boost recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoostReceiver {
    /// Recipient account identifier
    pub account_id: String,
    /// Recipient display name
    pub display_name: String,
}

/// Caller-facing boost request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoostRequest {
    /// Team (tenant) the boost belongs to
    pub team_id: String,
    /// Account issuing the boost
    pub actor_account_id: String,
    /// Recipients
    pub receivers: Vec<BoostReceiver>,
    /// Number of boosts, defaults to 1
    pub boost_amount: Option<u32>,
    /// Message, defaults to [`DEFAULT_BOOST_MESSAGE`]
    pub message: Option<String>,
}

impl BoostRequest {
    /// Boost a single recipient with default amount and message
    pub fn single(
        team_id: impl Into<String>,
        actor_account_id: impl Into<String>,
        receiver: BoostReceiver,
    ) -> Self {
        Self {
            team_id: team_id.into(),
            actor_account_id: actor_account_id.into(),
            receivers: vec![receiver],
            boost_amount: None,
            message: None,
        }
    }

    /// Validate required fields and fill in defaults
    pub fn into_payload(self) -> Result<BoostPayload, SyncError> {
        if self.team_id.trim().is_empty() {
            return Err(SyncError::InvalidInput("teamId is required".to_string()));
        }
        if self.actor_account_id.trim().is_empty() {
            return Err(SyncError::InvalidInput(
                "actorAccountId is required".to_string(),
            ));
        }
        if self.receivers.is_empty() {
            return Err(SyncError::InvalidInput(
                "at least one receiver is required".to_string(),
            ));
        }
        if self.receivers.iter().any(|r| r.account_id.trim().is_empty()) {
            return Err(SyncError::InvalidInput(
                "receiver accountId is required".to_string(),
            ));
        }
        let boost_amount = self.boost_amount.unwrap_or(1);
        if boost_amount == 0 {
            return Err(SyncError::InvalidInput(
                "boostAmount must be at least 1".to_string(),
            ));
        }

        Ok(BoostPayload {
            team_id: self.team_id,
            actor_account_id: self.actor_account_id,
            receivers: self.receivers,
            boost_amount,
            message: self
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BOOST_MESSAGE.to_string()),
            context: json!({ "triggerType": MANUAL_BOOST_TRIGGER }),
        })
    }
}

/// Request body of the downstream boost endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoostPayload {
    /// Team id
    pub team_id: String,
    /// Actor account id
    pub actor_account_id: String,
    /// Recipients
    pub receivers: Vec<BoostReceiver>,
    /// Number of boosts
    pub boost_amount: u32,
    /// Message
    pub message: String,
    /// Free-form context
    pub context: Value,
}

impl BoostPayload {
    /// Comma-separated recipient names for summaries
    pub fn receiver_names(&self) -> String {
        self.receivers
            .iter()
            .map(|r| r.display_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receiver() -> BoostReceiver {
        BoostReceiver {
            account_id: "acc-2".to_string(),
            display_name: "Grace".to_string(),
        }
    }

    #[test]
    fn test_defaults_applied() {
        let payload = BoostRequest::single("team-1", "acc-1", receiver())
            .into_payload()
            .unwrap();

        assert_eq!(payload.boost_amount, 1);
        assert_eq!(payload.message, DEFAULT_BOOST_MESSAGE);
        assert_eq!(payload.context, json!({"triggerType": "manual_boost"}));
        assert_eq!(payload.receiver_names(), "Grace");
    }

    #[test]
    fn test_payload_wire_shape() {
        let mut request = BoostRequest::single("team-1", "acc-1", receiver());
        request.boost_amount = Some(3);
        request.message = Some("Great release!".to_string());

        let value = serde_json::to_value(request.into_payload().unwrap()).unwrap();

        assert_eq!(
            value,
            json!({
                "teamId": "team-1",
                "actorAccountId": "acc-1",
                "receivers": [{"accountId": "acc-2", "displayName": "Grace"}],
                "boostAmount": 3,
                "message": "Great release!",
                "context": {"triggerType": "manual_boost"}
            })
        );
    }

    #[test]
    fn test_missing_fields_rejected() {
        let missing_team = BoostRequest::single("", "acc-1", receiver());
        assert!(matches!(
            missing_team.into_payload(),
            Err(SyncError::InvalidInput(msg)) if msg.contains("teamId")
        ));

        let missing_actor = BoostRequest::single("team-1", " ", receiver());
        assert!(matches!(
            missing_actor.into_payload(),
            Err(SyncError::InvalidInput(msg)) if msg.contains("actorAccountId")
        ));

        let mut no_receivers = BoostRequest::single("team-1", "acc-1", receiver());
        no_receivers.receivers.clear();
        assert!(matches!(
            no_receivers.into_payload(),
            Err(SyncError::InvalidInput(_))
        ));

        let mut zero = BoostRequest::single("team-1", "acc-1", receiver());
        zero.boost_amount = Some(0);
        assert!(matches!(zero.into_payload(), Err(SyncError::InvalidInput(_))));
    }
}
