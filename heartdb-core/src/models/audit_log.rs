use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::RecordKind;

/// Append-only audit entry (`audit_logs` collection).
///
/// `object_type` + `object_id` name the subject, e.g. `("patient", "PAT_...")`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub log_id: String,
    pub action: String,
    pub object_type: String,
    pub object_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub logged_at: DateTime<Utc>,
}

super::impl_record!(AuditLog, RecordKind::AuditLog, "audit_logs", log_id);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewAuditLog {
    pub action: String,
    pub object_type: String,
    pub object_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl NewAuditLog {
    pub fn new(
        action: impl Into<String>,
        object_type: impl Into<String>,
        object_id: impl Into<String>,
    ) -> Self {
        Self {
            action: action.into(),
            object_type: object_type.into(),
            object_id: object_id.into(),
            ..Default::default()
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl AuditLog {
    pub fn from_new(log_id: String, input: NewAuditLog, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            log_id,
            action: input.action,
            object_type: input.object_type,
            object_id: input.object_id,
            user_id: input.user_id,
            details: input.details,
            ip_address: input.ip_address,
            user_agent: input.user_agent,
            logged_at: now,
        }
    }
}
