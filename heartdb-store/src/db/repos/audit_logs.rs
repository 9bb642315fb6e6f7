//! Audit log repository
//!
//! Append-only: entries are created and read, never changed or removed.
//! Every listing is newest first.

use bson::doc;
use chrono::{DateTime, Utc};
use heartdb_core::models::now;
use heartdb_core::{AuditLog, NewAuditLog, Record};
use tracing::{debug, info};

use super::{
    find_record, find_records, insert_record, key_filter, object_id_filter, parse_object_id,
};
use crate::db::connection::ConnectionManager;
use crate::db::store::FindQuery;
use crate::error::StoreResult;

/// Default number of entries returned by [`AuditLogRepo::find_recent`].
pub const DEFAULT_RECENT_LIMIT: i64 = 100;

pub struct AuditLogRepo<'a> {
    conn: &'a ConnectionManager,
}

impl<'a> AuditLogRepo<'a> {
    pub fn new(conn: &'a ConnectionManager) -> Self {
        Self { conn }
    }

    /// Append an entry with a fresh `LOG_` id, stamped with the current time.
    pub async fn create(&self, input: NewAuditLog) -> StoreResult<AuditLog> {
        let entry = AuditLog::from_new(AuditLog::KIND.new_id(), input, now());
        let entry = insert_record(self.conn, entry).await?;
        info!(
            log_id = %entry.log_id,
            action = %entry.action,
            object_type = %entry.object_type,
            object_id = %entry.object_id,
            "Recorded audit entry"
        );
        Ok(entry)
    }

    pub async fn find_by_id(&self, log_id: &str) -> StoreResult<Option<AuditLog>> {
        find_record(self.conn, key_filter::<AuditLog>(log_id)).await
    }

    pub async fn find_by_object_id(&self, object_id: &str) -> StoreResult<Option<AuditLog>> {
        let id = parse_object_id(object_id)?;
        find_record(self.conn, object_id_filter(id)).await
    }

    /// History of one subject, e.g. `("patient", "PAT_...")`.
    pub async fn find_by_object(
        &self,
        object_type: &str,
        object_id: &str,
    ) -> StoreResult<Vec<AuditLog>> {
        debug!(object_type, object_id, "Listing audit history");
        let filter = doc! { "object_type": object_type, "object_id": object_id };
        find_records(self.conn, FindQuery::new(filter).sort_desc("logged_at")).await
    }

    /// Entries logged within `[start, end]`, both ends inclusive.
    pub async fn find_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<AuditLog>> {
        let filter = doc! {
            "logged_at": {
                "$gte": bson::DateTime::from_chrono(start),
                "$lte": bson::DateTime::from_chrono(end),
            }
        };
        find_records(self.conn, FindQuery::new(filter).sort_desc("logged_at")).await
    }

    pub async fn find_by_action(&self, action: &str) -> StoreResult<Vec<AuditLog>> {
        let filter = doc! { "action": action };
        find_records(self.conn, FindQuery::new(filter).sort_desc("logged_at")).await
    }

    /// The `limit` newest entries. Non-positive limits fall back to
    /// [`DEFAULT_RECENT_LIMIT`].
    pub async fn find_recent(&self, limit: i64) -> StoreResult<Vec<AuditLog>> {
        let limit = if limit > 0 { limit } else { DEFAULT_RECENT_LIMIT };
        let query = FindQuery::default().sort_desc("logged_at").limit(limit);
        find_records(self.conn, query).await
    }
}
