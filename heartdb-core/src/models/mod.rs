//! Persisted record shapes.
//!
//! Each record has two identifiers: `_id`, the ObjectId assigned by the
//! database on insert, and a business id (`patient_id`, `encounter_id`,
//! `test_id`, `log_id`) assigned by the repository. The `New*` types are the
//! create inputs and omit every server-assigned field.

pub mod audit_log;
pub mod encounter;
pub mod patient;

use std::sync::atomic::{AtomicI64, Ordering};

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::ids::RecordKind;

pub use audit_log::{AuditLog, NewAuditLog};
pub use ecg_test::{EcgStatistics, EcgTest, NewEcgTest, FEATURE_NAMES};
pub use encounter::{Encounter, NewEncounter};
pub use patient::{NewPatient, Patient, PatientPatch};

/// A record type stored in its own collection.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {
    /// Kind whose tag prefixes the business id.
    const KIND: RecordKind;
    /// Collection name in the database.
    const COLLECTION: &'static str;
    /// Name of the unique business id field.
    const KEY_FIELD: &'static str;

    fn set_object_id(&mut self, id: ObjectId);
}

static LAST_STAMP_MILLIS: AtomicI64 = AtomicI64::new(i64::MIN);

/// Current time at the millisecond precision BSON dates keep.
///
/// Stamps are strictly increasing within the process: two calls in the same
/// millisecond get consecutive milliseconds. A record handed back from
/// `create` compares equal to the same record read back from storage, and an
/// update always moves `updated_at` forward.
pub fn now() -> DateTime<Utc> {
    let wall = Utc::now().timestamp_millis();
    let mut prev = LAST_STAMP_MILLIS.load(Ordering::Relaxed);
    loop {
        let next = wall.max(prev.saturating_add(1));
        match LAST_STAMP_MILLIS.compare_exchange_weak(
            prev,
            next,
            Ordering::AcqRel,
            Ordering::Relaxed,
        ) {
            Ok(_) => return DateTime::from_timestamp_millis(next).unwrap_or_else(Utc::now),
            Err(actual) => prev = actual,
        }
    }
}

macro_rules! impl_record {
    ($ty:ty, $kind:expr, $collection:literal, $key:ident) => {
        impl $crate::models::Record for $ty {
            const KIND: $crate::ids::RecordKind = $kind;
            const COLLECTION: &'static str = $collection;
            const KEY_FIELD: &'static str = stringify!($key);

            fn set_object_id(&mut self, id: ::bson::oid::ObjectId) {
                self.id = Some(id);
            }
        }
    };
}

pub(crate) use impl_record;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collections_and_keys() {
        assert_eq!(Patient::COLLECTION, "patients");
        assert_eq!(Patient::KEY_FIELD, "patient_id");
        assert_eq!(Encounter::COLLECTION, "encounters");
        assert_eq!(Encounter::KEY_FIELD, "encounter_id");
        assert_eq!(EcgTest::COLLECTION, "ecg_tests");
        assert_eq!(EcgTest::KEY_FIELD, "test_id");
        assert_eq!(AuditLog::COLLECTION, "audit_logs");
        assert_eq!(AuditLog::KEY_FIELD, "log_id");
        assert_eq!(Patient::KIND, RecordKind::Patient);
        assert_eq!(AuditLog::KIND.prefix(), "LOG");
    }

    #[test]
    fn now_has_millisecond_precision() {
        let stamp = now();
        assert_eq!(stamp.timestamp_subsec_nanos() % 1_000_000, 0);
    }

    #[test]
    fn back_to_back_stamps_strictly_increase() {
        let stamps: Vec<_> = (0..1_000).map(|_| now()).collect();
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn stamps_increase_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| (0..250).map(|_| now()).collect::<Vec<_>>()))
            .collect();

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.join().unwrap());
        }
        let total = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), total);
    }
}
