use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use bson::{doc, Document};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::RecordKind;

/// Patient record (`patients` collection)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub patient_id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub dob: DateTime<Utc>,
    pub gender: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

super::impl_record!(Patient, RecordKind::Patient, "patients", patient_id);

/// Input for creating a patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub dob: DateTime<Utc>,
    pub gender: String,
}

impl Patient {
    /// Build the document to insert. `created_at` and `updated_at` both
    /// start at `now`.
    pub fn from_new(patient_id: String, input: NewPatient, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            patient_id,
            first_name: input.first_name,
            last_name: input.last_name,
            dob: input.dob,
            gender: input.gender,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Partial update for a patient.
///
/// `_id`, `patient_id` and `created_at` are not representable here, so a
/// patch can never touch them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub dob: Option<DateTime<Utc>>,
    pub gender: Option<String>,
}

impl PatientPatch {
    /// Fields for a `$set`, always including the refreshed `updated_at`.
    pub fn to_set_document(&self, now: DateTime<Utc>) -> Document {
        let mut set = doc! { "updated_at": bson::DateTime::from_chrono(now) };
        if let Some(first_name) = &self.first_name {
            set.insert("first_name", first_name.as_str());
        }
        if let Some(last_name) = &self.last_name {
            set.insert("last_name", last_name.as_str());
        }
        if let Some(dob) = self.dob {
            set.insert("dob", bson::DateTime::from_chrono(dob));
        }
        if let Some(gender) = &self.gender {
            set.insert("gender", gender.as_str());
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn john_doe() -> NewPatient {
        NewPatient {
            first_name: "John".into(),
            last_name: "Doe".into(),
            dob: Utc.with_ymd_and_hms(1980, 5, 15, 0, 0, 0).unwrap(),
            gender: "Male".into(),
        }
    }

    #[test]
    fn persisted_field_names() {
        let now = crate::models::now();
        let patient = Patient::from_new("PAT_1".into(), john_doe(), now);
        let doc = bson::to_document(&patient).unwrap();

        let keys: Vec<&str> = doc.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            [
                "patient_id",
                "first_name",
                "last_name",
                "dob",
                "gender",
                "created_at",
                "updated_at"
            ]
        );
        assert!(matches!(doc.get("dob"), Some(bson::Bson::DateTime(_))));
    }

    #[test]
    fn document_round_trip_keeps_object_id() {
        let mut patient = Patient::from_new("PAT_2".into(), john_doe(), crate::models::now());
        patient.id = Some(ObjectId::new());

        let doc = bson::to_document(&patient).unwrap();
        assert!(doc.get_object_id("_id").is_ok());

        let back: Patient = bson::from_document(doc).unwrap();
        assert_eq!(back, patient);
    }

    #[test]
    fn patch_sets_only_given_fields() {
        let now = crate::models::now();
        let patch = PatientPatch {
            gender: Some("Other".into()),
            ..Default::default()
        };

        let set = patch.to_set_document(now);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get_str("gender").unwrap(), "Other");
        assert!(set.get_datetime("updated_at").is_ok());
    }

    #[test]
    fn empty_patch_still_touches_updated_at() {
        let set = PatientPatch::default().to_set_document(crate::models::now());
        assert_eq!(set.keys().collect::<Vec<_>>(), ["updated_at"]);
    }
}
