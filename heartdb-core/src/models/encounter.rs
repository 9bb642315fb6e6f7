use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::RecordKind;

/// A clinical visit (`encounters` collection).
///
/// `patient_id` is expected to name an existing patient; nothing in the data
/// layer checks that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encounter {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub encounter_id: String,
    pub patient_id: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub visit_date: DateTime<Utc>,
    pub doctor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

super::impl_record!(Encounter, RecordKind::Encounter, "encounters", encounter_id);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEncounter {
    pub patient_id: String,
    pub visit_date: DateTime<Utc>,
    pub doctor: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Encounter {
    pub fn from_new(encounter_id: String, input: NewEncounter, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            encounter_id,
            patient_id: input.patient_id,
            visit_date: input.visit_date,
            doctor: input.doctor,
            notes: input.notes,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn notes_omitted_when_absent() {
        let encounter = Encounter::from_new(
            "ENC_1".into(),
            NewEncounter {
                patient_id: "PAT_1".into(),
                visit_date: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
                doctor: "Dr. Ada".into(),
                notes: None,
            },
            crate::models::now(),
        );

        let doc = bson::to_document(&encounter).unwrap();
        assert!(!doc.contains_key("notes"));
        assert!(!doc.contains_key("_id"));
        assert_eq!(doc.get_str("patient_id").unwrap(), "PAT_1");

        let back: Encounter = bson::from_document(doc).unwrap();
        assert_eq!(back, encounter);
    }
}
