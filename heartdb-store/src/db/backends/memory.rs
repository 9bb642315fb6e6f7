//! In-process document store.
//!
//! Implements the subset of query semantics the repositories use: equality
//! and `$eq`/`$ne`/`$gt`/`$gte`/`$lt`/`$lte`/`$in` filters, multi-key sorts,
//! skip/limit, unique indexes and whole-collection grouping. Data lives for
//! as long as the store does; `shutdown` keeps it so a reconnect sees the
//! same records, like a real server would.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{Bson, Document};
use tokio::sync::RwLock;
use tracing::debug;

use crate::db::store::{
    Accumulator, DocumentStore, FindQuery, GroupSpec, IndexSpec, SortOrder, UpdateOutcome,
};
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Default)]
struct MemoryCollection {
    documents: Vec<Document>,
    indexes: Vec<IndexSpec>,
}

impl MemoryCollection {
    /// First unique index `candidate` would violate, if any.
    fn violated_index(
        &self,
        candidate: &Document,
        skip_position: Option<usize>,
    ) -> Option<&IndexSpec> {
        self.indexes.iter().filter(|index| index.unique).find(|index| {
            self.documents
                .iter()
                .enumerate()
                .filter(|(position, _)| Some(*position) != skip_position)
                .any(|(_, existing)| {
                    index
                        .fields()
                        .all(|field| optional_equal(existing.get(field), candidate.get(field)))
                })
        })
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, MemoryCollection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently in `collection`.
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, |c| c.documents.len())
    }

    pub async fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn indexes(&self, collection: &str) -> Vec<IndexSpec> {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|c| c.indexes.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn insert_one(&self, collection: &str, mut document: Document) -> StoreResult<ObjectId> {
        let id = match document.get("_id") {
            Some(Bson::ObjectId(id)) => *id,
            _ => {
                let id = ObjectId::new();
                document.insert("_id", id);
                id
            }
        };

        let mut collections = self.collections.write().await;
        let target = collections.entry(collection.to_string()).or_default();

        if target
            .documents
            .iter()
            .any(|existing| existing.get_object_id("_id").ok() == Some(id))
        {
            return Err(StoreError::conflict(collection, format!("_id {id}")));
        }
        if let Some(index) = target.violated_index(&document, None) {
            return Err(StoreError::conflict(
                collection,
                format!("index {} rejects {}", index.name(), describe_keys(index, &document)),
            ));
        }

        target.documents.push(document);
        Ok(id)
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
    ) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|c| {
            c.documents
                .iter()
                .find(|document| matches_filter(document, &filter))
                .cloned()
        }))
    }

    async fn find(&self, collection: &str, query: FindQuery) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        let Some(source) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<Document> = source
            .documents
            .iter()
            .filter(|document| matches_filter(document, &query.filter))
            .cloned()
            .collect();

        if !query.sort.is_empty() {
            matched.sort_by(|a, b| compare_documents(a, b, &query.sort));
        }

        let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
        let limit = query
            .limit
            .filter(|limit| *limit != 0)
            .map_or(usize::MAX, |limit| {
                usize::try_from(limit.unsigned_abs()).unwrap_or(usize::MAX)
            });

        Ok(matched.into_iter().skip(skip).take(limit).collect())
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        set: Document,
    ) -> StoreResult<UpdateOutcome> {
        let mut collections = self.collections.write().await;
        let Some(target) = collections.get_mut(collection) else {
            return Ok(UpdateOutcome::default());
        };
        let Some(position) = target
            .documents
            .iter()
            .position(|document| matches_filter(document, &filter))
        else {
            return Ok(UpdateOutcome::default());
        };

        let mut updated = target.documents[position].clone();
        for (field, value) in set {
            updated.insert(field, value);
        }

        if let Some(index) = target.violated_index(&updated, Some(position)) {
            return Err(StoreError::conflict(
                collection,
                format!("index {} rejects {}", index.name(), describe_keys(index, &updated)),
            ));
        }

        target.documents[position] = updated;
        Ok(UpdateOutcome { matched: 1 })
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> StoreResult<u64> {
        let mut collections = self.collections.write().await;
        let Some(target) = collections.get_mut(collection) else {
            return Ok(0);
        };
        match target
            .documents
            .iter()
            .position(|document| matches_filter(document, &filter))
        {
            Some(position) => {
                target.documents.remove(position);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn group(&self, collection: &str, spec: &GroupSpec) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        let documents = match collections.get(collection) {
            Some(c) if !c.documents.is_empty() => &c.documents,
            _ => return Ok(None),
        };

        let mut row = Document::new();
        row.insert("_id", Bson::Null);
        for (output, accumulator) in &spec.outputs {
            let value = match accumulator {
                Accumulator::Count => Bson::Int64(saturating_count(documents.len())),
                Accumulator::CountWhere { field, value } => Bson::Int64(saturating_count(
                    documents
                        .iter()
                        .filter(|d| d.get(field).is_some_and(|v| values_equal(v, value)))
                        .count(),
                )),
                Accumulator::Average { field } => {
                    let (sum, seen) = documents
                        .iter()
                        .filter_map(|d| d.get(field).and_then(as_f64))
                        .fold((0.0, 0.0), |(sum, seen), v| (sum + v, seen + 1.0));
                    if seen == 0.0 {
                        Bson::Null
                    } else {
                        Bson::Double(sum / seen)
                    }
                }
            };
            row.insert(output.clone(), value);
        }
        Ok(Some(row))
    }

    async fn create_collection(&self, name: &str) -> StoreResult<()> {
        self.collections
            .write()
            .await
            .entry(name.to_string())
            .or_default();
        Ok(())
    }

    async fn create_index(&self, collection: &str, index: &IndexSpec) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let target = collections.entry(collection.to_string()).or_default();
        if target.indexes.contains(index) {
            debug!(collection, index = %index.name(), "index already present");
            return Ok(());
        }
        target.indexes.push(index.clone());
        Ok(())
    }

    async fn shutdown(&self) {}
}

fn saturating_count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn describe_keys(index: &IndexSpec, document: &Document) -> String {
    index
        .fields()
        .map(|field| match document.get(field) {
            Some(value) => format!("{field}: {value}"),
            None => format!("{field}: null"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Whether `document` satisfies every condition in `filter`.
pub(crate) fn matches_filter(document: &Document, filter: &Document) -> bool {
    filter.iter().all(|(field, condition)| {
        let value = document.get(field);
        match condition {
            Bson::Document(operators) if is_operator_document(operators) => operators
                .iter()
                .all(|(op, operand)| apply_operator(value, op, operand)),
            expected => value.is_some_and(|v| values_equal(v, expected)),
        }
    })
}

fn is_operator_document(document: &Document) -> bool {
    document.keys().next().is_some_and(|key| key.starts_with('$'))
}

fn apply_operator(value: Option<&Bson>, op: &str, operand: &Bson) -> bool {
    let ordering = value.and_then(|v| compare_values(v, operand));
    match op {
        "$eq" => value.is_some_and(|v| values_equal(v, operand)),
        "$ne" => !value.is_some_and(|v| values_equal(v, operand)),
        "$gt" => ordering == Some(Ordering::Greater),
        "$gte" => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        "$lt" => ordering == Some(Ordering::Less),
        "$lte" => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        "$in" => match (value, operand) {
            (Some(v), Bson::Array(candidates)) => candidates.iter().any(|c| values_equal(v, c)),
            _ => false,
        },
        _ => false,
    }
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

/// Ordering between two values of comparable types; numbers compare across
/// widths.
fn compare_values(a: &Bson, b: &Bson) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_f64(a), as_f64(b)) {
        return x.partial_cmp(&y);
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::DateTime(x), Bson::DateTime(y)) => Some(x.cmp(y)),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => Some(x.bytes().cmp(&y.bytes())),
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn values_equal(a: &Bson, b: &Bson) -> bool {
    match compare_values(a, b) {
        Some(ordering) => ordering == Ordering::Equal,
        None => a == b,
    }
}

fn optional_equal(a: Option<&Bson>, b: Option<&Bson>) -> bool {
    match (a, b) {
        (Some(x), Some(y)) => values_equal(x, y),
        (None, None) => true,
        (Some(Bson::Null), None) | (None, Some(Bson::Null)) => true,
        _ => false,
    }
}

/// Missing fields sort before present ones, as on the server.
fn compare_documents(a: &Document, b: &Document, sort: &[(String, SortOrder)]) -> Ordering {
    for (field, order) in sort {
        let ordering = match (a.get(field), b.get(field)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
        };
        let ordering = match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use chrono::{TimeZone, Utc};

    fn at(day: u32) -> bson::DateTime {
        bson::DateTime::from_chrono(Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap())
    }

    #[test]
    fn equality_crosses_numeric_widths() {
        let document = doc! { "target": 1_i32 };
        assert!(matches_filter(&document, &doc! { "target": 1_i64 }));
        assert!(matches_filter(&document, &doc! { "target": 1.0 }));
        assert!(!matches_filter(&document, &doc! { "target": 0 }));
    }

    #[test]
    fn missing_field_never_equals() {
        assert!(!matches_filter(&doc! {}, &doc! { "notes": "x" }));
        assert!(matches_filter(&doc! {}, &doc! { "notes": { "$ne": "x" } }));
    }

    #[test]
    fn range_operators_on_dates() {
        let document = doc! { "logged_at": at(10) };
        assert!(matches_filter(
            &document,
            &doc! { "logged_at": { "$gte": at(10), "$lte": at(20) } }
        ));
        assert!(!matches_filter(&document, &doc! { "logged_at": { "$gt": at(10) } }));
        assert!(matches_filter(&document, &doc! { "logged_at": { "$lt": at(11) } }));
    }

    #[test]
    fn in_operator() {
        let document = doc! { "action": "delete" };
        assert!(matches_filter(&document, &doc! { "action": { "$in": ["create", "delete"] } }));
        assert!(!matches_filter(&document, &doc! { "action": { "$in": ["create"] } }));
    }

    #[test]
    fn plain_subdocument_is_compared_whole() {
        let document = doc! { "details": { "field": "gender" } };
        assert!(matches_filter(&document, &doc! { "details": { "field": "gender" } }));
    }

    #[tokio::test]
    async fn find_sorts_skips_and_limits() {
        let store = MemoryStore::new();
        for day in [3, 1, 4, 2, 5] {
            store
                .insert_one("encounters", doc! { "day": day, "visit_date": at(day) })
                .await
                .unwrap();
        }

        let found = store
            .find(
                "encounters",
                FindQuery::default().sort_desc("visit_date").skip(1).limit(3),
            )
            .await
            .unwrap();
        let days: Vec<i32> = found.iter().map(|d| d.get_i32("day").unwrap()).collect();
        assert_eq!(days, [4, 3, 2]);
    }

    #[tokio::test]
    async fn unique_index_rejects_duplicates() {
        let store = MemoryStore::new();
        store
            .create_index("patients", &IndexSpec::unique("patient_id"))
            .await
            .unwrap();

        store
            .insert_one("patients", doc! { "patient_id": "PAT_1" })
            .await
            .unwrap();
        let err = store
            .insert_one("patients", doc! { "patient_id": "PAT_1" })
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.len("patients").await, 1);
    }

    #[tokio::test]
    async fn update_reports_matched_even_when_unchanged() {
        let store = MemoryStore::new();
        store
            .insert_one("encounters", doc! { "encounter_id": "ENC_1", "notes": "a" })
            .await
            .unwrap();

        let changed = store
            .update_one("encounters", doc! { "encounter_id": "ENC_1" }, doc! { "notes": "b" })
            .await
            .unwrap();
        assert_eq!(changed, UpdateOutcome { matched: 1 });

        let same = store
            .update_one("encounters", doc! { "encounter_id": "ENC_1" }, doc! { "notes": "b" })
            .await
            .unwrap();
        assert_eq!(same, UpdateOutcome { matched: 1 });

        let missing = store
            .update_one("encounters", doc! { "encounter_id": "ENC_9" }, doc! { "notes": "c" })
            .await
            .unwrap();
        assert_eq!(missing, UpdateOutcome::default());
    }

    #[tokio::test]
    async fn group_over_empty_collection_is_none() {
        let store = MemoryStore::new();
        store.create_collection("ecg_tests").await.unwrap();
        let row = store
            .group("ecg_tests", &GroupSpec::new().count("total"))
            .await
            .unwrap();
        assert!(row.is_none());
    }

    #[tokio::test]
    async fn group_computes_counts_and_means() {
        let store = MemoryStore::new();
        for (age, target) in [(40, 0), (60, 1), (50, 1)] {
            store
                .insert_one("ecg_tests", doc! { "age": age, "target": target })
                .await
                .unwrap();
        }

        let row = store
            .group(
                "ecg_tests",
                &GroupSpec::new()
                    .count("total")
                    .count_where("cases", "target", 1)
                    .average("avg_age", "age")
                    .average("avg_missing", "chol"),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(row.get_i64("total").unwrap(), 3);
        assert_eq!(row.get_i64("cases").unwrap(), 2);
        assert_eq!(row.get_f64("avg_age").unwrap(), 50.0);
        assert_eq!(row.get("avg_missing"), Some(&Bson::Null));
    }

    #[tokio::test]
    async fn duplicate_index_declaration_is_noop() {
        let store = MemoryStore::new();
        let index = IndexSpec::ascending("doctor");
        store.create_index("encounters", &index).await.unwrap();
        store.create_index("encounters", &index).await.unwrap();
        assert_eq!(store.indexes("encounters").await, vec![index]);
    }
}
