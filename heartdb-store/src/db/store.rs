//! The storage seam.
//!
//! Repositories talk to a [`DocumentStore`] rather than to the driver
//! directly, so the same repository code runs against MongoDB in production
//! and against [`MemoryStore`](super::MemoryStore) in tests.

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Bson, Document};

use crate::error::StoreResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    /// Driver representation: `1` or `-1`.
    pub fn as_i32(self) -> i32 {
        match self {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        }
    }
}

/// A filtered, optionally sorted and windowed read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
    pub filter: Document,
    pub sort: Vec<(String, SortOrder)>,
    pub skip: u64,
    /// `None` returns every match.
    pub limit: Option<i64>,
}

impl FindQuery {
    pub fn new(filter: Document) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    pub fn sort_desc(mut self, field: impl Into<String>) -> Self {
        self.sort.push((field.into(), SortOrder::Descending));
        self
    }

    pub fn sort_asc(mut self, field: impl Into<String>) -> Self {
        self.sort.push((field.into(), SortOrder::Ascending));
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn sort_document(&self) -> Option<Document> {
        if self.sort.is_empty() {
            return None;
        }
        Some(
            self.sort
                .iter()
                .map(|(field, order)| (field.clone(), Bson::Int32(order.as_i32())))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: u64,
}

/// One output column of a whole-collection `$group`.
#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    /// Number of documents.
    Count,
    /// Number of documents whose `field` equals `value`.
    CountWhere { field: String, value: Bson },
    /// Mean of a numeric field; null when no document has a number there.
    Average { field: String },
}

/// Summary computed over every document in a collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupSpec {
    pub outputs: Vec<(String, Accumulator)>,
}

impl GroupSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(mut self, output: impl Into<String>) -> Self {
        self.outputs.push((output.into(), Accumulator::Count));
        self
    }

    pub fn count_where(
        mut self,
        output: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<Bson>,
    ) -> Self {
        self.outputs.push((
            output.into(),
            Accumulator::CountWhere {
                field: field.into(),
                value: value.into(),
            },
        ));
        self
    }

    pub fn average(mut self, output: impl Into<String>, field: impl Into<String>) -> Self {
        self.outputs.push((
            output.into(),
            Accumulator::Average {
                field: field.into(),
            },
        ));
        self
    }

    /// Aggregation pipeline equivalent.
    pub fn to_pipeline(&self) -> Vec<Document> {
        let mut group = doc! { "_id": Bson::Null };
        for (output, accumulator) in &self.outputs {
            let expr = match accumulator {
                Accumulator::Count => doc! { "$sum": 1 },
                Accumulator::CountWhere { field, value } => doc! {
                    "$sum": { "$cond": [ { "$eq": [ format!("${field}"), value.clone() ] }, 1, 0 ] }
                },
                Accumulator::Average { field } => doc! { "$avg": format!("${field}") },
            };
            group.insert(output.clone(), expr);
        }
        vec![doc! { "$group": group }]
    }
}

/// Declared index on a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub keys: Vec<(String, SortOrder)>,
    pub unique: bool,
}

impl IndexSpec {
    pub fn new(keys: &[(&str, SortOrder)]) -> Self {
        Self {
            keys: keys
                .iter()
                .map(|(field, order)| ((*field).to_string(), *order))
                .collect(),
            unique: false,
        }
    }

    /// Single ascending field with a uniqueness constraint.
    pub fn unique(field: &str) -> Self {
        Self {
            unique: true,
            ..Self::new(&[(field, SortOrder::Ascending)])
        }
    }

    /// Single ascending field.
    pub fn ascending(field: &str) -> Self {
        Self::new(&[(field, SortOrder::Ascending)])
    }

    pub fn keys_document(&self) -> Document {
        self.keys
            .iter()
            .map(|(field, order)| (field.clone(), Bson::Int32(order.as_i32())))
            .collect()
    }

    /// Server-style default name, e.g. `patient_id_1_visit_date_-1`.
    pub fn name(&self) -> String {
        self.keys
            .iter()
            .map(|(field, order)| format!("{}_{}", field, order.as_i32()))
            .collect::<Vec<_>>()
            .join("_")
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|(field, _)| field.as_str())
    }
}

/// Document-level operations the repositories need, one round trip each.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Insert one document and return its `_id`.
    async fn insert_one(&self, collection: &str, document: Document) -> StoreResult<ObjectId>;

    async fn find_one(&self, collection: &str, filter: Document)
        -> StoreResult<Option<Document>>;

    async fn find(&self, collection: &str, query: FindQuery) -> StoreResult<Vec<Document>>;

    /// `$set` the given fields on the first match.
    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        set: Document,
    ) -> StoreResult<UpdateOutcome>;

    /// Delete the first match; returns the number deleted (0 or 1).
    async fn delete_one(&self, collection: &str, filter: Document) -> StoreResult<u64>;

    /// Run `spec` over the whole collection. `None` when it is empty.
    async fn group(&self, collection: &str, spec: &GroupSpec) -> StoreResult<Option<Document>>;

    /// Create a collection; an existing one is left as is.
    async fn create_collection(&self, name: &str) -> StoreResult<()>;

    /// Create an index; an identical existing index is left as is.
    async fn create_index(&self, collection: &str, index: &IndexSpec) -> StoreResult<()>;

    /// Release the underlying resources.
    async fn shutdown(&self);
}

/// Read a numeric aggregate output as `f64`; null or missing is 0.
pub fn number_or_zero(document: &Document, key: &str) -> f64 {
    match document.get(key) {
        Some(Bson::Int32(v)) => f64::from(*v),
        Some(Bson::Int64(v)) => *v as f64,
        Some(Bson::Double(v)) if v.is_finite() => *v,
        _ => 0.0,
    }
}

/// Read a count aggregate output; null or missing is 0.
pub fn count_or_zero(document: &Document, key: &str) -> u64 {
    match document.get(key) {
        Some(Bson::Int32(v)) => u64::try_from(*v).unwrap_or(0),
        Some(Bson::Int64(v)) => u64::try_from(*v).unwrap_or(0),
        Some(Bson::Double(v)) if v.is_finite() && *v >= 0.0 => *v as u64,
        _ => 0,
    }
}
