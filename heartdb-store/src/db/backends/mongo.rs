//! MongoDB backend.
//!
//! Thin mapping from [`DocumentStore`] calls onto the official driver. The
//! driver owns pooling, server selection and timeouts; nothing here retries.

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Document};
use futures::TryStreamExt;
use heartdb_core::DatabaseConfig;
use mongodb::error::ErrorKind;
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use serde::de::Error as _;
use tracing::{debug, info};

use crate::db::store::{DocumentStore, FindQuery, GroupSpec, IndexSpec, UpdateOutcome};
use crate::error::{StoreError, StoreResult};

/// Server error code for "collection already exists".
const NAMESPACE_EXISTS: i32 = 48;

pub struct MongoStore {
    client: Client,
    database: Database,
}

impl MongoStore {
    /// Connect and ping, so an unreachable server fails here rather than on
    /// the first query.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let endpoint = redact(&config.uri);
        let connection_error = |source| StoreError::Connection {
            endpoint: endpoint.clone(),
            source,
        };

        let client = Client::with_uri_str(&config.uri)
            .await
            .map_err(connection_error)?;
        let database = client.database(&config.name);
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(connection_error)?;

        info!(endpoint = %endpoint, database = %config.name, "Connected to MongoDB");
        Ok(Self { client, database })
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection(name)
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    fn backend_name(&self) -> &'static str {
        "mongodb"
    }

    async fn insert_one(&self, collection: &str, document: Document) -> StoreResult<ObjectId> {
        let result = self
            .collection(collection)
            .insert_one(document)
            .await
            .map_err(|e| StoreError::from_write(collection, e))?;

        match result.inserted_id.as_object_id() {
            Some(id) => Ok(id),
            // Only reachable if a caller supplied a non-ObjectId `_id`.
            None => Err(StoreError::Decode(bson::de::Error::custom(format!(
                "inserted _id {} is not an ObjectId",
                result.inserted_id
            )))),
        }
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
    ) -> StoreResult<Option<Document>> {
        Ok(self.collection(collection).find_one(filter).await?)
    }

    async fn find(&self, collection: &str, query: FindQuery) -> StoreResult<Vec<Document>> {
        let sort = query.sort_document();
        let coll = self.collection(collection);
        let mut action = coll.find(query.filter);
        if let Some(sort) = sort {
            action = action.sort(sort);
        }
        if query.skip > 0 {
            action = action.skip(query.skip);
        }
        if let Some(limit) = query.limit {
            action = action.limit(limit);
        }

        let cursor = action.await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        Ok(documents)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        set: Document,
    ) -> StoreResult<UpdateOutcome> {
        let result = self
            .collection(collection)
            .update_one(filter, doc! { "$set": set })
            .await
            .map_err(|e| StoreError::from_write(collection, e))?;

        Ok(UpdateOutcome {
            matched: result.matched_count,
        })
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> StoreResult<u64> {
        let result = self.collection(collection).delete_one(filter).await?;
        Ok(result.deleted_count)
    }

    async fn group(&self, collection: &str, spec: &GroupSpec) -> StoreResult<Option<Document>> {
        let cursor = self
            .collection(collection)
            .aggregate(spec.to_pipeline())
            .await?;
        let mut rows: Vec<Document> = cursor.try_collect().await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    async fn create_collection(&self, name: &str) -> StoreResult<()> {
        match self.database.create_collection(name).await {
            Ok(()) => Ok(()),
            Err(err) if is_namespace_exists(&err) => {
                debug!(collection = name, "collection already exists");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn create_index(&self, collection: &str, index: &IndexSpec) -> StoreResult<()> {
        let options = IndexOptions::builder().unique(index.unique).build();
        let model = IndexModel::builder()
            .keys(index.keys_document())
            .options(options)
            .build();

        let created = self.collection(collection).create_index(model).await?;
        debug!(collection, index = %created.index_name, "index ensured");
        Ok(())
    }

    async fn shutdown(&self) {
        self.client.clone().shutdown().await;
    }
}

fn is_namespace_exists(err: &mongodb::error::Error) -> bool {
    matches!(err.kind.as_ref(), ErrorKind::Command(command) if command.code == NAMESPACE_EXISTS)
}

/// Drop credentials from a connection string before it is logged.
pub(crate) fn redact(uri: &str) -> String {
    let Some((scheme, rest)) = uri.split_once("://") else {
        return uri.to_string();
    };
    let authority_end = rest.find('/').unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at) => format!("{scheme}://***@{}", &rest[at + 1..]),
        None => uri.to_string(),
    }
}
