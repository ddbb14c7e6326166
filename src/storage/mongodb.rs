//! MongoDB storage backend using the official MongoDB async driver.
//!
//! Provides `MongoStore<T>`, a [`DocumentStore`] backed by a MongoDB
//! database via `mongodb::Database`.
//!
//! # Feature flag
//!
//! This module is gated behind the `mongodb_backend` feature flag:
//! ```toml
//! [dependencies]
//! backbone-rs = { version = "0.1", features = ["mongodb_backend"] }
//! ```
//!
//! # Storage model
//!
//! Each `MongoStore<T>` operates on a collection named after
//! `T::resource_name()` (e.g., "users", "companies").
//!
//! # Serialization strategy
//!
//! Entities are serialized via `serde_json::Value` as an intermediate format,
//! then converted to BSON documents. UUIDs and timestamps are stored as
//! strings. The `id` field is mapped to MongoDB's `_id` convention, in
//! documents as well as in filters and sort keys.

use crate::core::query::SortSpec;
use crate::core::store::{DocumentStore, Filter, strip_immutable_fields};
use crate::core::Entity;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{Bson, Document, doc};
use mongodb::options::ReturnDocument;
use mongodb::{Database, IndexModel};
use serde_json::{Map, Value};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

/// Convert a serde_json::Value (expected to be an Object) into a BSON Document,
/// renaming `id` → `_id` for MongoDB convention.
fn json_to_document(json: Value) -> Result<Document> {
    let bson_val = mongodb::bson::to_bson(&json)
        .map_err(|e| anyhow!("Failed to convert JSON to BSON: {}", e))?;

    let mut doc = match bson_val {
        Bson::Document(d) => d,
        _ => return Err(anyhow!("Expected BSON document, got non-object")),
    };

    if let Some(id) = doc.remove("id") {
        doc.insert("_id", id);
    }

    Ok(doc)
}

/// Convert a BSON Document back into a serde_json::Value,
/// renaming `_id` → `id` for domain entity convention.
fn document_to_json(mut doc: Document) -> Value {
    if let Some(id) = doc.remove("_id") {
        doc.insert("id", id);
    }

    Bson::Document(doc).into_relaxed_extjson()
}

/// Convert a UUID to its BSON string representation for queries.
fn uuid_bson(id: &Uuid) -> Bson {
    Bson::String(id.to_string())
}

fn field_name(field: &str) -> &str {
    if field == "id" { "_id" } else { field }
}

/// Convert a caller filter into a query document.
fn filter_to_document(filter: &Filter) -> Result<Document> {
    json_to_document(Value::Object(filter.clone()))
}

/// Convert a sort specification into a MongoDB sort document, keeping key order.
fn sort_to_document(sort: &SortSpec) -> Document {
    let mut doc = Document::new();
    for (field, direction) in sort.iter() {
        doc.insert(field_name(field), direction.as_i32());
    }
    doc
}

/// Build the `$set` update for a partial patch, stamping `updated_at`.
fn patch_to_update(patch: Map<String, Value>) -> Result<Document> {
    let mut fields = strip_immutable_fields(patch);
    fields.insert("updated_at".to_string(), serde_json::to_value(Utc::now())?);

    let set = json_to_document(Value::Object(fields))?;
    Ok(doc! { "$set": set })
}

// ---------------------------------------------------------------------------
// MongoStore<T>
// ---------------------------------------------------------------------------

/// Generic document store backed by MongoDB.
///
/// # Example
///
/// ```rust,ignore
/// use mongodb::Client;
/// use backbone::storage::MongoStore;
///
/// let client = Client::with_uri_str("mongodb://localhost:27017").await?;
/// let store = MongoStore::<User>::new(client.database("mydb"));
/// store.ensure_indexes().await?;
/// let users = CrudService::from_store(store);
/// ```
#[derive(Clone, Debug)]
pub struct MongoStore<T> {
    database: Database,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T> MongoStore<T> {
    /// Create a new `MongoStore` with the given database handle.
    pub fn new(database: Database) -> Self {
        Self {
            database,
            _marker: std::marker::PhantomData,
        }
    }

    /// Get a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }
}

impl<T: Entity> MongoStore<T> {
    fn collection(&self) -> mongodb::Collection<Document> {
        self.database.collection(T::resource_name())
    }

    /// Create the index backing the default newest-first listing.
    ///
    /// Idempotent, safe to call on every startup.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder().keys(doc! { "created_at": -1 }).build();

        self.collection().create_index(index).await.map_err(|e| {
            anyhow!(
                "Failed to create indexes on {} collection: {}",
                T::resource_name(),
                e
            )
        })?;

        Ok(())
    }

    fn entity_to_document(entity: &T) -> Result<Document> {
        let json = serde_json::to_value(entity)
            .map_err(|e| anyhow!("Failed to serialize entity: {}", e))?;
        json_to_document(json)
    }

    fn document_to_entity(doc: Document) -> Result<T> {
        let json = document_to_json(doc);
        serde_json::from_value(json)
            .map_err(|e| anyhow!("Failed to deserialize entity from document: {}", e))
    }
}

#[async_trait]
impl<T: Entity> DocumentStore<T> for MongoStore<T> {
    async fn insert(&self, entity: T) -> Result<T> {
        let doc = Self::entity_to_document(&entity)?;
        let id_bson = uuid_bson(&entity.id());

        self.collection()
            .insert_one(doc)
            .await
            .map_err(|e| anyhow!("Failed to create {}: {}", T::resource_name_singular(), e))?;

        let stored = self
            .collection()
            .find_one(doc! { "_id": id_bson })
            .await
            .map_err(|e| anyhow!("Failed to read back created entity: {}", e))?
            .ok_or_else(|| anyhow!("Entity not found after insert"))?;

        Self::document_to_entity(stored)
    }

    async fn find_many(
        &self,
        filter: &Filter,
        sort: &SortSpec,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<T>> {
        let collection = self.collection();
        let mut find = collection
            .find(filter_to_document(filter)?)
            .skip(skip)
            .limit(i64::try_from(limit).unwrap_or(i64::MAX));
        if !sort.is_empty() {
            find = find.sort(sort_to_document(sort));
        }

        let cursor = find
            .await
            .map_err(|e| anyhow!("Failed to list {}: {}", T::resource_name(), e))?;

        let docs: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| anyhow!("Failed to collect {}: {}", T::resource_name(), e))?;

        docs.into_iter().map(Self::document_to_entity).collect()
    }

    async fn count(&self, filter: &Filter) -> Result<u64> {
        self.collection()
            .count_documents(filter_to_document(filter)?)
            .await
            .map_err(|e| anyhow!("Failed to count {}: {}", T::resource_name(), e))
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<T>> {
        self.collection()
            .find_one(filter_to_document(filter)?)
            .await
            .map_err(|e| anyhow!("Failed to query {}: {}", T::resource_name(), e))?
            .map(Self::document_to_entity)
            .transpose()
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<T>> {
        self.collection()
            .find_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(|e| anyhow!("Failed to get entity: {}", e))?
            .map(Self::document_to_entity)
            .transpose()
    }

    async fn update_and_return(&self, id: &Uuid, patch: Map<String, Value>) -> Result<Option<T>> {
        let update = patch_to_update(patch)?;

        self.collection()
            .find_one_and_update(doc! { "_id": uuid_bson(id) }, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| anyhow!("Failed to update entity: {}", e))?
            .map(Self::document_to_entity)
            .transpose()
    }

    async fn delete_and_return(&self, id: &Uuid) -> Result<Option<T>> {
        self.collection()
            .find_one_and_delete(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(|e| anyhow!("Failed to delete entity: {}", e))?
            .map(Self::document_to_entity)
            .transpose()
    }
}
