//! Store trait for document-database backends

use crate::core::query::SortSpec;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Predicate map passed through to the store
///
/// The CRUD layer never inspects a filter. Backends interpret it with the
/// usual document-database vocabulary:
///
/// - Exact match: `{"status": "active"}`
/// - Comparison: `{"age": {"$gte": 18, "$lt": 65}}`
/// - Membership: `{"role": {"$in": ["admin", "owner"]}}`
/// - Nested fields: `{"address.city": "Lyon"}`
pub type Filter = Map<String, Value>;

/// Trait for document stores holding one entity type
///
/// Implementations own persistence; every call round-trips to the backend
/// and errors are returned as-is to the caller.
#[async_trait]
pub trait DocumentStore<T>: Send + Sync {
    /// Insert a new document and return it as stored
    async fn insert(&self, entity: T) -> Result<T>;

    /// Fetch a page of documents matching `filter`, ordered by `sort`
    ///
    /// An empty `sort` leaves ordering to the backend.
    async fn find_many(&self, filter: &Filter, sort: &SortSpec, skip: u64, limit: u64)
    -> Result<Vec<T>>;

    /// Count the documents matching `filter`
    async fn count(&self, filter: &Filter) -> Result<u64>;

    /// Fetch the first document matching `filter`
    async fn find_one(&self, filter: &Filter) -> Result<Option<T>>;

    /// Fetch a document by id
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<T>>;

    /// Apply a partial update and return the document after the update
    ///
    /// `patch` must be a JSON object. `id` and `created_at` keys are ignored
    /// and `updated_at` is refreshed by the store. Returns `Ok(None)` when no
    /// document has this id.
    async fn update_and_return(&self, id: &Uuid, patch: Map<String, Value>) -> Result<Option<T>>;

    /// Delete a document and return it as it was before deletion
    async fn delete_and_return(&self, id: &Uuid) -> Result<Option<T>>;
}

/// Keys a patch may never overwrite
pub const IMMUTABLE_FIELDS: &[&str] = &["id", "_id", "created_at"];

/// Drop the keys a partial update must not touch
pub fn strip_immutable_fields(mut patch: Map<String, Value>) -> Map<String, Value> {
    for key in IMMUTABLE_FIELDS {
        patch.remove(*key);
    }
    patch
}
