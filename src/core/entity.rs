//! Entity trait defining the core abstraction for stored documents

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Base trait for every document managed by a [`CrudService`](crate::core::CrudService).
///
/// All entities have:
/// - id: Unique identifier (serialized as `id`)
/// - created_at: Creation timestamp
/// - updated_at: Last modification timestamp
///
/// Stores rely on the serialized form: `id`, `created_at` and `updated_at`
/// must be top-level fields of the JSON representation. The
/// [`impl_entity!`](crate::impl_entity) macro implements this trait for
/// structs that follow that layout.
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// The plural resource name, used as collection name and URL segment (e.g., "users")
    fn resource_name() -> &'static str;

    /// The singular resource name (e.g., "user")
    fn resource_name_singular() -> &'static str;

    /// Get the unique identifier for this entity instance
    fn id(&self) -> Uuid;

    /// Get the creation timestamp
    fn created_at(&self) -> DateTime<Utc>;

    /// Get the last update timestamp
    fn updated_at(&self) -> DateTime<Utc>;
}
