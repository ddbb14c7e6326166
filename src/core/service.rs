//! Generic CRUD service over a document store

use crate::core::error::ServiceError;
use crate::core::query::{PaginatedResult, PaginationOptions};
use crate::core::store::{DocumentStore, Filter};
use crate::core::Entity;
use anyhow::{Context, anyhow};
use serde::Serialize;
use serde_json::{Map, Value};
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

/// CRUD operations for one entity type
///
/// `CrudService` is a thin layer over a shared [`DocumentStore`] handle: it
/// never caches and every call is a single round-trip (two concurrent ones
/// for [`find_all`](Self::find_all)). Entity-specific services embed it and
/// add their own queries next to it.
///
/// - `T`: the stored entity
/// - `C`: create input, converted with `Into<T>`
/// - `U`: update input, serialized into a partial patch
///
/// # Example
///
/// ```rust,ignore
/// pub struct UserService {
///     crud: CrudService<User, NewUser, UserPatch>,
/// }
///
/// impl UserService {
///     pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
///         let mut filter = Filter::new();
///         filter.insert("email".into(), email.into());
///         self.crud.find_one(&filter).await
///     }
/// }
/// ```
pub struct CrudService<T, C = T, U = Map<String, Value>> {
    store: Arc<dyn DocumentStore<T>>,
    _marker: PhantomData<fn(C, U)>,
}

impl<T, C, U> Clone for CrudService<T, C, U> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T, C, U> CrudService<T, C, U>
where
    T: Entity,
    C: Into<T> + Send,
    U: Serialize + Send,
{
    /// Create a service sharing an existing store handle
    pub fn new(store: Arc<dyn DocumentStore<T>>) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    /// Create a service owning `store`
    pub fn from_store(store: impl DocumentStore<T> + 'static) -> Self {
        Self::new(Arc::new(store))
    }

    /// The underlying store, for entity-specific queries
    pub fn store(&self) -> &Arc<dyn DocumentStore<T>> {
        &self.store
    }

    /// Persist a new entity built from `input`
    pub async fn create(&self, input: C) -> Result<T, ServiceError> {
        Ok(self.store.insert(input.into()).await?)
    }

    /// Fetch one page of entities matching `filter`
    ///
    /// Sorts by `options.sort`, or newest first when no sort was requested.
    /// The page and the total count are queried concurrently.
    pub async fn find_all(
        &self,
        filter: &Filter,
        options: &PaginationOptions,
    ) -> Result<PaginatedResult<T>, ServiceError> {
        let sort = options.sort.or_newest_first();

        let (data, total) = futures::try_join!(
            self.store
                .find_many(filter, &sort, options.skip(), options.limit),
            self.store.count(filter),
        )?;

        Ok(PaginatedResult::new(data, total, options))
    }

    /// Fetch an entity by id, `None` when absent
    pub async fn find_by_id(&self, id: &Uuid) -> Result<Option<T>, ServiceError> {
        Ok(self.store.find_by_id(id).await?)
    }

    /// Fetch an entity by id, failing with [`ServiceError::NotFound`] when absent
    pub async fn find_by_id_or_fail(&self, id: &Uuid) -> Result<T, ServiceError> {
        self.find_by_id(id).await?.ok_or_else(|| self.not_found(id))
    }

    /// Fetch the first entity matching `filter`
    pub async fn find_one(&self, filter: &Filter) -> Result<Option<T>, ServiceError> {
        Ok(self.store.find_one(filter).await?)
    }

    /// Apply a partial update, returning the updated entity or `None`
    pub async fn update(&self, id: &Uuid, input: U) -> Result<Option<T>, ServiceError> {
        let patch = Self::to_patch(&input)?;
        Ok(self.store.update_and_return(id, patch).await?)
    }

    /// Apply a partial update, failing with [`ServiceError::NotFound`] when absent
    pub async fn update_or_fail(&self, id: &Uuid, input: U) -> Result<T, ServiceError> {
        self.update(id, input).await?.ok_or_else(|| self.not_found(id))
    }

    /// Delete an entity, returning what was deleted or `None`
    pub async fn remove(&self, id: &Uuid) -> Result<Option<T>, ServiceError> {
        Ok(self.store.delete_and_return(id).await?)
    }

    /// Delete an entity, failing with [`ServiceError::NotFound`] when absent
    pub async fn remove_or_fail(&self, id: &Uuid) -> Result<T, ServiceError> {
        self.remove(id).await?.ok_or_else(|| self.not_found(id))
    }

    fn not_found(&self, id: &Uuid) -> ServiceError {
        ServiceError::not_found(T::resource_name_singular(), *id)
    }

    fn to_patch(input: &U) -> anyhow::Result<Map<String, Value>> {
        let value = serde_json::to_value(input)
            .with_context(|| format!("Failed to serialize {} update", T::resource_name_singular()))?;

        match value {
            Value::Object(patch) => Ok(patch),
            other => Err(anyhow!(
                "{} update must serialize to a JSON object, got {}",
                T::resource_name_singular(),
                other
            )),
        }
    }
}
