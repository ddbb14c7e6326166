//! Router builder utilities for CRUD routes

use crate::core::error::ServiceError;
use crate::core::extractors::{EntityId, JsonBody, ListQuery};
use crate::core::query::PaginatedResult;
use crate::core::service::CrudService;
use crate::core::Entity;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Build CRUD routes for one entity type
///
/// These routes are mounted under the entity's resource name:
/// - GET /{resource} - List (paginated, `?filter=&page=&limit=&sort=`)
/// - POST /{resource} - Create
/// - GET /{resource}/{id} - Get by ID
/// - PUT|PATCH /{resource}/{id} - Partial update
/// - DELETE /{resource}/{id} - Delete, returns the deleted entity
///
/// Malformed ids, bodies and list queries are rejected with an
/// [`ExtractorError`](crate::core::extractors::ExtractorError).
pub fn crud_routes<T, C, U>(service: CrudService<T, C, U>) -> Router
where
    T: Entity,
    C: Into<T> + DeserializeOwned + Send + 'static,
    U: Serialize + DeserializeOwned + Send + 'static,
{
    let collection = format!("/{}", T::resource_name());
    let item = format!("/{}/{{id}}", T::resource_name());

    Router::new()
        .route(&collection, get(list::<T, C, U>).post(create::<T, C, U>))
        .route(
            &item,
            get(get_one::<T, C, U>)
                .put(update::<T, C, U>)
                .patch(update::<T, C, U>)
                .delete(remove::<T, C, U>),
        )
        .with_state(service)
}

async fn list<T, C, U>(
    State(service): State<CrudService<T, C, U>>,
    query: ListQuery,
) -> Result<Json<PaginatedResult<T>>, ServiceError>
where
    T: Entity,
    C: Into<T> + Send,
    U: Serialize + Send,
{
    let page = service.find_all(&query.filter, &query.options).await?;
    Ok(Json(page))
}

async fn create<T, C, U>(
    State(service): State<CrudService<T, C, U>>,
    JsonBody(input): JsonBody<C>,
) -> Result<(StatusCode, Json<T>), ServiceError>
where
    T: Entity,
    C: Into<T> + Send,
    U: Serialize + Send,
{
    let entity = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(entity)))
}

async fn get_one<T, C, U>(
    State(service): State<CrudService<T, C, U>>,
    EntityId(id): EntityId,
) -> Result<Json<T>, ServiceError>
where
    T: Entity,
    C: Into<T> + Send,
    U: Serialize + Send,
{
    Ok(Json(service.find_by_id_or_fail(&id).await?))
}

async fn update<T, C, U>(
    State(service): State<CrudService<T, C, U>>,
    EntityId(id): EntityId,
    JsonBody(input): JsonBody<U>,
) -> Result<Json<T>, ServiceError>
where
    T: Entity,
    C: Into<T> + Send,
    U: Serialize + Send,
{
    Ok(Json(service.update_or_fail(&id, input).await?))
}

async fn remove<T, C, U>(
    State(service): State<CrudService<T, C, U>>,
    EntityId(id): EntityId,
) -> Result<Json<T>, ServiceError>
where
    T: Entity,
    C: Into<T> + Send,
    U: Serialize + Send,
{
    Ok(Json(service.remove_or_fail(&id).await?))
}
