//! Core module containing fundamental traits and types for the framework

pub mod auth;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod query;
pub mod sanitize;
pub mod service;
pub mod store;

pub use auth::{PublicRoutes, RouteKey, RoutePolicy};
pub use entity::Entity;
pub use error::{ErrorResponse, RequestFailure, ServiceError};
pub use query::{PaginatedResult, PaginationMeta, PaginationOptions, SortDirection, SortSpec};
pub use service::CrudService;
pub use store::{DocumentStore, Filter};
