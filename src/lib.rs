//! # Backbone
//!
//! Reusable scaffolding for axum backends that sit on a document database.
//!
//! ## Features
//!
//! - **Generic CRUD**: `CrudService<T, C, U>` over any [`DocumentStore`](core::store::DocumentStore)
//! - **Pagination**: query-string parsing and `{data, meta}` envelopes
//! - **Request Logging**: axum middleware with duration, status and sanitized bodies
//! - **Public Routes**: a side table the authorization layer reads to skip auth
//! - **Sanitization**: mask or strip secret-bearing fields from JSON values
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use backbone::prelude::*;
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct User {
//!     pub id: Uuid,
//!     pub email: String,
//!     pub created_at: DateTime<Utc>,
//!     pub updated_at: DateTime<Utc>,
//! }
//!
//! impl_entity!(User, "user", "users");
//!
//! let store = InMemoryStore::<User>::new();
//! let users: CrudService<User, NewUser, UserPatch> = CrudService::new(Arc::new(store));
//!
//! let app = ServerBuilder::new()
//!     .with_routes(crud_routes(users))
//!     .with_health_check()
//!     .with_logging_config(RequestLoggingConfig::from_env())
//!     .build()?;
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod observability;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core Traits ===
    pub use crate::core::{
        auth::{PublicRoutes, RouteKey, RoutePolicy},
        entity::Entity,
        error::{ErrorResponse, RequestFailure, ServiceError},
        extractors::{EntityId, ExtractorError, JsonBody, ListQuery, Pagination},
        query::{
            PaginatedResult, PaginationMeta, PaginationOptions, SortDirection, SortSpec,
            create_paginated_result, create_pagination_options,
        },
        sanitize::{
            DEFAULT_MASK, SensitiveFields, remove_sensitive_fields, sanitize_object,
            sanitize_object_default,
        },
        service::CrudService,
        store::{DocumentStore, Filter},
    };

    // === Macros ===
    pub use crate::impl_entity;

    // === Storage ===
    pub use crate::storage::InMemoryStore;
    #[cfg(feature = "mongodb_backend")]
    pub use crate::storage::MongoStore;

    // === Config ===
    pub use crate::config::RequestLoggingConfig;

    // === Server ===
    pub use crate::server::{RequestContext, ServerBuilder, crud_routes, request_logging};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use std::sync::Arc;
    pub use uuid::Uuid;

    // === Axum ===
    pub use axum::{
        Router,
        extract::{Path, State},
        http::Method,
        routing::{delete, get, patch, post, put},
    };
}
