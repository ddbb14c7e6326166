//! Server module for building HTTP servers
//!
//! This module provides:
//! - CRUD routes generated from a [`CrudService`](crate::core::CrudService)
//! - The request logging middleware
//! - A `ServerBuilder` wiring routes, public-route marking and logging together

pub mod builder;
pub mod logging;
pub mod router;

pub use builder::ServerBuilder;
pub use logging::{RequestContext, RequestLogging, request_logging, with_request_logging};
pub use router::crud_routes;
