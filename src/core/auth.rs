//! Public-route marking for the authorization layer
//!
//! Routes are declared public at registration time and recorded in a
//! [`PublicRoutes`] side table. This crate only produces the table; the
//! authorization middleware of the application reads it (through an axum
//! `Extension<Arc<PublicRoutes>>` or a direct handle) to decide whether a
//! request may skip authentication.

use axum::http::Method;
use std::collections::HashSet;

/// Identifies a registered route: HTTP method plus route pattern
///
/// The path is the pattern given to the router (`/users/{id}`), not the
/// concrete request path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    pub method: Method,
    pub path: String,
}

impl RouteKey {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

/// Access policy of a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePolicy {
    /// Public access (no auth required)
    Public,

    /// Authentication decided by the authorization layer
    Protected,
}

/// Side table of routes that do not require authentication
#[derive(Debug, Clone, Default)]
pub struct PublicRoutes {
    routes: HashSet<RouteKey>,
}

impl PublicRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a route as public; returns `false` if it already was
    pub fn mark_public(&mut self, method: Method, path: impl Into<String>) -> bool {
        self.routes.insert(RouteKey::new(method, path))
    }

    pub fn is_public(&self, method: &Method, path: &str) -> bool {
        self.routes.contains(&RouteKey::new(method.clone(), path))
    }

    /// Policy for a route; anything not marked is [`RoutePolicy::Protected`]
    pub fn policy_for(&self, method: &Method, path: &str) -> RoutePolicy {
        if self.is_public(method, path) {
            RoutePolicy::Public
        } else {
            RoutePolicy::Protected
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteKey> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Add every route of `other` to this table
    pub fn merge(&mut self, other: PublicRoutes) {
        self.routes.extend(other.routes);
    }
}
