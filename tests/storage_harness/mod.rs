//! Shared test harness for store and HTTP testing
//!
//! Provides `TestUser` with its create/update inputs, helper functions for
//! building test data, and `LogCapture` for asserting on emitted log lines.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//! use storage_harness::*;
//! ```

#![allow(dead_code)]

#[macro_use]
pub mod document_store_tests;
#[macro_use]
pub mod rest_tests;

use backbone::impl_entity;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// TestUser
// ---------------------------------------------------------------------------

/// A test entity with fields of every JSON kind used by filters and sorts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password: String,
    pub age: i64,
    pub score: f64,
    pub active: bool,
    pub address: TestAddress,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestAddress {
    pub city: String,
}

impl_entity!(TestUser, "test_user", "test_users");

/// Create input for `TestUser`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewTestUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub age: i64,
    #[serde(default)]
    pub score: f64,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default = "default_city")]
    pub city: String,
}

fn default_active() -> bool {
    true
}

fn default_city() -> String {
    "Paris".to_string()
}

impl From<NewTestUser> for TestUser {
    fn from(input: NewTestUser) -> Self {
        let now = Utc::now();
        TestUser {
            id: Uuid::new_v4(),
            name: input.name,
            email: input.email,
            password: input.password,
            age: input.age,
            score: input.score,
            active: input.active,
            address: TestAddress { city: input.city },
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update input for `TestUser`; absent fields are left untouched
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TestUserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// Fixed reference instant, so stored timestamps share one textual format.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Create a `TestUser` with a random ID, created `offset_secs` after [`base_time`].
pub fn create_test_user(name: &str, age: i64, active: bool, offset_secs: i64) -> TestUser {
    let created_at = base_time() + Duration::seconds(offset_secs);
    TestUser {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: format!("{}@test.com", name.to_lowercase()),
        password: "hunter2".to_string(),
        age,
        score: age as f64 / 10.0,
        active,
        address: TestAddress {
            city: "Paris".to_string(),
        },
        created_at,
        updated_at: created_at,
    }
}

/// Generate `n` users created one second apart.
///
/// Names are `User_0..User_{n-1}`, ages `20..20+n`, and even indexes are active.
pub fn sample_batch(n: usize) -> Vec<TestUser> {
    (0..n)
        .map(|i| create_test_user(&format!("User_{}", i), 20 + i as i64, i % 2 == 0, i as i64))
        .collect()
}

/// Build a filter from a `json!` object literal.
pub fn filter(value: serde_json::Value) -> backbone::core::Filter {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("filter must be a JSON object, got {other}"),
    }
}

pub fn names(users: &[TestUser]) -> Vec<&str> {
    users.iter().map(|u| u.name.as_str()).collect()
}

// ---------------------------------------------------------------------------
// Log capture
// ---------------------------------------------------------------------------

/// In-memory sink for `tracing` output.
///
/// ```rust,ignore
/// let logs = LogCapture::new();
/// let _guard = logs.set_default();
/// // ... run code that logs ...
/// assert!(logs.contents().contains("GET /users 200"));
/// ```
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a capturing subscriber for the current thread, at every level.
    pub fn set_default(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_target(false)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }
}

pub struct LogWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter {
            buffer: self.buffer.clone(),
        }
    }
}
