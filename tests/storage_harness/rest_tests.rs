//! REST integration test macro for document stores.
//!
//! The `rest_integration_tests!` macro generates HTTP-level tests that validate
//! a `DocumentStore<TestUser>` through full REST round-trips:
//! JSON → HTTP request → `crud_routes` → `CrudService` → store → JSON.
//!
//! ```text
//! axum_test::TestServer
//!     └─ ServerBuilder (health check + request logging)
//!         ├─ POST   /test_users        → create
//!         ├─ GET    /test_users        → paginated list
//!         ├─ GET    /test_users/{id}   → get
//!         ├─ PATCH  /test_users/{id}   → partial update
//!         └─ DELETE /test_users/{id}   → delete
//! ```

/// Generate a REST integration test suite for a store.
///
/// `$store_factory` must produce an `impl DocumentStore<TestUser> + 'static`.
#[macro_export]
macro_rules! rest_integration_tests {
    ($store_factory:expr) => {
        mod rest_integration_tests {
            use super::*;
            use axum::http::StatusCode;
            use axum_test::TestServer;
            use backbone::prelude::*;
            use serde_json::{Value, json};

            type TestUsers = CrudService<TestUser, NewTestUser, TestUserPatch>;

            async fn make_server() -> TestServer {
                let users: TestUsers = CrudService::from_store($store_factory);
                let app = ServerBuilder::new()
                    .with_routes(crud_routes(users))
                    .with_health_check()
                    .build()
                    .unwrap();
                TestServer::try_new(app).unwrap()
            }

            async fn create(server: &TestServer, name: &str, age: i64, active: bool) -> Value {
                let response = server
                    .post("/test_users")
                    .json(&json!({
                        "name": name,
                        "email": format!("{}@test.com", name.to_lowercase()),
                        "age": age,
                        "active": active
                    }))
                    .await;
                response.assert_status(StatusCode::CREATED);
                response.json()
            }

            // ==============================================================
            // CRUD
            // ==============================================================

            #[tokio::test]
            async fn test_rest_create() {
                let server = make_server().await;

                let body = create(&server, "Alice", 30, true).await;

                assert_eq!(body["name"], "Alice");
                assert_eq!(body["address"]["city"], "Paris");
                Uuid::parse_str(body["id"].as_str().unwrap()).unwrap();
                assert_eq!(body["created_at"], body["updated_at"]);
            }

            #[tokio::test]
            async fn test_rest_get() {
                let server = make_server().await;
                let created = create(&server, "Bob", 25, false).await;
                let id = created["id"].as_str().unwrap();

                let response = server.get(&format!("/test_users/{}", id)).await;

                response.assert_status_ok();
                let body: Value = response.json();
                assert_eq!(body, created);
            }

            #[tokio::test]
            async fn test_rest_patch() {
                let server = make_server().await;
                let created = create(&server, "Carol", 41, true).await;
                let id = created["id"].as_str().unwrap();

                let response = server
                    .patch(&format!("/test_users/{}", id))
                    .json(&json!({"age": 42}))
                    .await;

                response.assert_status_ok();
                let body: Value = response.json();
                assert_eq!(body["age"], 42);
                assert_eq!(body["name"], "Carol");
                assert_eq!(body["created_at"], created["created_at"]);
                assert_ne!(body["updated_at"], created["updated_at"]);
            }

            #[tokio::test]
            async fn test_rest_delete() {
                let server = make_server().await;
                let created = create(&server, "Dave", 33, true).await;
                let id = created["id"].as_str().unwrap();

                let response = server.delete(&format!("/test_users/{}", id)).await;
                response.assert_status_ok();
                let body: Value = response.json();
                assert_eq!(body["id"], id);

                server
                    .get(&format!("/test_users/{}", id))
                    .await
                    .assert_status(StatusCode::NOT_FOUND);
            }

            // ==============================================================
            // Pagination / Filter / Sort
            // ==============================================================

            #[tokio::test]
            async fn test_rest_list_pagination() {
                let server = make_server().await;
                for i in 0..5 {
                    create(&server, &format!("User{}", i), 20 + i, true).await;
                }

                let response = server
                    .get("/test_users")
                    .add_query_param("page", 2)
                    .add_query_param("limit", 2)
                    .add_query_param("sort", "age")
                    .await;

                response.assert_status_ok();
                let body: Value = response.json();
                let ages: Vec<i64> = body["data"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|u| u["age"].as_i64().unwrap())
                    .collect();
                assert_eq!(ages, vec![22, 23]);
                assert_eq!(body["meta"], json!({"total": 5, "page": 2, "limit": 2, "pages": 3}));
            }

            #[tokio::test]
            async fn test_rest_list_defaults_to_newest_first() {
                let server = make_server().await;
                for name in ["First", "Second", "Third"] {
                    create(&server, name, 30, true).await;
                    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                }

                let response = server.get("/test_users").await;

                response.assert_status_ok();
                let body: Value = response.json();
                let names: Vec<&str> = body["data"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|u| u["name"].as_str().unwrap())
                    .collect();
                assert_eq!(names, vec!["Third", "Second", "First"]);
            }

            #[tokio::test]
            async fn test_rest_list_defaults_for_invalid_paging() {
                let server = make_server().await;
                create(&server, "Only", 50, true).await;

                let response = server
                    .get("/test_users")
                    .add_query_param("page", "-3")
                    .add_query_param("limit", "500")
                    .await;

                response.assert_status_ok();
                let body: Value = response.json();
                assert_eq!(body["meta"]["page"], 1);
                assert_eq!(body["meta"]["limit"], 20);
            }

            #[tokio::test]
            async fn test_rest_list_filter() {
                let server = make_server().await;
                create(&server, "Young", 18, true).await;
                create(&server, "Adult", 40, true).await;
                create(&server, "Retired", 70, false).await;

                let response = server
                    .get("/test_users")
                    .add_query_param("filter", r#"{"active":true,"age":{"$gte":21}}"#)
                    .await;

                response.assert_status_ok();
                let body: Value = response.json();
                assert_eq!(body["meta"]["total"], 1);
                assert_eq!(body["data"][0]["name"], "Adult");
            }

            #[tokio::test]
            async fn test_rest_list_sort_descending() {
                let server = make_server().await;
                for (name, age) in [("B", 30), ("A", 10), ("C", 20)] {
                    create(&server, name, age, true).await;
                }

                let response = server.get("/test_users").add_query_param("sort", "-age").await;

                let body: Value = response.json();
                let names: Vec<&str> = body["data"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|u| u["name"].as_str().unwrap())
                    .collect();
                assert_eq!(names, vec!["B", "C", "A"]);
            }

            // ==============================================================
            // Error handling
            // ==============================================================

            #[tokio::test]
            async fn test_rest_error_not_found() {
                let server = make_server().await;
                let id = Uuid::new_v4();

                let response = server.get(&format!("/test_users/{}", id)).await;

                response.assert_status(StatusCode::NOT_FOUND);
                let body: Value = response.json();
                assert_eq!(body["code"], "ENTITY_NOT_FOUND");
                assert_eq!(body["details"]["id"], id.to_string());
            }

            #[tokio::test]
            async fn test_rest_update_missing_is_not_found() {
                let server = make_server().await;

                server
                    .patch(&format!("/test_users/{}", Uuid::new_v4()))
                    .json(&json!({"name": "Ghost"}))
                    .await
                    .assert_status(StatusCode::NOT_FOUND);
            }

            #[tokio::test]
            async fn test_rest_error_invalid_uuid() {
                let server = make_server().await;

                server
                    .get("/test_users/not-a-uuid")
                    .await
                    .assert_status(StatusCode::BAD_REQUEST);
            }

            #[tokio::test]
            async fn test_rest_error_invalid_filter() {
                let server = make_server().await;

                let response = server
                    .get("/test_users")
                    .add_query_param("filter", "[1,2]")
                    .await;

                response.assert_status(StatusCode::BAD_REQUEST);
                let body: Value = response.json();
                assert!(body["error"].as_str().unwrap().contains("Invalid filter"));
            }

            #[tokio::test]
            async fn test_rest_health_check() {
                let server = make_server().await;

                let response = server.get("/health").await;

                response.assert_status_ok();
                response.assert_json(&json!({"status": "ok"}));
            }
        }
    };
}
