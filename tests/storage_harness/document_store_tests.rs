//! Macro-generated test suite for `DocumentStore<TestUser>` contract validation.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//!
//! use storage_harness::*;
//! use backbone::storage::InMemoryStore;
//!
//! document_store_tests!(InMemoryStore::<TestUser>::new());
//! ```
//!
//! # Generated Tests
//!
//! ## Insert & lookup
//! - `test_insert_and_find_by_id`: inserted document comes back unchanged
//! - `test_find_by_id_missing`: unknown id returns None
//! - `test_insert_duplicate_id`: second insert with the same id fails
//!
//! ## Queries
//! - `test_filter_equality`, `test_filter_operators`, `test_filter_membership`,
//!   `test_filter_nested_field`: filter vocabulary
//! - `test_sort_skip_limit`: ordering and windowing
//! - `test_count_matches_filter`, `test_find_one`
//!
//! ## Update & delete
//! - `test_update_and_return`: patch merge, `updated_at` refreshed
//! - `test_update_ignores_immutable_fields`: id and created_at survive a patch
//! - `test_update_missing` / `test_delete_missing`: None, not an error
//! - `test_delete_and_return`: returns the deleted document
//!
//! ## Concurrency
//! - `test_concurrent_inserts`: parallel inserts from spawned tasks

/// Generate a full `DocumentStore<TestUser>` conformance test suite.
///
/// `$factory` must evaluate to a fresh, empty store. It is re-evaluated for
/// each test. For the concurrent test the store must be `Clone + 'static`.
#[macro_export]
macro_rules! document_store_tests {
    ($factory:expr) => {
        mod document_store_contract_tests {
            use super::*;
            use backbone::core::query::{SortDirection, SortSpec};
            use backbone::core::store::DocumentStore;
            use backbone::core::Filter;
            use serde_json::json;
            use uuid::Uuid;

            async fn seeded(n: usize) -> (impl DocumentStore<TestUser> + Clone + 'static, Vec<TestUser>) {
                let store = $factory;
                let batch = sample_batch(n);
                for user in &batch {
                    store.insert(user.clone()).await.unwrap();
                }
                (store, batch)
            }

            // ==================================================================
            // Insert & lookup
            // ==================================================================

            #[tokio::test]
            async fn test_insert_and_find_by_id() {
                let store = $factory;
                let user = create_test_user("Alice", 30, true, 0);

                let inserted = store.insert(user.clone()).await.unwrap();
                assert_eq!(inserted, user);

                let found = store.find_by_id(&user.id).await.unwrap();
                assert_eq!(found, Some(user));
            }

            #[tokio::test]
            async fn test_find_by_id_missing() {
                let store = $factory;
                let found = store.find_by_id(&Uuid::new_v4()).await.unwrap();
                assert!(found.is_none());
            }

            #[tokio::test]
            async fn test_insert_duplicate_id() {
                let store = $factory;
                let user = create_test_user("Alice", 30, true, 0);

                store.insert(user.clone()).await.unwrap();
                let result = store.insert(user).await;
                assert!(result.is_err(), "duplicate id must be rejected");
            }

            // ==================================================================
            // Queries
            // ==================================================================

            #[tokio::test]
            async fn test_filter_equality() {
                let (store, _) = seeded(6).await;

                let active = store
                    .find_many(&filter(json!({"active": true})), &SortSpec::parse("age"), 0, 100)
                    .await
                    .unwrap();

                assert_eq!(names(&active), vec!["User_0", "User_2", "User_4"]);
            }

            #[tokio::test]
            async fn test_filter_operators() {
                let (store, _) = seeded(6).await;

                let middle = store
                    .find_many(
                        &filter(json!({"age": {"$gte": 21, "$lt": 24}})),
                        &SortSpec::parse("age"),
                        0,
                        100,
                    )
                    .await
                    .unwrap();

                assert_eq!(names(&middle), vec!["User_1", "User_2", "User_3"]);
            }

            #[tokio::test]
            async fn test_filter_membership() {
                let (store, _) = seeded(5).await;

                let picked = store
                    .find_many(
                        &filter(json!({"name": {"$in": ["User_1", "User_3", "Nobody"]}})),
                        &SortSpec::parse("name"),
                        0,
                        100,
                    )
                    .await
                    .unwrap();
                assert_eq!(names(&picked), vec!["User_1", "User_3"]);

                let rest = store
                    .count(&filter(json!({"name": {"$nin": ["User_1", "User_3"]}})))
                    .await
                    .unwrap();
                assert_eq!(rest, 3);
            }

            #[tokio::test]
            async fn test_filter_nested_field() {
                let store = $factory;
                let mut lyon = create_test_user("Lyonnais", 40, true, 0);
                lyon.address.city = "Lyon".to_string();
                store.insert(lyon.clone()).await.unwrap();
                store.insert(create_test_user("Parisien", 41, true, 1)).await.unwrap();

                let found = store
                    .find_many(&filter(json!({"address.city": "Lyon"})), &SortSpec::new(), 0, 100)
                    .await
                    .unwrap();

                assert_eq!(found, vec![lyon]);
            }

            #[tokio::test]
            async fn test_sort_skip_limit() {
                let (store, _) = seeded(5).await;

                let newest = store
                    .find_many(&Filter::new(), &SortSpec::newest_first(), 0, 2)
                    .await
                    .unwrap();
                assert_eq!(names(&newest), vec!["User_4", "User_3"]);

                let mut by_active_then_age = SortSpec::new();
                by_active_then_age.push("active", SortDirection::Descending);
                by_active_then_age.push("age", SortDirection::Ascending);
                let window = store
                    .find_many(&Filter::new(), &by_active_then_age, 1, 3)
                    .await
                    .unwrap();
                assert_eq!(names(&window), vec!["User_2", "User_4", "User_1"]);

                let past_end = store
                    .find_many(&Filter::new(), &SortSpec::newest_first(), 10, 5)
                    .await
                    .unwrap();
                assert!(past_end.is_empty());
            }

            #[tokio::test]
            async fn test_count_matches_filter() {
                let (store, _) = seeded(7).await;

                assert_eq!(store.count(&Filter::new()).await.unwrap(), 7);
                assert_eq!(store.count(&filter(json!({"active": false}))).await.unwrap(), 3);
                assert_eq!(store.count(&filter(json!({"age": {"$gt": 100}}))).await.unwrap(), 0);
            }

            #[tokio::test]
            async fn test_find_one() {
                let (store, batch) = seeded(3).await;

                let found = store
                    .find_one(&filter(json!({"email": "user_2@test.com"})))
                    .await
                    .unwrap();
                assert_eq!(found, Some(batch[2].clone()));

                let missing = store
                    .find_one(&filter(json!({"email": "nobody@test.com"})))
                    .await
                    .unwrap();
                assert!(missing.is_none());
            }

            // ==================================================================
            // Update & delete
            // ==================================================================

            #[tokio::test]
            async fn test_update_and_return() {
                let (store, batch) = seeded(2).await;
                let target = &batch[0];

                let updated = store
                    .update_and_return(&target.id, filter(json!({"name": "Renamed", "age": 99})))
                    .await
                    .unwrap()
                    .expect("document should exist");

                assert_eq!(updated.name, "Renamed");
                assert_eq!(updated.age, 99);
                assert_eq!(updated.email, target.email);
                assert!(updated.updated_at > target.updated_at);

                let stored = store.find_by_id(&target.id).await.unwrap().unwrap();
                assert_eq!(stored, updated);

                let untouched = store.find_by_id(&batch[1].id).await.unwrap().unwrap();
                assert_eq!(untouched, batch[1]);
            }

            #[tokio::test]
            async fn test_update_ignores_immutable_fields() {
                let (store, batch) = seeded(1).await;
                let target = &batch[0];

                let updated = store
                    .update_and_return(
                        &target.id,
                        filter(json!({
                            "id": Uuid::new_v4(),
                            "created_at": "2030-01-01T00:00:00Z",
                            "active": false
                        })),
                    )
                    .await
                    .unwrap()
                    .unwrap();

                assert_eq!(updated.id, target.id);
                assert_eq!(updated.created_at, target.created_at);
                assert!(!updated.active);
            }

            #[tokio::test]
            async fn test_update_missing() {
                let store = $factory;
                let result = store
                    .update_and_return(&Uuid::new_v4(), filter(json!({"name": "Ghost"})))
                    .await
                    .unwrap();
                assert!(result.is_none());
            }

            #[tokio::test]
            async fn test_delete_and_return() {
                let (store, batch) = seeded(3).await;

                let deleted = store.delete_and_return(&batch[1].id).await.unwrap();
                assert_eq!(deleted, Some(batch[1].clone()));

                assert!(store.find_by_id(&batch[1].id).await.unwrap().is_none());
                assert_eq!(store.count(&Filter::new()).await.unwrap(), 2);
            }

            #[tokio::test]
            async fn test_delete_missing() {
                let store = $factory;
                let deleted = store.delete_and_return(&Uuid::new_v4()).await.unwrap();
                assert!(deleted.is_none());
            }

            // ==================================================================
            // Concurrency
            // ==================================================================

            #[tokio::test]
            async fn test_concurrent_inserts() {
                let store = $factory;

                let handles: Vec<_> = sample_batch(10)
                    .into_iter()
                    .map(|user| {
                        let store = store.clone();
                        tokio::spawn(async move { store.insert(user).await })
                    })
                    .collect();

                for handle in handles {
                    handle.await.unwrap().unwrap();
                }

                assert_eq!(store.count(&Filter::new()).await.unwrap(), 10);
            }
        }
    };
}
