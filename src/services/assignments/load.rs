use futures_util::{StreamExt, TryStreamExt, stream};
use tracing::{debug, warn};

use super::AssignmentStore;
use crate::backend::NodePath;
use crate::errors::{Result, StoreError};
use crate::models::assignments::record;
use crate::models::{Assignment, Bucket, UserId};
use crate::utils::{is_canonical_due_date, with_retry};

pub async fn load_bucket(
    store: &AssignmentStore,
    user: &UserId,
    bucket: Bucket,
) -> Result<Vec<Assignment>> {
    let collection = NodePath::bucket(user, bucket);
    let backend = &store.backend;
    let retry = &store.retry;

    let keys = with_retry(retry, "list assignments", || backend.child_keys(&collection)).await?;
    debug!("Listed {} assignment(s) under {}", keys.len(), collection);

    // 并发拉取各条目，`buffered` 保持列出顺序，便于排序时稳定
    let collection_ref = &collection;
    let fetched: Vec<Option<Assignment>> = stream::iter(keys)
        .map(|key| async move {
            let path = collection_ref.child(&key);
            let fetched =
                with_retry(retry, "fetch assignment", || backend.get_record(&path)).await?;
            Ok::<_, StoreError>(fetched.map(|fields| {
                let decoded = record::decode(&key, &fields, bucket);
                for issue in &decoded.issues {
                    warn!("{} ({})", StoreError::record_malformed(issue.as_str()), path);
                }
                decoded.assignment
            }))
        })
        .buffered(store.load_concurrency)
        .try_collect()
        .await?;

    let mut assignments: Vec<Assignment> = Vec::with_capacity(fetched.len());
    for (index, assignment) in fetched.into_iter().enumerate() {
        match assignment {
            Some(assignment) => {
                if !is_canonical_due_date(&assignment.due_date) {
                    debug!(
                        "Assignment {} has non-canonical due date '{}', ordering may be off",
                        assignment.id, assignment.due_date
                    );
                }
                assignments.push(assignment);
            }
            // 列出之后被并发删除
            None => debug!("Entry #{} under {} vanished before fetch", index, collection),
        }
    }

    // 稳定排序，同一截止日期保持列出顺序
    assignments.sort_by(|a, b| a.due_date.cmp(&b.due_date));
    Ok(assignments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RemoteStore;
    use crate::backend::testing::{FlakyRemoteStore, Op, two_assignment_tree};
    use crate::services::assignments::test_support::{store_over, user};
    use serde_json::json;
    use std::sync::Arc;

    fn ids(assignments: &[Assignment]) -> Vec<&str> {
        assignments.iter().map(|a| a.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_load_sorts_by_due_date() {
        let backend = Arc::new(FlakyRemoteStore::from_tree(two_assignment_tree("u1")));
        let store = store_over(backend);

        let loaded = store.load(&user()).await.unwrap();
        assert_eq!(ids(&loaded), vec!["B", "A"]);
        assert_eq!(loaded[0].course, "Art");
        assert_eq!(loaded[1].course, "Math");
        assert!(loaded.iter().all(|a| !a.completed));
    }

    #[tokio::test]
    async fn test_load_many_distinct_dates_sorted() {
        let dates = [
            "2025-11-30", "2024-01-02", "2024-12-31", "2023-06-15", "2024-01-01", "2026-02-28",
        ];
        let mut current = serde_json::Map::new();
        for (i, date) in dates.iter().enumerate() {
            current.insert(format!("k{i}"), json!({"course": "C", "dueDate": date}));
        }
        let tree = json!({"users": {"u1": {"assignments": {"current": current}}}});
        let store = store_over(Arc::new(FlakyRemoteStore::from_tree(tree)));

        let loaded = store.load(&user()).await.unwrap();
        let loaded_dates: Vec<&str> = loaded.iter().map(|a| a.due_date.as_str()).collect();
        let mut expected = dates.to_vec();
        expected.sort();
        assert_eq!(loaded_dates, expected);
    }

    #[tokio::test]
    async fn test_ties_keep_listing_order() {
        let tree = json!({"users": {"u1": {"assignments": {"current": {
            "a": {"course": "X", "dueDate": "2024-05-05"},
            "b": {"course": "Y", "dueDate": "2024-01-01"},
            "c": {"course": "Z", "dueDate": "2024-05-05"}
        }}}}});
        let store = store_over(Arc::new(FlakyRemoteStore::from_tree(tree)));
        assert_eq!(ids(&store.load(&user()).await.unwrap()), vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn test_missing_due_date_does_not_abort_load() {
        let tree = json!({"users": {"u1": {"assignments": {"current": {
            "A": {"course": "Math", "dueDate": "2024-03-01"},
            "C": {"course": "History", "details": "no date"}
        }}}}});
        let store = store_over(Arc::new(FlakyRemoteStore::from_tree(tree)));

        let loaded = store.load(&user()).await.unwrap();
        assert_eq!(ids(&loaded), vec!["C", "A"]);
        assert_eq!(loaded[0].due_date, "");
        assert_eq!(loaded[0].details, "no date");
    }

    #[tokio::test]
    async fn test_empty_user_loads_nothing() {
        let store = store_over(Arc::new(FlakyRemoteStore::from_tree(json!({}))));
        assert!(store.load(&user()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_vanished_entries_are_skipped() {
        let backend = Arc::new(FlakyRemoteStore::from_tree(two_assignment_tree("u1")));
        backend.add_phantom_key("gone");
        let store = store_over(backend);
        assert_eq!(ids(&store.load(&user()).await.unwrap()), vec!["B", "A"]);
    }

    #[tokio::test]
    async fn test_transient_fetch_failure_is_retried() {
        let backend = Arc::new(FlakyRemoteStore::from_tree(two_assignment_tree("u1")));
        backend.fail_next(Op::ChildKeys, StoreError::network_failure("reset"));
        backend.fail_next(Op::GetRecord, StoreError::network_failure("reset"));
        let store = store_over(backend.clone());

        assert_eq!(ids(&store.load(&user()).await.unwrap()), vec!["B", "A"]);
        assert_eq!(backend.calls(Op::ChildKeys), 2);
        assert_eq!(backend.calls(Op::GetRecord), 3);
    }

    #[tokio::test]
    async fn test_persistent_network_failure_propagates() {
        let backend = Arc::new(FlakyRemoteStore::from_tree(two_assignment_tree("u1")));
        for _ in 0..3 {
            backend.fail_next(Op::ChildKeys, StoreError::network_failure("offline"));
        }
        let store = store_over(backend);
        assert!(matches!(
            store.load(&user()).await,
            Err(StoreError::NetworkFailure(_))
        ));
    }

    #[tokio::test]
    async fn test_load_completed_bucket() {
        let backend = Arc::new(FlakyRemoteStore::from_tree(json!({"users": {"u1": {"assignments": {
            "completed": {"Z": {
                "course": "Bio",
                "details": "",
                "dueDate": "2023-09-01",
                "completed": true,
                "ID": "Z"
            }}
        }}}})));
        let store = store_over(backend);
        let loaded = store.load_bucket(&user(), Bucket::Completed).await.unwrap();
        assert_eq!(ids(&loaded), vec!["Z"]);
        assert!(loaded[0].completed);
        assert!(store.load(&user()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_loads_are_identical() {
        let backend = Arc::new(FlakyRemoteStore::from_tree(two_assignment_tree("u1")));
        backend
            .inner()
            .set_record(
                &NodePath::bucket(&user(), Bucket::Current).child("C"),
                match json!({"course": "Chem", "dueDate": "2024-02-10"}) {
                    serde_json::Value::Object(map) => map,
                    _ => unreachable!(),
                },
            )
            .await
            .unwrap();
        let store = store_over(backend);

        let u = user();
        let (first, second, third) = tokio::join!(store.load(&u), store.load(&u), store.load(&u));
        let first = first.unwrap();
        assert_eq!(ids(&first), vec!["B", "C", "A"]);
        assert_eq!(first, second.unwrap());
        assert_eq!(first, third.unwrap());
    }
}
