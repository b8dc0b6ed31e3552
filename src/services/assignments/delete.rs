use tracing::info;

use super::AssignmentStore;
use crate::backend::NodePath;
use crate::errors::Result;
use crate::models::{AssignmentState, Bucket, LifecycleAction, UserId};
use crate::utils::{validate_key, with_retry};

/// 删除 `bucket` 分区中的作业；作业不存在时视为成功
pub async fn delete_assignment(
    store: &AssignmentStore,
    user: &UserId,
    assignment_id: &str,
    bucket: Bucket,
) -> Result<()> {
    validate_key("assignment id", assignment_id)?;
    AssignmentState::of_bucket(bucket).apply(LifecycleAction::Delete)?;

    let backend = &store.backend;
    let path = NodePath::bucket(user, bucket).child(assignment_id);
    with_retry(&store.retry, "delete assignment", || backend.remove_record(&path)).await?;

    info!(
        "Assignment {} deleted from {} for user {}",
        assignment_id, bucket, user
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::{FlakyRemoteStore, Op, two_assignment_tree};
    use crate::errors::StoreError;
    use crate::services::assignments::test_support::{store_over, user};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_delete_current_assignment() {
        let store = store_over(Arc::new(FlakyRemoteStore::from_tree(two_assignment_tree("u1"))));

        store.delete(&user(), "A", Bucket::Current).await.unwrap();
        let loaded = store.load(&user()).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "B");
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = store_over(Arc::new(FlakyRemoteStore::from_tree(two_assignment_tree("u1"))));

        store.delete(&user(), "A", Bucket::Current).await.unwrap();
        store.delete(&user(), "A", Bucket::Current).await.unwrap();
        store.delete(&user(), "never-existed", Bucket::Completed).await.unwrap();
        assert!(store.load(&user()).await.unwrap().iter().all(|a| a.id != "A"));
    }

    #[tokio::test]
    async fn test_delete_completed_assignment() {
        let store = store_over(Arc::new(FlakyRemoteStore::from_tree(two_assignment_tree("u1"))));
        store.complete(&user(), "A").await.unwrap();

        store.delete(&user(), "A", Bucket::Completed).await.unwrap();
        assert!(
            store
                .load_bucket(&user(), Bucket::Completed)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_delete_only_touches_given_bucket() {
        let store = store_over(Arc::new(FlakyRemoteStore::from_tree(two_assignment_tree("u1"))));
        store.delete(&user(), "A", Bucket::Completed).await.unwrap();
        assert_eq!(store.load(&user()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_retries_then_fails() {
        let backend = Arc::new(FlakyRemoteStore::from_tree(two_assignment_tree("u1")));
        backend.fail_next(Op::RemoveRecord, StoreError::network_failure("reset"));
        let store = store_over(backend.clone());
        store.delete(&user(), "A", Bucket::Current).await.unwrap();
        assert_eq!(backend.calls(Op::RemoveRecord), 2);

        for _ in 0..3 {
            backend.fail_next(Op::RemoveRecord, StoreError::network_failure("offline"));
        }
        assert!(matches!(
            store.delete(&user(), "B", Bucket::Current).await,
            Err(StoreError::NetworkFailure(_))
        ));
        assert_eq!(store.load(&user()).await.unwrap()[0].id, "B");
    }
}
