use std::collections::HashSet;
use tracing::{info, warn};

use super::AssignmentStore;
use crate::backend::NodePath;
use crate::errors::Result;
use crate::models::{Bucket, UserId};
use crate::utils::with_retry;

/// 修复两步完成留下的双份记录：删除已在 completed 中的作业的 current 副本
pub async fn reconcile_user(store: &AssignmentStore, user: &UserId) -> Result<usize> {
    let backend = &store.backend;
    let retry = &store.retry;
    let current = NodePath::bucket(user, Bucket::Current);
    let completed = NodePath::bucket(user, Bucket::Completed);

    let completed_keys: HashSet<String> =
        with_retry(retry, "list completed assignments", || backend.child_keys(&completed))
            .await?
            .into_iter()
            .collect();
    let current_keys =
        with_retry(retry, "list current assignments", || backend.child_keys(&current)).await?;

    let mut repaired = 0;
    for key in current_keys.into_iter().filter(|k| completed_keys.contains(k)) {
        let path = current.child(&key);
        warn!("Removing stale current copy of completed assignment {}", key);
        with_retry(retry, "remove stale assignment", || backend.remove_record(&path)).await?;
        repaired += 1;
    }

    if repaired > 0 {
        info!("Reconciled {} assignment(s) for user {}", repaired, user);
    }
    Ok(repaired)
}
