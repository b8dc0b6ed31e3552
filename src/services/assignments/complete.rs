use tracing::{debug, error, info, warn};

use super::AssignmentStore;
use crate::backend::{NodePath, PathWrite};
use crate::errors::{Result, StoreError};
use crate::models::assignments::record;
use crate::models::{Assignment, Bucket, UserId};
use crate::utils::{validate_key, with_retry};

/// 将作业从 current 移到 completed
///
/// 后端支持多路径原子更新时一次写入完成；否则先写 completed，
/// 成功后再删除 current。第一步失败时不会删除；第二步失败时返回
/// `CompletionIncomplete`，只需重试删除或执行 reconcile。
pub async fn complete_assignment(
    store: &AssignmentStore,
    user: &UserId,
    assignment_id: &str,
) -> Result<Assignment> {
    validate_key("assignment id", assignment_id)?;

    let backend = &store.backend;
    let retry = &store.retry;
    let source = NodePath::bucket(user, Bucket::Current).child(assignment_id);
    let target = NodePath::bucket(user, Bucket::Completed).child(assignment_id);

    // 读取源记录
    let fields = with_retry(retry, "fetch assignment", || backend.get_record(&source))
        .await?
        .ok_or_else(|| {
            StoreError::record_not_found(format!(
                "Assignment '{assignment_id}' is not in the current bucket"
            ))
        })?;

    let decoded = record::decode(assignment_id, &fields, Bucket::Current);
    for issue in &decoded.issues {
        warn!("{} ({})", StoreError::record_malformed(issue.as_str()), source);
    }
    let completed = decoded.assignment.into_completed()?;
    let completed_record = record::encode(&completed, Bucket::Completed);

    if store.atomic_complete && backend.supports_atomic_update() {
        let writes = vec![
            PathWrite::Set(target.clone(), completed_record),
            PathWrite::Remove(source.clone()),
        ];
        with_retry(retry, "complete assignment", || backend.update(writes.clone())).await?;
        info!(
            "Assignment {} completed for user {} (atomic via {})",
            assignment_id,
            user,
            backend.name()
        );
        return Ok(completed);
    }

    // 非原子路径：先写 completed
    if let Err(e) = with_retry(retry, "write completed assignment", || {
        backend.set_record(&target, completed_record.clone())
    })
    .await
    {
        warn!(
            "Failed to write completed copy of {}; current copy left untouched: {}",
            assignment_id, e
        );
        return Err(e);
    }
    debug!("Wrote {}", target);

    // 再删除 current
    match with_retry(retry, "remove current assignment", || backend.remove_record(&source)).await {
        Ok(()) => {
            info!(
                "Assignment {} completed for user {} (two-step via {})",
                assignment_id,
                user,
                backend.name()
            );
            Ok(completed)
        }
        Err(e) => {
            error!(
                "Assignment {} is now in both buckets for user {}: {}",
                assignment_id, user, e
            );
            Err(StoreError::completion_incomplete(format!(
                "Assignment '{assignment_id}' was written to completed but its current copy \
                 could not be removed ({e}); retry the removal or run reconcile"
            )))
        }
    }
}
