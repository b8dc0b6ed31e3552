//! 作业生命周期存储
//!
//! 远程布局：`users/{userID}/assignments/{current|completed}/{assignmentID}`。
//! 所有远程调用都经过 [`with_retry`](crate::utils::with_retry)，
//! 受配置的超时与重试策略约束。

pub mod complete;
pub mod delete;
pub mod load;
pub mod reconcile;

use std::sync::Arc;

use crate::backend::RemoteStore;
use crate::config::StoreConfig;
use crate::errors::Result;
use crate::models::{Assignment, Bucket, UserId};
use crate::services::identity::IdentityProvider;
use crate::utils::RetryPolicy;

#[derive(Clone)]
pub struct AssignmentStore {
    backend: Arc<dyn RemoteStore>,
    retry: RetryPolicy,
    load_concurrency: usize,
    atomic_complete: bool,
}

impl AssignmentStore {
    pub fn new(backend: Arc<dyn RemoteStore>, config: &StoreConfig) -> Self {
        Self {
            backend,
            retry: RetryPolicy::from_config(config),
            load_concurrency: config.load_concurrency.max(1),
            atomic_complete: config.atomic_complete,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn backend(&self) -> &Arc<dyn RemoteStore> {
        &self.backend
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// 解析当前用户，未登录时返回 `NotAuthenticated`
    pub fn resolve_user(&self, identity: &dyn IdentityProvider) -> Result<UserId> {
        crate::services::identity::resolve_user(identity)
    }

    /// 加载待完成作业，按截止日期升序
    pub async fn load(&self, user: &UserId) -> Result<Vec<Assignment>> {
        load::load_bucket(self, user, Bucket::Current).await
    }

    /// 加载任一分区的作业，按截止日期升序
    pub async fn load_bucket(&self, user: &UserId, bucket: Bucket) -> Result<Vec<Assignment>> {
        load::load_bucket(self, user, bucket).await
    }

    /// 将作业从 current 移到 completed
    pub async fn complete(&self, user: &UserId, assignment_id: &str) -> Result<Assignment> {
        complete::complete_assignment(self, user, assignment_id).await
    }

    /// 删除指定分区中的作业，幂等
    pub async fn delete(&self, user: &UserId, assignment_id: &str, bucket: Bucket) -> Result<()> {
        delete::delete_assignment(self, user, assignment_id, bucket).await
    }

    /// 清理同时存在于两个分区的作业的 current 副本，返回清理数量
    pub async fn reconcile(&self, user: &UserId) -> Result<usize> {
        reconcile::reconcile_user(self, user).await
    }
}
