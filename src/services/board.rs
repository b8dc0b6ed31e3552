//! 待完成作业列表的视图模型
//!
//! 持有一份 current 分区的快照。变更失败时快照保持不变；变更成功后重新加载，
//! 重新加载失败则只在本地移除对应行。

use tracing::warn;

use crate::errors::{Result, StoreError};
use crate::models::{Assignment, Bucket};
use crate::services::assignments::AssignmentStore;
use crate::services::identity::{IdentityProvider, resolve_user};
use crate::utils::format_due_label;

/// 列表中的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardRow {
    pub id: String,
    pub course: String,
    pub details: String,
    pub due_label: String,
}

impl From<&Assignment> for BoardRow {
    fn from(assignment: &Assignment) -> Self {
        Self {
            id: assignment.id.clone(),
            course: assignment.course.clone(),
            details: assignment.details.clone(),
            due_label: format_due_label(&assignment.due_date),
        }
    }
}

pub struct AssignmentBoard<I: IdentityProvider> {
    store: AssignmentStore,
    identity: I,
    snapshot: Vec<Assignment>,
}

impl<I: IdentityProvider> AssignmentBoard<I> {
    pub fn new(store: AssignmentStore, identity: I) -> Self {
        Self {
            store,
            identity,
            snapshot: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> &[Assignment] {
        &self.snapshot
    }

    pub fn rows(&self) -> Vec<BoardRow> {
        self.snapshot.iter().map(BoardRow::from).collect()
    }

    /// 重新加载快照，失败时保留旧快照
    pub async fn refresh(&mut self) -> Result<&[Assignment]> {
        self.reload().await?;
        Ok(&self.snapshot)
    }

    async fn reload(&mut self) -> Result<()> {
        let user = resolve_user(&self.identity)?;
        self.snapshot = self.store.load(&user).await?;
        Ok(())
    }

    /// 完成第 `index` 行的作业
    pub async fn complete_at(&mut self, index: usize) -> Result<Assignment> {
        let user = resolve_user(&self.identity)?;
        let id = self.id_at(index)?;
        let completed = self.store.complete(&user, &id).await?;
        self.after_mutation(&id).await;
        Ok(completed)
    }

    /// 删除第 `index` 行的作业
    pub async fn delete_at(&mut self, index: usize) -> Result<()> {
        let user = resolve_user(&self.identity)?;
        let id = self.id_at(index)?;
        self.store.delete(&user, &id, Bucket::Current).await?;
        self.after_mutation(&id).await;
        Ok(())
    }

    fn id_at(&self, index: usize) -> Result<String> {
        self.snapshot
            .get(index)
            .map(|assignment| assignment.id.clone())
            .ok_or_else(|| {
                StoreError::validation(format!(
                    "Row {index} is out of range ({} row(s))",
                    self.snapshot.len()
                ))
            })
    }

    async fn after_mutation(&mut self, id: &str) {
        if let Err(e) = self.reload().await {
            warn!("Reload after mutating {} failed, updating locally: {}", id, e);
            self.snapshot.retain(|assignment| assignment.id != id);
        }
    }
}
