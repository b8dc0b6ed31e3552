//! 测试用的故障注入后端

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::backend::memory::MemoryRemoteStore;
use crate::backend::{NodePath, PathWrite, Record, RemoteStore};
use crate::errors::{Result, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Op {
    ChildKeys,
    GetRecord,
    SetRecord,
    RemoveRecord,
    Update,
}

/// 包装内存后端，可按操作注入错误并统计调用次数
pub(crate) struct FlakyRemoteStore {
    inner: MemoryRemoteStore,
    atomic: bool,
    failures: Mutex<HashMap<Op, VecDeque<StoreError>>>,
    calls: Mutex<HashMap<Op, usize>>,
    phantom_keys: Mutex<Vec<String>>,
}

impl FlakyRemoteStore {
    pub(crate) fn new(inner: MemoryRemoteStore) -> Self {
        Self {
            inner,
            atomic: true,
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            phantom_keys: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn from_tree(tree: Value) -> Self {
        Self::new(MemoryRemoteStore::from_tree(&tree).expect("valid seed tree"))
    }

    /// 模拟不支持多路径原子更新的后端
    pub(crate) fn non_atomic(mut self) -> Self {
        self.atomic = false;
        self
    }

    pub(crate) fn fail_next(&self, op: Op, error: StoreError) {
        self.failures
            .lock()
            .unwrap()
            .entry(op)
            .or_default()
            .push_back(error);
    }

    /// 列出但读取不到的键，模拟列出后被并发删除的条目
    pub(crate) fn add_phantom_key(&self, key: &str) {
        self.phantom_keys.lock().unwrap().push(key.to_string());
    }

    pub(crate) fn calls(&self, op: Op) -> usize {
        self.calls.lock().unwrap().get(&op).copied().unwrap_or(0)
    }

    pub(crate) fn inner(&self) -> &MemoryRemoteStore {
        &self.inner
    }

    fn enter(&self, op: Op) -> Result<()> {
        *self.calls.lock().unwrap().entry(op).or_default() += 1;
        match self
            .failures
            .lock()
            .unwrap()
            .get_mut(&op)
            .and_then(VecDeque::pop_front)
        {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteStore for FlakyRemoteStore {
    fn name(&self) -> &'static str {
        "flaky"
    }

    async fn child_keys(&self, collection: &NodePath) -> Result<Vec<String>> {
        self.enter(Op::ChildKeys)?;
        let mut keys = self.inner.child_keys(collection).await?;
        keys.extend(self.phantom_keys.lock().unwrap().iter().cloned());
        Ok(keys)
    }

    async fn get_record(&self, path: &NodePath) -> Result<Option<Record>> {
        self.enter(Op::GetRecord)?;
        self.inner.get_record(path).await
    }

    async fn set_record(&self, path: &NodePath, record: Record) -> Result<()> {
        self.enter(Op::SetRecord)?;
        self.inner.set_record(path, record).await
    }

    async fn remove_record(&self, path: &NodePath) -> Result<()> {
        self.enter(Op::RemoveRecord)?;
        self.inner.remove_record(path).await
    }

    fn supports_atomic_update(&self) -> bool {
        self.atomic
    }

    async fn update(&self, writes: Vec<PathWrite>) -> Result<()> {
        self.enter(Op::Update)?;
        self.inner.update(writes).await
    }
}

/// 单用户的测试数据：current = {A: Math 2024-03-01, B: Art 2024-01-15}
pub(crate) fn two_assignment_tree(user: &str) -> Value {
    json!({
        "users": {
            user: {
                "assignments": {
                    "current": {
                        "A": {"course": "Math", "details": "Chapter 4", "dueDate": "2024-03-01"},
                        "B": {"course": "Art", "details": "", "dueDate": "2024-01-15"}
                    }
                }
            }
        }
    })
}
