use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::backend::{NodePath, PathWrite, Record, RemoteStore};
use crate::config::AppConfig;
use crate::declare_backend_plugin;
use crate::errors::{Result, StoreError};

declare_backend_plugin!("memory", MemoryRemoteStore);

/// 记录所在的层级：users/{uid}/assignments/{bucket}/{id}
const RECORD_DEPTH: usize = 5;

/// 进程内层级存储
///
/// 外层键为集合路径，内层按子键排序保存记录。所有写入在同一把写锁下完成，
/// 因此多路径更新是原子的。
#[derive(Default)]
pub struct MemoryRemoteStore {
    collections: RwLock<BTreeMap<NodePath, BTreeMap<String, Record>>>,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let seed_file = config.backend.memory.seed_file.trim();
        if seed_file.is_empty() {
            debug!("MemoryRemoteStore initialized empty");
            return Ok(Self::new());
        }

        let raw = tokio::fs::read_to_string(seed_file).await.map_err(|e| {
            StoreError::backend_config(format!("Failed to read seed file '{seed_file}': {e}"))
        })?;
        let tree: Value = serde_json::from_str(&raw)?;
        let store = Self::from_tree(&tree)?;
        debug!(
            "MemoryRemoteStore seeded from '{}' with {} record(s)",
            seed_file,
            store.record_count().await
        );
        Ok(store)
    }

    /// 从 JSON 树导出构建存储
    ///
    /// 位于记录层级的对象整体作为一条记录，更浅的对象继续向下展开。
    pub fn from_tree(tree: &Value) -> Result<Self> {
        let Value::Object(root) = tree else {
            return Err(StoreError::backend_config(
                "Seed tree root must be a JSON object",
            ));
        };

        let mut collections = BTreeMap::new();
        collect_records(&NodePath::root(), root, &mut collections);

        Ok(Self {
            collections: RwLock::new(collections),
        })
    }

    pub async fn record_count(&self) -> usize {
        self.collections
            .read()
            .await
            .values()
            .map(BTreeMap::len)
            .sum()
    }

    fn split(path: &NodePath) -> Result<(NodePath, String)> {
        match (path.parent(), path.key()) {
            (Some(parent), Some(key)) => Ok((parent, key.to_string())),
            _ => Err(StoreError::validation("Record path must not be the root")),
        }
    }

    fn apply(
        collections: &mut BTreeMap<NodePath, BTreeMap<String, Record>>,
        write: PathWrite,
    ) -> Result<()> {
        match write {
            // 空记录等同于删除
            PathWrite::Set(path, record) if record.is_empty() => {
                Self::apply(collections, PathWrite::Remove(path))?;
            }
            PathWrite::Set(path, record) => {
                let (parent, key) = Self::split(&path)?;
                collections.entry(parent).or_default().insert(key, record);
            }
            PathWrite::Remove(path) => {
                let (parent, key) = Self::split(&path)?;
                if let Some(children) = collections.get_mut(&parent) {
                    children.remove(&key);
                    if children.is_empty() {
                        collections.remove(&parent);
                    }
                }
            }
        }
        Ok(())
    }
}

fn collect_records(
    path: &NodePath,
    node: &serde_json::Map<String, Value>,
    out: &mut BTreeMap<NodePath, BTreeMap<String, Record>>,
) {
    if path.segments().len() == RECORD_DEPTH {
        if node.is_empty() {
            warn!("Skipping empty record at '{}'", path);
        } else if let (Some(parent), Some(key)) = (path.parent(), path.key()) {
            out.entry(parent)
                .or_default()
                .insert(key.to_string(), node.clone());
        }
        return;
    }

    for (key, value) in node {
        match value {
            Value::Object(child) => collect_records(&path.child(key), child, out),
            _ => warn!("Ignoring scalar '{}' at non-record node '{}'", key, path),
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn child_keys(&self, collection: &NodePath) -> Result<Vec<String>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|children| children.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_record(&self, path: &NodePath) -> Result<Option<Record>> {
        let (parent, key) = Self::split(path)?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(&parent)
            .and_then(|children| children.get(&key))
            .cloned())
    }

    async fn set_record(&self, path: &NodePath, record: Record) -> Result<()> {
        let mut collections = self.collections.write().await;
        Self::apply(&mut collections, PathWrite::Set(path.clone(), record))
    }

    async fn remove_record(&self, path: &NodePath) -> Result<()> {
        let mut collections = self.collections.write().await;
        Self::apply(&mut collections, PathWrite::Remove(path.clone()))
    }

    fn supports_atomic_update(&self) -> bool {
        true
    }

    async fn update(&self, writes: Vec<PathWrite>) -> Result<()> {
        // 先校验全部路径，保证要么全部生效要么全部不生效
        for write in &writes {
            let path = match write {
                PathWrite::Set(path, _) | PathWrite::Remove(path) => path,
            };
            Self::split(path)?;
        }

        let mut collections = self.collections.write().await;
        for write in writes {
            Self::apply(&mut collections, write)?;
        }
        Ok(())
    }
}
