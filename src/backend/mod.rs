//! 远程层级键值存储抽象
//!
//! 数据按 `users/{userID}/assignments/{bucket}/{assignmentID}` 组织，
//! 叶子节点为字段集合（[`Record`]），其上层为集合节点。

pub mod memory;
pub mod path;
pub mod redis;
pub mod register;

#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;

use crate::errors::Result;

pub use path::NodePath;

/// 单条记录的字段集合
pub type Record = serde_json::Map<String, serde_json::Value>;

/// 多路径更新中的一次写入
#[derive(Debug, Clone, PartialEq)]
pub enum PathWrite {
    Set(NodePath, Record),
    Remove(NodePath),
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// 后端名称，用于日志
    fn name(&self) -> &'static str;

    /// 列出集合下的所有子键，按键排序
    async fn child_keys(&self, collection: &NodePath) -> Result<Vec<String>>;

    /// 读取记录，不存在时返回 `None`
    async fn get_record(&self, path: &NodePath) -> Result<Option<Record>>;

    /// 整体覆盖写入记录
    async fn set_record(&self, path: &NodePath, record: Record) -> Result<()>;

    /// 删除记录，记录不存在时不视为错误
    async fn remove_record(&self, path: &NodePath) -> Result<()>;

    /// 是否支持多路径原子更新
    fn supports_atomic_update(&self) -> bool {
        false
    }

    /// 多路径更新。支持原子更新的后端必须保证全部写入同时生效或全部不生效；
    /// 默认实现按顺序逐条写入。
    async fn update(&self, writes: Vec<PathWrite>) -> Result<()> {
        for write in writes {
            match write {
                PathWrite::Set(path, record) => self.set_record(&path, record).await?,
                PathWrite::Remove(path) => self.remove_record(&path).await?,
            }
        }
        Ok(())
    }
}

/// 声明并在程序启动时注册一个后端插件
///
/// 目标类型需提供 `async fn connect(config: &AppConfig) -> Result<Self>`。
#[macro_export]
macro_rules! declare_backend_plugin {
    ($name:literal, $ty:ty) => {
        #[ctor::ctor]
        unsafe fn __register_backend_plugin() {
            $crate::backend::register::register_backend_plugin(
                $name,
                std::sync::Arc::new(|config: $crate::config::AppConfig| {
                    Box::pin(async move {
                        let backend = <$ty>::connect(&config).await?;
                        Ok::<_, $crate::errors::StoreError>(
                            Box::new(backend) as Box<dyn $crate::backend::RemoteStore>
                        )
                    }) as $crate::backend::register::BoxedRemoteStoreFuture
                }),
            );
        }
    };
}
