use async_trait::async_trait;
use redis::{AsyncCommands, aio::MultiplexedConnection};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, error};

use crate::backend::{NodePath, PathWrite, Record, RemoteStore};
use crate::config::AppConfig;
use crate::declare_backend_plugin;
use crate::errors::{Result, StoreError};

declare_backend_plugin!("redis", RedisRemoteStore);

/// 基于 Redis 的层级存储
///
/// - 记录：`{prefix}node:{path}`，HASH，字段值为 JSON 编码
/// - 子键索引：`{prefix}children:{collection}`，SET
pub struct RedisRemoteStore {
    conn: MultiplexedConnection,
    keys: RedisKeys,
}

/// 键布局与写入管道的构建，不依赖连接
#[derive(Debug, Clone)]
struct RedisKeys {
    prefix: String,
}

impl RedisKeys {
    fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn node_key(&self, path: &NodePath) -> String {
        format!("{}node:{}", self.prefix, path)
    }

    fn children_key(&self, collection: &NodePath) -> String {
        format!("{}children:{}", self.prefix, collection)
    }

    fn split(path: &NodePath) -> Result<(NodePath, String)> {
        match (path.parent(), path.key()) {
            (Some(parent), Some(key)) => Ok((parent, key.to_string())),
            _ => Err(StoreError::validation("Record path must not be the root")),
        }
    }

    fn encode_fields(record: &Record) -> Result<Vec<(String, String)>> {
        record
            .iter()
            .map(|(field, value)| Ok((field.clone(), serde_json::to_string(value)?)))
            .collect()
    }

    /// 解码字段值；非 JSON 的原始字符串按字符串处理
    fn decode_fields(fields: HashMap<String, String>) -> Record {
        fields
            .into_iter()
            .map(|(field, raw)| {
                let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
                (field, value)
            })
            .collect()
    }

    fn queue_write(&self, pipe: &mut redis::Pipeline, write: &PathWrite) -> Result<()> {
        match write {
            PathWrite::Set(path, record) => {
                let (parent, key) = Self::split(path)?;
                let node_key = self.node_key(path);
                let fields = Self::encode_fields(record)?;
                pipe.del(&node_key).ignore();
                // 空记录等同于删除，不能留下无法读取的索引项
                if fields.is_empty() {
                    pipe.srem(self.children_key(&parent), key).ignore();
                } else {
                    pipe.hset_multiple(&node_key, &fields).ignore();
                    pipe.sadd(self.children_key(&parent), key).ignore();
                }
            }
            PathWrite::Remove(path) => {
                let (parent, key) = Self::split(path)?;
                pipe.del(self.node_key(path)).ignore();
                pipe.srem(self.children_key(&parent), key).ignore();
            }
        }
        Ok(())
    }

    /// 所有写入放进同一个 MULTI/EXEC 事务
    fn build_pipeline(&self, writes: &[PathWrite]) -> Result<redis::Pipeline> {
        let mut pipe = redis::pipe();
        pipe.atomic();
        for write in writes {
            self.queue_write(&mut pipe, write)?;
        }
        Ok(pipe)
    }
}

impl RedisRemoteStore {
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let redis_config = &config.backend.redis;

        let client = redis::Client::open(redis_config.url.clone()).map_err(|e| {
            StoreError::backend_config(format!(
                "Failed to create Redis client. Check Redis URL in config: {e}"
            ))
        })?;

        let mut conn = client.get_multiplexed_async_connection().await.map_err(|e| {
            error!(
                "Failed to connect to Redis server: {}. Check Redis server status and URL: {}",
                e, redis_config.url
            );
            StoreError::backend_connection(format!("Redis connection failed: {e}"))
        })?;

        // 测试 Redis 连接
        let response: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::backend_connection(format!("Redis ping failed: {e}")))?;
        debug!(
            "RedisRemoteStore connected with prefix '{}': {}",
            redis_config.key_prefix, response
        );

        Ok(Self {
            conn,
            keys: RedisKeys::new(redis_config.key_prefix.clone()),
        })
    }

    async fn execute(&self, writes: &[PathWrite]) -> Result<()> {
        let pipe = self.keys.build_pipeline(writes)?;
        let mut conn = self.conn.clone();
        pipe.query_async::<()>(&mut conn).await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for RedisRemoteStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn child_keys(&self, collection: &NodePath) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let mut keys: Vec<String> = conn.smembers(self.keys.children_key(collection)).await?;
        keys.sort();
        Ok(keys)
    }

    async fn get_record(&self, path: &NodePath) -> Result<Option<Record>> {
        let mut conn = self.conn.clone();
        let fields: HashMap<String, String> = conn.hgetall(self.keys.node_key(path)).await?;
        if fields.is_empty() {
            debug!("Record not found: {}", path);
            return Ok(None);
        }
        Ok(Some(RedisKeys::decode_fields(fields)))
    }

    async fn set_record(&self, path: &NodePath, record: Record) -> Result<()> {
        self.execute(&[PathWrite::Set(path.clone(), record)]).await
    }

    async fn remove_record(&self, path: &NodePath) -> Result<()> {
        self.execute(&[PathWrite::Remove(path.clone())]).await
    }

    fn supports_atomic_update(&self) -> bool {
        true
    }

    async fn update(&self, writes: Vec<PathWrite>) -> Result<()> {
        self.execute(&writes).await
    }
}
