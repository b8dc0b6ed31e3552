//! 当前用户解析
//!
//! 存储本身不管理登录会话，只通过 [`IdentityProvider`] 获取当前用户 ID。

use crate::config::AppConfig;
use crate::errors::{Result, StoreError};
use crate::models::UserId;

pub trait IdentityProvider: Send + Sync {
    /// 当前已认证用户的 ID，未登录时返回 `None`
    fn current_user_id(&self) -> Option<String>;
}

/// 固定身份，供命令行和测试使用
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    user_id: Option<String>,
}

impl StaticIdentity {
    pub fn signed_in<S: Into<String>>(user_id: S) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    pub fn signed_out() -> Self {
        Self { user_id: None }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user_id(&self) -> Option<String> {
        self.user_id.clone()
    }
}

impl IdentityProvider for AppConfig {
    fn current_user_id(&self) -> Option<String> {
        self.configured_user_id().map(str::to_string)
    }
}

pub fn resolve_user(identity: &dyn IdentityProvider) -> Result<UserId> {
    match identity.current_user_id() {
        Some(user_id) => UserId::parse(user_id),
        None => Err(StoreError::not_authenticated("No authenticated user")),
    }
}
