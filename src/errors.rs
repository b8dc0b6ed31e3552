//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码和类型名称。

use std::fmt;

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_store_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum StoreError {
            $($variant(String),)*
        }

        impl StoreError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(StoreError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(StoreError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(StoreError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl StoreError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        StoreError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_store_errors! {
    NotAuthenticated("E001", "Not Authenticated"),
    NetworkFailure("E002", "Network Failure"),
    Timeout("E003", "Operation Timeout"),
    RecordMalformed("E004", "Record Malformed"),
    RecordNotFound("E005", "Record Not Found"),
    CompletionIncomplete("E006", "Completion Incomplete"),
    BackendConfig("E007", "Backend Configuration Error"),
    BackendConnection("E008", "Backend Connection Error"),
    BackendOperation("E009", "Backend Operation Error"),
    BackendPluginNotFound("E010", "Backend Plugin Not Found"),
    Serialization("E011", "Serialization Error"),
    Validation("E012", "Validation Error"),
}

impl StoreError {
    /// 是否为可重试的瞬时错误
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::NetworkFailure(_) | StoreError::Timeout(_))
    }

    /// 格式化为彩色输出（用于开发环境）
    #[cfg(debug_assertions)]
    pub fn format_colored(&self) -> String {
        format!(
            "\x1b[1;31m[ERROR]\x1b[0m \x1b[33m{}\x1b[0m \x1b[31m{}\x1b[0m\n  {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for StoreError {}

// 为常见的错误类型实现 From trait
impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error()
            || err.is_timeout()
            || err.is_connection_dropped()
            || err.is_connection_refusal()
        {
            StoreError::NetworkFailure(err.to_string())
        } else {
            StoreError::BackendOperation(err.to_string())
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::BackendConfig(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
