//! Assignment Store - 作业生命周期存储
//!
//! 按用户与生命周期分区（current / completed）管理作业，
//! 后端为远程层级键值存储。
//!
//! # 架构
//! - `backend`: 远程存储抽象与实现（内存 / Redis）
//! - `config`: 配置管理
//! - `errors`: 统一错误处理
//! - `models`: 数据模型定义
//! - `runtime`: 运行时生命周期管理
//! - `services`: 业务逻辑层（存储、身份、列表视图）
//! - `utils`: 工具函数

pub mod backend;
pub mod config;
pub mod errors;
pub mod models;
pub mod runtime;
pub mod services;
pub mod utils;
