use config::{Config, ConfigError, Environment, File};
use std::sync::OnceLock;

use super::AppConfig;

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// 并发拉取的上限，避免 CPU 核数过多时对后端造成压力
const MAX_LOAD_CONCURRENCY: usize = 32;

impl AppConfig {
    /// 加载配置
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            // 首先加载默认配置文件
            .add_source(File::with_name("config").required(false))
            // 然后根据环境加载特定配置文件
            .add_source(
                File::with_name(&format!(
                    "config.{}",
                    std::env::var("APP_ENV").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            // 最后加载环境变量覆盖
            .add_source(
                Environment::with_prefix("ASSIGNMENTS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        // 支持从常用环境变量加载
        builder = builder
            .set_override_option("app.environment", std::env::var("APP_ENV").ok())?
            .set_override_option("app.log_level", std::env::var("RUST_LOG").ok())?
            .set_override_option("backend.type", std::env::var("ASSIGNMENTS_BACKEND_TYPE").ok())?
            .set_override_option("backend.redis.url", std::env::var("REDIS_URL").ok())?
            .set_override_option(
                "backend.redis.key_prefix",
                std::env::var("REDIS_KEY_PREFIX").ok(),
            )?
            .set_override_option("identity.user_id", std::env::var("ASSIGNMENTS_USER_ID").ok())?;

        let config = builder.build()?;
        let mut app_config: AppConfig = config.try_deserialize()?;
        app_config.normalize();

        Ok(app_config)
    }

    /// 补全需要运行时推断的配置项
    pub fn normalize(&mut self) {
        // 处理并发拉取数
        if self.store.load_concurrency == 0 {
            self.store.load_concurrency = num_cpus::get().clamp(1, MAX_LOAD_CONCURRENCY);
        }
        if self.store.retry.max_attempts == 0 {
            self.store.retry.max_attempts = 1;
        }
    }

    /// 获取全局配置实例
    pub fn get() -> &'static AppConfig {
        APP_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                eprintln!("Failed to load configuration: {e}");
                std::process::exit(1);
            })
        })
    }

    /// 初始化配置 (在应用启动时调用)
    pub fn init() -> Result<(), ConfigError> {
        let config = Self::load()?;
        APP_CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("Configuration already initialized".to_string()))?;
        Ok(())
    }

    /// 检查是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app.environment == "development"
    }

    /// 获取配置中的默认用户 (如果配置了)
    pub fn configured_user_id(&self) -> Option<&str> {
        let user_id = self.identity.user_id.trim();
        if user_id.is_empty() {
            None
        } else {
            Some(user_id)
        }
    }
}
