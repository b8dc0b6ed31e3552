use crate::backend::{RemoteStore, register::get_backend_plugin};
use crate::config::AppConfig;
use crate::errors::{Result, StoreError};
use crate::services::AssignmentStore;
use std::sync::Arc;
use tracing::{debug, warn};

const FALLBACK_BACKEND: &str = "memory";

pub struct StartupContext {
    pub backend: Arc<dyn RemoteStore>,
    pub store: AssignmentStore,
}

async fn build_backend(name: &str, config: &AppConfig) -> Result<Arc<dyn RemoteStore>> {
    let constructor = get_backend_plugin(name).ok_or_else(|| {
        StoreError::backend_plugin_not_found(format!("Backend '{name}' not found in registry"))
    })?;
    let backend = constructor(config.clone()).await?;
    Ok(Arc::from(backend))
}

/// 创建远程存储后端
///
/// 配置的后端不可用时回退到内存后端。
pub async fn create_backend(config: &AppConfig) -> Result<Arc<dyn RemoteStore>> {
    let backend_type = config.backend.backend_type.as_str();

    warn!("Attempting to create {} backend", backend_type);

    match build_backend(backend_type, config).await {
        Ok(backend) => {
            warn!("Successfully created {} backend", backend_type);
            Ok(backend)
        }
        Err(e) if backend_type != FALLBACK_BACKEND => {
            warn!("Failed to create {} backend: {}", backend_type, e);
            warn!("Falling back to {} backend", FALLBACK_BACKEND);
            let backend = build_backend(FALLBACK_BACKEND, config).await.map_err(|fallback_e| {
                StoreError::backend_connection(format!(
                    "No backend available (tried: {backend_type}, {FALLBACK_BACKEND}): {fallback_e}"
                ))
            })?;
            warn!("Successfully created fallback {} backend", FALLBACK_BACKEND);
            Ok(backend)
        }
        Err(e) => Err(e),
    }
}

/// 准备存储上下文
pub async fn prepare_startup(config: &AppConfig) -> Result<StartupContext> {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    if cfg!(debug_assertions) {
        crate::backend::register::debug_backend_registry();
    }

    let backend = create_backend(config).await?;
    let store = AssignmentStore::new(backend.clone(), &config.store);
    debug!(
        "Assignment store ready on {} backend (load concurrency {})",
        backend.name(),
        config.store.load_concurrency
    );

    Ok(StartupContext { backend, store })
}
