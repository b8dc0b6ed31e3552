use crate::backend::RemoteStore;
use crate::config::AppConfig;
use crate::errors::Result;
use once_cell::sync::Lazy;
use std::{
    collections::HashMap,
    future::Future,
    pin::Pin,
    sync::{Arc, RwLock},
};

pub type BoxedRemoteStoreFuture =
    Pin<Box<dyn Future<Output = Result<Box<dyn RemoteStore>>> + Send>>;
pub type RemoteStoreConstructor = Arc<dyn Fn(AppConfig) -> BoxedRemoteStoreFuture + Send + Sync>;

static BACKEND_REGISTRY: Lazy<RwLock<HashMap<String, RemoteStoreConstructor>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

pub fn register_backend_plugin<S: Into<String>>(name: S, constructor: RemoteStoreConstructor) {
    let name = name.into();
    let mut registry = BACKEND_REGISTRY
        .write()
        .expect("Backend registry lock poisoned");
    registry.insert(name, constructor);
}

pub fn get_backend_plugin(name: &str) -> Option<RemoteStoreConstructor> {
    BACKEND_REGISTRY
        .read()
        .expect("Backend registry lock poisoned")
        .get(name)
        .cloned()
}

pub fn registered_backend_names() -> Vec<String> {
    let mut names: Vec<String> = BACKEND_REGISTRY
        .read()
        .expect("Backend registry lock poisoned")
        .keys()
        .cloned()
        .collect();
    names.sort();
    names
}

pub fn debug_backend_registry() {
    let names = registered_backend_names();
    if names.is_empty() {
        tracing::debug!("No backend plugins registered.");
    } else {
        tracing::debug!("Registered backend plugins:");
        for name in names {
            tracing::debug!(" - {}", name);
        }
    }
}
