//! Bookshelf application library
//!
//! Service modules plus the helpers `main` uses to assemble them; integration
//! tests build the same router over an in-memory store.
#![recursion_limit = "256"]

pub mod modules;

use std::sync::Arc;

use axum::Router;
use bookshelf_http::ServiceInfo;
use bookshelf_kernel::{settings::Settings, ModuleRegistry};

pub use modules::books::store::{BookStore, MemoryBookStore, MySqlBookStore};

/// Metadata served at `/`
pub fn service_info(settings: &Settings) -> ServiceInfo {
    ServiceInfo {
        name: "Bookshelf API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: "CRUD and keyword search over a catalogue of books".to_string(),
        environment: settings.environment.as_str().to_string(),
    }
}

/// Registry with every module wired to `store`
pub fn registry_with_store(store: Arc<dyn BookStore>) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, store)?;
    Ok(registry)
}

/// Full application router over `store`, as served in production
pub fn app(store: Arc<dyn BookStore>, settings: &Settings) -> anyhow::Result<Router> {
    let registry = registry_with_store(store)?;
    Ok(bookshelf_http::build_router(
        &registry,
        settings,
        &service_info(settings),
    ))
}
