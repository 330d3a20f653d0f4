//! API module - HTTP handlers and shared state.

pub mod handlers;
pub mod openapi;
pub mod render;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::emitter::SideEffectEmitter;
use crate::error::Result;
use crate::resolver::Resolver;
use crate::storage::StorageBackend;
use crate::store::ContentStore;
use crate::webhooks::WebhookDeliverer;

/// Application state shared across handlers.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ContentStore>,
    pub storage: Arc<dyn StorageBackend>,
    pub resolver: Resolver,
    pub deliverer: Arc<WebhookDeliverer>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn ContentStore>,
        storage: Arc<dyn StorageBackend>,
    ) -> Result<Self> {
        let deliverer = Arc::new(WebhookDeliverer::new(
            store.clone(),
            Duration::from_secs(config.webhook_timeout_secs),
        )?);
        let emitter = SideEffectEmitter::new(store.clone(), deliverer.clone());
        let resolver = Resolver::new(store.clone(), emitter);
        Ok(Self {
            config,
            store,
            storage,
            resolver,
            deliverer,
        })
    }
}

pub type SharedState = Arc<AppState>;
