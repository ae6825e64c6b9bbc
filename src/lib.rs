pub mod chat;
pub mod config;
pub mod error;
pub mod gateways;
pub mod logging;
pub mod models;
pub mod pricing;
pub mod services;
pub mod session;
pub mod store;
pub mod web;

pub use error::{Error, Result};

use crate::config::AppConfig;
use crate::gateways::Gateways;
use crate::session::UserLocks;
use crate::store::Store;
use std::sync::Arc;

/// Shared application state, resolved once at startup.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub gateways: Gateways,
    pub config: AppConfig,
    pub locks: UserLocks,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: AppConfig) -> Result<Arc<Self>> {
        let gateways = Gateways::from_config(&config)?;
        Ok(Arc::new(Self { store, gateways, config, locks: UserLocks::new() }))
    }

    /// Builds state around pre-built gateway handles; tests use this to point
    /// clients at mock servers or to disable them all.
    pub fn with_gateways(
        store: Arc<dyn Store>,
        config: AppConfig,
        gateways: Gateways,
    ) -> Arc<Self> {
        Arc::new(Self { store, gateways, config, locks: UserLocks::new() })
    }
}
