//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use choreboard_core::materialize::Materializer;
use choreboard_core::ports::{DatabaseService, InstanceStore, PriceService, TemplateStore};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub templates: Arc<dyn TemplateStore>,
    pub instances: Arc<dyn InstanceStore>,
    pub price: Arc<dyn PriceService>,
    pub config: Arc<Config>,
}

impl AppState {
    /// A materializer over the same stores the handlers use.
    pub fn materializer(&self) -> Materializer {
        Materializer::new(self.templates.clone(), self.instances.clone())
    }
}
